use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error reported by the underlying capture platform.
///
/// Backends translate their native error values (OS status codes,
/// exceptions, driver errors) into this shape before handing them to the
/// core.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("platform error {code}: {message}")]
pub struct PlatformError {
    pub code: i64,
    pub message: String,
}

impl PlatformError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Renders an optional underlying cause as a `": cause"` suffix.
struct Cause<'a>(&'a Option<PlatformError>);

impl fmt::Display for Cause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(error) => write!(f, ": {}", error),
            None => Ok(()),
        }
    }
}

/// Session-level failures. These are surfaced through
/// [`SessionState::Error`](crate::SessionState::Error) and are terminal for
/// the session until `start()` is called again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("capture is not authorized")]
    Unauthorized,

    #[error("no camera found")]
    NoCameraFound,

    #[error("no microphone found")]
    NoMicrophoneFound,

    #[error("unable to add video input{}", Cause(.0))]
    UnableToAddVideoInput(Option<PlatformError>),

    #[error("unable to add audio input{}", Cause(.0))]
    UnableToAddAudioInput(Option<PlatformError>),

    #[error("unable to add photo output{}", Cause(.0))]
    UnableToAddPhotoOutput(Option<PlatformError>),

    #[error("video recording is not supported")]
    VideoRecordingUnsupported,

    #[error("capture session runtime error{}", Cause(.0))]
    RuntimeError(Option<PlatformError>),
}

/// Failures scoped to a single photo capture request. Never promoted to
/// session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhotoError {
    #[error("no photo data captured")]
    NoData,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors from the serialized session queue.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("session queue has shut down")]
    Closed,

    #[error("cannot wait synchronously on the session queue from its own worker")]
    Reentrant,
}

/// Errors from handing captured photos to a photo library.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LibraryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_cause_is_appended() {
        let bare = SessionError::UnableToAddVideoInput(None);
        assert_eq!(bare.to_string(), "unable to add video input");

        let wrapped = SessionError::UnableToAddAudioInput(Some(PlatformError::new(-11814, "busy")));
        assert_eq!(
            wrapped.to_string(),
            "unable to add audio input: platform error -11814: busy"
        );
    }

    #[test]
    fn photo_error_wraps_platform_error() {
        let error: PhotoError = PlatformError::new(7, "sensor fault").into();
        assert_eq!(error.to_string(), "platform error 7: sensor fault");
    }
}
