use std::path::PathBuf;
use std::time::Duration;

use crate::models::captured_photo::PhotoFrame;
use crate::models::error::PlatformError;
use crate::models::photo_settings::ResolvedPhotoSettings;

/// One step of the hardware's photo capture callback sequence.
///
/// For a single request the hardware emits, in order:
/// ```text
/// WillBegin → WillCapture → DidFinishProcessingPhoto
///           → [DidFinishRecordingClip → DidFinishProcessingClip]   (live photos only)
///           → DidFinishCapture
/// ```
/// `DidFinishCapture` is always the last event and is always delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoCaptureEvent {
    WillBegin(ResolvedPhotoSettings),
    WillCapture(ResolvedPhotoSettings),
    DidFinishProcessingPhoto(Result<PhotoFrame, PlatformError>),
    /// The companion movie stopped recording; the file is not final yet.
    DidFinishRecordingClip { file: PathBuf },
    DidFinishProcessingClip(Result<ProcessedClip, PlatformError>),
    DidFinishCapture(Result<(), PlatformError>),
}

/// A finished live photo companion movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedClip {
    pub file: PathBuf,
    pub duration: Duration,
    pub photo_display_time: Duration,
}

/// Receives the capture callback sequence for one request.
///
/// Events are delivered from hardware threads, never the caller's thread.
/// Implementations must marshal to their own context before touching
/// shared state.
pub trait PhotoCaptureDelegate: Send + Sync {
    fn handle_event(&self, event: PhotoCaptureEvent);
}
