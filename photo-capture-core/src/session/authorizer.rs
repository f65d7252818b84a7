use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::logging::SessionLogger;
use crate::traits::authorization::{AuthorizationSource, AuthorizationStatus, MediaKind};

/// Combined camera and microphone authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureAuthorization {
    pub video: AuthorizationStatus,
    pub audio: AuthorizationStatus,
}

impl CaptureAuthorization {
    /// Both axes granted. Denied and restricted are not told apart.
    pub fn is_fully_authorized(&self) -> bool {
        self.video == AuthorizationStatus::Authorized && self.audio == AuthorizationStatus::Authorized
    }
}

/// How [`Authorizer::request_access`] delivered its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Both axes were already determined; the completion ran before
    /// `request_access` returned.
    Sync,
    /// At least one axis needed a prompt; the completion runs on whatever
    /// thread answers the last prompt.
    Async,
}

type AuthorizationCompletion = Box<dyn FnOnce(CaptureAuthorization) + Send + 'static>;

struct PendingAuthorization {
    video: Option<AuthorizationStatus>,
    audio: Option<AuthorizationStatus>,
    completion: Option<AuthorizationCompletion>,
}

/// Gate in front of capture: unifies the video and audio permission axes.
pub struct Authorizer {
    source: Arc<dyn AuthorizationSource>,
    logger: SessionLogger,
}

impl Authorizer {
    pub fn new(source: Arc<dyn AuthorizationSource>, logger: SessionLogger) -> Self {
        Self { source, logger }
    }

    /// Current status of both axes, queried now.
    pub fn existing(&self) -> CaptureAuthorization {
        CaptureAuthorization {
            video: self.source.status(MediaKind::Video),
            audio: self.source.status(MediaKind::Audio),
        }
    }

    /// Resolve both axes, prompting for any that are undetermined.
    ///
    /// `completion` runs exactly once, after both axes have an answer. A
    /// prompt answer maps to `Authorized` or `Denied`.
    pub fn request_access(
        &self,
        completion: impl FnOnce(CaptureAuthorization) + Send + 'static,
    ) -> CompletionMode {
        let existing = self.existing();
        let pending = Arc::new(Mutex::new(PendingAuthorization {
            video: None,
            audio: None,
            completion: Some(Box::new(completion)),
        }));

        let video = self.check(MediaKind::Video, existing.video, &pending);
        let audio = self.check(MediaKind::Audio, existing.audio, &pending);

        match (video, audio) {
            (CompletionMode::Sync, CompletionMode::Sync) => CompletionMode::Sync,
            _ => CompletionMode::Async,
        }
    }

    fn check(
        &self,
        kind: MediaKind,
        status: AuthorizationStatus,
        pending: &Arc<Mutex<PendingAuthorization>>,
    ) -> CompletionMode {
        if status.is_determined() {
            record(pending, kind, status, &self.logger);
            return CompletionMode::Sync;
        }

        self.logger
            .info(format_args!("Requesting {:?} capture access", kind));
        let pending = Arc::clone(pending);
        let logger = self.logger.clone();
        self.source.request_access(
            kind,
            Box::new(move |granted| {
                let status = if granted {
                    AuthorizationStatus::Authorized
                } else {
                    AuthorizationStatus::Denied
                };
                record(&pending, kind, status, &logger);
            }),
        );
        CompletionMode::Async
    }
}

/// Store one axis' answer; fire the completion when it was the last one.
fn record(
    pending: &Mutex<PendingAuthorization>,
    kind: MediaKind,
    status: AuthorizationStatus,
    logger: &SessionLogger,
) {
    let ready = {
        let mut pending = pending.lock();
        let slot = match kind {
            MediaKind::Video => &mut pending.video,
            MediaKind::Audio => &mut pending.audio,
        };
        if slot.is_some() {
            logger.warn(format_args!(
                "Ignoring duplicate {:?} authorization answer: {:?}",
                kind, status
            ));
            return;
        }
        *slot = Some(status);

        match (pending.video, pending.audio) {
            (Some(video), Some(audio)) => pending
                .completion
                .take()
                .map(|completion| (completion, CaptureAuthorization { video, audio })),
            _ => None,
        }
    };

    if let Some((completion, authorization)) = ready {
        completion(authorization);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::authorization::AccessCallback;
    use crate::traits::authorization::AuthorizationStatus::*;

    struct FakeSource {
        video: AuthorizationStatus,
        audio: AuthorizationStatus,
        prompts: Mutex<Vec<(MediaKind, AccessCallback)>>,
    }

    impl FakeSource {
        fn new(video: AuthorizationStatus, audio: AuthorizationStatus) -> Arc<Self> {
            Arc::new(Self {
                video,
                audio,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn answer(&self, kind: MediaKind, granted: bool) {
            let callback = {
                let mut prompts = self.prompts.lock();
                let index = prompts.iter().position(|(k, _)| *k == kind).unwrap();
                prompts.remove(index).1
            };
            callback(granted);
        }
    }

    impl AuthorizationSource for FakeSource {
        fn status(&self, kind: MediaKind) -> AuthorizationStatus {
            match kind {
                MediaKind::Video => self.video,
                MediaKind::Audio => self.audio,
            }
        }

        fn request_access(&self, kind: MediaKind, callback: AccessCallback) {
            self.prompts.lock().push((kind, callback));
        }
    }

    fn collect(authorizer: &Authorizer) -> (CompletionMode, Arc<Mutex<Vec<CaptureAuthorization>>>) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        let mode = authorizer.request_access(move |auth| sink.lock().push(auth));
        (mode, results)
    }

    #[test]
    fn determined_axes_complete_synchronously() {
        let source = FakeSource::new(Authorized, Authorized);
        let authorizer = Authorizer::new(source.clone(), SessionLogger::new());
        assert!(authorizer.existing().is_fully_authorized());

        let (mode, results) = collect(&authorizer);
        assert_eq!(mode, CompletionMode::Sync);
        assert_eq!(results.lock().len(), 1);
        assert!(results.lock()[0].is_fully_authorized());
        assert!(source.prompts.lock().is_empty());
    }

    #[test]
    fn restricted_is_terminal_and_not_authorized() {
        let authorizer = Authorizer::new(FakeSource::new(Authorized, Restricted), SessionLogger::new());
        let (mode, results) = collect(&authorizer);
        assert_eq!(mode, CompletionMode::Sync);
        assert!(!results.lock()[0].is_fully_authorized());
    }

    #[test]
    fn waits_for_every_prompt_before_completing() {
        let source = FakeSource::new(NotDetermined, NotDetermined);
        let authorizer = Authorizer::new(source.clone(), SessionLogger::new());

        let (mode, results) = collect(&authorizer);
        assert_eq!(mode, CompletionMode::Async);
        assert_eq!(source.prompts.lock().len(), 2);

        source.answer(MediaKind::Audio, true);
        assert!(results.lock().is_empty());

        source.answer(MediaKind::Video, true);
        let results = results.lock();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_fully_authorized());
    }

    #[test]
    fn mixed_determined_and_prompted_axes() {
        let source = FakeSource::new(Authorized, NotDetermined);
        let authorizer = Authorizer::new(source.clone(), SessionLogger::new());

        let (mode, results) = collect(&authorizer);
        assert_eq!(mode, CompletionMode::Async);
        assert!(results.lock().is_empty());

        source.answer(MediaKind::Audio, false);
        assert_eq!(
            results.lock().as_slice(),
            &[CaptureAuthorization { video: Authorized, audio: Denied }]
        );
    }

    #[test]
    fn duplicate_answers_are_ignored() {
        let pending = Mutex::new(PendingAuthorization {
            video: None,
            audio: None,
            completion: None,
        });
        let logger = SessionLogger::new();
        record(&pending, MediaKind::Video, Denied, &logger);
        record(&pending, MediaKind::Video, Authorized, &logger);
        assert_eq!(pending.lock().video, Some(Denied));
    }
}
