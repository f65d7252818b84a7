#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use photo_capture_core::{
    CaptureSession, Options, PhotoCaptureEvent, Published, RequestId, SessionState,
};
use photo_capture_virtual::{VirtualBackend, VirtualCaptureHardware, VirtualPhotoOutput};

/// A capture session wired to a virtual backend, stepped deterministically.
pub struct Harness {
    pub backend: VirtualBackend,
    pub session: CaptureSession<VirtualCaptureHardware>,
}

impl Harness {
    pub fn new(backend: VirtualBackend) -> Self {
        Self::with_options(backend, |options| options)
    }

    pub fn with_options(backend: VirtualBackend, configure: impl FnOnce(Options) -> Options) -> Self {
        let options = configure(backend.options());
        let session = CaptureSession::new(backend.hardware.clone(), backend.collaborators(), options);
        let harness = Self { backend, session };
        harness.flush();
        harness
    }

    pub fn standard() -> Self {
        Self::new(VirtualBackend::standard())
    }

    /// A standard session that has started and is running.
    pub fn running() -> Self {
        let harness = Self::standard();
        harness.start();
        assert_eq!(harness.session.state(), SessionState::Running);
        harness
    }

    pub fn start(&self) {
        self.session.start();
        self.flush();
    }

    pub fn flush(&self) {
        self.session.flush().expect("session queue is alive");
    }

    pub fn hardware(&self) -> &VirtualCaptureHardware {
        &self.backend.hardware
    }

    pub fn output(&self) -> VirtualPhotoOutput {
        self.backend.output()
    }

    /// Issue a capture and return the id the hardware received.
    pub fn capture(&self) -> RequestId {
        let issued = self.output().issued().len();
        self.session.capture_photo();
        self.flush();
        let requests = self.output().issued();
        assert_eq!(requests.len(), issued + 1, "capture was not issued to the hardware");
        requests[issued].request_id
    }

    /// Deliver the next hardware event for `id` and let the session react.
    pub fn step(&self, id: RequestId) -> PhotoCaptureEvent {
        let event = self.output().step(id).expect("request has events left");
        self.flush();
        event
    }

    /// Step `id` through will-capture so its item is published.
    pub fn step_through_will_capture(&self, id: RequestId) {
        let found = self
            .output()
            .step_until(id, |event| matches!(event, PhotoCaptureEvent::WillCapture(_)));
        assert!(found);
        self.flush();
    }

    pub fn complete(&self, id: RequestId) {
        self.output().complete(id);
        self.flush();
    }

    pub fn item_ids(&self) -> Vec<RequestId> {
        self.session
            .photo_capture_items()
            .iter()
            .map(|item| item.id)
            .collect()
    }
}

/// Record every value written to `published` from now on.
pub fn record<T>(published: &Published<T>) -> Arc<Mutex<Vec<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    let values = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&values);
    published.subscribe(move |value: &T| sink.lock().push(value.clone()));
    values
}

/// Drop consecutive duplicates.
pub fn collapse<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut collapsed = values;
    collapsed.dedup();
    collapsed
}
