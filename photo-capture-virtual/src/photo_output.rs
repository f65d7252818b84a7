//! Virtual photo output.
//!
//! Captures are scripted as the full delegate event sequence when they are
//! issued. In manual mode (the default) nothing is delivered until the
//! caller steps a request, which makes interleavings deterministic. In
//! automatic mode a worker thread delivers each sequence on its own.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use photo_capture_core::models::camera_models::Dimensions;
use photo_capture_core::models::captured_photo::{PhotoFrame, RawImage};
use photo_capture_core::models::error::PlatformError;
use photo_capture_core::models::orientation::VideoOrientation;
use photo_capture_core::models::photo_settings::{
    PhotoCodec, PhotoSettings, ProcessingTimeRange, QualityPrioritization, RequestId, ResolvedPhotoSettings,
};
use photo_capture_core::traits::capture_delegate::{PhotoCaptureDelegate, PhotoCaptureEvent, ProcessedClip};
use photo_capture_core::traits::hardware::PhotoOutput;

/// Pixel format tag for BGRA frames.
const BGRA: u32 = 0x4247_5241;

const PHOTO_DIMENSIONS: Dimensions = Dimensions {
    width: 4032,
    height: 3024,
};
const PREVIEW_DIMENSIONS: Dimensions = Dimensions {
    width: 160,
    height: 120,
};
const LIVE_PHOTO_DIMENSIONS: Dimensions = Dimensions {
    width: 1920,
    height: 1440,
};

/// How the next capture should go wrong, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureFailure {
    /// Photo processing reports an error; the capture itself finishes
    /// cleanly.
    ProcessingError(PlatformError),
    /// The final did-finish-capture event carries an error.
    CaptureError(PlatformError),
    /// The processed frame has no encoded file data.
    MissingData,
}

struct PendingCapture {
    settings: PhotoSettings,
    delegate: Arc<dyn PhotoCaptureDelegate>,
    events: VecDeque<PhotoCaptureEvent>,
}

struct OutputState {
    live_photo_supported: bool,
    live_photo_enabled: bool,
    high_resolution_enabled: bool,
    max_quality: QualityPrioritization,
    codecs: Vec<PhotoCodec>,
    preview_formats: Vec<u32>,
    video_orientation: VideoOrientation,
    processing_time: Duration,
    automatic: Option<Duration>,
    next_failure: Option<CaptureFailure>,
    issued: Vec<PhotoSettings>,
    pending: Vec<PendingCapture>,
}

impl Default for OutputState {
    fn default() -> Self {
        Self {
            live_photo_supported: true,
            live_photo_enabled: false,
            high_resolution_enabled: false,
            max_quality: QualityPrioritization::Balanced,
            codecs: vec![PhotoCodec::Hevc, PhotoCodec::Jpeg],
            preview_formats: vec![BGRA],
            video_orientation: VideoOrientation::Portrait,
            processing_time: Duration::from_millis(300),
            automatic: None,
            next_failure: None,
            issued: Vec::new(),
            pending: Vec::new(),
        }
    }
}

/// Shared handle to a virtual photo output. Clones observe and drive the
/// same output.
#[derive(Clone, Default)]
pub struct VirtualPhotoOutput {
    state: Arc<Mutex<OutputState>>,
}

impl VirtualPhotoOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_live_photo_supported(&self, supported: bool) {
        self.state.lock().live_photo_supported = supported;
    }

    pub fn set_codecs(&self, codecs: Vec<PhotoCodec>) {
        self.state.lock().codecs = codecs;
    }

    /// Expected processing duration reported at will-begin.
    pub fn set_processing_time(&self, duration: Duration) {
        self.state.lock().processing_time = duration;
    }

    /// Deliver every capture on a worker thread, pausing `step_delay`
    /// between events. `None` returns to manual stepping.
    pub fn set_automatic(&self, step_delay: Option<Duration>) {
        self.state.lock().automatic = step_delay;
    }

    /// Script a failure for the next capture request only.
    pub fn fail_next_capture(&self, failure: CaptureFailure) {
        self.state.lock().next_failure = Some(failure);
    }

    pub fn is_live_photo_enabled(&self) -> bool {
        self.state.lock().live_photo_enabled
    }

    pub fn is_high_resolution_enabled(&self) -> bool {
        self.state.lock().high_resolution_enabled
    }

    pub fn max_quality(&self) -> QualityPrioritization {
        self.state.lock().max_quality
    }

    pub fn video_orientation(&self) -> VideoOrientation {
        self.state.lock().video_orientation
    }

    /// Settings of every capture request issued so far.
    pub fn issued(&self) -> Vec<PhotoSettings> {
        self.state.lock().issued.clone()
    }

    /// Requests that still have events to deliver, in issue order.
    pub fn pending(&self) -> Vec<RequestId> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|capture| capture.settings.request_id)
            .collect()
    }

    /// Deliver the next event of request `id`. Returns the event, or `None`
    /// if the request has nothing left.
    pub fn step(&self, id: RequestId) -> Option<PhotoCaptureEvent> {
        let (delegate, event) = {
            let mut state = self.state.lock();
            let index = state
                .pending
                .iter()
                .position(|capture| capture.settings.request_id == id)?;
            let capture = &mut state.pending[index];
            let event = capture.events.pop_front()?;
            let delegate = Arc::clone(&capture.delegate);
            if capture.events.is_empty() {
                state.pending.remove(index);
            }
            (delegate, event)
        };
        deliver(delegate.as_ref(), event.clone());
        Some(event)
    }

    /// Deliver events of request `id` until `predicate` matches the event
    /// just delivered, or the request runs out. Returns whether it matched.
    pub fn step_until(&self, id: RequestId, predicate: impl Fn(&PhotoCaptureEvent) -> bool) -> bool {
        while let Some(event) = self.step(id) {
            if predicate(&event) {
                return true;
            }
        }
        false
    }

    /// Deliver every remaining event of request `id`.
    pub fn complete(&self, id: RequestId) -> usize {
        let mut delivered = 0;
        while self.step(id).is_some() {
            delivered += 1;
        }
        delivered
    }

    /// Complete every pending request, oldest first.
    pub fn complete_all(&self) {
        for id in self.pending() {
            self.complete(id);
        }
    }

    fn script(state: &mut OutputState, settings: &PhotoSettings) -> VecDeque<PhotoCaptureEvent> {
        let live_clip = settings
            .live_photo_movie_file
            .clone()
            .filter(|_| state.live_photo_enabled);
        let resolved = ResolvedPhotoSettings {
            request_id: settings.request_id,
            photo_dimensions: PHOTO_DIMENSIONS,
            live_photo_movie_dimensions: if live_clip.is_some() {
                LIVE_PHOTO_DIMENSIONS
            } else {
                Dimensions::default()
            },
            processing_time_range: ProcessingTimeRange {
                start: Duration::ZERO,
                duration: state.processing_time,
            },
        };

        let failure = state.next_failure.take();
        let processed = match &failure {
            Some(CaptureFailure::ProcessingError(error)) => Err(error.clone()),
            Some(CaptureFailure::MissingData) => Ok(PhotoFrame {
                file_data: None,
                image: Some(raw_image(PHOTO_DIMENSIONS)),
                preview: None,
            }),
            _ => Ok(frame(settings)),
        };
        let finished = match failure {
            Some(CaptureFailure::CaptureError(error)) => Err(error),
            _ => Ok(()),
        };

        let mut events = VecDeque::from([
            PhotoCaptureEvent::WillBegin(resolved.clone()),
            PhotoCaptureEvent::WillCapture(resolved),
            PhotoCaptureEvent::DidFinishProcessingPhoto(processed),
        ]);
        if let Some(file) = live_clip {
            events.push_back(PhotoCaptureEvent::DidFinishRecordingClip { file: file.clone() });
            events.push_back(PhotoCaptureEvent::DidFinishProcessingClip(Ok(ProcessedClip {
                file,
                duration: Duration::from_millis(3000),
                photo_display_time: Duration::from_millis(1500),
            })));
        }
        events.push_back(PhotoCaptureEvent::DidFinishCapture(finished));
        events
    }
}

impl PhotoOutput for VirtualPhotoOutput {
    fn is_live_photo_capture_supported(&self) -> bool {
        self.state.lock().live_photo_supported
    }

    fn set_live_photo_capture_enabled(&mut self, enabled: bool) {
        let mut state = self.state.lock();
        state.live_photo_enabled = enabled && state.live_photo_supported;
    }

    fn set_high_resolution_capture_enabled(&mut self, enabled: bool) {
        self.state.lock().high_resolution_enabled = enabled;
    }

    fn set_max_quality_prioritization(&mut self, quality: QualityPrioritization) {
        self.state.lock().max_quality = quality;
    }

    fn available_codecs(&self) -> Vec<PhotoCodec> {
        self.state.lock().codecs.clone()
    }

    fn available_preview_pixel_formats(&self) -> Vec<u32> {
        self.state.lock().preview_formats.clone()
    }

    fn set_video_orientation(&mut self, orientation: VideoOrientation) {
        self.state.lock().video_orientation = orientation;
    }

    fn capture_photo(&mut self, settings: PhotoSettings, delegate: Arc<dyn PhotoCaptureDelegate>) {
        let mut state = self.state.lock();
        let events = Self::script(&mut state, &settings);
        state.issued.push(settings.clone());

        let Some(step_delay) = state.automatic else {
            state.pending.push(PendingCapture {
                settings,
                delegate,
                events,
            });
            return;
        };
        drop(state);

        let spawned = thread::Builder::new()
            .name(format!("virtual-capture-{}", settings.request_id))
            .spawn(move || {
                for event in events {
                    thread::sleep(step_delay);
                    deliver(delegate.as_ref(), event);
                }
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn virtual capture thread: {}", e);
        }
    }
}

/// Hand `event` to `delegate`, writing the companion movie first when the
/// event announces it.
fn deliver(delegate: &dyn PhotoCaptureDelegate, event: PhotoCaptureEvent) {
    if let PhotoCaptureEvent::DidFinishRecordingClip { file } = &event {
        write_clip(file);
    }
    delegate.handle_event(event);
}

fn write_clip(file: &Path) {
    if let Err(e) = fs::write(file, b"virtual live photo movie") {
        log::warn!("Failed to write virtual live photo clip {}: {}", file.display(), e);
    }
}

fn raw_image(dimensions: Dimensions) -> RawImage {
    RawImage {
        dimensions,
        pixel_format: BGRA,
        pixels: Arc::from(vec![0x80u8; 64]),
    }
}

fn frame(settings: &PhotoSettings) -> PhotoFrame {
    let mut file_data = match settings.codec {
        PhotoCodec::Hevc => b"ftypheic".to_vec(),
        PhotoCodec::Jpeg => vec![0xFF, 0xD8, 0xFF, 0xE0],
    };
    file_data.extend_from_slice(format!("virtual photo {}", settings.request_id).as_bytes());
    PhotoFrame {
        file_data: Some(file_data),
        image: Some(raw_image(PHOTO_DIMENSIONS)),
        preview: Some(raw_image(PREVIEW_DIMENSIONS)),
    }
}
