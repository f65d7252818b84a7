use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use crate::models::captured_photo::{CapturedPhoto, PhotoFrame};
use crate::models::error::PhotoError;
use crate::models::orientation::VideoOrientation;
use crate::models::photo_settings::{PhotoSettings, RequestId};
use crate::session::logging::SessionLogger;
use crate::session::queue::QueueHandle;
use crate::traits::capture_delegate::{PhotoCaptureDelegate, PhotoCaptureEvent};
use crate::traits::image_normalizer::ImageNormalizer;

/// Expected processing time above which a capture reports indeterminate
/// processing, so fast captures do not flash a busy indicator.
pub const INDETERMINATE_PROCESSING_THRESHOLD: Duration = Duration::from_secs(1);

pub type ProgressCallback<T> = Arc<dyn Fn(&mut T, RequestId) + Send + Sync + 'static>;
pub type StateChangeCallback<T> = Arc<dyn Fn(&mut T, RequestId, bool) + Send + Sync + 'static>;
pub type CompletionCallback<T> =
    Box<dyn FnOnce(&mut T, RequestId, Result<CapturedPhoto, PhotoError>) + Send + 'static>;

/// Observers of one capture request. All of them run on the queue the
/// processor was created with.
pub struct PhotoProcessorCallbacks<T> {
    pub will_capture: ProgressCallback<T>,
    /// `true` when a live photo companion movie starts recording, `false`
    /// when it stops.
    pub live_photo_capture_changed: StateChangeCallback<T>,
    /// `true` when processing is expected to take a noticeable time,
    /// `false` once the photo has been processed.
    pub indeterminate_processing_changed: StateChangeCallback<T>,
    pub completion: CompletionCallback<T>,
}

#[derive(Default)]
struct ProcessorState {
    frame: Option<PhotoFrame>,
    live_photo_file: Option<PathBuf>,
    max_processing_time: Option<Duration>,
    recording_live_photo: bool,
    processing_indeterminately: bool,
    finished: bool,
}

/// Drives one capture request from the hardware's event sequence to a
/// single [`CapturedPhoto`] or [`PhotoError`].
///
/// ```text
/// WillBegin ──→ live start?       (live movie dimensions non-zero)
/// WillCapture ──→ will capture, indeterminate start?   (> 1 s expected)
/// DidFinishProcessingPhoto ──→ indeterminate stop?, keep frame
/// DidFinishRecordingClip ──→ live stop?
/// DidFinishProcessingClip ──→ keep clip
/// DidFinishCapture ──→ live stop?, completion (exactly once)
/// ```
///
/// Events arrive on hardware threads; every callback is marshaled onto the
/// queue with [`QueueHandle::asap`].
pub struct PhotoProcessor<T: 'static> {
    settings: PhotoSettings,
    user_orientation: VideoOrientation,
    queue: QueueHandle<T>,
    normalizer: Arc<dyn ImageNormalizer>,
    logger: SessionLogger,
    will_capture: ProgressCallback<T>,
    live_photo_capture_changed: StateChangeCallback<T>,
    indeterminate_processing_changed: StateChangeCallback<T>,
    completion: Mutex<Option<CompletionCallback<T>>>,
    state: Mutex<ProcessorState>,
}

impl<T: 'static> PhotoProcessor<T> {
    pub fn new(
        settings: PhotoSettings,
        user_orientation: VideoOrientation,
        queue: QueueHandle<T>,
        normalizer: Arc<dyn ImageNormalizer>,
        logger: SessionLogger,
        callbacks: PhotoProcessorCallbacks<T>,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            user_orientation,
            queue,
            normalizer,
            logger,
            will_capture: callbacks.will_capture,
            live_photo_capture_changed: callbacks.live_photo_capture_changed,
            indeterminate_processing_changed: callbacks.indeterminate_processing_changed,
            completion: Mutex::new(Some(callbacks.completion)),
            state: Mutex::new(ProcessorState::default()),
        })
    }

    pub fn request_id(&self) -> RequestId {
        self.settings.request_id
    }

    pub fn settings(&self) -> &PhotoSettings {
        &self.settings
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    fn signal_live_photo(&self, is_recording: bool) {
        let callback = Arc::clone(&self.live_photo_capture_changed);
        let id = self.request_id();
        self.dispatch(move |context| callback(context, id, is_recording));
    }

    fn signal_indeterminate(&self, is_processing: bool) {
        let callback = Arc::clone(&self.indeterminate_processing_changed);
        let id = self.request_id();
        self.dispatch(move |context| callback(context, id, is_processing));
    }

    fn signal_will_capture(&self) {
        let callback = Arc::clone(&self.will_capture);
        let id = self.request_id();
        self.dispatch(move |context| callback(context, id));
    }

    fn finish(&self, result: Result<CapturedPhoto, PhotoError>) {
        let Some(completion) = self.completion.lock().take() else {
            return;
        };
        let id = self.request_id();
        self.dispatch(move |context| completion(context, id, result));
    }

    fn dispatch(&self, job: impl FnOnce(&mut T) + Send + 'static) {
        if self.queue.asap(job).is_err() {
            self.logger.warn(format_args!(
                "Dropping callback for capture {}: session queue has shut down",
                self.request_id()
            ));
        }
    }

    fn assemble(
        &self,
        frame: Option<PhotoFrame>,
        live_photo_file: Option<PathBuf>,
    ) -> Result<CapturedPhoto, PhotoError> {
        let frame = frame.ok_or(PhotoError::NoData)?;
        let file_data = frame.file_data.ok_or(PhotoError::NoData)?;
        let image = frame.image.ok_or(PhotoError::NoData)?;

        let orientation = self.user_orientation.image_orientation();
        Ok(CapturedPhoto {
            request_id: self.request_id(),
            file_data,
            live_photo_file,
            settings: self.settings.clone(),
            original_image: self.normalizer.normalize(image, orientation),
            preview_image: frame
                .preview
                .map(|preview| self.normalizer.normalize(preview, orientation)),
            user_orientation: self.user_orientation,
            captured_at: Utc::now(),
        })
    }
}

impl<T: 'static> PhotoCaptureDelegate for PhotoProcessor<T> {
    fn handle_event(&self, event: PhotoCaptureEvent) {
        let mut state = self.state.lock();
        if state.finished {
            self.logger.warn(format_args!(
                "Ignoring {:?} for capture {}: already finished",
                event,
                self.request_id()
            ));
            return;
        }

        match event {
            PhotoCaptureEvent::WillBegin(resolved) => {
                if !resolved.live_photo_movie_dimensions.is_empty() {
                    state.recording_live_photo = true;
                    self.signal_live_photo(true);
                }
                state.max_processing_time = Some(resolved.processing_time_range.end());
            }
            PhotoCaptureEvent::WillCapture(_) => {
                self.signal_will_capture();
                if state
                    .max_processing_time
                    .is_some_and(|max| max > INDETERMINATE_PROCESSING_THRESHOLD)
                {
                    state.processing_indeterminately = true;
                    self.signal_indeterminate(true);
                }
            }
            PhotoCaptureEvent::DidFinishProcessingPhoto(result) => {
                if state.processing_indeterminately {
                    state.processing_indeterminately = false;
                    self.signal_indeterminate(false);
                }
                match result {
                    Ok(frame) => state.frame = Some(frame),
                    Err(error) => self.logger.error(format_args!(
                        "Error capturing photo {}: {}",
                        self.request_id(),
                        error
                    )),
                }
            }
            PhotoCaptureEvent::DidFinishRecordingClip { file } => {
                self.logger.debug(format_args!(
                    "Live photo clip for capture {} recorded to {}",
                    self.request_id(),
                    file.display()
                ));
                if state.recording_live_photo {
                    state.recording_live_photo = false;
                    self.signal_live_photo(false);
                }
            }
            PhotoCaptureEvent::DidFinishProcessingClip(result) => match result {
                Ok(clip) => state.live_photo_file = Some(clip.file),
                Err(error) => self.logger.error(format_args!(
                    "Error processing live photo clip for capture {}: {}",
                    self.request_id(),
                    error
                )),
            },
            PhotoCaptureEvent::DidFinishCapture(result) => {
                if state.recording_live_photo {
                    state.recording_live_photo = false;
                    self.signal_live_photo(false);
                }
                state.finished = true;

                let outcome = match result {
                    Err(error) => {
                        self.logger.error(format_args!(
                            "Error capturing photo {}: {}",
                            self.request_id(),
                            error
                        ));
                        Err(PhotoError::Platform(error))
                    }
                    Ok(()) => {
                        let frame = state.frame.take();
                        let clip = state.live_photo_file.take();
                        drop(state);
                        let assembled = self.assemble(frame, clip);
                        if assembled.is_err() {
                            self.logger.error(format_args!(
                                "No photo data captured for {}",
                                self.request_id()
                            ));
                        }
                        assembled
                    }
                };
                self.finish(outcome);
            }
        }
    }
}

impl<T: 'static> fmt::Debug for PhotoProcessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoProcessor")
            .field("request_id", &self.request_id())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::camera_models::Dimensions;
    use crate::models::captured_photo::fixtures;
    use crate::models::error::PlatformError;
    use crate::models::orientation::ImageOrientation;
    use crate::models::photo_settings::{ProcessingTimeRange, ResolvedPhotoSettings};
    use crate::session::queue::SerialQueue;
    use crate::traits::capture_delegate::ProcessedClip;
    use crate::traits::image_normalizer::OrientationTagger;

    #[derive(Debug, Clone, PartialEq)]
    enum Signal {
        WillCapture,
        Live(bool),
        Indeterminate(bool),
        Completed(Result<RequestId, PhotoError>),
    }

    #[derive(Default)]
    struct Recorder {
        signals: Vec<Signal>,
        photos: Vec<CapturedPhoto>,
    }

    fn processor(queue: &SerialQueue<Recorder>) -> Arc<PhotoProcessor<Recorder>> {
        PhotoProcessor::new(
            fixtures::settings(),
            VideoOrientation::LandscapeRight,
            queue.handle(),
            Arc::new(OrientationTagger),
            SessionLogger::new(),
            PhotoProcessorCallbacks {
                will_capture: Arc::new(|r: &mut Recorder, _: RequestId| {
                    r.signals.push(Signal::WillCapture)
                }),
                live_photo_capture_changed: Arc::new(|r: &mut Recorder, _: RequestId, on: bool| {
                    r.signals.push(Signal::Live(on))
                }),
                indeterminate_processing_changed: Arc::new(|r: &mut Recorder, _: RequestId, on: bool| {
                    r.signals.push(Signal::Indeterminate(on))
                }),
                completion: Box::new(|r: &mut Recorder, _: RequestId, result: Result<CapturedPhoto, PhotoError>| {
                    let signal = Signal::Completed(result.as_ref().map(|p| p.request_id).map_err(Clone::clone));
                    r.signals.push(signal);
                    if let Ok(photo) = result {
                        r.photos.push(photo);
                    }
                }),
            },
        )
    }

    fn resolved(id: RequestId, live: bool, processing_ms: u64) -> ResolvedPhotoSettings {
        ResolvedPhotoSettings {
            request_id: id,
            photo_dimensions: Dimensions::new(4032, 3024),
            live_photo_movie_dimensions: if live { Dimensions::new(1440, 1080) } else { Dimensions::default() },
            processing_time_range: ProcessingTimeRange {
                start: Duration::from_millis(processing_ms / 2),
                duration: Duration::from_millis(processing_ms - processing_ms / 2),
            },
        }
    }

    fn frame() -> PhotoFrame {
        PhotoFrame {
            file_data: Some(b"heic".to_vec()),
            image: Some(fixtures::raw_image(4032, 3024)),
            preview: Some(fixtures::raw_image(320, 240)),
        }
    }

    fn signals(queue: &SerialQueue<Recorder>) -> Vec<Signal> {
        queue.sync(|r| r.signals.clone()).unwrap()
    }

    #[test]
    fn fast_capture_completes_without_progress_noise() {
        let queue = SerialQueue::new("processor-fast", |_| Recorder::default());
        let processor = processor(&queue);
        let id = processor.request_id();

        processor.handle_event(PhotoCaptureEvent::WillBegin(resolved(id, false, 300)));
        processor.handle_event(PhotoCaptureEvent::WillCapture(resolved(id, false, 300)));
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingPhoto(Ok(frame())));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Ok(())));

        assert_eq!(signals(&queue), vec![Signal::WillCapture, Signal::Completed(Ok(id))]);
        let photo = queue.sync(|r| r.photos[0].clone()).unwrap();
        assert_eq!(photo.file_data, b"heic".to_vec());
        assert_eq!(photo.original_image.orientation, ImageOrientation::Down);
        assert_eq!(photo.preview_image.unwrap().image.dimensions, Dimensions::new(320, 240));
        assert!(processor.is_finished());
    }

    #[test]
    fn live_and_slow_capture_signals_in_order() {
        let queue = SerialQueue::new("processor-live", |_| Recorder::default());
        let processor = processor(&queue);
        let id = processor.request_id();
        let clip = std::env::temp_dir().join("clip.mov");

        processor.handle_event(PhotoCaptureEvent::WillBegin(resolved(id, true, 1500)));
        processor.handle_event(PhotoCaptureEvent::WillCapture(resolved(id, true, 1500)));
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingPhoto(Ok(frame())));
        processor.handle_event(PhotoCaptureEvent::DidFinishRecordingClip { file: clip.clone() });
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingClip(Ok(ProcessedClip {
            file: clip.clone(),
            duration: Duration::from_millis(2900),
            photo_display_time: Duration::from_millis(1500),
        })));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Ok(())));

        assert_eq!(
            signals(&queue),
            vec![
                Signal::Live(true),
                Signal::WillCapture,
                Signal::Indeterminate(true),
                Signal::Indeterminate(false),
                Signal::Live(false),
                Signal::Completed(Ok(id)),
            ]
        );
        let photo = queue.sync(|r| r.photos[0].clone()).unwrap();
        assert_eq!(photo.live_photo_file, Some(clip));
    }

    #[test]
    fn missing_frame_fails_with_no_data() {
        let queue = SerialQueue::new("processor-nodata", |_| Recorder::default());
        let processor = processor(&queue);
        let id = processor.request_id();

        processor.handle_event(PhotoCaptureEvent::WillBegin(resolved(id, false, 100)));
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingPhoto(Err(PlatformError::new(
            -11800, "failed",
        ))));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Ok(())));

        assert_eq!(signals(&queue), vec![Signal::Completed(Err(PhotoError::NoData))]);
    }

    #[test]
    fn frame_without_file_data_is_no_data() {
        let queue = SerialQueue::new("processor-nofile", |_| Recorder::default());
        let processor = processor(&queue);

        let mut incomplete = frame();
        incomplete.file_data = None;
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingPhoto(Ok(incomplete)));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Ok(())));

        assert_eq!(signals(&queue), vec![Signal::Completed(Err(PhotoError::NoData))]);
    }

    #[test]
    fn capture_error_wins_and_stops_pending_live_recording() {
        let queue = SerialQueue::new("processor-error", |_| Recorder::default());
        let processor = processor(&queue);
        let id = processor.request_id();
        let error = PlatformError::new(-11803, "capture failed");

        processor.handle_event(PhotoCaptureEvent::WillBegin(resolved(id, true, 100)));
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingPhoto(Ok(frame())));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Err(error.clone())));

        assert_eq!(
            signals(&queue),
            vec![
                Signal::Live(true),
                Signal::Live(false),
                Signal::Completed(Err(PhotoError::Platform(error))),
            ]
        );
    }

    #[test]
    fn events_after_completion_are_ignored() {
        let queue = SerialQueue::new("processor-late", |_| Recorder::default());
        let processor = processor(&queue);
        let id = processor.request_id();

        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Err(PlatformError::new(1, "x"))));
        processor.handle_event(PhotoCaptureEvent::WillBegin(resolved(id, true, 5000)));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Ok(())));

        let signals = signals(&queue);
        assert_eq!(signals.len(), 1);
        assert!(matches!(signals[0], Signal::Completed(Err(PhotoError::Platform(_)))));
    }

    #[test]
    fn clip_processing_error_omits_clip() {
        let queue = SerialQueue::new("processor-clip", |_| Recorder::default());
        let processor = processor(&queue);

        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingPhoto(Ok(frame())));
        processor.handle_event(PhotoCaptureEvent::DidFinishProcessingClip(Err(PlatformError::new(
            2, "clip failed",
        ))));
        processor.handle_event(PhotoCaptureEvent::DidFinishCapture(Ok(())));

        let photo = queue.sync(|r| r.photos[0].clone()).unwrap();
        assert_eq!(photo.live_photo_file, None);
    }
}
