use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::models::camera_models::{
    AutoToggle, BodyPosition, Camera, DeviceInfo, Dimensions, Mode, Point, Toggle,
};
use crate::models::capture_item::{PhotoCaptureItem, PhotoCaptureState};
use crate::models::captured_photo::CapturedPhoto;
use crate::models::config::Options;
use crate::models::diagnostics::SessionDiagnostics;
use crate::models::error::{PhotoError, QueueError, SessionError};
use crate::models::interruption::SessionInterruption;
use crate::models::orientation::{InterfaceOrientation, VideoOrientation};
use crate::models::photo_settings::{
    PhotoSettings, PhotoSettingsOptions, QualityPrioritization, RequestId,
};
use crate::models::state::SessionState;
use crate::session::authorizer::Authorizer;
use crate::session::catalog::DeviceCatalog;
use crate::session::focus::{self, FocusRequest};
use crate::session::logging::SessionLogger;
use crate::session::notifications::Subscription;
use crate::session::processor::{PhotoProcessor, PhotoProcessorCallbacks};
use crate::session::published::{PhotoBroadcaster, SessionObservables};
use crate::session::queue::{QueueHandle, SerialQueue};
use crate::traits::authorization::AuthorizationSource;
use crate::traits::hardware::{
    CaptureDevice, CaptureHardware, DeviceDiscovery, HardwareEvent, InputId, SessionPreset, Topic,
};
use crate::traits::image_normalizer::{ImageNormalizer, OrientationTagger};
use crate::traits::orientation::{FixedOrientation, OrientationSource};

const QUEUE_LABEL: &str = "photo-capture.session";

/// External services a capture session depends on.
pub struct Collaborators {
    pub discovery: Arc<dyn DeviceDiscovery>,
    pub authorization: Arc<dyn AuthorizationSource>,
    pub logger: SessionLogger,
    pub normalizer: Arc<dyn ImageNormalizer>,
}

impl Collaborators {
    /// Logs through the `log` facade and tags images with their
    /// orientation without touching pixels.
    pub fn new(discovery: Arc<dyn DeviceDiscovery>, authorization: Arc<dyn AuthorizationSource>) -> Self {
        Self {
            discovery,
            authorization,
            logger: SessionLogger::new(),
            normalizer: Arc::new(OrientationTagger),
        }
    }

    pub fn with_logger(mut self, logger: SessionLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ImageNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// State readable from both the caller side and the queue.
struct SessionShared {
    observables: SessionObservables,
    photos: PhotoBroadcaster,
    diagnostics: Mutex<SessionDiagnostics>,
}

impl SessionShared {
    fn record(&self, f: impl FnOnce(&mut SessionDiagnostics)) {
        f(&mut self.diagnostics.lock());
    }
}

/// Camera capture session orchestrator.
///
/// Owns a [`CaptureHardware`] session on a dedicated serial queue. Public
/// methods may be called from any thread; they are marshaled onto the
/// queue, which is the only place the hardware and the session's state are
/// mutated. Hardware notifications and capture callbacks are marshaled the
/// same way.
///
/// ```text
/// caller ──┐
/// hardware notifications ──┼──→ [serial queue] ──→ SessionCore ──→ CaptureHardware
/// capture delegates ───────┘                  │
///                                             ├──→ SessionObservables (listeners)
///                                             └──→ photos() receivers
/// ```
///
/// Call [`start`](Self::start) once, then [`pause`](Self::pause) /
/// [`resume`](Self::resume) / [`stop`](Self::stop).
pub struct CaptureSession<H: CaptureHardware + 'static> {
    queue: SerialQueue<SessionCore<H>>,
    shared: Arc<SessionShared>,
    authorizer: Authorizer,
    orientation: Arc<dyn OrientationSource>,
    interface_orientations: HashSet<InterfaceOrientation>,
    available_front_cameras: Vec<Camera>,
    available_back_cameras: Vec<Camera>,
    logger: SessionLogger,
}

impl<H: CaptureHardware + 'static> CaptureSession<H> {
    /// Create a session. The hardware is not touched until
    /// [`start`](Self::start).
    ///
    /// # Panics
    ///
    /// If `options` has no modes or no interface orientations.
    pub fn new(hardware: H, collaborators: Collaborators, options: Options) -> Self {
        if let Err(reason) = options.validate() {
            panic!("invalid capture session options: {reason}");
        }

        let Collaborators {
            discovery,
            authorization,
            logger,
            normalizer,
        } = collaborators;

        let catalog = DeviceCatalog::new(
            discovery,
            options.preferred_front_cameras.clone(),
            options.preferred_back_cameras.clone(),
        );
        let available_front_cameras = catalog.available_cameras(BodyPosition::Front);
        let available_back_cameras = catalog.available_cameras(BodyPosition::Back);

        let mode = options.initial_mode();
        let shared = Arc::new(SessionShared {
            observables: SessionObservables::new(mode),
            photos: PhotoBroadcaster::new(),
            diagnostics: Mutex::new(SessionDiagnostics::default()),
        });
        let orientation: Arc<dyn OrientationSource> = match &options.orientation_source {
            Some(source) => Arc::clone(source),
            None => Arc::new(FixedOrientation::default()),
        };

        let core_shared = Arc::clone(&shared);
        let core_orientation = Arc::clone(&orientation);
        let core_logger = logger.clone();
        let preferred_initial_flash_mode = options.preferred_initial_flash_mode;
        let auto_enable_live_photos = options.auto_enable_live_photos_if_available;
        let queue = SerialQueue::new(QUEUE_LABEL, move |handle| {
            let mut core = SessionCore {
                hardware,
                queue: handle,
                shared: core_shared,
                catalog,
                mode,
                preferred_initial_flash_mode,
                auto_enable_live_photos,
                logger: core_logger,
                normalizer,
                current_device: None,
                current_input: None,
                audio_input: None,
                photo_output_attached: false,
                processors: HashMap::new(),
                camera_subscriptions: Vec::new(),
                session_subscriptions: Vec::new(),
                lifetime_subscriptions: Vec::new(),
            };
            core.subscribe_lifetime_events(core_orientation.as_ref());
            core
        });

        logger.debug(format_args!(
            "Capture session created: mode {:?}, {} front / {} back cameras available",
            mode,
            available_front_cameras.len(),
            available_back_cameras.len()
        ));

        Self {
            queue,
            shared,
            authorizer: Authorizer::new(authorization, logger.clone()),
            orientation,
            interface_orientations: options.interface_orientations,
            available_front_cameras,
            available_back_cameras,
            logger,
        }
    }

    // ---- lifecycle ----

    /// Authorize, configure and start the hardware session.
    ///
    /// Moves to `Starting` before returning. If both permissions are
    /// already granted, configuration is queued immediately; otherwise it
    /// is queued once the prompts are answered. A denial ends in
    /// `Error(Unauthorized)`.
    ///
    /// # Panics
    ///
    /// If the session is already starting, running or paused. The check and
    /// the move to `Starting` happen as one step on the session queue, so
    /// back-to-back calls panic even before the first has configured.
    pub fn start(&self) {
        let previous = match self.queue.sync(|core| {
            let previous = core.state();
            if previous.can_start() {
                core.set_state(SessionState::Starting);
            }
            previous
        }) {
            Ok(previous) => previous,
            Err(error) => {
                self.logger
                    .error(format_args!("Unable to start capture session: {}", error));
                return;
            }
        };
        assert!(
            previous.can_start(),
            "start() must not be called on a capture session that is already running (state: {:?})",
            previous
        );

        self.orientation.start();

        if self.authorizer.existing().is_fully_authorized() {
            self.authorization_passed();
            return;
        }

        let queue = self.queue.handle();
        let logger = self.logger.clone();
        self.authorizer.request_access(move |authorization| {
            let result = if authorization.is_fully_authorized() {
                queue.submit(|core| core.configure_and_run())
            } else {
                queue.asap(|core| {
                    if core.state().is_starting() {
                        core.set_state(SessionState::Error(SessionError::Unauthorized));
                    }
                })
            };
            if result.is_err() {
                logger.warn(format_args!("Authorization answered after the session shut down"));
            }
        });
    }

    fn authorization_passed(&self) {
        if self.queue.submit(|core| core.configure_and_run()).is_err() {
            self.logger.error(format_args!("Session queue has shut down"));
        }
    }

    /// Stop the hardware session, keeping its configuration.
    pub fn pause(&self) {
        self.orientation.stop();
        self.dispatch(|core| {
            if !core.state().is_running() {
                return;
            }
            core.set_state(SessionState::Paused);
            core.hardware.stop_running();
        });
    }

    /// Restart a paused hardware session.
    pub fn resume(&self) {
        self.orientation.start();
        self.dispatch(|core| {
            if !core.state().is_paused() {
                return;
            }
            core.hardware.start_running();
            core.set_state(SessionState::Running);
        });
    }

    /// Tear the session down to `Idle`. In-flight captures are abandoned:
    /// their late callbacks are dropped.
    pub fn stop(&self) {
        self.orientation.stop();
        self.dispatch(|core| core.end_session(SessionState::Idle));
    }

    // ---- user controls ----

    /// Only takes effect when the photo output supports live photos.
    pub fn toggle_live_photos(&self, value: Toggle) {
        self.dispatch(move |core| {
            let live_photos = &core.shared.observables.live_photos;
            if live_photos.get().is_some() {
                live_photos.set(Some(value));
            }
        });
    }

    /// Only takes effect when the current camera has a flash.
    pub fn toggle_flash(&self, value: AutoToggle) {
        self.dispatch(move |core| {
            let flash = &core.shared.observables.flash;
            if flash.get().is_some() {
                flash.set(Some(value));
            }
        });
    }

    /// Switch to the most preferred camera on the other side of the device.
    /// Does nothing when there is no camera there.
    pub fn toggle_between_front_and_back_cameras(&self) {
        self.dispatch(|core| core.toggle_cameras());
    }

    /// Focus and expose on `point`, given in capture-device coordinates.
    pub fn focus_and_expose(&self, point: Point) {
        self.dispatch(move |core| core.apply_focus(FocusRequest::at_point(point)));
    }

    /// Issue a capture request with the current toggles. Does nothing when
    /// there is no current camera. Results arrive on [`photos`](Self::photos).
    pub fn capture_photo(&self) {
        if self.queue.submit(|core| core.capture_photo()).is_err() {
            self.logger.error(format_args!("Session queue has shut down"));
        }
    }

    // ---- observation ----

    pub fn observables(&self) -> &SessionObservables {
        &self.shared.observables
    }

    /// A new receiver for every photo completed from now on, in completion
    /// order.
    pub fn photos(&self) -> Receiver<Arc<CapturedPhoto>> {
        self.shared.photos.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.shared.observables.state.get()
    }

    pub fn mode(&self) -> Mode {
        self.shared.observables.mode.get()
    }

    pub fn current_camera(&self) -> Option<DeviceInfo> {
        self.shared.observables.current_camera.get()
    }

    pub fn body_position(&self) -> BodyPosition {
        self.shared.observables.body_position.get()
    }

    pub fn flash(&self) -> Option<AutoToggle> {
        self.shared.observables.flash.get()
    }

    pub fn live_photos(&self) -> Option<Toggle> {
        self.shared.observables.live_photos.get()
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.shared.observables.dimensions.get()
    }

    pub fn session_interruption(&self) -> Option<SessionInterruption> {
        self.shared.observables.session_interruption.get()
    }

    pub fn photo_capture_items(&self) -> Vec<PhotoCaptureItem> {
        self.shared.observables.photo_capture_items.get()
    }

    pub fn live_photos_in_progress(&self) -> usize {
        self.shared.observables.live_photos_in_progress.get()
    }

    pub fn video_orientation(&self) -> VideoOrientation {
        self.shared.observables.video_orientation.get()
    }

    pub fn available_front_cameras(&self) -> &[Camera] {
        &self.available_front_cameras
    }

    pub fn available_back_cameras(&self) -> &[Camera] {
        &self.available_back_cameras
    }

    pub fn supported_interface_orientations(&self) -> &HashSet<InterfaceOrientation> {
        &self.interface_orientations
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.shared.diagnostics.lock().clone()
    }

    /// Block until everything queued before this call has run.
    pub fn flush(&self) -> Result<(), QueueError> {
        self.queue.sync(|_| ())
    }

    fn dispatch(&self, job: impl FnOnce(&mut SessionCore<H>) + Send + 'static) {
        if self.queue.asap(job).is_err() {
            self.logger.error(format_args!("Session queue has shut down"));
        }
    }
}

impl<H: CaptureHardware + 'static> Drop for CaptureSession<H> {
    fn drop(&mut self) {
        self.orientation.stop();
        let _ = self.queue.submit(|core| {
            if core.hardware.is_running() {
                core.hardware.stop_running();
            }
        });
    }
}

struct RegisteredCapture<H: CaptureHardware + 'static> {
    item: PhotoCaptureItem,
    processor: Arc<PhotoProcessor<SessionCore<H>>>,
}

/// Everything owned by the session queue.
pub(crate) struct SessionCore<H: CaptureHardware + 'static> {
    hardware: H,
    queue: QueueHandle<SessionCore<H>>,
    shared: Arc<SessionShared>,
    catalog: DeviceCatalog,
    mode: Mode,
    preferred_initial_flash_mode: AutoToggle,
    auto_enable_live_photos: bool,
    logger: SessionLogger,
    normalizer: Arc<dyn ImageNormalizer>,
    current_device: Option<Arc<dyn CaptureDevice>>,
    current_input: Option<InputId>,
    audio_input: Option<InputId>,
    photo_output_attached: bool,
    processors: HashMap<RequestId, RegisteredCapture<H>>,
    camera_subscriptions: Vec<Subscription>,
    session_subscriptions: Vec<Subscription>,
    lifetime_subscriptions: Vec<Subscription>,
}

impl<H: CaptureHardware + 'static> SessionCore<H> {
    fn state(&self) -> SessionState {
        self.shared.observables.state.get()
    }

    fn set_state(&mut self, state: SessionState) {
        self.logger
            .info(format_args!("Capture session state: {:?} → {:?}", self.state(), state));
        self.shared.observables.state.set(state);
    }

    /// Run `f` inside one hardware configuration transaction.
    fn in_configuration<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.hardware.begin_configuration();
        let result = f(self);
        self.hardware.commit_configuration();
        result
    }

    /// Register `react` to run on the queue for each `topic` notification.
    fn on_event(&self, topic: Topic, react: fn(&mut SessionCore<H>, &HardwareEvent)) -> Subscription {
        let queue = self.queue.clone();
        self.hardware.subscribe(
            topic,
            Arc::new(move |event: &HardwareEvent| {
                let event = event.clone();
                let _ = queue.asap(move |core| react(core, &event));
            }),
        )
    }

    fn subscribe_lifetime_events(&mut self, orientation: &dyn OrientationSource) {
        let runtime_errors = self.on_event(Topic::RuntimeError, Self::handle_runtime_error);
        self.lifetime_subscriptions.push(runtime_errors);

        let queue = self.queue.clone();
        let orientation_changes = orientation.subscribe(Arc::new(move |value: InterfaceOrientation| {
            let _ = queue.asap(move |core| {
                core.shared
                    .observables
                    .video_orientation
                    .set(value.video_orientation());
            });
        }));
        self.lifetime_subscriptions.push(orientation_changes);
    }

    // ---- configuration ----

    fn configure_and_run(&mut self) {
        // stop() may have landed while authorization was pending.
        if !self.state().is_starting() {
            self.logger.debug(format_args!(
                "Skipping configuration: session is {:?}",
                self.state()
            ));
            return;
        }

        match self.configure() {
            Ok(()) => {
                self.set_state(SessionState::Running);
                self.hardware.start_running();
            }
            Err(error) => {
                self.logger
                    .error(format_args!("Capture session configuration failed: {}", error));
                self.end_session(SessionState::Error(error));
            }
        }
    }

    fn configure(&mut self) -> Result<(), SessionError> {
        let position = self.shared.observables.body_position.get();
        let device = self
            .catalog
            .first_available(position)
            .ok_or(SessionError::NoCameraFound)?;

        self.in_configuration(|core| {
            core.hardware.set_preset(match core.mode {
                Mode::Photo => SessionPreset::Photo,
                Mode::Video => SessionPreset::High,
            });

            core.add_video_input(device)?;
            core.add_audio_input()?;

            match core.mode {
                Mode::Photo => core.add_photo_output()?,
                Mode::Video => return Err(SessionError::VideoRecordingUnsupported),
            }

            core.subscribe_session_events();
            Ok(())
        })
    }

    fn add_video_input(&mut self, device: Arc<dyn CaptureDevice>) -> Result<(), SessionError> {
        let input = self
            .hardware
            .create_input(&device)
            .map_err(|error| SessionError::UnableToAddVideoInput(Some(error)))?;
        if !self.hardware.can_add_input(input) {
            return Err(SessionError::UnableToAddVideoInput(None));
        }
        self.hardware.add_input(input);

        let info = device.info();
        self.logger
            .info(format_args!("Using camera {} ({:?})", info.name, info.device_type));

        let subject_area = self.on_event(
            Topic::SubjectAreaChanged {
                device_id: info.id.clone(),
            },
            Self::handle_subject_area_change,
        );
        self.camera_subscriptions.push(subject_area);

        let observables = &self.shared.observables;
        let flash = if device.has_flash() {
            Some(observables.flash.get().unwrap_or(self.preferred_initial_flash_mode))
        } else {
            None
        };
        observables.flash.set(flash);
        observables.body_position.set(info.position.body_position());
        observables.current_camera.set(Some(info));

        self.current_input = Some(input);
        self.current_device = Some(device);
        Ok(())
    }

    fn add_audio_input(&mut self) -> Result<(), SessionError> {
        let microphone = self
            .catalog
            .default_microphone()
            .ok_or(SessionError::NoMicrophoneFound)?;
        let input = self
            .hardware
            .create_input(&microphone)
            .map_err(|error| SessionError::UnableToAddAudioInput(Some(error)))?;
        if !self.hardware.can_add_input(input) {
            return Err(SessionError::UnableToAddAudioInput(None));
        }
        self.hardware.add_input(input);
        self.audio_input = Some(input);
        Ok(())
    }

    fn add_photo_output(&mut self) -> Result<(), SessionError> {
        if !self.hardware.can_add_photo_output() {
            return Err(SessionError::UnableToAddPhotoOutput(None));
        }
        self.hardware.add_photo_output();
        self.photo_output_attached = true;

        let output = self.hardware.photo_output();
        output.set_high_resolution_capture_enabled(true);
        output.set_max_quality_prioritization(QualityPrioritization::Quality);

        let live_photos = match (output.is_live_photo_capture_supported(), self.auto_enable_live_photos) {
            (true, true) => Some(Toggle::On),
            (true, false) => Some(Toggle::Off),
            (false, _) => None,
        };
        output.set_live_photo_capture_enabled(live_photos == Some(Toggle::On));
        self.shared.observables.live_photos.set(live_photos);
        Ok(())
    }

    fn subscribe_session_events(&mut self) {
        self.session_subscriptions.clear();
        let subscriptions = [
            self.on_event(Topic::InputFormatChanged, Self::handle_input_format_change),
            self.on_event(Topic::InterruptionBegan, Self::handle_interruption_began),
            self.on_event(Topic::InterruptionEnded, Self::handle_interruption_ended),
        ];
        self.session_subscriptions.extend(subscriptions);
    }

    // ---- cameras and focus ----

    fn toggle_cameras(&mut self) {
        let next = self.shared.observables.body_position.get().opposite();
        let Some(device) = self.catalog.first_available(next) else {
            self.logger
                .debug(format_args!("No {:?} camera available to toggle to", next));
            return;
        };

        // Without a configured session only the side to configure changes.
        if !self.state().is_active() {
            self.shared.observables.body_position.set(next);
            return;
        }

        self.in_configuration(|core| {
            core.remove_current_video_input();
            if let Err(error) = core.add_video_input(device) {
                core.logger
                    .error(format_args!("Unable to toggle cameras: {}", error));
                core.shared.record(|d| d.camera_toggle_failures += 1);
                core.shared.observables.body_position.set(BodyPosition::Back);
            }
        });
    }

    fn remove_current_video_input(&mut self) {
        let Some(input) = self.current_input.take() else {
            return;
        };
        self.camera_subscriptions.clear();
        self.hardware.remove_input(input);
        self.current_device = None;
        self.shared.observables.current_camera.set(None);
    }

    fn apply_focus(&mut self, request: FocusRequest) {
        let Some(device) = &self.current_device else {
            return;
        };
        if let Err(error) = focus::focus_and_expose(device.as_ref(), &request) {
            self.logger.error(format_args!(
                "Could not lock device for configuration: {}",
                error
            ));
            self.shared.record(|d| d.focus_lock_failures += 1);
        }
    }

    // ---- hardware notifications ----

    fn handle_runtime_error(&mut self, event: &HardwareEvent) {
        let Some(error) = event.runtime_error() else {
            return;
        };
        if !self.state().is_active() {
            self.logger.warn(format_args!(
                "Ignoring runtime error while {:?}: {}",
                self.state(),
                error
            ));
            return;
        }
        self.logger.error(format_args!("Capture session runtime error: {}", error));
        self.end_session(SessionState::Error(error));
    }

    fn handle_subject_area_change(&mut self, _event: &HardwareEvent) {
        self.apply_focus(FocusRequest::recenter());
    }

    fn handle_input_format_change(&mut self, _event: &HardwareEvent) {
        let Some(input) = self.current_input else {
            return;
        };
        if let Some(dimensions) = self.hardware.input_dimensions(input) {
            self.shared.observables.dimensions.set(Some(dimensions));
        }
    }

    fn handle_interruption_began(&mut self, event: &HardwareEvent) {
        if let HardwareEvent::InterruptionBegan(reason) = event {
            let interruption = SessionInterruption::new(*reason);
            self.logger.info(format_args!(
                "Capture session interrupted: {:?} (resumable: {})",
                reason,
                interruption.is_resumable()
            ));
            self.shared
                .observables
                .session_interruption
                .set(Some(interruption));
        }
    }

    fn handle_interruption_ended(&mut self, _event: &HardwareEvent) {
        self.logger.info(format_args!("Capture session interruption ended"));
        self.shared.observables.session_interruption.set(None);
    }

    // ---- photo capture ----

    fn capture_photo(&mut self) {
        let Some(camera) = self.current_device.clone() else {
            self.logger
                .debug(format_args!("Ignoring capture request: no current camera"));
            return;
        };
        if !self.photo_output_attached {
            self.logger
                .debug(format_args!("Ignoring capture request: no photo output"));
            return;
        }

        let observables = &self.shared.observables;
        let user_orientation = observables.video_orientation.get();
        let options = PhotoSettingsOptions {
            live_photos: observables.live_photos.get(),
            flash: observables.flash.get(),
            quality: QualityPrioritization::Quality,
        };

        let output = self.hardware.photo_output();
        output.set_video_orientation(user_orientation);
        let settings = PhotoSettings::resolve(camera.as_ref(), &*output, &options);

        let item = PhotoCaptureItem::new(&settings);
        let processor = PhotoProcessor::new(
            settings.clone(),
            user_orientation,
            self.queue.clone(),
            Arc::clone(&self.normalizer),
            self.logger.clone(),
            PhotoProcessorCallbacks {
                will_capture: Arc::new(|core: &mut SessionCore<H>, id: RequestId| {
                    core.capture_will_begin(id)
                }),
                live_photo_capture_changed: Arc::new(
                    |core: &mut SessionCore<H>, id: RequestId, is_recording: bool| {
                        core.live_photo_capture_changed(id, is_recording)
                    },
                ),
                indeterminate_processing_changed: Arc::new(
                    |core: &mut SessionCore<H>, id: RequestId, is_processing: bool| {
                        core.indeterminate_processing_changed(id, is_processing)
                    },
                ),
                completion: Box::new(
                    |core: &mut SessionCore<H>, id: RequestId, result: Result<CapturedPhoto, PhotoError>| {
                        core.capture_finished(id, result)
                    },
                ),
            },
        );

        self.logger.debug(format_args!(
            "Capturing photo {} ({:?}, flash {:?}, live {})",
            settings.request_id,
            settings.codec,
            settings.flash_mode,
            settings.live_photo_movie_file.is_some()
        ));
        self.processors.insert(
            settings.request_id,
            RegisteredCapture {
                item,
                processor: Arc::clone(&processor),
            },
        );
        self.hardware.photo_output().capture_photo(settings, processor);
    }

    fn drop_late_callback(&self, id: RequestId, callback: &str) {
        self.logger.warn(format_args!(
            "Dropping {} for capture {}: no longer in flight",
            callback, id
        ));
        self.shared.record(|d| d.dropped_callbacks += 1);
    }

    fn capture_will_begin(&mut self, id: RequestId) {
        let Some(registered) = self.processors.get(&id) else {
            return self.drop_late_callback(id, "will-capture");
        };
        let item = registered.item.clone();
        self.shared
            .observables
            .photo_capture_items
            .update(|items| items.push(item));
    }

    fn live_photo_capture_changed(&mut self, id: RequestId, is_recording: bool) {
        if !self.processors.contains_key(&id) {
            return self.drop_late_callback(id, "live photo update");
        }
        self.shared.observables.live_photos_in_progress.update(|count| {
            *count = if is_recording {
                *count + 1
            } else {
                count.saturating_sub(1)
            };
        });
    }

    fn indeterminate_processing_changed(&mut self, id: RequestId, is_processing: bool) {
        let Some(registered) = self.processors.get_mut(&id) else {
            return self.drop_late_callback(id, "processing update");
        };
        registered.item.apply_processing_change(is_processing);
        let updated = registered.item.clone();
        replace_item(&self.shared.observables, updated);
    }

    fn capture_finished(&mut self, id: RequestId, result: Result<CapturedPhoto, PhotoError>) {
        let Some(mut registered) = self.processors.remove(&id) else {
            return self.drop_late_callback(id, "completion");
        };
        debug_assert!(registered.processor.is_finished());

        match result {
            Ok(photo) => {
                self.shared.record(|d| d.completed_captures += 1);
                let delivered = self.shared.photos.publish(Arc::new(photo));
                self.logger
                    .debug(format_args!("Photo {} delivered to {} subscribers", id, delivered));
            }
            Err(error) => {
                self.logger
                    .error(format_args!("Failed to capture photo {}: {}", id, error));
                self.shared.record(|d| {
                    d.failed_captures += 1;
                    d.last_capture_error = Some(error);
                });
            }
        }

        if !registered.item.is_finished() {
            registered.item.state = PhotoCaptureState::Finished;
            replace_item(&self.shared.observables, registered.item.clone());
        }
        self.shared
            .observables
            .photo_capture_items
            .update(|items| items.retain(|item| item.id != id));
    }

    // ---- teardown ----

    /// The one hard-reset path, used by `stop()`, runtime errors and failed
    /// configuration. Leaves the hardware stopped with nothing attached.
    fn end_session(&mut self, state: SessionState) {
        if self.hardware.is_running() {
            self.hardware.stop_running();
        }
        self.set_state(state);

        self.session_subscriptions.clear();
        self.camera_subscriptions.clear();
        self.detach_all();
        self.current_device = None;

        if !self.processors.is_empty() {
            self.logger.info(format_args!(
                "Abandoning {} in-flight captures",
                self.processors.len()
            ));
            self.processors.clear();
        }

        let observables = &self.shared.observables;
        observables.current_camera.set(None);
        observables.live_photos_in_progress.set(0);
        observables.photo_capture_items.set(Vec::new());
        observables.body_position.set(BodyPosition::Back);
        observables.flash.set(None);
        observables.live_photos.set(None);
        observables.dimensions.set(None);
        observables.session_interruption.set(None);
    }

    fn detach_all(&mut self) {
        if self.current_input.is_none() && self.audio_input.is_none() && !self.photo_output_attached {
            return;
        }
        self.in_configuration(|core| {
            if let Some(input) = core.current_input.take() {
                core.hardware.remove_input(input);
            }
            if let Some(input) = core.audio_input.take() {
                core.hardware.remove_input(input);
            }
            if core.photo_output_attached {
                core.hardware.remove_photo_output();
                core.photo_output_attached = false;
            }
        });
    }
}

fn replace_item(observables: &SessionObservables, updated: PhotoCaptureItem) {
    observables.photo_capture_items.update(|items| {
        if let Some(existing) = items.iter_mut().find(|item| item.id == updated.id) {
            *existing = updated;
        }
    });
}
