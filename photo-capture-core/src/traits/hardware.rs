use std::fmt;
use std::sync::Arc;

use crate::models::camera_models::{
    BodyPosition, Camera, DeviceInfo, DevicePosition, DeviceType, Dimensions, ExposureMode,
    FocusMode, Point,
};
use crate::models::error::{PlatformError, SessionError};
use crate::models::interruption::InterruptionReason;
use crate::models::orientation::VideoOrientation;
use crate::models::photo_settings::{PhotoCodec, PhotoSettings, QualityPrioritization};
use crate::session::notifications::Subscription;
use crate::traits::capture_delegate::PhotoCaptureDelegate;

/// A physical capture device (camera or microphone).
///
/// Devices are shared handles: configuration methods take `&self` and
/// implementations use interior mutability. Focus and exposure setters are
/// only called between a successful [`lock_for_configuration`] and the
/// matching [`unlock_for_configuration`].
///
/// [`lock_for_configuration`]: CaptureDevice::lock_for_configuration
/// [`unlock_for_configuration`]: CaptureDevice::unlock_for_configuration
pub trait CaptureDevice: Send + Sync {
    /// Stable identifier of the device.
    fn unique_id(&self) -> String;

    /// Human-readable name.
    fn localized_name(&self) -> String;

    fn device_type(&self) -> DeviceType;

    fn position(&self) -> DevicePosition;

    fn has_flash(&self) -> bool;

    /// Acquire exclusive configuration access to the device.
    fn lock_for_configuration(&self) -> Result<(), PlatformError>;

    fn unlock_for_configuration(&self);

    fn is_focus_point_of_interest_supported(&self) -> bool;

    fn is_focus_mode_supported(&self, mode: FocusMode) -> bool;

    fn set_focus(&self, point: Point, mode: FocusMode);

    fn is_exposure_point_of_interest_supported(&self) -> bool;

    fn is_exposure_mode_supported(&self, mode: ExposureMode) -> bool;

    fn set_exposure(&self, point: Point, mode: ExposureMode);

    /// When enabled the hardware posts
    /// [`HardwareEvent::SubjectAreaChanged`] for this device.
    fn set_subject_area_change_monitoring(&self, enabled: bool);

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            id: self.unique_id(),
            name: self.localized_name(),
            device_type: self.device_type(),
            position: self.position(),
        }
    }
}

impl fmt::Debug for dyn CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureDevice")
            .field("id", &self.unique_id())
            .field("type", &self.device_type())
            .field("position", &self.position())
            .finish()
    }
}

/// Platform device enumeration.
///
/// Queried on every use; implementations should not cache beyond what the
/// platform itself caches.
pub trait DeviceDiscovery: Send + Sync {
    /// Video devices at `position` whose type is one of `kinds`, in the
    /// platform's own order.
    fn video_devices(&self, kinds: &[Camera], position: BodyPosition) -> Vec<Arc<dyn CaptureDevice>>;

    /// The system default microphone, if any.
    fn default_microphone(&self) -> Option<Arc<dyn CaptureDevice>>;
}

/// Handle to an input the hardware session created for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputId(pub u64);

/// Session-wide quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPreset {
    Photo,
    High,
}

/// Notifications posted by the hardware layer, possibly on threads the
/// caller does not control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareEvent {
    RuntimeError(Option<PlatformError>),
    InputFormatChanged,
    InterruptionBegan(Option<InterruptionReason>),
    InterruptionEnded,
    SubjectAreaChanged { device_id: String },
}

impl HardwareEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::RuntimeError(_) => Topic::RuntimeError,
            Self::InputFormatChanged => Topic::InputFormatChanged,
            Self::InterruptionBegan(_) => Topic::InterruptionBegan,
            Self::InterruptionEnded => Topic::InterruptionEnded,
            Self::SubjectAreaChanged { device_id } => Topic::SubjectAreaChanged {
                device_id: device_id.clone(),
            },
        }
    }

    /// The session error a runtime error notification resolves to.
    pub fn runtime_error(&self) -> Option<SessionError> {
        match self {
            Self::RuntimeError(cause) => Some(SessionError::RuntimeError(cause.clone())),
            _ => None,
        }
    }
}

/// What a hardware subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    RuntimeError,
    InputFormatChanged,
    InterruptionBegan,
    InterruptionEnded,
    SubjectAreaChanged { device_id: String },
}

pub type EventHandler = Arc<dyn Fn(&HardwareEvent) + Send + Sync + 'static>;

/// The photo output attached to a hardware session.
pub trait PhotoOutput: Send {
    fn is_live_photo_capture_supported(&self) -> bool;

    fn set_live_photo_capture_enabled(&mut self, enabled: bool);

    fn set_high_resolution_capture_enabled(&mut self, enabled: bool);

    fn set_max_quality_prioritization(&mut self, quality: QualityPrioritization);

    fn available_codecs(&self) -> Vec<PhotoCodec>;

    fn available_preview_pixel_formats(&self) -> Vec<u32>;

    /// Orientation applied to the output's video connection.
    fn set_video_orientation(&mut self, orientation: VideoOrientation);

    /// Issue a capture request. The hardware drives `delegate` through the
    /// fixed event sequence and always finishes with
    /// [`PhotoCaptureEvent::DidFinishCapture`](crate::PhotoCaptureEvent::DidFinishCapture).
    fn capture_photo(&mut self, settings: PhotoSettings, delegate: Arc<dyn PhotoCaptureDelegate>);
}

/// A mutable hardware capture session.
///
/// All methods are called from the session queue only. Mutations between
/// [`begin_configuration`](CaptureHardware::begin_configuration) and
/// [`commit_configuration`](CaptureHardware::commit_configuration) must be
/// applied atomically by the implementation.
pub trait CaptureHardware: Send {
    fn begin_configuration(&mut self);

    fn commit_configuration(&mut self);

    fn set_preset(&mut self, preset: SessionPreset);

    /// Create (but do not add) an input for `device`.
    fn create_input(&mut self, device: &Arc<dyn CaptureDevice>) -> Result<InputId, PlatformError>;

    fn can_add_input(&self, input: InputId) -> bool;

    fn add_input(&mut self, input: InputId);

    fn remove_input(&mut self, input: InputId);

    /// Dimensions of the first port's current format for `input`.
    fn input_dimensions(&self, input: InputId) -> Option<Dimensions>;

    fn can_add_photo_output(&self) -> bool;

    fn add_photo_output(&mut self);

    fn remove_photo_output(&mut self);

    fn photo_output(&mut self) -> &mut dyn PhotoOutput;

    fn start_running(&mut self);

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Register `handler` for notifications on `topic`. Dropping the
    /// returned subscription unregisters it.
    fn subscribe(&self, topic: Topic, handler: EventHandler) -> Subscription;
}
