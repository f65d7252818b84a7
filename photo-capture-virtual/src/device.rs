//! Scriptable virtual capture devices.

use std::sync::Arc;

use parking_lot::Mutex;

use photo_capture_core::models::camera_models::{
    Camera, DevicePosition, DeviceType, Dimensions, ExposureMode, FocusMode, Point,
};
use photo_capture_core::models::error::PlatformError;
use photo_capture_core::traits::hardware::CaptureDevice;

/// Focus and exposure state last applied to a [`VirtualDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceSettings {
    pub focus: Option<(Point, FocusMode)>,
    pub exposure: Option<(Point, ExposureMode)>,
    pub subject_area_monitoring: bool,
}

#[derive(Debug, Default)]
struct DeviceState {
    settings: DeviceSettings,
    locked: bool,
    lock_count: usize,
    lock_error: Option<PlatformError>,
}

/// An in-process camera or microphone.
///
/// Identity and capabilities are fixed at construction; focus, exposure
/// and the configuration lock are tracked so tests can inspect what the
/// session did to the device.
#[derive(Debug)]
pub struct VirtualDevice {
    id: String,
    name: String,
    device_type: DeviceType,
    position: DevicePosition,
    has_flash: bool,
    supports_focus: bool,
    supports_exposure: bool,
    format: Dimensions,
    state: Mutex<DeviceState>,
}

impl VirtualDevice {
    /// A camera of kind `camera` with a flash and full focus/exposure
    /// support, streaming 4032x3024.
    pub fn camera(id: &str, camera: Camera, position: DevicePosition) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Virtual {:?} Camera", camera),
            device_type: camera.device_type(),
            position,
            has_flash: true,
            supports_focus: true,
            supports_exposure: true,
            format: Dimensions::new(4032, 3024),
            state: Mutex::new(DeviceState::default()),
        }
    }

    pub fn microphone(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: "Virtual Microphone".to_string(),
            device_type: DeviceType::BuiltInMicrophone,
            position: DevicePosition::Unspecified,
            has_flash: false,
            supports_focus: false,
            supports_exposure: false,
            format: Dimensions::default(),
            state: Mutex::new(DeviceState::default()),
        }
    }

    pub fn without_flash(mut self) -> Self {
        self.has_flash = false;
        self
    }

    pub fn without_focus(mut self) -> Self {
        self.supports_focus = false;
        self
    }

    pub fn with_format(mut self, format: Dimensions) -> Self {
        self.format = format;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Active format of the device's first port.
    pub fn format(&self) -> Dimensions {
        self.format
    }

    /// Make every later `lock_for_configuration` fail with `error`, or
    /// succeed again with `None`.
    pub fn fail_locks(&self, error: Option<PlatformError>) {
        self.state.lock().lock_error = error;
    }

    pub fn settings(&self) -> DeviceSettings {
        self.state.lock().settings
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Number of successful configuration locks.
    pub fn lock_count(&self) -> usize {
        self.state.lock().lock_count
    }

    fn configure(&self, f: impl FnOnce(&mut DeviceSettings)) {
        let mut state = self.state.lock();
        if !state.locked {
            log::warn!("Virtual device {} configured without holding its lock", self.id);
        }
        f(&mut state.settings);
    }
}

impl CaptureDevice for VirtualDevice {
    fn unique_id(&self) -> String {
        self.id.clone()
    }

    fn localized_name(&self) -> String {
        self.name.clone()
    }

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn position(&self) -> DevicePosition {
        self.position
    }

    fn has_flash(&self) -> bool {
        self.has_flash
    }

    fn lock_for_configuration(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if let Some(error) = &state.lock_error {
            return Err(error.clone());
        }
        state.locked = true;
        state.lock_count += 1;
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.state.lock().locked = false;
    }

    fn is_focus_point_of_interest_supported(&self) -> bool {
        self.supports_focus
    }

    fn is_focus_mode_supported(&self, _mode: FocusMode) -> bool {
        self.supports_focus
    }

    fn set_focus(&self, point: Point, mode: FocusMode) {
        self.configure(|settings| settings.focus = Some((point, mode)));
    }

    fn is_exposure_point_of_interest_supported(&self) -> bool {
        self.supports_exposure
    }

    fn is_exposure_mode_supported(&self, _mode: ExposureMode) -> bool {
        self.supports_exposure
    }

    fn set_exposure(&self, point: Point, mode: ExposureMode) {
        self.configure(|settings| settings.exposure = Some((point, mode)));
    }

    fn set_subject_area_change_monitoring(&self, enabled: bool) {
        self.configure(|settings| settings.subject_area_monitoring = enabled);
    }
}
