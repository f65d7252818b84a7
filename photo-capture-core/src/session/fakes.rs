//! In-crate fakes shared by the session unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::camera_models::{
    BodyPosition, Camera, DevicePosition, DeviceType, ExposureMode, FocusMode, Point,
};
use crate::models::error::PlatformError;
use crate::traits::hardware::{CaptureDevice, DeviceDiscovery};

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Lock,
    Unlock,
    Focus(Point, FocusMode),
    Exposure(Point, ExposureMode),
    Monitoring(bool),
}

pub struct FakeDevice {
    pub id: String,
    pub device_type: DeviceType,
    pub position: DevicePosition,
    pub has_flash: bool,
    pub lock_error: Option<PlatformError>,
    pub supports_focus: bool,
    pub supports_exposure: bool,
    pub calls: Mutex<Vec<DeviceCall>>,
}

impl FakeDevice {
    pub fn camera(id: &str, device_type: DeviceType, position: DevicePosition) -> Arc<Self> {
        Arc::new(Self::build(id, device_type, position))
    }

    pub fn build(id: &str, device_type: DeviceType, position: DevicePosition) -> Self {
        Self {
            id: id.to_string(),
            device_type,
            position,
            has_flash: true,
            lock_error: None,
            supports_focus: true,
            supports_exposure: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().clone()
    }
}

impl CaptureDevice for FakeDevice {
    fn unique_id(&self) -> String {
        self.id.clone()
    }

    fn localized_name(&self) -> String {
        format!("Fake {}", self.id)
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
        if let Some(error) = &self.lock_error {
            return Err(error.clone());
        }
        self.calls.lock().push(DeviceCall::Lock);
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.calls.lock().push(DeviceCall::Unlock);
    }

    fn is_focus_point_of_interest_supported(&self) -> bool {
        self.supports_focus
    }

    fn is_focus_mode_supported(&self, _mode: FocusMode) -> bool {
        self.supports_focus
    }

    fn set_focus(&self, point: Point, mode: FocusMode) {
        self.calls.lock().push(DeviceCall::Focus(point, mode));
    }

    fn is_exposure_point_of_interest_supported(&self) -> bool {
        self.supports_exposure
    }

    fn is_exposure_mode_supported(&self, _mode: ExposureMode) -> bool {
        self.supports_exposure
    }

    fn set_exposure(&self, point: Point, mode: ExposureMode) {
        self.calls.lock().push(DeviceCall::Exposure(point, mode));
    }

    fn set_subject_area_change_monitoring(&self, enabled: bool) {
        self.calls.lock().push(DeviceCall::Monitoring(enabled));
    }
}

pub struct FakeDiscovery {
    devices: Mutex<Vec<Arc<FakeDevice>>>,
    queries: AtomicUsize,
}

impl FakeDiscovery {
    pub fn new(devices: Vec<Arc<FakeDevice>>) -> Self {
        Self {
            devices: Mutex::new(devices),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, device: Arc<FakeDevice>) {
        self.devices.lock().push(device);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl DeviceDiscovery for FakeDiscovery {
    fn video_devices(&self, kinds: &[Camera], position: BodyPosition) -> Vec<Arc<dyn CaptureDevice>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.devices
            .lock()
            .iter()
            .filter(|d| d.position.body_position() == position)
            .filter(|d| d.device_type.camera().is_some_and(|c| kinds.contains(&c)))
            .map(|d| Arc::clone(d) as Arc<dyn CaptureDevice>)
            .collect()
    }

    fn default_microphone(&self) -> Option<Arc<dyn CaptureDevice>> {
        let microphone: Arc<dyn CaptureDevice> =
            FakeDevice::camera("mic", DeviceType::BuiltInMicrophone, DevicePosition::Unspecified);
        Some(microphone)
    }
}
