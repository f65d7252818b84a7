//! Virtual device enumeration.

use std::sync::Arc;

use parking_lot::Mutex;

use photo_capture_core::models::camera_models::{BodyPosition, Camera, DevicePosition};
use photo_capture_core::traits::hardware::{CaptureDevice, DeviceDiscovery};

use crate::device::VirtualDevice;

/// A hot-pluggable set of virtual devices.
///
/// Devices are reported in insertion order, which plays the role of the
/// platform's own ordering.
#[derive(Debug, Default)]
pub struct VirtualDiscovery {
    cameras: Mutex<Vec<Arc<VirtualDevice>>>,
    microphone: Mutex<Option<Arc<VirtualDevice>>>,
}

impl VirtualDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A back wide-angle camera, a front TrueDepth camera and a
    /// microphone.
    pub fn standard() -> Self {
        let discovery = Self::new();
        discovery.add_camera(VirtualDevice::camera("back-wide", Camera::Wide, DevicePosition::Back).shared());
        discovery.add_camera(
            VirtualDevice::camera("front-truedepth", Camera::TrueDepth, DevicePosition::Front)
                .without_flash()
                .shared(),
        );
        discovery.set_microphone(Some(VirtualDevice::microphone("mic").shared()));
        discovery
    }

    pub fn add_camera(&self, device: Arc<VirtualDevice>) {
        self.cameras.lock().push(device);
    }

    /// Unplug the camera with `id`. Returns whether it was present.
    pub fn remove_camera(&self, id: &str) -> bool {
        let mut cameras = self.cameras.lock();
        let before = cameras.len();
        cameras.retain(|device| device.unique_id() != id);
        cameras.len() != before
    }

    pub fn set_microphone(&self, microphone: Option<Arc<VirtualDevice>>) {
        *self.microphone.lock() = microphone;
    }

    /// Look up a camera or the microphone by id.
    pub fn device(&self, id: &str) -> Option<Arc<VirtualDevice>> {
        let camera = self
            .cameras
            .lock()
            .iter()
            .find(|device| device.unique_id() == id)
            .cloned();
        camera.or_else(|| {
            self.microphone
                .lock()
                .as_ref()
                .filter(|mic| mic.unique_id() == id)
                .cloned()
        })
    }
}

impl DeviceDiscovery for VirtualDiscovery {
    fn video_devices(&self, kinds: &[Camera], position: BodyPosition) -> Vec<Arc<dyn CaptureDevice>> {
        self.cameras
            .lock()
            .iter()
            .filter(|device| device.position().body_position() == position)
            .filter(|device| device.device_type().camera().is_some_and(|kind| kinds.contains(&kind)))
            .map(|device| Arc::clone(device) as Arc<dyn CaptureDevice>)
            .collect()
    }

    fn default_microphone(&self) -> Option<Arc<dyn CaptureDevice>> {
        let microphone: Arc<dyn CaptureDevice> = self.microphone.lock().clone()?;
        Some(microphone)
    }
}
