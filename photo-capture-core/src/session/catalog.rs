use std::sync::Arc;

use crate::models::camera_models::{BodyPosition, Camera};
use crate::traits::hardware::{CaptureDevice, DeviceDiscovery};

/// Resolves camera preferences to the platform's devices.
///
/// Nothing is cached: every call re-queries the discovery.
pub struct DeviceCatalog {
    discovery: Arc<dyn DeviceDiscovery>,
    front_preferences: Vec<Camera>,
    back_preferences: Vec<Camera>,
}

impl DeviceCatalog {
    pub fn new(
        discovery: Arc<dyn DeviceDiscovery>,
        front_preferences: Vec<Camera>,
        back_preferences: Vec<Camera>,
    ) -> Self {
        Self {
            discovery,
            front_preferences,
            back_preferences,
        }
    }

    pub fn preferences(&self, position: BodyPosition) -> &[Camera] {
        match position {
            BodyPosition::Front => &self.front_preferences,
            BodyPosition::Back => &self.back_preferences,
        }
    }

    /// Devices at `position` of a preferred kind, most preferred kind
    /// first. Devices of the same kind keep the platform's order.
    pub fn devices(&self, position: BodyPosition) -> Vec<Arc<dyn CaptureDevice>> {
        let preferences = self.preferences(position);
        let mut ranked: Vec<(usize, Arc<dyn CaptureDevice>)> = self
            .discovery
            .video_devices(preferences, position)
            .into_iter()
            .filter_map(|device| {
                let camera = device.device_type().camera()?;
                let rank = preferences.iter().position(|preferred| *preferred == camera)?;
                Some((rank, device))
            })
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, device)| device).collect()
    }

    pub fn first_available(&self, position: BodyPosition) -> Option<Arc<dyn CaptureDevice>> {
        self.devices(position).into_iter().next()
    }

    /// Camera kinds present at `position`, in preference order.
    pub fn available_cameras(&self, position: BodyPosition) -> Vec<Camera> {
        self.devices(position)
            .iter()
            .filter_map(|device| device.device_type().camera())
            .collect()
    }

    pub fn default_microphone(&self) -> Option<Arc<dyn CaptureDevice>> {
        self.discovery.default_microphone()
    }
}
