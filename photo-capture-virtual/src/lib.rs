//! # photo-capture-virtual
//!
//! In-process virtual camera backend for photo-capture-kit.
//!
//! Provides:
//! - `VirtualCaptureHardware` — Capture session with transaction and mutation tracking
//! - `VirtualPhotoOutput` — Photo output that scripts the full delegate event sequence
//! - `VirtualDiscovery` / `VirtualDevice` — Hot-pluggable cameras and microphone
//! - `VirtualAuthorization` — Permission statuses with immediate or held prompts
//! - `VirtualOrientation` — Orientation sensor driven by the caller
//!
//! Used for integration tests and for running the core without a camera.
//!
//! ## Usage
//! ```ignore
//! use photo_capture_core::{CaptureSession, Options};
//! use photo_capture_virtual::VirtualBackend;
//!
//! let backend = VirtualBackend::standard();
//! let session = CaptureSession::new(backend.hardware.clone(), backend.collaborators(), Options::default());
//! session.start();
//! ```

pub mod device;
pub mod discovery;
pub mod hardware;
pub mod orientation;
pub mod permissions;
pub mod photo_output;

use std::sync::Arc;

use photo_capture_core::models::config::Options;
use photo_capture_core::session::orchestrator::Collaborators;
use photo_capture_core::traits::orientation::OrientationSource;

pub use device::{DeviceSettings, VirtualDevice};
pub use discovery::VirtualDiscovery;
pub use hardware::VirtualCaptureHardware;
pub use orientation::VirtualOrientation;
pub use permissions::{PromptBehavior, VirtualAuthorization};
pub use photo_output::{CaptureFailure, VirtualPhotoOutput};

/// Every virtual collaborator a capture session needs, wired together.
pub struct VirtualBackend {
    pub discovery: Arc<VirtualDiscovery>,
    pub hardware: VirtualCaptureHardware,
    pub authorization: Arc<VirtualAuthorization>,
    pub orientation: Arc<VirtualOrientation>,
}

impl VirtualBackend {
    pub fn new(discovery: VirtualDiscovery, authorization: VirtualAuthorization) -> Self {
        let discovery = Arc::new(discovery);
        Self {
            hardware: VirtualCaptureHardware::new(Arc::clone(&discovery)),
            discovery,
            authorization: Arc::new(authorization),
            orientation: Arc::new(VirtualOrientation::new()),
        }
    }

    /// Standard devices with both permissions granted.
    pub fn standard() -> Self {
        Self::new(VirtualDiscovery::standard(), VirtualAuthorization::granted())
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.discovery.clone(), self.authorization.clone())
    }

    /// Default options reading orientation from this backend's sensor.
    pub fn options(&self) -> Options {
        let orientation: Arc<dyn OrientationSource> = self.orientation.clone();
        Options {
            orientation_source: Some(orientation),
            ..Options::default()
        }
    }

    pub fn output(&self) -> VirtualPhotoOutput {
        self.hardware.output()
    }
}
