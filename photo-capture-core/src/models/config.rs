use std::collections::HashSet;
use std::sync::Arc;

use super::camera_models::{AutoToggle, Camera, Mode};
use super::orientation::InterfaceOrientation;
use crate::traits::orientation::OrientationSource;

/// Options for a capture session, fixed at construction.
#[derive(Clone)]
pub struct Options {
    /// Supported capture modes. The first one is the active mode. Must not
    /// be empty.
    pub modes: Vec<Mode>,

    /// Interface orientations the preview supports. Must not be empty.
    pub interface_orientations: HashSet<InterfaceOrientation>,

    /// Front camera kinds, most preferred first.
    pub preferred_front_cameras: Vec<Camera>,

    /// Back camera kinds, most preferred first.
    pub preferred_back_cameras: Vec<Camera>,

    /// Turn live photos on when the photo output supports them (default: true).
    pub auto_enable_live_photos_if_available: bool,

    /// Flash mode used when a camera with a flash is first selected
    /// (default: off).
    pub preferred_initial_flash_mode: AutoToggle,

    /// Overrides the orientation source. When `None` the session assumes
    /// a fixed portrait orientation.
    pub orientation_source: Option<Arc<dyn OrientationSource>>,
}

impl Options {
    pub fn validate(&self) -> Result<(), String> {
        if self.modes.is_empty() {
            return Err("at least one mode must be provided".into());
        }
        if self.interface_orientations.is_empty() {
            return Err("at least one supported interface orientation must be provided".into());
        }
        Ok(())
    }

    /// The mode the session configures for.
    pub fn initial_mode(&self) -> Mode {
        self.modes.first().copied().unwrap_or(Mode::Photo)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            modes: vec![Mode::Photo],
            interface_orientations: HashSet::from([InterfaceOrientation::Portrait]),
            preferred_front_cameras: Camera::default_front_preferences(),
            preferred_back_cameras: Camera::default_back_preferences(),
            auto_enable_live_photos_if_available: true,
            preferred_initial_flash_mode: AutoToggle::Off,
            orientation_source: None,
        }
    }
}
