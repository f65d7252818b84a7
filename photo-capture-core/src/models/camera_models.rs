use serde::{Deserialize, Serialize};

/// Capture mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Photo,
    /// Accepted by [`Options`](crate::Options) but not implemented:
    /// configuring a video session always fails.
    Video,
}

/// A two-state user toggle (e.g. live photos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// A three-state user toggle (e.g. flash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoToggle {
    On,
    Off,
    Auto,
}

/// Which physical side of the device a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPosition {
    Front,
    #[default]
    Back,
}

impl BodyPosition {
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

/// Position as reported by the platform. Unspecified positions (external
/// cameras) are treated as back-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevicePosition {
    Front,
    Back,
    Unspecified,
}

impl DevicePosition {
    pub fn body_position(self) -> BodyPosition {
        match self {
            Self::Front => BodyPosition::Front,
            Self::Back | Self::Unspecified => BodyPosition::Back,
        }
    }
}

/// Semantic camera kind, used to express device preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Camera {
    Dual,
    DualWide,
    Triple,
    Wide,
    UltraWide,
    Telephoto,
    TrueDepth,
}

impl Camera {
    pub fn default_front_preferences() -> Vec<Camera> {
        vec![
            Self::Wide,
            Self::Telephoto,
            Self::UltraWide,
            Self::Triple,
            Self::Dual,
            Self::DualWide,
            Self::TrueDepth,
        ]
    }

    pub fn default_back_preferences() -> Vec<Camera> {
        vec![
            Self::TrueDepth,
            Self::Wide,
            Self::Telephoto,
            Self::UltraWide,
            Self::Triple,
            Self::Dual,
            Self::DualWide,
        ]
    }

    pub fn lens(self) -> Lens {
        match self {
            Self::Dual | Self::DualWide | Self::Triple => Lens::Adjustable,
            Self::Wide | Self::TrueDepth => Lens::Wide,
            Self::UltraWide => Lens::UltraWide,
            Self::Telephoto => Lens::Telephoto,
        }
    }

    pub fn device_type(self) -> DeviceType {
        match self {
            Self::Dual => DeviceType::BuiltInDualCamera,
            Self::DualWide => DeviceType::BuiltInDualWideCamera,
            Self::Triple => DeviceType::BuiltInTripleCamera,
            Self::Wide => DeviceType::BuiltInWideAngleCamera,
            Self::UltraWide => DeviceType::BuiltInUltraWideCamera,
            Self::Telephoto => DeviceType::BuiltInTelephotoCamera,
            Self::TrueDepth => DeviceType::BuiltInTrueDepthCamera,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lens {
    Wide,
    UltraWide,
    Telephoto,
    Adjustable,
}

/// Platform device type. Everything the platform reports that has no
/// [`Camera`] counterpart lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    BuiltInDualCamera,
    BuiltInDualWideCamera,
    BuiltInTripleCamera,
    BuiltInWideAngleCamera,
    BuiltInUltraWideCamera,
    BuiltInTelephotoCamera,
    BuiltInTrueDepthCamera,
    BuiltInMicrophone,
    Other,
}

impl DeviceType {
    pub fn camera(self) -> Option<Camera> {
        match self {
            Self::BuiltInWideAngleCamera => Some(Camera::Wide),
            Self::BuiltInTelephotoCamera => Some(Camera::Telephoto),
            Self::BuiltInUltraWideCamera => Some(Camera::UltraWide),
            Self::BuiltInTripleCamera => Some(Camera::Triple),
            Self::BuiltInDualCamera => Some(Camera::Dual),
            Self::BuiltInDualWideCamera => Some(Camera::DualWide),
            Self::BuiltInTrueDepthCamera => Some(Camera::TrueDepth),
            Self::BuiltInMicrophone | Self::Other => None,
        }
    }
}

/// Snapshot of a capture device, safe to publish to observers on any
/// thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub device_type: DeviceType,
    pub position: DevicePosition,
}

impl DeviceInfo {
    pub fn camera(&self) -> Option<Camera> {
        self.device_type.camera()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    Off,
    On,
    Auto,
}

impl From<AutoToggle> for FlashMode {
    fn from(toggle: AutoToggle) -> Self {
        match toggle {
            AutoToggle::On => Self::On,
            AutoToggle::Off => Self::Off,
            AutoToggle::Auto => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusMode {
    Locked,
    AutoFocus,
    ContinuousAutoFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExposureMode {
    Locked,
    AutoExpose,
    ContinuousAutoExposure,
}

/// A point in capture-device coordinates: `(0, 0)` is the top left and
/// `(1, 1)` the bottom right of the unrotated sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const CENTER: Point = Point { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
