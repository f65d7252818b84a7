use serde::{Deserialize, Serialize};

/// User interface orientation, as produced by an orientation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterfaceOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl InterfaceOrientation {
    /// Interface landscape-left is the device rotated so that the sensor's
    /// landscape-right edge is up, hence the swap.
    pub fn video_orientation(self) -> VideoOrientation {
        match self {
            Self::Portrait => VideoOrientation::Portrait,
            Self::PortraitUpsideDown => VideoOrientation::PortraitUpsideDown,
            Self::LandscapeLeft => VideoOrientation::LandscapeRight,
            Self::LandscapeRight => VideoOrientation::LandscapeLeft,
        }
    }
}

/// Orientation of captured video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl VideoOrientation {
    pub fn interface_orientation(self) -> InterfaceOrientation {
        match self {
            Self::Portrait => InterfaceOrientation::Portrait,
            Self::PortraitUpsideDown => InterfaceOrientation::PortraitUpsideDown,
            Self::LandscapeLeft => InterfaceOrientation::LandscapeRight,
            Self::LandscapeRight => InterfaceOrientation::LandscapeLeft,
        }
    }

    /// Orientation tag applied to still images captured while the user
    /// held the device in this orientation.
    pub fn image_orientation(self) -> ImageOrientation {
        match self {
            Self::Portrait => ImageOrientation::Right,
            Self::PortraitUpsideDown => ImageOrientation::Left,
            Self::LandscapeRight => ImageOrientation::Down,
            Self::LandscapeLeft => ImageOrientation::Up,
        }
    }
}

/// EXIF-style orientation of an image's pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageOrientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    Left,
    LeftMirrored,
    Right,
    RightMirrored,
}

impl ImageOrientation {
    /// Maps an EXIF orientation value (1–8).
    pub fn from_exif(raw: u32) -> Option<Self> {
        let orientation = match raw {
            1 => Self::Up,
            2 => Self::UpMirrored,
            3 => Self::Down,
            4 => Self::DownMirrored,
            5 => Self::LeftMirrored,
            6 => Self::Right,
            7 => Self::RightMirrored,
            8 => Self::Left,
            _ => return None,
        };
        Some(orientation)
    }
}
