use crate::models::captured_photo::{DisplayImage, RawImage};
use crate::models::orientation::ImageOrientation;

/// Turns raw hardware images into display-ready images.
///
/// Pixel format conversion and rotation are platform concerns; the core
/// only decides which orientation the user experienced.
pub trait ImageNormalizer: Send + Sync {
    fn normalize(&self, image: RawImage, orientation: ImageOrientation) -> DisplayImage;
}

/// Leaves pixels untouched and records the orientation so the consumer can
/// rotate at display time.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationTagger;

impl ImageNormalizer for OrientationTagger {
    fn normalize(&self, image: RawImage, orientation: ImageOrientation) -> DisplayImage {
        DisplayImage { image, orientation }
    }
}
