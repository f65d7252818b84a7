use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::camera_models::{AutoToggle, Dimensions, FlashMode, Toggle};
use crate::traits::hardware::{CaptureDevice, PhotoOutput};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one photo capture request. Unique for the lifetime of the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCodec {
    Hevc,
    Jpeg,
}

impl PhotoCodec {
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Hevc => "heic",
            Self::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPrioritization {
    Speed,
    Balanced,
    Quality,
}

/// User-facing choices that feed settings resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettingsOptions {
    pub live_photos: Option<Toggle>,
    pub flash: Option<AutoToggle>,
    pub quality: QualityPrioritization,
}

/// Settings for a single capture request, resolved against a camera and
/// photo output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSettings {
    pub request_id: RequestId,
    pub codec: PhotoCodec,
    pub flash_mode: FlashMode,
    pub high_resolution: bool,
    pub preview_pixel_format: Option<u32>,
    pub live_photo_movie_file: Option<PathBuf>,
    pub quality: QualityPrioritization,
}

impl PhotoSettings {
    pub fn resolve(
        camera: &dyn CaptureDevice,
        output: &dyn PhotoOutput,
        options: &PhotoSettingsOptions,
    ) -> Self {
        let codec = if output.available_codecs().contains(&PhotoCodec::Hevc) {
            PhotoCodec::Hevc
        } else {
            PhotoCodec::Jpeg
        };

        let flash_mode = match options.flash {
            Some(flash) if camera.has_flash() => FlashMode::from(flash),
            _ => FlashMode::Off,
        };

        let preview_pixel_format = output.available_preview_pixel_formats().first().copied();

        let live_photo_movie_file = match options.live_photos {
            Some(Toggle::On) if output.is_live_photo_capture_supported() => Some(
                std::env::temp_dir().join(format!("{}.mov", uuid::Uuid::new_v4())),
            ),
            _ => None,
        };

        Self {
            request_id: RequestId::next(),
            codec,
            flash_mode,
            high_resolution: true,
            preview_pixel_format,
            live_photo_movie_file,
            quality: options.quality,
        }
    }
}

/// Expected duration window for post-capture processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessingTimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl ProcessingTimeRange {
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// Settings as the hardware resolved them once the capture was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPhotoSettings {
    pub request_id: RequestId,
    pub photo_dimensions: Dimensions,
    /// Zero when no live photo companion movie is being recorded.
    pub live_photo_movie_dimensions: Dimensions,
    pub processing_time_range: ProcessingTimeRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique_and_increasing() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert!(b > a);
    }

    #[test]
    fn processing_range_end() {
        let range = ProcessingTimeRange {
            start: Duration::from_millis(400),
            duration: Duration::from_millis(900),
        };
        assert_eq!(range.end(), Duration::from_millis(1300));
    }

    #[test]
    fn codec_extensions() {
        assert_eq!(PhotoCodec::Hevc.file_extension(), "heic");
        assert_eq!(PhotoCodec::Jpeg.file_extension(), "jpg");
    }
}
