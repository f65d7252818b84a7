use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::camera_models::{Dimensions, FlashMode};
use super::orientation::{ImageOrientation, VideoOrientation};
use super::photo_settings::{PhotoCodec, PhotoSettings, RequestId};

/// Decoded pixel data delivered by the hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub dimensions: Dimensions,
    pub pixel_format: u32,
    pub pixels: Arc<[u8]>,
}

/// What the hardware hands back once it has finished processing a photo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoFrame {
    /// Encoded file representation (HEIC/JPEG bytes).
    pub file_data: Option<Vec<u8>>,
    /// Full-size decoded image.
    pub image: Option<RawImage>,
    /// Smaller embedded preview image.
    pub preview: Option<RawImage>,
}

/// An image ready to display the way the user saw the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub image: RawImage,
    pub orientation: ImageOrientation,
}

/// The result of one successful capture request.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    pub request_id: RequestId,
    pub file_data: Vec<u8>,
    pub live_photo_file: Option<PathBuf>,
    pub settings: PhotoSettings,
    pub original_image: DisplayImage,
    pub preview_image: Option<DisplayImage>,
    pub user_orientation: VideoOrientation,
    pub captured_at: DateTime<Utc>,
}

impl CapturedPhoto {
    /// SHA-256 hex digest of the encoded file data.
    pub fn checksum(&self) -> String {
        hex_encode(&Sha256::digest(&self.file_data))
    }
}

/// Metadata stored alongside a saved photo.
///
/// Serializable for JSON export next to the image file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: String,
    pub request_id: RequestId,
    pub created_at: String,
    pub codec: PhotoCodec,
    pub flash_mode: FlashMode,
    pub byte_length: usize,
    pub checksum: String,
    pub orientation: ImageOrientation,
    pub dimensions: Dimensions,
    pub live_photo_file: Option<String>,
}

impl PhotoMetadata {
    pub fn new(photo: &CapturedPhoto, live_photo_file: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request_id: photo.request_id,
            created_at: photo.captured_at.to_rfc3339(),
            codec: photo.settings.codec,
            flash_mode: photo.settings.flash_mode,
            byte_length: photo.file_data.len(),
            checksum: photo.checksum(),
            orientation: photo.original_image.orientation,
            dimensions: photo.original_image.image.dimensions,
            live_photo_file,
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
