use std::path::PathBuf;

use crate::models::captured_photo::{CapturedPhoto, PhotoMetadata};
use crate::models::error::LibraryError;

/// Where a photo ended up after being handed to a library.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPhoto {
    pub photo_file: PathBuf,
    pub live_photo_file: Option<PathBuf>,
    pub metadata: PhotoMetadata,
}

/// Media persistence collaborator. Receives captured photos and their
/// companion clips once the session is done with them.
pub trait PhotoLibrary: Send + Sync {
    fn save(&self, photo: &CapturedPhoto) -> Result<SavedPhoto, LibraryError>;
}
