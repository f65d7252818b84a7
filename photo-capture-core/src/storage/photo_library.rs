use std::fs;
use std::path::{Path, PathBuf};

use crate::models::captured_photo::{CapturedPhoto, PhotoMetadata};
use crate::models::error::LibraryError;
use crate::models::photo_settings::RequestId;
use crate::session::logging::SessionLogger;
use crate::traits::photo_library::{PhotoLibrary, SavedPhoto};

/// Stores captured photos as plain files in one directory.
///
/// ## Layout
///
/// ```text
/// <root>/
/// ├── <request-id>.heic            ← encoded photo (or .jpg)
/// ├── <request-id>.mov             ← live photo companion movie, if any
/// └── <request-id>.metadata.json   ← PhotoMetadata sidecar
/// ```
///
/// The companion movie is moved out of its temporary location, so the
/// temporary file no longer exists after a successful save.
pub struct DirectoryPhotoLibrary {
    root: PathBuf,
    logger: SessionLogger,
}

impl DirectoryPhotoLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            logger: SessionLogger::new(),
        }
    }

    pub fn with_logger(mut self, logger: SessionLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the sidecar written for `request_id`.
    pub fn read_metadata(&self, request_id: RequestId) -> Result<PhotoMetadata, LibraryError> {
        let path = self.metadata_path(request_id);
        let json = fs::read_to_string(&path)
            .map_err(|e| LibraryError::Storage(format!("failed to read metadata: {}", e)))?;
        serde_json::from_str(&json)
            .map_err(|e| LibraryError::Serialization(format!("failed to parse metadata: {}", e)))
    }

    fn metadata_path(&self, request_id: RequestId) -> PathBuf {
        self.root.join(format!("{}.metadata.json", request_id))
    }

    fn store_live_photo(&self, source: &Path, request_id: RequestId) -> Result<PathBuf, LibraryError> {
        let destination = self.root.join(format!("{}.mov", request_id));
        if fs::rename(source, &destination).is_err() {
            // Crossing filesystems: copy, then drop the temporary file.
            fs::copy(source, &destination)
                .map_err(|e| LibraryError::Storage(format!("failed to store live photo: {}", e)))?;
            if let Err(e) = fs::remove_file(source) {
                self.logger.warn(format_args!(
                    "Could not remove temporary live photo {}: {}",
                    source.display(),
                    e
                ));
            }
        }
        Ok(destination)
    }
}

impl PhotoLibrary for DirectoryPhotoLibrary {
    fn save(&self, photo: &CapturedPhoto) -> Result<SavedPhoto, LibraryError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| LibraryError::Storage(format!("failed to create directory: {}", e)))?;

        let photo_file = self.root.join(format!(
            "{}.{}",
            photo.request_id,
            photo.settings.codec.file_extension()
        ));
        fs::write(&photo_file, &photo.file_data)
            .map_err(|e| LibraryError::Storage(format!("failed to write photo: {}", e)))?;

        let live_photo_file = match &photo.live_photo_file {
            Some(source) => Some(self.store_live_photo(source, photo.request_id)?),
            None => None,
        };

        let metadata = PhotoMetadata::new(
            photo,
            live_photo_file
                .as_ref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned()),
        );
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| LibraryError::Serialization(format!("failed to serialize metadata: {}", e)))?;
        fs::write(self.metadata_path(photo.request_id), json)
            .map_err(|e| LibraryError::Storage(format!("failed to write metadata: {}", e)))?;

        self.logger.info(format_args!(
            "Saved photo {} ({} bytes) to {}",
            photo.request_id,
            photo.file_data.len(),
            photo_file.display()
        ));

        Ok(SavedPhoto {
            photo_file,
            live_photo_file,
            metadata,
        })
    }
}
