use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};

use crate::config::Settings;
use crate::errors::ApiError;

/// Writes uploaded images under one subdirectory per listing and removes
/// them again when a listing goes away.
pub struct ImageStore {
    upload_dir: PathBuf,
    max_file_size: usize,
}

impl ImageStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            upload_dir: PathBuf::from(&settings.upload_dir),
            max_file_size: settings.max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Persists one uploaded file and returns its storage path. The filename
    /// carries the upload instant down to microseconds so files saved in the
    /// same batch cannot collide.
    pub fn save(&self, laptop_id: i64, original_filename: &str, data: &[u8]) -> Result<String, ApiError> {
        if data.len() > self.max_file_size {
            return Err(ApiError::FileTooLarge(original_filename.to_string()));
        }

        let dir = self.upload_dir.join(format!("laptop_{laptop_id}"));
        fs::create_dir_all(&dir)?;

        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let now = Utc::now();
        let filename = format!(
            "{}.{:06}.{}",
            now.timestamp(),
            now.timestamp_subsec_micros(),
            ext
        );

        let path = dir.join(filename);
        fs::write(&path, data)?;
        info!("Saved image for laptop {}: {}", laptop_id, path.display());

        Ok(path.to_string_lossy().into_owned())
    }

    /// Best-effort removal; a missing or undeletable file is logged and
    /// otherwise ignored.
    pub fn remove(&self, path: &str) {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove image file {}: {}", path, e);
        }
    }
}
