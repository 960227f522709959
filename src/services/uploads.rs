use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::services::ids;
use crate::services::validate::{Reason, ValidationError, OWNED_UPLOAD_PREFIX};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload directory unavailable: {0}")]
    Io(#[from] std::io::Error),
}

/// Image file received with a chat widget submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Accepts JPEG or PNG up to 5 MiB; both the declared type and the
    /// file extension have to agree.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ValidationError::new("greetingImage", Reason::TooLarge));
        }
        if self.bytes.is_empty() || self.extension().is_none() {
            return Err(ValidationError::new("greetingImage", Reason::InvalidFormat));
        }
        Ok(())
    }

    fn extension(&self) -> Option<&'static str> {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        match (self.content_type.as_str(), ext.as_str()) {
            ("image/jpeg" | "image/jpg", "jpg" | "jpeg") => Some("jpg"),
            ("image/png", "png") => Some("png"),
            _ => None,
        }
    }
}

/// Greeting images kept on local disk and served under `/uploads`.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a checked image and returns its owned reference (`/uploads/<file>`).
    pub async fn save(&self, upload: &ImageUpload) -> Result<String, UploadError> {
        let ext = upload.extension().unwrap_or("bin");
        let file_name = format!("{}.{}", ids::generate(), ext);
        tokio::fs::write(self.dir.join(&file_name), &upload.bytes).await?;
        tracing::info!(file = %file_name, size = upload.bytes.len(), "Stored greeting image");
        Ok(format!("{}{}", OWNED_UPLOAD_PREFIX, file_name))
    }

    /// Deletes an owned reference. External URLs and already-missing files
    /// are ignored.
    pub async fn remove(&self, reference: &str) {
        let Some(file_name) = owned_file_name(reference) else {
            return;
        };
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => tracing::info!(reference, "Deleted greeting image"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::error!(reference, error = %e, "Failed to delete greeting image"),
        }
    }
}

fn owned_file_name(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(OWNED_UPLOAD_PREFIX)
        .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
}
