//! Upload store — image blobs on local disk, served back over HTTP.
//!
//! DESIGN
//! ======
//! Files land under `<root>/<folder>/<timestamp>_<sanitized name>` and the
//! returned URL path is what `ServeDir` exposes at `/uploads`. Folders are
//! whitelisted so callers cannot write outside the two image buckets.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::state::now_ms;

/// Folder for creator profile images.
pub const PROFILES_FOLDER: &str = "profiles";
/// Folder for creator cover images.
pub const COVERS_FOLDER: &str = "covers";

const ALLOWED_FOLDERS: [&str; 2] = [PROFILES_FOLDER, COVERS_FOLDER];
const DEFAULT_UPLOADS_DIR: &str = "uploads";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unknown upload folder: {0}")]
    UnknownFolder(String),
    #[error("empty file")]
    EmptyFile,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Disk-backed blob store. Cheap to clone into `AppState`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Load the root directory from `UPLOADS_DIR`, defaulting to `uploads`.
    #[must_use]
    pub fn from_env() -> Self {
        let root = std::env::var("UPLOADS_DIR").unwrap_or_else(|_| DEFAULT_UPLOADS_DIR.into());
        Self::new(PathBuf::from(root))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store a blob and return its retrievable URL path.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFolder` for folders outside the whitelist, `EmptyFile`
    /// for zero-byte uploads, and `Io` when the write fails.
    pub async fn save(&self, folder: &str, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        if !ALLOWED_FOLDERS.contains(&folder) {
            return Err(UploadError::UnknownFolder(folder.to_owned()));
        }
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let file_name = format!("{}_{}", now_ms(), sanitize_file_name(original_name));
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        info!(folder, file = %file_name, size = bytes.len(), "stored upload");
        Ok(format!("/uploads/{folder}/{file_name}"))
    }
}

/// Strip path separators and anything outside a conservative character set.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "upload".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
