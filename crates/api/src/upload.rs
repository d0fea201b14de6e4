//! Scoped storage for uploaded files
//!
//! Uploads are written under one directory with a random prefix and a
//! sanitized name, and removed as soon as the request that brought them in
//! is done.

use crate::error::GatewayError;
use data_validator::UploadedFile;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_NAME_LEN: usize = 100;
const FALLBACK_NAME: &str = "upload";

/// Directory that receives uploads
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist
    pub async fn ensure(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Write `bytes` under a unique, sanitized name
    pub async fn persist(&self, original_name: &str, bytes: &[u8]) -> Result<ScopedUpload, GatewayError> {
        self.ensure()
            .await
            .map_err(|e| GatewayError::Internal(format!("cannot create upload dir: {}", e)))?;

        let filename = sanitize_filename(original_name);
        let path = self.root.join(format!("{}-{}", Uuid::new_v4().simple(), filename));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| GatewayError::Internal(format!("cannot store upload: {}", e)))?;

        debug!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(ScopedUpload {
            file: UploadedFile {
                filename,
                path,
                size_bytes: bytes.len() as u64,
            },
        })
    }
}

/// An uploaded file that is deleted when dropped
#[derive(Debug)]
pub struct ScopedUpload {
    file: UploadedFile,
}

impl ScopedUpload {
    pub fn file(&self) -> &UploadedFile {
        &self.file
    }
}

impl Drop for ScopedUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.file.path) {
            Ok(()) => debug!("Removed upload {}", self.file.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", self.file.path.display(), e),
        }
    }
}

/// Reduce a client-supplied filename to a safe final path component.
///
/// Directory parts are dropped, only `[A-Za-z0-9._-]` survive and leading
/// dots are stripped, so the result can never climb out of the upload dir.
pub fn sanitize_filename(raw: &str) -> String {
    let last = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = cleaned.trim_start_matches('.');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        // Keep the tail so the extension survives truncation
        let skip = trimmed.len().saturating_sub(MAX_NAME_LEN);
        trimmed[skip..].to_string()
    }
}
