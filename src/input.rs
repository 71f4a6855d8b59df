//! Input resolution: turn a user-supplied image path into a [`SelectedFile`].
//!
//! The MIME type comes from the file extension only and the size from the
//! file's metadata. Bytes are read once, after the metadata passes
//! validation, so the upload can be replayed without touching the disk again.

use crate::error::PackDimError;
use crate::validation::ValidationPolicy;
use image::ImageFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// MIME type used when the extension does not name a known image format.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// The user's chosen image.
///
/// Replaced wholesale on re-selection, never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    pub name: String,
    /// Byte size as reported at selection time.
    pub size: u64,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl SelectedFile {
    /// Build from in-memory bytes; `size` is taken from `bytes.len()`.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Metadata-only file, as a picker would report it before reading.
    pub fn metadata(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            bytes: Vec::new(),
        }
    }

    /// Resolve an image on disk.
    ///
    /// Name, size and MIME type come from the path and its metadata. The
    /// bytes are read only when `policy` accepts that metadata; a rejected
    /// file comes back metadata-only so its validation message can still be
    /// shown.
    pub fn from_path(
        path: impl AsRef<Path>,
        policy: &ValidationPolicy,
    ) -> Result<Self, PackDimError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
        let mut file = Self::metadata(file_name(path), mime_from_path(path), meta.len());

        if !policy.validate(Some(&file)).valid {
            debug!("Selected {:?}, not reading rejected file", file);
            return Ok(file);
        }

        file.bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        debug!("Selected {:?}", file);
        Ok(file)
    }

    /// Whether the image bytes are in memory.
    pub fn is_loaded(&self) -> bool {
        self.size == 0 || !self.bytes.is_empty()
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PackDimError {
    match e.kind() {
        std::io::ErrorKind::NotFound => PackDimError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => PackDimError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PackDimError::FileRead {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Guess the MIME type from the extension (`photo.JPG` → `image/jpeg`).
pub fn mime_from_path(path: &Path) -> String {
    match ImageFormat::from_path(path) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => FALLBACK_MIME.to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}
