//! Staged preview copy of the selected image.
//!
//! A [`Preview`] owns a temporary file holding the image bytes, for a viewer
//! or overlay renderer to open. Dropping the handle deletes the file, so the
//! controller keeps at most one alive: it releases the old handle before
//! staging a new one.

use crate::error::PackDimError;
use crate::input::SelectedFile;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Owned preview resource. The backing file lives exactly as long as this value.
#[derive(Debug)]
pub struct Preview {
    file: NamedTempFile,
}

impl Preview {
    /// Write `file`'s bytes into a fresh temporary file.
    pub fn stage(file: &SelectedFile) -> Result<Self, PackDimError> {
        let suffix = Path::new(&file.name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut tmp = tempfile::Builder::new()
            .prefix("packdim-preview-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| PackDimError::Internal(format!("tempfile: {e}")))?;
        tmp.write_all(&file.bytes)
            .map_err(|e| PackDimError::Internal(format!("tempfile write: {e}")))?;

        debug!("Staged preview at {}", tmp.path().display());
        Ok(Self { file: tmp })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the backing file now, reporting (not propagating) failures.
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => debug!("Released preview {}", path.display()),
            Err(e) => warn!("Failed to remove preview {}: {}", path.display(), e),
        }
    }
}
