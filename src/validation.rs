//! Local acceptance check for a selected image.
//!
//! Rules run in order and the first match wins. The check is a pure function
//! of file metadata: it never reads the bytes, so it is safe to recompute on
//! every file change.

use crate::input::SelectedFile;
use serde::{Deserialize, Serialize};

pub const MSG_NO_FILE: &str = "select an image file.";
pub const MSG_NOT_IMAGE: &str = "only image files are accepted.";
pub const MSG_TOO_LARGE: &str = "file must be ≤ 10 MB.";
pub const MSG_ACCEPTABLE: &str = "file is acceptable for upload.";
pub const MSG_LARGE_FILE_WARNING: &str = "large file; analysis may take longer.";

const MIB: u64 = 1024 * 1024;

/// Outcome of [`ValidationPolicy::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Size thresholds used to judge a selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Strictly larger files are rejected. Default: 10 MiB.
    pub max_bytes: u64,
    /// Strictly larger files get an advisory warning. Default: 5 MiB.
    pub warn_bytes: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * MIB,
            warn_bytes: 5 * MIB,
        }
    }
}

impl ValidationPolicy {
    pub fn validate(&self, file: Option<&SelectedFile>) -> ValidationResult {
        let Some(file) = file else {
            return ValidationResult::invalid(MSG_NO_FILE);
        };
        if !file.mime_type.starts_with("image/") {
            return ValidationResult::invalid(MSG_NOT_IMAGE);
        }
        if file.size > self.max_bytes {
            return ValidationResult::invalid(MSG_TOO_LARGE);
        }
        ValidationResult {
            valid: true,
            message: MSG_ACCEPTABLE.to_string(),
        }
    }

    /// Advisory warning for large files. Does not affect validity.
    pub fn warning(&self, file: &SelectedFile) -> Option<&'static str> {
        (file.size > self.warn_bytes).then_some(MSG_LARGE_FILE_WARNING)
    }
}

/// [`ValidationPolicy::validate`] with the default thresholds.
pub fn validate(file: Option<&SelectedFile>) -> ValidationResult {
    ValidationPolicy::default().validate(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(mime: &str, size: u64) -> SelectedFile {
        SelectedFile::metadata("f", mime, size)
    }

    #[test]
    fn no_file() {
        let r = validate(None);
        assert!(!r.valid);
        assert_eq!(r.message, MSG_NO_FILE);
    }

    #[test]
    fn non_image_rejected_regardless_of_size() {
        for size in [0, 1, 5 * MIB, 10 * MIB, 10 * MIB + 1, 500 * MIB] {
            for mime in ["application/pdf", "text/plain", "", "IMAGE/png"] {
                let r = validate(Some(&file(mime, size)));
                assert!(!r.valid, "{mime} / {size}");
                assert_eq!(r.message, MSG_NOT_IMAGE);
            }
        }
    }

    #[test]
    fn oversized_image_rejected() {
        for size in [10 * MIB + 1, 11 * MIB, u64::MAX] {
            let r = validate(Some(&file("image/png", size)));
            assert!(!r.valid);
            assert_eq!(r.message, MSG_TOO_LARGE);
        }
    }

    #[test]
    fn boundary_is_inclusive() {
        let r = validate(Some(&file("image/jpeg", 10 * MIB)));
        assert!(r.valid);
        assert_eq!(r.message, MSG_ACCEPTABLE);
    }

    #[test]
    fn warning_is_advisory() {
        let policy = ValidationPolicy::default();
        let big = file("image/png", 6 * MIB);
        assert!(policy.validate(Some(&big)).valid);
        assert_eq!(policy.warning(&big), Some(MSG_LARGE_FILE_WARNING));
        assert_eq!(policy.warning(&file("image/png", 5 * MIB)), None);
        assert_eq!(policy.warning(&file("image/png", 2 * MIB)), None);
    }
}
