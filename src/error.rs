//! Error types for the packdim library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ApiError`] — **Boundary**: a single remote call to the analysis
//!   backend failed (non-success status, network failure, unparseable body).
//!   Returned by every [`crate::client::JobClient`] operation. The workflow
//!   controller never propagates these; it catches them at the call site and
//!   turns them into a message on [`crate::workflow::WorkflowState::error`].
//!
//! * [`PackDimError`] — **Fatal**: the library cannot even set up a workflow
//!   (image file unreadable, configuration invalid, HTTP client could not be
//!   built). Returned as `Err(PackDimError)` from constructors.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the packdim library.
///
/// Failures of individual remote calls use [`ApiError`] and end up as a
/// message inside the workflow state rather than here.
#[derive(Debug, Error)]
pub enum PackDimError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed midway.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed remote call against the analysis backend.
///
/// Every variant carries a human-readable message so the workflow can show
/// it verbatim. Use [`ApiError::user_message`] to get that message with a
/// per-operation fallback.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ApiError {
    /// The backend answered with a non-success HTTP status.
    ///
    /// `message` is the raw response body, or the operation's default
    /// message when the body was empty.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("{message}")]
    Transport { message: String },

    /// The request exceeded the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The backend claimed JSON but the body did not parse.
    #[error("invalid JSON in response: {detail}")]
    Decode { detail: String },

    /// Local I/O failed while preparing the request.
    #[error("{message}")]
    Io { message: String },
}

impl ApiError {
    /// The message to show the user, or `default` if this error carries none.
    pub fn user_message(&self, default: &str) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            default.to_string()
        } else {
            msg
        }
    }

    /// HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
