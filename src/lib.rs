//! # packdim
//!
//! Extract package dimensions (width, height, depth in millimetres) from a
//! photo of a package label, through a remote analysis backend.
//!
//! ## Why this crate?
//!
//! The backend is the one doing OCR and dimension mapping, but its responses
//! come in many shapes, jobs run asynchronously, and users correct the
//! numbers before saving them. This crate owns that client side: local file
//! validation, payload normalization into canonical types, a cancellable
//! polling loop, and an edit/save/confirm review step.
//!
//! ## Workflow Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Pick      SelectedFile + staged preview copy
//!  ├─ 2. Validate  image/* and ≤ 10 MiB (warning above 5 MiB)
//!  ├─ 3. Analyze   polling: create job → poll status → fetch result
//!  │               two-phase: OCR → map dimensions
//!  ├─ 4. Review    edit values in place
//!  └─ 5. Persist   save remotely (polling) / confirm locally (two-phase)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use packdim::{ClientConfig, HttpJobClient, SelectedFile, WorkflowController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from PACKDIM_API_BASE, default http://127.0.0.1:8000
//!     let config = ClientConfig::from_env()?;
//!     let client = Arc::new(HttpJobClient::new(&config)?);
//!     let file = SelectedFile::from_path("label.jpg", &config.validation_policy())?;
//!     let mut workflow = WorkflowController::new(client, config);
//!
//!     workflow.pick(file);
//!     workflow.start_analysis().await;
//!     workflow.run_polling().await;
//!
//!     if let Some(dims) = workflow.state().dimensions() {
//!         println!("{} × {} × {} mm", dims.width, dims.height, dims.depth);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `packdim` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! packdim = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod normalize;
pub mod observer;
pub mod preview;
pub mod validation;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{ApiResult, HttpJobClient, JobClient, MapDimensionsRequest};
pub use config::{AnalysisPipeline, ClientConfig, ClientConfigBuilder};
pub use error::{ApiError, PackDimError};
pub use input::SelectedFile;
pub use model::{
    BBox, ConfirmationExport, ConfirmedDimension, DimensionItem, DimensionKey, Dimensions,
    DimensionsUpdate, FieldValue, OcrItem,
};
pub use observer::{NoopObserver, SharedObserver, WorkflowObserver};
pub use validation::{validate, ValidationPolicy, ValidationResult};
pub use workflow::{
    AnalysisResult, Job, JobStatus, PendingPoll, PollOutcome, PollToken, Step, TickOutcome,
    WorkflowController, WorkflowState,
};
