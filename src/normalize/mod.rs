//! Payload normalization: backend JSON → canonical shapes.
//!
//! Every function here is pure: no I/O, no state, and no failure mode. An
//! unrecognized shape degrades to empty values rather than an error, so the
//! workflow can always show *something*.
//!
//! ## Data Flow
//!
//! ```text
//! polling   result / update ──▶ dimensions::extract_dimensions ──▶ Dimensions
//! two-phase OCR response    ──▶ ocr::normalize_ocr_items       ──▶ Vec<OcrItem>
//! two-phase mapping         ──▶ ocr::normalize_dimension_items ──▶ Vec<DimensionItem>
//!                                bbox::normalize_bbox (per item) ──▶ Option<BBox>
//! ```
//!
//! 1. [`locate`]     — ordered candidate-path lookup shared by all stages
//! 2. [`dimensions`] — job envelope (id, status) and width/height/depth
//! 3. [`bbox`]       — tuple / polygon / edge-object boxes
//! 4. [`ocr`]        — OCR items, mapped dimension items, mapping warnings

pub mod bbox;
pub mod dimensions;
pub mod locate;
pub mod ocr;

pub use bbox::normalize_bbox;
pub use dimensions::{creation_status, extract_dimensions, extract_job_id, poll_status};
pub use ocr::{mapping_warnings, normalize_dimension_items, normalize_ocr_items};
