//! Polling-pipeline shapes: job envelope fields and width/height/depth.

use super::locate::{at, locate, text_of, truthy, Path};
use crate::model::{DimensionKey, Dimensions, FieldValue};
use serde_json::Value;
use tracing::debug;

/// Where the flat `{width, height, depth}` object may live.
pub const DIMENSIONS_MM: &[Path] = &[
    &["dimensions_mm"],
    &["data", "dimensions_mm"],
    &["result", "dimensions_mm"],
];

/// Where the job id may live in a job-creation response.
pub const JOB_ID: &[Path] = &[
    &["job_id"],
    &["id"],
    &["jobId"],
    &["data", "job_id"],
    &["data", "id"],
];

/// Where the status string may live in a job-status response.
pub const JOB_STATUS: &[Path] = &[&["status"], &["data", "status"]];

/// Extract width/height/depth from any of the known envelope shapes.
///
/// Falls back to reading the fields off the payload itself. Never fails:
/// a missing payload or missing field yields `""`.
pub fn extract_dimensions(payload: Option<&Value>) -> Dimensions {
    let Some(payload) = payload else {
        return Dimensions::default();
    };
    let source = locate(payload, DIMENSIONS_MM, Value::is_object).unwrap_or(payload);

    let mut dims = Dimensions::default();
    for key in DimensionKey::ALL {
        *dims.get_mut(key) = match source.get(key.as_str()) {
            None | Some(Value::Null) => FieldValue::empty(),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(n.to_string())),
            Some(other) => FieldValue::Text(text_of(other)),
        };
    }
    debug!("Extracted dimensions: {:?}", dims);
    dims
}

/// Job id from a creation response; empty strings and `0` do not count.
pub fn extract_job_id(payload: Option<&Value>) -> Option<String> {
    locate(payload?, JOB_ID, truthy).map(text_of)
}

/// Lowercased status from a creation response, defaulting to `"processing"`.
pub fn creation_status(payload: Option<&Value>) -> String {
    payload
        .and_then(|p| at(p, &["status"]))
        .filter(|v| truthy(v))
        .map(text_of)
        .unwrap_or_else(|| "processing".to_string())
        .to_lowercase()
}

/// Lowercased status from a poll response; `""` when absent.
pub fn poll_status(payload: Option<&Value>) -> String {
    payload
        .and_then(|p| locate(p, JOB_STATUS, truthy))
        .map(text_of)
        .unwrap_or_default()
        .to_lowercase()
}
