//! The workflow aggregate and its parts.
//!
//! Everything here is plain data. Only [`super::WorkflowController`] mutates
//! a [`WorkflowState`]; presentation code reads it by reference.

use crate::config::AnalysisPipeline;
use crate::input::SelectedFile;
use crate::model::{ConfirmationExport, DimensionItem, Dimensions, OcrItem};
use crate::validation::ValidationResult;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Current screen of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Landing,
    Validating,
    Analyzing,
    Result,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Landing => "landing",
            Step::Validating => "validating",
            Step::Analyzing => "analyzing",
            Step::Result => "result",
        };
        f.write_str(s)
    }
}

/// Backend job status, classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
    Failed,
    /// Any status the backend invents; treated as still running.
    Pending(String),
}

impl JobStatus {
    /// Classify a lowercased status string.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "done" | "completed" | "success" | "processed" => JobStatus::Done,
            "failed" | "error" => JobStatus::Failed,
            "" | "processing" => JobStatus::Processing,
            other => JobStatus::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// A submitted analysis job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Lowercased status as the backend reported it; `"processing"` when blank.
    pub status_text: String,
}

impl Job {
    pub fn new(id: impl Into<String>, raw_status: &str) -> Self {
        let status_text = if raw_status.is_empty() {
            "processing".to_string()
        } else {
            raw_status.to_string()
        };
        Self {
            id: id.into(),
            status: JobStatus::classify(&status_text),
            status_text,
        }
    }
}

/// What an analysis produced, per pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pipeline", rename_all = "kebab-case")]
pub enum AnalysisResult {
    Polling {
        dimensions: Dimensions,
        /// Last raw result payload, kept for diagnostics.
        raw: Option<Value>,
    },
    TwoPhase {
        ocr_items: Vec<OcrItem>,
        dimension_items: Vec<DimensionItem>,
        ocr_raw: Option<Value>,
        mapping_raw: Option<Value>,
        /// Present only after confirmation; cleared by any later edit.
        export: Option<ConfirmationExport>,
    },
}

/// The aggregate the controller owns.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    pub step: Step,
    pub pipeline: AnalysisPipeline,
    pub file: Option<SelectedFile>,
    pub validation: ValidationResult,
    pub job: Option<Job>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub status_message: Option<String>,
    pub loading: bool,
    pub saving: bool,
}

impl WorkflowState {
    pub fn new(pipeline: AnalysisPipeline, validation: ValidationResult) -> Self {
        Self {
            step: Step::Landing,
            pipeline,
            file: None,
            validation,
            job: None,
            result: None,
            error: None,
            warning: None,
            status_message: None,
            loading: false,
            saving: false,
        }
    }

    pub fn dimensions(&self) -> Option<&Dimensions> {
        match &self.result {
            Some(AnalysisResult::Polling { dimensions, .. }) => Some(dimensions),
            _ => None,
        }
    }

    pub fn dimension_items(&self) -> &[DimensionItem] {
        match &self.result {
            Some(AnalysisResult::TwoPhase {
                dimension_items, ..
            }) => dimension_items,
            _ => &[],
        }
    }

    pub fn ocr_items(&self) -> &[OcrItem] {
        match &self.result {
            Some(AnalysisResult::TwoPhase { ocr_items, .. }) => ocr_items,
            _ => &[],
        }
    }

    pub fn export(&self) -> Option<&ConfirmationExport> {
        match &self.result {
            Some(AnalysisResult::TwoPhase { export, .. }) => export.as_ref(),
            _ => None,
        }
    }
}
