//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use packdim::{
    AnalysisPipeline, ApiError, ApiResult, ClientConfig, DimensionsUpdate, JobClient,
    MapDimensionsRequest, SelectedFile, Step, WorkflowController, WorkflowObserver,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ── Scripted JobClient ───────────────────────────────────────────────────────

/// A recorded call against [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateJob(String),
    GetJob(String),
    GetJobResult(String),
    UpdateDimensions(String, DimensionsUpdate),
    ExtractOcr(String),
    MapDimensions(usize),
}

/// In-memory [`JobClient`] answering from per-operation queues.
///
/// An exhausted queue answers with a 500 so an unexpected call shows up as
/// a surfaced error rather than a hang.
#[derive(Default)]
pub struct ScriptedClient {
    create: Mutex<VecDeque<ApiResult>>,
    status: Mutex<VecDeque<ApiResult>>,
    result: Mutex<VecDeque<ApiResult>>,
    update: Mutex<VecDeque<ApiResult>>,
    ocr: Mutex<VecDeque<ApiResult>>,
    map: Mutex<VecDeque<ApiResult>>,
    calls: Mutex<Vec<Call>>,
    status_gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, r: ApiResult) -> Self {
        self.create.lock().unwrap().push_back(r);
        self
    }

    pub fn on_status(self, r: ApiResult) -> Self {
        self.status.lock().unwrap().push_back(r);
        self
    }

    pub fn on_result(self, r: ApiResult) -> Self {
        self.result.lock().unwrap().push_back(r);
        self
    }

    pub fn on_update(self, r: ApiResult) -> Self {
        self.update.lock().unwrap().push_back(r);
        self
    }

    pub fn on_ocr(self, r: ApiResult) -> Self {
        self.ocr.lock().unwrap().push_back(r);
        self
    }

    pub fn on_map(self, r: ApiResult) -> Self {
        self.map.lock().unwrap().push_back(r);
        self
    }

    /// Make every status request wait for `gate` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.status_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(queue: &Mutex<VecDeque<ApiResult>>) -> ApiResult {
        queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ApiError::Status {
                status: 500,
                message: "unscripted call".into(),
            })
        })
    }
}

#[async_trait]
impl JobClient for ScriptedClient {
    async fn create_job(&self, file: &SelectedFile) -> ApiResult {
        self.record(Call::CreateJob(file.name.clone()));
        Self::next(&self.create)
    }

    async fn get_job(&self, job_id: &str) -> ApiResult {
        self.record(Call::GetJob(job_id.to_string()));
        if let Some(ref gate) = self.status_gate {
            gate.notified().await;
        }
        Self::next(&self.status)
    }

    async fn get_job_result(&self, job_id: &str) -> ApiResult {
        self.record(Call::GetJobResult(job_id.to_string()));
        Self::next(&self.result)
    }

    async fn update_dimensions(&self, job_id: &str, dimensions: DimensionsUpdate) -> ApiResult {
        self.record(Call::UpdateDimensions(job_id.to_string(), dimensions));
        Self::next(&self.update)
    }

    async fn extract_ocr(&self, file: &SelectedFile) -> ApiResult {
        self.record(Call::ExtractOcr(file.name.clone()));
        Self::next(&self.ocr)
    }

    async fn map_dimensions(&self, request: &MapDimensionsRequest) -> ApiResult {
        self.record(Call::MapDimensions(request.ocr.len()));
        Self::next(&self.map)
    }
}

// ── Recording observer ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingObserver {
    pub steps: Mutex<Vec<Step>>,
    pub statuses: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl WorkflowObserver for RecordingObserver {
    fn on_transition(&self, _from: Step, to: Step) {
        self.steps.lock().unwrap().push(to);
    }

    fn on_status(&self, _job_id: &str, status: &str) {
        self.statuses.lock().unwrap().push(status.to_string());
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

// ── Builders ─────────────────────────────────────────────────────────────────

/// A successful response carrying `value` as its JSON body.
pub fn body(value: Value) -> ApiResult {
    Ok(Some(value))
}

pub fn png(name: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, "image/png", vec![0u8; size])
}

pub fn controller(
    client: &Arc<ScriptedClient>,
    pipeline: AnalysisPipeline,
) -> WorkflowController {
    let config = ClientConfig::builder()
        .pipeline(pipeline)
        .poll_interval_ms(2000)
        .build()
        .unwrap();
    WorkflowController::new(client.clone() as Arc<dyn JobClient>, config)
}
