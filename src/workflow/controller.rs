//! [`WorkflowController`]: the only writer of [`WorkflowState`].

use super::poll::{PendingPoll, PollOutcome, PollSchedule, TickOutcome};
use super::state::{AnalysisResult, Job, JobStatus, Step, WorkflowState};
use crate::client::{JobClient, MapDimensionsRequest};
use crate::config::{AnalysisPipeline, ClientConfig};
use crate::error::ApiError;
use crate::input::SelectedFile;
use crate::model::{ConfirmationExport, DimensionKey, FieldValue};
use crate::normalize::{
    creation_status, extract_dimensions, extract_job_id, mapping_warnings,
    normalize_dimension_items, normalize_ocr_items, poll_status,
};
use crate::observer::{NoopObserver, SharedObserver};
use crate::preview::Preview;
use crate::validation::ValidationPolicy;
use futures::FutureExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ── Messages ─────────────────────────────────────────────────────────────

pub const MSG_START_FAILED: &str = "failed to start analysis.";
pub const MSG_OCR_RUN_FAILED: &str = "failed to run OCR analysis.";
pub const MSG_POLL_FAILED: &str = "error while checking job status.";
pub const MSG_JOB_FAILED: &str = "analysis job failed.";
pub const MSG_SAVE_FAILED: &str = "error while saving dimensions.";
pub const MSG_SAVED: &str = "dimensions saved.";
pub const MSG_CONFIRMED: &str = "dimensions confirmed.";
pub const MSG_NO_JOB_ID: &str = "no job id returned.";

/// Drives one image through pick → validate → analyze → review.
///
/// Every intent takes `&mut self`, so operations never interleave. Remote
/// failures never escape as `Err`: they land in [`WorkflowState::error`].
///
/// Dropping the controller runs [`shutdown`](Self::shutdown).
pub struct WorkflowController {
    client: Arc<dyn JobClient>,
    config: ClientConfig,
    policy: ValidationPolicy,
    state: WorkflowState,
    preview: Option<Preview>,
    generation: u64,
    schedule: Option<PollSchedule>,
    observer: SharedObserver,
}

impl WorkflowController {
    pub fn new(client: Arc<dyn JobClient>, config: ClientConfig) -> Self {
        let policy = config.validation_policy();
        let state = WorkflowState::new(config.pipeline, policy.validate(None));
        Self {
            client,
            config,
            policy,
            state,
            preview: None,
            generation: 0,
            schedule: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observer for state changes.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Path of the staged preview copy, if one is live.
    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(Preview::path)
    }

    /// Whether a poll schedule is armed.
    pub fn has_pending_timer(&self) -> bool {
        self.schedule.is_some()
    }

    // ── Intents ──────────────────────────────────────────────────────────

    /// Select a new image. Starts a fresh run: any active polling, job and
    /// result from the previous run are discarded.
    pub fn pick(&mut self, file: SelectedFile) {
        self.cancel_polling();
        self.release_preview();

        info!(
            "Picked {} ({}, {} bytes)",
            file.name, file.mime_type, file.size
        );
        self.preview = match Preview::stage(&file) {
            Ok(preview) => Some(preview),
            Err(e) => {
                warn!("Could not stage preview for {}: {}", file.name, e);
                None
            }
        };

        self.state.validation = self.policy.validate(Some(&file));
        self.state.warning = self.policy.warning(&file).map(str::to_string);
        self.state.file = Some(file);
        self.state.job = None;
        self.state.result = None;
        self.state.error = None;
        self.state.status_message = None;
        self.state.loading = false;
        self.state.saving = false;

        self.enter(Step::Validating);
        self.notify();
    }

    /// Submit the selected image through the configured pipeline.
    ///
    /// No-op unless a valid file is selected and the workflow is in
    /// `Validating`.
    pub async fn start_analysis(&mut self) {
        if self.state.step != Step::Validating
            || !self.state.validation.valid
            || self.state.file.is_none()
        {
            debug!(
                "start_analysis ignored (step={}, valid={})",
                self.state.step, self.state.validation.valid
            );
            return;
        }

        self.state.loading = true;
        self.state.error = None;
        self.state.status_message = None;
        self.notify();

        match self.state.pipeline {
            AnalysisPipeline::Polling => self.start_polling_job().await,
            AnalysisPipeline::TwoPhase => self.run_two_phase().await,
        }

        self.state.loading = false;
        self.notify();
    }

    /// Replace one dimension with user text. Only meaningful for a polling
    /// result; returns `false` otherwise.
    pub fn edit_dimension(&mut self, key: DimensionKey, value: impl Into<String>) -> bool {
        let Some(AnalysisResult::Polling { dimensions, .. }) = self.state.result.as_mut() else {
            return false;
        };
        *dimensions.get_mut(key) = FieldValue::Text(value.into());
        self.state.status_message = None;
        self.notify();
        true
    }

    /// Replace the value of the mapped dimension item with `id`. Clears any
    /// earlier confirmation. Returns `false` when no item matches.
    pub fn edit_dimension_item(&mut self, id: &str, value: impl Into<String>) -> bool {
        let Some(AnalysisResult::TwoPhase {
            dimension_items,
            export,
            ..
        }) = self.state.result.as_mut()
        else {
            return false;
        };
        let Some(item) = dimension_items.iter_mut().find(|i| i.id == id) else {
            debug!("No dimension item with id {}", id);
            return false;
        };
        item.value = value.into();
        *export = None;
        self.state.status_message = None;
        self.notify();
        true
    }

    /// Polling: persist the edited dimensions remotely.
    /// Two-phase: build the confirmation export locally.
    pub async fn save_or_confirm(&mut self) {
        match self.state.result {
            Some(AnalysisResult::Polling { .. }) => self.save_dimensions().await,
            Some(AnalysisResult::TwoPhase { .. }) => self.confirm_dimensions(),
            None => debug!("Nothing to save"),
        }
    }

    /// Back to `Landing`, discarding job, result, file and preview.
    pub fn reset(&mut self) {
        self.cancel_polling();
        self.release_preview();
        let fresh = WorkflowState::new(self.state.pipeline, self.policy.validate(None));
        let previous = std::mem::replace(&mut self.state, fresh);
        if previous.step != Step::Landing {
            info!("Workflow {} → {}", previous.step, Step::Landing);
            self.observer.on_transition(previous.step, Step::Landing);
        }
        self.notify();
    }

    /// Stop polling and release the preview. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.cancel_polling();
        self.release_preview();
    }

    // ── Polling ──────────────────────────────────────────────────────────

    /// Issue one status request for the armed schedule.
    ///
    /// Returns `None` when nothing is armed. The returned future owns
    /// everything it needs; the controller may be mutated or dropped while
    /// it is in flight.
    pub fn dispatch_poll(&self) -> Option<PendingPoll> {
        let schedule = self.schedule.as_ref()?;
        if self.state.step != Step::Analyzing {
            return None;
        }
        let job_id = self.state.job.as_ref()?.id.clone();
        let client = Arc::clone(&self.client);
        let id = job_id.clone();
        Some(PendingPoll {
            token: schedule.token,
            job_id,
            request: async move { client.get_job(&id).await }.boxed(),
        })
    }

    /// Apply a resolved tick. Outcomes from a cancelled schedule are
    /// discarded without touching state.
    pub async fn apply_poll(&mut self, outcome: PollOutcome) -> TickOutcome {
        let current = self.schedule.as_ref().map(|s| s.token);
        if current != Some(outcome.token) || self.state.step != Step::Analyzing {
            warn!(
                "Discarding stale status for job {} (generation {})",
                outcome.job_id, outcome.token.generation
            );
            return TickOutcome::Discarded;
        }

        let payload = match outcome.result {
            Ok(payload) => payload,
            Err(e) => {
                self.cancel_polling();
                self.fail(e.user_message(MSG_POLL_FAILED));
                self.notify();
                return TickOutcome::Failed;
            }
        };

        let job = Job::new(outcome.job_id, &poll_status(payload.as_ref()));
        debug!("Job {} status: {}", job.id, job.status_text);
        self.observer.on_status(&job.id, &job.status_text);
        let status = job.status.clone();
        let job_id = job.id.clone();
        self.state.job = Some(job);

        let outcome = match status {
            JobStatus::Done => {
                self.cancel_polling();
                match self.fetch_result(&job_id).await {
                    Ok(()) => TickOutcome::Completed,
                    Err(e) => {
                        self.fail(e.user_message(MSG_POLL_FAILED));
                        TickOutcome::Failed
                    }
                }
            }
            JobStatus::Failed => {
                self.cancel_polling();
                self.fail(MSG_JOB_FAILED.to_string());
                TickOutcome::Failed
            }
            JobStatus::Processing | JobStatus::Pending(_) => TickOutcome::Continue,
        };
        self.notify();
        outcome
    }

    /// Dispatch and apply one tick immediately, without waiting.
    pub async fn poll_once(&mut self) -> TickOutcome {
        let Some(pending) = self.dispatch_poll() else {
            return TickOutcome::Idle;
        };
        let outcome = pending.resolve().await;
        self.apply_poll(outcome).await
    }

    /// Wait for the next scheduled tick, then poll.
    pub async fn next_tick(&mut self) -> TickOutcome {
        let Some(schedule) = self.schedule.as_mut() else {
            return TickOutcome::Idle;
        };
        schedule.interval.tick().await;
        self.poll_once().await
    }

    /// Poll on schedule until the job settles or polling stops.
    pub async fn run_polling(&mut self) -> TickOutcome {
        loop {
            match self.next_tick().await {
                TickOutcome::Continue => continue,
                other => return other,
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn start_polling_job(&mut self) {
        let job = match self.submit_job().await {
            Ok(job) => job,
            Err(message) => {
                self.fail(message);
                self.enter(Step::Validating);
                return;
            }
        };

        info!("Job {} created ({})", job.id, job.status_text);
        let job_id = job.id.clone();
        let processed = job.status_text == "processed";
        self.state.job = Some(job);

        if processed {
            // Backend finished synchronously.
            if let Err(e) = self.fetch_result(&job_id).await {
                self.fail(e.user_message(MSG_START_FAILED));
            }
            return;
        }

        self.enter(Step::Analyzing);
        self.arm_polling();
    }

    async fn submit_job(&self) -> Result<Job, String> {
        let file = self
            .state
            .file
            .as_ref()
            .ok_or_else(|| MSG_START_FAILED.to_string())?;
        let payload = self
            .client
            .create_job(file)
            .await
            .map_err(|e| e.user_message(MSG_START_FAILED))?;
        let id = extract_job_id(payload.as_ref()).ok_or_else(|| MSG_NO_JOB_ID.to_string())?;
        Ok(Job::new(id, &creation_status(payload.as_ref())))
    }

    async fn run_two_phase(&mut self) {
        match self.analyze_two_phase().await {
            Ok((result, warnings)) => {
                if !warnings.is_empty() {
                    self.state.warning = Some(warnings.join("; "));
                }
                self.state.result = Some(result);
                self.enter(Step::Result);
            }
            Err(message) => {
                self.fail(message);
                self.enter(Step::Validating);
            }
        }
    }

    async fn analyze_two_phase(&self) -> Result<(AnalysisResult, Vec<String>), String> {
        let file = self
            .state
            .file
            .as_ref()
            .ok_or_else(|| MSG_OCR_RUN_FAILED.to_string())?;

        let ocr_raw = self
            .client
            .extract_ocr(file)
            .await
            .map_err(|e| e.user_message(MSG_OCR_RUN_FAILED))?;
        let ocr_items = normalize_ocr_items(ocr_raw.as_ref());
        info!("OCR returned {} items", ocr_items.len());

        let request = MapDimensionsRequest {
            ocr: ocr_items.clone(),
            raw: ocr_raw.clone().unwrap_or(Value::Null),
        };
        let mapping_raw = self
            .client
            .map_dimensions(&request)
            .await
            .map_err(|e| e.user_message(MSG_OCR_RUN_FAILED))?;
        let dimension_items = normalize_dimension_items(mapping_raw.as_ref());
        let warnings = mapping_warnings(mapping_raw.as_ref());
        info!(
            "Mapped {} dimensions ({} warnings)",
            dimension_items.len(),
            warnings.len()
        );

        let result = AnalysisResult::TwoPhase {
            ocr_items,
            dimension_items,
            ocr_raw,
            mapping_raw,
            export: None,
        };
        Ok((result, warnings))
    }

    async fn fetch_result(&mut self, job_id: &str) -> Result<(), ApiError> {
        let payload = self.client.get_job_result(job_id).await?;
        let dimensions = extract_dimensions(payload.as_ref());
        debug!("Result for job {}: {:?}", job_id, dimensions);

        if let Some(job) = self.state.job.as_mut() {
            job.status = JobStatus::Done;
        }
        self.state.result = Some(AnalysisResult::Polling {
            dimensions,
            raw: payload,
        });
        self.enter(Step::Result);
        Ok(())
    }

    async fn save_dimensions(&mut self) {
        let Some(job_id) = self.state.job.as_ref().map(|j| j.id.clone()) else {
            debug!("No job to save dimensions for");
            return;
        };
        let Some(update) = self.state.dimensions().map(|d| d.to_update()) else {
            return;
        };

        self.state.saving = true;
        self.state.error = None;
        self.state.status_message = None;
        self.notify();

        let outcome = self.client.update_dimensions(&job_id, update).await;
        self.state.saving = false;

        match outcome {
            Ok(payload) => {
                // A body-less success keeps the edited values as they are.
                if let (Some(payload), Some(AnalysisResult::Polling { dimensions, .. })) =
                    (payload, self.state.result.as_mut())
                {
                    *dimensions = extract_dimensions(Some(&payload));
                }
                info!("Saved dimensions for job {}", job_id);
                self.state.status_message = Some(MSG_SAVED.to_string());
            }
            Err(e) => self.fail(e.user_message(MSG_SAVE_FAILED)),
        }
        self.notify();
    }

    fn confirm_dimensions(&mut self) {
        if let Some(AnalysisResult::TwoPhase {
            dimension_items,
            export,
            ..
        }) = self.state.result.as_mut()
        {
            let built = ConfirmationExport::from_items(dimension_items);
            info!("Confirmed {} dimensions", dimension_items.len());
            *export = Some(built);
            self.state.error = None;
            self.state.status_message = Some(MSG_CONFIRMED.to_string());
        }
        self.notify();
    }

    fn arm_polling(&mut self) {
        self.generation += 1;
        let period = self.config.poll_interval();
        self.schedule = Some(PollSchedule::arm(self.generation, period));
        info!(
            "Polling armed every {:?} (generation {})",
            period, self.generation
        );
    }

    fn cancel_polling(&mut self) {
        self.generation += 1;
        if self.schedule.take().is_some() {
            debug!("Polling cancelled");
        }
    }

    fn release_preview(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.release();
        }
    }

    fn enter(&mut self, to: Step) {
        let from = self.state.step;
        if from == to {
            return;
        }
        if from == Step::Analyzing {
            self.cancel_polling();
        }
        info!("Workflow {} → {}", from, to);
        self.state.step = to;
        self.observer.on_transition(from, to);
    }

    fn fail(&mut self, message: String) {
        warn!("{}", message);
        self.observer.on_error(&message);
        self.state.error = Some(message);
    }

    fn notify(&self) {
        self.observer.on_state_change(&self.state);
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiResult;
    use crate::model::DimensionsUpdate;
    use crate::validation::{MSG_ACCEPTABLE, MSG_LARGE_FILE_WARNING, MSG_NOT_IMAGE, MSG_NO_FILE};
    use async_trait::async_trait;

    /// Fails every call; for intents that must not reach the backend.
    struct Offline;

    fn offline() -> ApiResult {
        Err(ApiError::Transport {
            message: String::new(),
        })
    }

    #[async_trait]
    impl JobClient for Offline {
        async fn create_job(&self, _file: &SelectedFile) -> ApiResult {
            offline()
        }
        async fn get_job(&self, _job_id: &str) -> ApiResult {
            offline()
        }
        async fn get_job_result(&self, _job_id: &str) -> ApiResult {
            offline()
        }
        async fn update_dimensions(&self, _job_id: &str, _d: DimensionsUpdate) -> ApiResult {
            offline()
        }
        async fn extract_ocr(&self, _file: &SelectedFile) -> ApiResult {
            offline()
        }
        async fn map_dimensions(&self, _request: &MapDimensionsRequest) -> ApiResult {
            offline()
        }
    }

    fn controller(pipeline: AnalysisPipeline) -> WorkflowController {
        let config = ClientConfig::builder().pipeline(pipeline).build().unwrap();
        WorkflowController::new(Arc::new(Offline), config)
    }

    fn png(size: usize) -> SelectedFile {
        SelectedFile::new("pack.png", "image/png", vec![0u8; size])
    }

    #[test]
    fn starts_on_landing_without_file() {
        let ctrl = controller(AnalysisPipeline::Polling);
        assert_eq!(ctrl.state().step, Step::Landing);
        assert_eq!(ctrl.state().validation.message, MSG_NO_FILE);
        assert!(ctrl.preview_path().is_none());
        assert!(!ctrl.has_pending_timer());
    }

    #[test]
    fn pick_validates_and_stages_preview() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.pick(png(16));
        assert_eq!(ctrl.state().step, Step::Validating);
        assert!(ctrl.state().validation.valid);
        assert_eq!(ctrl.state().validation.message, MSG_ACCEPTABLE);
        assert!(ctrl.state().warning.is_none());
        assert!(ctrl.preview_path().is_some_and(Path::exists));
    }

    #[test]
    fn pick_rejects_non_image_but_keeps_file() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        let notes = SelectedFile::new("notes.txt", "text/plain", b"hi".to_vec());
        ctrl.pick(notes);
        assert_eq!(ctrl.state().step, Step::Validating);
        assert!(!ctrl.state().validation.valid);
        assert_eq!(ctrl.state().validation.message, MSG_NOT_IMAGE);
        assert!(ctrl.state().file.is_some());
    }

    #[test]
    fn large_file_sets_warning() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.pick(png(6 * 1024 * 1024));
        assert!(ctrl.state().validation.valid);
        assert_eq!(
            ctrl.state().warning.as_deref(),
            Some(MSG_LARGE_FILE_WARNING)
        );
    }

    #[test]
    fn repick_and_reset_remove_previews() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.pick(png(8));
        let first = ctrl.preview_path().unwrap().to_path_buf();
        ctrl.pick(png(8));
        let second = ctrl.preview_path().unwrap().to_path_buf();
        assert!(!first.exists());
        assert!(second.exists());

        ctrl.reset();
        assert!(!second.exists());
        assert_eq!(ctrl.state().step, Step::Landing);
        assert!(ctrl.state().file.is_none());
    }

    #[test]
    fn drop_releases_preview() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.pick(png(8));
        let path = ctrl.preview_path().unwrap().to_path_buf();
        drop(ctrl);
        assert!(!path.exists());
    }

    #[test]
    fn edits_without_result_are_noops() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.pick(png(8));
        assert!(!ctrl.edit_dimension(DimensionKey::Width, "10"));
        assert!(!ctrl.edit_dimension_item("width", "10"));
    }

    #[tokio::test]
    async fn start_is_noop_for_invalid_file() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.start_analysis().await;
        assert_eq!(ctrl.state().step, Step::Landing);
        assert!(ctrl.state().error.is_none());

        let huge = SelectedFile::metadata("huge.png", "image/png", 11 * 1024 * 1024);
        ctrl.pick(huge);
        ctrl.start_analysis().await;
        assert_eq!(ctrl.state().step, Step::Validating);
        assert!(ctrl.state().error.is_none());
        assert!(!ctrl.state().loading);
    }

    #[tokio::test]
    async fn transport_failure_uses_fallback_message() {
        let mut ctrl = controller(AnalysisPipeline::Polling);
        ctrl.pick(png(8));
        ctrl.start_analysis().await;
        assert_eq!(ctrl.state().step, Step::Validating);
        assert_eq!(ctrl.state().error.as_deref(), Some(MSG_START_FAILED));
        assert!(!ctrl.state().loading);
        assert!(!ctrl.has_pending_timer());

        let mut ctrl = controller(AnalysisPipeline::TwoPhase);
        ctrl.pick(png(8));
        ctrl.start_analysis().await;
        assert_eq!(ctrl.state().step, Step::Validating);
        assert_eq!(ctrl.state().error.as_deref(), Some(MSG_OCR_RUN_FAILED));
        assert!(ctrl.preview_path().is_some());
    }
}
