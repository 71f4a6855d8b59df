//! Observer trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::workflow::WorkflowController::with_observer`] to re-render
//! whenever the controller changes state.
//!
//! # Why callbacks instead of channels?
//!
//! The presentation layer only ever *reads* state. A callback receiving
//! `&WorkflowState` lets it redraw a terminal spinner, forward a snapshot to
//! a websocket, or record events in a test, without the controller knowing
//! how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use packdim::{Step, WorkflowObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct StepLog(Mutex<Vec<Step>>);
//!
//! impl WorkflowObserver for StepLog {
//!     fn on_transition(&self, _from: Step, to: Step) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let log: Arc<dyn WorkflowObserver> = Arc::new(StepLog::default());
//! log.on_transition(Step::Landing, Step::Validating);
//! ```

use crate::workflow::{Step, WorkflowState};
use std::sync::Arc;

/// Called by the controller as the workflow progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Callbacks run synchronously on the controller's
/// task; keep them cheap.
pub trait WorkflowObserver: Send + Sync {
    /// Called after every intent or remote result that changed state.
    fn on_state_change(&self, state: &WorkflowState) {
        let _ = state;
    }

    /// Called when the step changes.
    fn on_transition(&self, from: Step, to: Step) {
        let _ = (from, to);
    }

    /// Called for every status the backend reports while polling.
    ///
    /// # Arguments
    /// * `job_id` — the active job
    /// * `status` — lowercased status text (`"processing"` when blank)
    fn on_status(&self, job_id: &str, status: &str) {
        let _ = (job_id, status);
    }

    /// Called when an error message is surfaced to the user.
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias matching the type the controller stores.
pub type SharedObserver = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        transitions: AtomicUsize,
        statuses: AtomicUsize,
        errors: AtomicUsize,
    }

    impl WorkflowObserver for Counting {
        fn on_transition(&self, _from: Step, _to: Step) {
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_status(&self, _job_id: &str, _status: &str) {
            self.statuses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_transition(Step::Landing, Step::Validating);
        obs.on_status("job-1", "processing");
        obs.on_error("boom");
    }

    #[test]
    fn counting_observer_receives_events() {
        let obs = Counting::default();
        obs.on_transition(Step::Landing, Step::Validating);
        obs.on_transition(Step::Validating, Step::Analyzing);
        obs.on_status("job-1", "processing");
        obs.on_error("analysis job failed.");
        assert_eq!(obs.transitions.load(Ordering::SeqCst), 2);
        assert_eq!(obs.statuses.load(Ordering::SeqCst), 1);
        assert_eq!(obs.errors.load(Ordering::SeqCst), 1);
    }
}
