//! Poll schedule and generation-tagged ticks.
//!
//! A tick is two halves: [`PendingPoll`] is the owned, `'static` remote call
//! (it borrows nothing from the controller, so it can outlive it), and
//! [`PollOutcome`] is what comes back. The controller applies an outcome only
//! if its [`PollToken`] still matches the current generation. Every
//! cancellation bumps the generation, so a late outcome is inert.

use crate::client::ApiResult;
use futures::future::BoxFuture;
use std::fmt;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Identifies the schedule a tick was dispatched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollToken {
    pub(crate) generation: u64,
}

/// What a call to `poll_once`/`next_tick`/`apply_poll` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing armed; no remote call made.
    Idle,
    /// Non-terminal status; polling continues.
    Continue,
    /// Terminal success; result fetched and `Result` entered.
    Completed,
    /// Polling stopped with an error surfaced.
    Failed,
    /// Outcome belonged to a cancelled schedule and was dropped.
    Discarded,
}

/// An armed interval plus the token it hands to every tick.
pub(crate) struct PollSchedule {
    pub(crate) token: PollToken,
    pub(crate) interval: Interval,
}

impl PollSchedule {
    /// First tick fires one full `period` after arming.
    pub(crate) fn arm(generation: u64, period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            token: PollToken { generation },
            interval,
        }
    }
}

/// A dispatched status request that has not resolved yet.
pub struct PendingPoll {
    pub(crate) token: PollToken,
    pub(crate) job_id: String,
    pub(crate) request: BoxFuture<'static, ApiResult>,
}

impl PendingPoll {
    pub fn token(&self) -> PollToken {
        self.token
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Drive the remote call to completion.
    pub async fn resolve(self) -> PollOutcome {
        let result = self.request.await;
        PollOutcome {
            token: self.token,
            job_id: self.job_id,
            result,
        }
    }
}

impl fmt::Debug for PendingPoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPoll")
            .field("token", &self.token)
            .field("job_id", &self.job_id)
            .finish_non_exhaustive()
    }
}

/// A resolved tick, ready for `WorkflowController::apply_poll`.
#[derive(Debug)]
pub struct PollOutcome {
    pub(crate) token: PollToken,
    pub(crate) job_id: String,
    pub(crate) result: ApiResult,
}

impl PollOutcome {
    pub fn token(&self) -> PollToken {
        self.token
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn result(&self) -> &ApiResult {
        &self.result
    }
}
