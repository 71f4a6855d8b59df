//! The analysis workflow state machine.
//!
//! ## Steps
//!
//! ```text
//! Landing ──pick──▶ Validating ──start──▶ Analyzing ──done──▶ Result
//!    ▲                 ▲    │                                  │
//!    │                 │    └──processed / two-phase ──────────┤
//!    └────reset────────┴──── pick (any step) ◀─────────────────┘
//! ```
//!
//! 1. [`state`]      — `WorkflowState` and its parts (plain data)
//! 2. [`poll`]       — interval schedule, generation tokens, dispatched ticks
//! 3. [`controller`] — `WorkflowController`, the only writer of state
//!
//! Polling runs only while the step is `Analyzing` with a job id. Leaving
//! `Analyzing` for any reason (re-pick, reset, result, shutdown, drop)
//! bumps the generation, and a tick that resolves afterwards is discarded.

pub mod controller;
pub mod poll;
pub mod state;

pub use controller::WorkflowController;
pub use poll::{PendingPoll, PollOutcome, PollToken, TickOutcome};
pub use state::{AnalysisResult, Job, JobStatus, Step, WorkflowState};
