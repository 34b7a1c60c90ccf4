//! Durable run state: progress tracking and the failed-URL log
//!
//! Both documents are owned by the orchestrator for the run's duration and
//! mutated only through the run context after a record is durably written or
//! a fetch is exhausted.

mod failures;
mod progress;

pub use failures::{FailedUrl, FailureLog};
pub use progress::ProgressState;
