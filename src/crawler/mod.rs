//! Crawler module for fetching and orchestrating the harvest
//!
//! This module contains the harvesting engine, including:
//! - Single-attempt HTTP fetching with outcome classification
//! - Bounded retries with exponential backoff
//! - Global and per-host concurrency limiting
//! - The run context carrying all mutable run state
//! - Page orchestration and the terminal retry pass

mod context;
mod coordinator;
mod fetcher;
mod limiter;
mod retry;

pub use context::{CommitOutcome, RunContext};
pub use coordinator::{Harvester, PagePhase};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher};
pub use limiter::FetchLimiter;
pub use retry::RetryingFetcher;

use crate::config::Config;
use crate::output::RunSummary;

/// Runs a complete harvest operation
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Load or ignore previous progress state
/// 2. Build the HTTP client
/// 3. Walk the configured page range, fanning out listing tasks
/// 4. Run the terminal retry pass over exhausted URLs
/// 5. Flush durable state and return the run summary
pub async fn harvest(config: Config) -> crate::Result<RunSummary> {
    let harvester = Harvester::new(config, false)?;
    harvester.run().await
}
