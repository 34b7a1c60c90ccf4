//! Run context: the shared mutable state of one harvest run
//!
//! ProgressState, the FailureLog, the record sink, and the run counters live
//! here, behind one handle that the coordinator threads explicitly into every
//! listing task. No component reaches them as ambient state. Record commits
//! funnel through the progress mutex, giving single-writer semantics under
//! concurrent task completion; every lock is held only across synchronous
//! work, never across an await.

use crate::output::{CsvSink, RunSummary, SinkTarget};
use crate::record::ListingRecord;
use crate::state::{FailureLog, ProgressState};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// What happened to a record handed to [`RunContext::commit_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Durably written, progress updated
    Written(SinkTarget),

    /// Identifier was already committed this run; nothing written
    Duplicate,
}

#[derive(Default)]
struct Counters {
    pages_visited: AtomicU64,
    pages_failed: AtomicU64,
    cards_seen: AtomicU64,
    cards_skipped: AtomicU64,
    records_written: AtomicU64,
    records_fallback: AtomicU64,
    urls_exhausted: AtomicU64,
    urls_retried: AtomicU64,
}

pub struct RunContext {
    progress: Mutex<ProgressState>,
    failures: Mutex<FailureLog>,
    sink: Mutex<CsvSink>,
    progress_path: PathBuf,
    failed_path: PathBuf,
    persist_every: u64,
    counters: Counters,
}

impl RunContext {
    pub fn new(
        progress: ProgressState,
        failures: FailureLog,
        sink: CsvSink,
        progress_path: PathBuf,
        failed_path: PathBuf,
        persist_every: u64,
    ) -> Self {
        Self {
            progress: Mutex::new(progress),
            failures: Mutex::new(failures),
            sink: Mutex::new(sink),
            progress_path,
            failed_path,
            persist_every: persist_every.max(1),
            counters: Counters::default(),
        }
    }

    /// Snapshot of the committed identifier set, for the extraction stage.
    pub fn seen_ids(&self) -> HashSet<String> {
        self.progress.lock().unwrap().snapshot()
    }

    /// The failure log handle the retry controller records exhaustions into.
    pub fn failures(&self) -> &Mutex<FailureLog> {
        &self.failures
    }

    /// Commits one record: duplicate-checked, appended to the sink, marked in
    /// progress, persisted every `persist_every` successes.
    ///
    /// The progress lock is held across the whole commit so concurrent
    /// listing tasks serialize here. A sink fault routed to the fallback file
    /// still counts as a commit; only a fault on both sink paths errors.
    pub fn commit_record(&self, record: &ListingRecord) -> crate::Result<CommitOutcome> {
        let mut progress = self.progress.lock().unwrap();

        if progress.contains(&record.elan_id) {
            return Ok(CommitOutcome::Duplicate);
        }

        let target = self.sink.lock().unwrap().append(record)?;
        match target {
            SinkTarget::Primary => {
                self.counters.records_written.fetch_add(1, Ordering::Relaxed);
            }
            SinkTarget::Fallback => {
                self.counters.records_fallback.fetch_add(1, Ordering::Relaxed);
            }
        }

        progress.record_success(&record.elan_id);

        if progress.len() as u64 % self.persist_every == 0 {
            if let Err(e) = progress.persist(&self.progress_path) {
                tracing::error!("Failed to persist progress: {}", e);
            }
        }

        Ok(CommitOutcome::Written(target))
    }

    /// Persists both durable documents unconditionally. Called at shutdown,
    /// including on interrupt; failures are logged, never raised.
    pub fn flush(&self) {
        if let Err(e) = self.progress.lock().unwrap().persist(&self.progress_path) {
            tracing::error!("Failed to persist progress: {}", e);
        }
        if let Err(e) = self.failures.lock().unwrap().persist(&self.failed_path) {
            tracing::error!("Failed to persist failure log: {}", e);
        }
    }

    pub fn count_page_visited(&self) {
        self.counters.pages_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_page_failed(&self) {
        self.counters.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_cards(&self, seen: u64, skipped: u64) {
        self.counters.cards_seen.fetch_add(seen, Ordering::Relaxed);
        self.counters.cards_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub fn count_exhausted(&self) {
        self.counters.urls_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_retried(&self) {
        self.counters.urls_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            pages_visited: self.counters.pages_visited.load(Ordering::Relaxed),
            pages_failed: self.counters.pages_failed.load(Ordering::Relaxed),
            cards_seen: self.counters.cards_seen.load(Ordering::Relaxed),
            cards_skipped: self.counters.cards_skipped.load(Ordering::Relaxed),
            records_written: self.counters.records_written.load(Ordering::Relaxed),
            records_fallback: self.counters.records_fallback.load(Ordering::Relaxed),
            urls_exhausted: self.counters.urls_exhausted.load(Ordering::Relaxed),
            urls_retried: self.counters.urls_retried.load(Ordering::Relaxed),
        }
    }
}
