//! Durable progress tracking for crash-resumable runs
//!
//! The progress document is the set of listing identifiers already committed
//! to the sink. It is loaded once at startup, mutated after each durable
//! write, and fully rewritten on every persist. A missing file is an empty
//! state, not an error; a corrupt file is demoted to an empty state with a
//! warning so a damaged document can never block a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Set of identifiers already committed to the sink, plus the time of the
/// last persist. Field names are the stable on-disk schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(default)]
    scraped_ids: HashSet<String>,

    #[serde(default)]
    last_update: Option<DateTime<Utc>>,
}

impl ProgressState {
    /// Loads progress from `path`. Missing file ⇒ empty state; unreadable or
    /// unparseable file ⇒ warning + empty state.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No progress file at {}, starting empty", path.display());
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(state) => {
                    tracing::info!(
                        "Loaded {} previously harvested identifiers",
                        state.scraped_ids.len()
                    );
                    state
                }
                Err(e) => {
                    tracing::warn!(
                        "Progress file {} is corrupt ({}), starting empty",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read progress file {} ({}), starting empty",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// True if `id` has already been committed to the sink.
    pub fn contains(&self, id: &str) -> bool {
        self.scraped_ids.contains(id)
    }

    /// Marks `id` as committed. Returns false if it was already present.
    pub fn record_success(&mut self, id: &str) -> bool {
        self.scraped_ids.insert(id.to_string())
    }

    /// Number of committed identifiers.
    pub fn len(&self) -> usize {
        self.scraped_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scraped_ids.is_empty()
    }

    /// A snapshot of the committed set, for the pure extraction stage.
    pub fn snapshot(&self) -> HashSet<String> {
        self.scraped_ids.clone()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Rewrites the whole document at `path`, stamping the update time.
    /// Failures are the caller's to log; in-memory state stays authoritative.
    pub fn persist(&mut self, path: &Path) -> crate::Result<()> {
        self.last_update = Some(Utc::now());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
