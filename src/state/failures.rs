//! Durable log of URLs that exhausted their retry budget
//!
//! Exhausted URLs are not fatal; they are appended here in order and
//! persisted at shutdown so a later retry pass can re-attempt them. The log
//! is reset at the start of a retry pass: new exhaustions during the pass
//! repopulate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One exhausted URL with the time of its last attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub time: DateTime<Utc>,
}

/// Ordered list of exhausted URLs. The `count` field mirrors the list length
/// in the on-disk document for quick inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureLog {
    #[serde(default)]
    failed_urls: Vec<FailedUrl>,

    #[serde(default)]
    count: usize,
}

impl FailureLog {
    /// Loads the log from `path`. Missing file ⇒ empty log; corrupt file ⇒
    /// warning + empty log.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(log) => log,
                Err(e) => {
                    tracing::warn!(
                        "Failure log {} is corrupt ({}), starting empty",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read failure log {} ({}), starting empty",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Appends an exhausted URL with its last-attempt time.
    pub fn record_exhausted(&mut self, url: impl Into<String>, time: DateTime<Utc>) {
        self.failed_urls.push(FailedUrl {
            url: url.into(),
            time,
        });
    }

    /// Takes every entry out of the log, leaving it empty for the retry pass
    /// to repopulate.
    pub fn drain_for_retry(&mut self) -> Vec<FailedUrl> {
        self.count = 0;
        std::mem::take(&mut self.failed_urls)
    }

    pub fn entries(&self) -> &[FailedUrl] {
        &self.failed_urls
    }

    pub fn len(&self) -> usize {
        self.failed_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed_urls.is_empty()
    }

    /// Rewrites the whole document at `path`, syncing the count field.
    /// Failures are the caller's to log; in-memory state stays authoritative.
    pub fn persist(&mut self, path: &Path) -> crate::Result<()> {
        self.count = self.failed_urls.len();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = FailureLog::load(&dir.path().join("missing.json"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut log = FailureLog::default();
        let t = Utc::now();
        log.record_exhausted("https://a.example/1", t);
        log.record_exhausted("https://a.example/2", t);

        let urls: Vec<_> = log.entries().iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls, ["https://a.example/1", "https://a.example/2"]);
    }

    #[test]
    fn test_persist_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("failed.json");

        let mut log = FailureLog::default();
        log.record_exhausted("https://a.example/x", Utc::now());
        log.persist(&path).unwrap();

        let reloaded = FailureLog::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.entries()[0].url, "https://a.example/x");
    }

    #[test]
    fn test_persist_syncs_count_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("failed.json");

        let mut log = FailureLog::default();
        log.record_exhausted("https://a.example/x", Utc::now());
        log.record_exhausted("https://a.example/y", Utc::now());
        log.persist(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["count"], 2);
    }

    #[test]
    fn test_drain_resets_the_log() {
        let mut log = FailureLog::default();
        log.record_exhausted("https://a.example/x", Utc::now());

        let drained = log.drain_for_retry();
        assert_eq!(drained.len(), 1);
        assert!(log.is_empty());
    }
}
