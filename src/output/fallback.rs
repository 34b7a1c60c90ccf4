//! JSON-lines overflow sink for records the CSV could not take
//!
//! One timestamped fallback file per run, created lazily on first use, one
//! JSON object per line. This path is the last stop before losing a record,
//! so it does as little as possible: open for append, write, newline, done.

use crate::record::ListingRecord;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct FallbackSink {
    path: PathBuf,
}

impl FallbackSink {
    /// Derives the fallback path from the primary sink path:
    /// `records.csv` → `records_fallback_<timestamp>.jsonl` in the same
    /// directory.
    pub fn for_primary(primary: &Path) -> Self {
        let stem = primary
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string());
        let name = format!(
            "{}_fallback_{}.jsonl",
            stem,
            Utc::now().format("%Y%m%d_%H%M%S")
        );

        let path = match primary.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
            _ => PathBuf::from(name),
        };

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a JSON line.
    pub fn append(&self, record: &ListingRecord) -> crate::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_path_derived_from_primary() {
        let sink = FallbackSink::for_primary(Path::new("/data/out/listings.csv"));
        let name = sink.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("listings_fallback_"));
        assert!(name.ends_with(".jsonl"));
        assert_eq!(sink.path().parent(), Some(Path::new("/data/out")));
    }

    #[test]
    fn test_appends_one_json_object_per_line() {
        let dir = tempdir().unwrap();
        let sink = FallbackSink::for_primary(&dir.path().join("records.csv"));

        let mut record = ListingRecord::default();
        record.elan_id = "1".to_string();
        sink.append(&record).unwrap();
        record.elan_id = "2".to_string();
        sink.append(&record).unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let ids: Vec<String> = content
            .lines()
            .map(|line| {
                let v: serde_json::Value = serde_json::from_str(line).unwrap();
                v["elan_id"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(ids, ["1", "2"]);
    }
}
