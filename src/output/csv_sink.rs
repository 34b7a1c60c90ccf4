//! Append-only CSV record sink
//!
//! Records are appended one row at a time in the stable column order from
//! [`CSV_COLUMNS`]. The header is written exactly once, when the file is
//! created or still empty. Every append is flushed so a crash loses at most
//! the row being written. A write fault routes the record to the JSON-lines
//! fallback sink instead of dropping it.

use crate::output::fallback::FallbackSink;
use crate::record::{ListingRecord, CSV_COLUMNS};
use crate::HarvestError;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Where an appended record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTarget {
    Primary,
    Fallback,
}

pub struct CsvSink {
    path: PathBuf,
    fallback: FallbackSink,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let fallback = FallbackSink::for_primary(&path);
        Self { path, fallback }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fallback_path(&self) -> &Path {
        self.fallback.path()
    }

    /// Appends one record, writing the header first if the file is new.
    ///
    /// On a primary write fault the record is appended to the fallback file;
    /// only a fault on both paths surfaces as an error.
    pub fn append(&mut self, record: &ListingRecord) -> crate::Result<SinkTarget> {
        match self.append_csv(record) {
            Ok(()) => Ok(SinkTarget::Primary),
            Err(e) => {
                tracing::error!(
                    "CSV write failed for listing {} ({}), routing to fallback {}",
                    record.elan_id,
                    e,
                    self.fallback.path().display()
                );
                self.fallback.append(record)?;
                Ok(SinkTarget::Fallback)
            }
        }
    }

    fn append_csv(&self, record: &ListingRecord) -> crate::Result<()> {
        let size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if size == 0 {
            writer.write_record(CSV_COLUMNS)?;
        }

        writer.write_record(record.as_row())?;
        writer
            .flush()
            .map_err(|e| HarvestError::Sink(format!("flush failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str) -> ListingRecord {
        ListingRecord {
            elan_id: id.to_string(),
            title: "test".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");

        let mut sink = CsvSink::new(&path);
        sink.append(&record("1")).unwrap();
        sink.append(&record("2")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("elan_id,title,url"));
        assert!(lines[1].starts_with("1,test"));
        assert!(lines[2].starts_with("2,test"));
    }

    #[test]
    fn test_header_written_once_across_sink_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");

        CsvSink::new(&path).append(&record("1")).unwrap();
        CsvSink::new(&path).append(&record("2")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("elan_id").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_row_has_all_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");

        CsvSink::new(&path).append(&record("1")).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), CSV_COLUMNS.len());

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), CSV_COLUMNS.len());
        assert_eq!(row.get(0), Some("1"));
    }

    #[test]
    fn test_write_fault_routes_to_fallback() {
        let dir = tempdir().unwrap();
        // a directory at the CSV path makes every primary write fail
        let path = dir.path().join("records.csv");
        std::fs::create_dir(&path).unwrap();

        let mut sink = CsvSink::new(&path);
        let target = sink.append(&record("42")).unwrap();
        assert_eq!(target, SinkTarget::Fallback);

        let fallback = std::fs::read_to_string(sink.fallback_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(fallback.lines().next().unwrap()).unwrap();
        assert_eq!(value["elan_id"], "42");
    }
}
