//! Output module: record sinks and run reporting
//!
//! This module handles:
//! - Appending records to the primary CSV sink with a stable column order
//! - The JSON-lines fallback path for records the CSV cannot take
//! - Aggregating and printing the end-of-run summary

mod csv_sink;
mod fallback;
pub mod summary;

pub use csv_sink::{CsvSink, SinkTarget};
pub use fallback::FallbackSink;
pub use summary::{print_summary, RunSummary};
