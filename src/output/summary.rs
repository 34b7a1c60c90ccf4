//! End-of-run summary reporting

/// Counter totals for one harvest run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Index pages fetched and processed
    pub pages_visited: u64,

    /// Index pages whose fetch came up empty
    pub pages_failed: u64,

    /// Listing cards seen on index pages
    pub cards_seen: u64,

    /// Cards dropped before the detail fetch (already harvested, or not a
    /// listing)
    pub cards_skipped: u64,

    /// Records written to the primary CSV sink
    pub records_written: u64,

    /// Records routed to the fallback sink
    pub records_fallback: u64,

    /// URLs that exhausted their retry budget this run
    pub urls_exhausted: u64,

    /// URLs re-attempted by the retry pass
    pub urls_retried: u64,
}

impl RunSummary {
    /// Total records that reached durable output on either path.
    pub fn total_persisted(&self) -> u64 {
        self.records_written + self.records_fallback
    }
}

/// Prints the run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Pages:");
    println!("  Visited: {}", summary.pages_visited);
    println!("  Failed:  {}", summary.pages_failed);
    println!();

    println!("Listings:");
    println!("  Cards seen:       {}", summary.cards_seen);
    println!("  Skipped:          {}", summary.cards_skipped);
    println!("  Records written:  {}", summary.records_written);
    if summary.records_fallback > 0 {
        println!("  Fallback records: {}", summary.records_fallback);
    }
    println!();

    println!("Failures:");
    println!("  Exhausted URLs: {}", summary.urls_exhausted);
    if summary.urls_retried > 0 {
        println!("  Retried URLs:   {}", summary.urls_retried);
    }
    println!();

    println!(
        "Total persisted: {} record(s)",
        summary.total_persisted()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_persisted_counts_both_paths() {
        let summary = RunSummary {
            records_written: 10,
            records_fallback: 2,
            ..Default::default()
        };
        assert_eq!(summary.total_persisted(), 12);
    }
}
