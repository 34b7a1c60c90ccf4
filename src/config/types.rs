use serde::Deserialize;

/// Main configuration structure for Elan-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub harvester: HarvesterConfig,
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin every request goes to (e.g. "https://birja-in.az")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Index-page path with a `{page}` placeholder for the page number
    #[serde(rename = "index-path-template")]
    pub index_path_template: String,

    /// First index page to harvest (inclusive)
    #[serde(rename = "start-page")]
    pub start_page: u32,

    /// Last index page to harvest (inclusive)
    #[serde(rename = "end-page")]
    pub end_page: u32,
}

/// Harvester behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    /// System-wide cap on concurrent fetches
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Per-host cap on concurrent fetches, independent of the global cap
    #[serde(rename = "max-fetches-per-host")]
    pub max_fetches_per_host: u32,

    /// Retry budget per URL before it is recorded as exhausted
    #[serde(rename = "max-retry-attempts")]
    pub max_retry_attempts: u32,

    /// Base backoff delay; attempt n waits base * 2^n (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,

    /// Fixed delay between index pages (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Persist progress every N successful records
    #[serde(rename = "persist-every")]
    pub persist_every: u64,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 5,
            max_fetches_per_host: 5,
            max_retry_attempts: 5,
            retry_base_delay_ms: 1000,
            page_delay_ms: 1000,
            persist_every: 10,
        }
    }
}

/// Output and state file configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV record sink
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Path to the progress document (processed identifiers)
    #[serde(rename = "progress-path")]
    pub progress_path: String,

    /// Path to the failed-URL document
    #[serde(rename = "failed-path")]
    pub failed_path: String,
}
