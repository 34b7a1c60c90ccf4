//! Harvest coordinator - main crawl orchestration logic
//!
//! This module contains the run loop that drives the whole harvest:
//! - Sequencing index pages strictly one after another
//! - Fanning out one task per listing card and waiting for the page's batch
//! - Spacing pages with a fixed delay
//! - Flushing durable state at shutdown, including on interrupt
//! - The terminal retry pass over previously exhausted URLs

use crate::config::Config;
use crate::crawler::context::{CommitOutcome, RunContext};
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::limiter::FetchLimiter;
use crate::crawler::retry::RetryingFetcher;
use crate::extract::{enrich, extract_cards, find_listing_id, CARD_SELECTOR};
use crate::output::{CsvSink, RunSummary};
use crate::record::{ListingRecord, PartialRecord};
use crate::state::{FailureLog, ProgressState};
use chrono::Utc;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Phases one index page moves through. Terminal is `PageComplete`; `Done`
/// marks the end of the page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    FetchingPage,
    ExtractingListings,
    FanningOutListings,
    PageComplete,
    Done,
}

impl fmt::Display for PagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchingPage => "fetching-page",
            Self::ExtractingListings => "extracting-listings",
            Self::FanningOutListings => "fanning-out-listings",
            Self::PageComplete => "page-complete",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Main harvester structure
pub struct Harvester {
    config: Arc<Config>,
    base_url: Url,
    fetcher: Arc<RetryingFetcher>,
    context: Arc<RunContext>,
}

impl Harvester {
    /// Creates a new harvester instance
    ///
    /// Loads (or, with `fresh`, ignores) the persisted progress and failure
    /// documents and builds the HTTP stack. A failure here is the only
    /// process-ending startup fault.
    pub fn new(config: Config, fresh: bool) -> crate::Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;

        let client = build_http_client()?;
        let fetcher = Fetcher::new(client, config.harvester.max_fetches_per_host as usize);
        let limiter = FetchLimiter::new(config.harvester.max_concurrent_fetches as usize);
        let retrying = RetryingFetcher::new(
            fetcher,
            limiter,
            config.harvester.max_retry_attempts,
            Duration::from_millis(config.harvester.retry_base_delay_ms),
        );

        let progress_path = PathBuf::from(&config.output.progress_path);
        let failed_path = PathBuf::from(&config.output.failed_path);

        let (progress, failures) = if fresh {
            tracing::info!("Starting fresh harvest (ignoring previous state)");
            (ProgressState::default(), FailureLog::default())
        } else {
            (
                ProgressState::load(&progress_path),
                FailureLog::load(&failed_path),
            )
        };

        let sink = CsvSink::new(config.output.records_path.as_str());
        let context = RunContext::new(
            progress,
            failures,
            sink,
            progress_path,
            failed_path,
            config.harvester.persist_every,
        );

        Ok(Self {
            config: Arc::new(config),
            base_url,
            fetcher: Arc::new(retrying),
            context: Arc::new(context),
        })
    }

    /// Runs the harvest over the configured page range
    ///
    /// Pages are processed strictly in order; listing tasks within a page run
    /// concurrently. An interrupt stops iteration between awaits; durable
    /// state is flushed unconditionally before returning, and a terminal
    /// retry pass re-attempts any URLs that exhausted their budget.
    pub async fn run(&self) -> crate::Result<RunSummary> {
        let start_page = self.config.site.start_page;
        let end_page = self.config.site.end_page;
        let started = std::time::Instant::now();

        tracing::info!(
            "Starting harvest of {} pages {}..={}",
            self.config.site.base_url,
            start_page,
            end_page
        );

        // If signal registration fails, pend forever instead of aborting the run
        let mut interrupt = Box::pin(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        });
        let mut interrupted = false;

        for page in start_page..=end_page {
            tokio::select! {
                _ = &mut interrupt => {
                    tracing::warn!("Interrupt received, stopping before page {}", page);
                    interrupted = true;
                }
                _ = self.process_page(page) => {}
            }
            if interrupted {
                break;
            }

            if page < end_page {
                tokio::time::sleep(Duration::from_millis(self.config.harvester.page_delay_ms))
                    .await;
            }
        }

        if !interrupted {
            tracing::debug!("Page iteration finished: {}", PagePhase::Done);
            let has_failures = !self.context.failures().lock().unwrap().is_empty();
            if has_failures {
                self.retry_pass().await;
            }
        }

        self.context.flush();

        let summary = self.context.summary();
        tracing::info!(
            "Harvest completed in {:?}: {} record(s) written, {} URL(s) exhausted",
            started.elapsed(),
            summary.total_persisted(),
            summary.urls_exhausted
        );

        Ok(summary)
    }

    /// Runs only the retry pass against the persisted failure log, then
    /// flushes state.
    pub async fn run_retry_only(&self) -> crate::Result<RunSummary> {
        self.retry_pass().await;
        self.context.flush();
        Ok(self.context.summary())
    }

    /// Processes a single index page
    ///
    /// A failed page fetch is warned about and skipped; pages are never
    /// retried at the page level (the failure log covers the URL level).
    async fn process_page(&self, page: u32) {
        let mut phase = PagePhase::Idle;
        self.advance(page, &mut phase, PagePhase::FetchingPage);

        let url = self.index_url(page);
        tracing::info!("Harvesting page {}: {}", page, url);

        let outcome = self
            .fetcher
            .fetch_with_retry(&url, self.context.failures())
            .await;
        if matches!(outcome, FetchOutcome::Exhausted { .. }) {
            self.context.count_exhausted();
        }
        let Some(body) = outcome.into_body() else {
            tracing::warn!("Failed to fetch page {}", page);
            self.context.count_page_failed();
            return;
        };

        self.advance(page, &mut phase, PagePhase::ExtractingListings);
        // parse tree is kept inside this block: extraction is synchronous and
        // the tree must not live across the fan-out awaits
        let partials = {
            let document = Html::parse_document(&body);
            let total = Selector::parse(CARD_SELECTOR)
                .map(|sel| document.select(&sel).count() as u64)
                .unwrap_or(0);
            let seen = self.context.seen_ids();
            let partials = extract_cards(&document, &seen, &self.base_url);

            tracing::info!(
                "Found {} listing(s) on page {}, {} new",
                total,
                page,
                partials.len()
            );
            self.context
                .count_cards(total, total.saturating_sub(partials.len() as u64));
            partials
        };

        self.advance(page, &mut phase, PagePhase::FanningOutListings);
        self.fan_out(partials).await;

        self.advance(page, &mut phase, PagePhase::PageComplete);
        self.context.count_page_visited();
    }

    /// Launches one task per partial and waits for the page's whole batch.
    /// Individual task failures are swallowed; a page's success never depends
    /// on a single listing.
    async fn fan_out(&self, partials: Vec<PartialRecord>) {
        let mut tasks = JoinSet::new();

        for partial in partials {
            let fetcher = Arc::clone(&self.fetcher);
            let context = Arc::clone(&self.context);
            let base = self.base_url.clone();
            tasks.spawn(harvest_listing(fetcher, context, base, partial));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Listing task failed: {}", e);
            }
        }
    }

    /// Re-attempts every URL in the failure log once, through the same
    /// fetch → extract → commit path as the primary crawl. The log is
    /// drained first; URLs that exhaust again repopulate it.
    pub async fn retry_pass(&self) {
        let entries = self.context.failures().lock().unwrap().drain_for_retry();
        if entries.is_empty() {
            tracing::info!("No failed URLs to retry");
            return;
        }

        tracing::info!("Retrying {} failed URL(s)", entries.len());
        for entry in entries {
            self.context.count_retried();
            self.retry_url(&entry.url).await;
        }
    }

    async fn retry_url(&self, url: &str) {
        let outcome = self
            .fetcher
            .fetch_with_retry(url, self.context.failures())
            .await;
        if matches!(outcome, FetchOutcome::Exhausted { .. }) {
            self.context.count_exhausted();
        }
        let Some(body) = outcome.into_body() else {
            tracing::warn!("Retry failed for {}", url);
            return;
        };

        let seen = self.context.seen_ids();
        match classify_retry_body(&body, url, &seen, &self.base_url) {
            RetryBody::Index(partials) => {
                tracing::info!(
                    "Retried {} is an index page with {} new listing(s)",
                    url,
                    partials.len()
                );
                self.fan_out(partials).await;
            }
            RetryBody::Detail(record) => commit(&self.context, &record),
            RetryBody::AlreadySeen => {
                tracing::debug!("Retried {} was already harvested", url);
            }
            RetryBody::Unrecognized => {
                tracing::warn!("Retried {} is neither an index page nor a listing", url);
            }
        }
    }

    fn advance(&self, page: u32, phase: &mut PagePhase, next: PagePhase) {
        tracing::debug!("Page {}: {} -> {}", page, phase, next);
        *phase = next;
    }

    fn index_url(&self, page: u32) -> String {
        let path = self
            .config
            .site
            .index_path_template
            .replace("{page}", &page.to_string());
        match self.base_url.join(&path) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}{}",
                self.config.site.base_url.trim_end_matches('/'),
                path
            ),
        }
    }
}

/// Harvests one listing: detail fetch, enrichment, commit. Runs as its own
/// task; every failure mode degrades to a warning.
async fn harvest_listing(
    fetcher: Arc<RetryingFetcher>,
    context: Arc<RunContext>,
    base: Url,
    partial: PartialRecord,
) {
    let Some(detail_url) = partial.url.clone() else {
        tracing::warn!("Listing {} has no detail URL, skipping", partial.elan_id);
        return;
    };

    tracing::info!(
        "Harvesting listing {}: {}",
        partial.elan_id,
        partial.title.as_deref().unwrap_or("(untitled)")
    );

    let outcome = fetcher.fetch_with_retry(&detail_url, context.failures()).await;
    let body = match outcome {
        FetchOutcome::Success { body } => body,
        FetchOutcome::Exhausted { .. } => {
            context.count_exhausted();
            tracing::warn!("Detail page for {} exhausted retries", partial.elan_id);
            return;
        }
        _ => {
            tracing::warn!("Failed to fetch detail page for {}", partial.elan_id);
            return;
        }
    };

    let record = {
        let document = Html::parse_document(&body);
        enrich(&document, partial, &base, Utc::now())
    };

    commit(&context, &record);
}

fn commit(context: &RunContext, record: &ListingRecord) {
    match context.commit_record(record) {
        Ok(CommitOutcome::Written(_)) => {
            tracing::info!("Saved listing {}", record.elan_id);
        }
        Ok(CommitOutcome::Duplicate) => {
            tracing::debug!("Listing {} already committed, skipping", record.elan_id);
        }
        Err(e) => {
            tracing::error!("Failed to commit listing {}: {}", record.elan_id, e);
        }
    }
}

enum RetryBody {
    Index(Vec<PartialRecord>),
    Detail(Box<ListingRecord>),
    AlreadySeen,
    Unrecognized,
}

/// A refetched body is processed symmetrically with the primary path: an
/// index page fans its cards out again, a detail page commits one record.
fn classify_retry_body(body: &str, url: &str, seen: &HashSet<String>, base: &Url) -> RetryBody {
    let document = Html::parse_document(body);

    let has_cards = Selector::parse(CARD_SELECTOR)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false);
    if has_cards {
        return RetryBody::Index(extract_cards(&document, seen, base));
    }

    match find_listing_id(document.root_element()) {
        Some(id) if seen.contains(&id) => RetryBody::AlreadySeen,
        Some(id) => {
            let partial = PartialRecord {
                elan_id: id,
                url: Some(url.to_string()),
                ..Default::default()
            };
            RetryBody::Detail(Box::new(enrich(&document, partial, base, Utc::now())))
        }
        None => RetryBody::Unrecognized,
    }
}
