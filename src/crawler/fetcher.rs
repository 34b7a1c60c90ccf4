//! HTTP fetcher: one attempt, one classified outcome
//!
//! This module handles the single-request layer of the harvester:
//! - Building the HTTP client with browser-like headers and timeouts
//! - Issuing one GET and classifying the result
//! - A per-host in-flight ceiling, independent of the global limiter
//!
//! Retry policy lives one layer up, in the retry controller.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Result of fetching a URL.
///
/// A single attempt yields `Success`, `NotFound`, or `Transient`; the retry
/// controller additionally yields `Exhausted` once the attempt budget is
/// spent. `NotFound` is permanent and never retried.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Success { body: String },

    /// HTTP 404: the resource is gone, permanently
    NotFound,

    /// Network-level failure or non-2xx status; worth retrying
    Transient { reason: String },

    /// Every retry attempt failed; recorded in the failure log
    Exhausted {
        url: String,
        last_attempt: DateTime<Utc>,
    },
}

impl FetchOutcome {
    /// Collapses the outcome for callers that treat every miss uniformly as
    /// "skip this unit of work".
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body } => Some(body),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the HTTP client used for every request in the run
///
/// Timeouts: 10s connect, 60s total per request. The listing site serves a
/// trimmed page to unknown agents, so the client presents ordinary browser
/// headers.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("az,en-US;q=0.7,en;q=0.3"),
    );

    Client::builder()
        .user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .default_headers(headers)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Single-attempt fetcher with a per-host concurrency ceiling.
pub struct Fetcher {
    client: Client,
    host_gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    per_host_limit: usize,
}

impl Fetcher {
    pub fn new(client: Client, per_host_limit: usize) -> Self {
        Self {
            client,
            host_gates: Mutex::new(HashMap::new()),
            per_host_limit,
        }
    }

    /// Issues one GET for `url` and classifies the result. No retries.
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | 2xx | Success |
    /// | 404 | NotFound (permanent) |
    /// | other status | Transient |
    /// | timeout / connect / body error | Transient |
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        // Hold a host permit for the duration of the request so no single
        // origin sees more than per_host_limit concurrent fetches.
        let _host_permit = match self.host_gate(url) {
            Some(gate) => Some(
                gate.acquire_owned()
                    .await
                    .expect("host semaphore is never closed"),
            ),
            None => None,
        };

        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();

                if status == StatusCode::NOT_FOUND {
                    return FetchOutcome::NotFound;
                }

                if !status.is_success() {
                    return FetchOutcome::Transient {
                        reason: format!("HTTP {}", status.as_u16()),
                    };
                }

                match response.text().await {
                    Ok(body) => FetchOutcome::Success { body },
                    Err(e) => FetchOutcome::Transient {
                        reason: format!("Body read failed: {}", e),
                    },
                }
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    format!("Connection failed: {}", e)
                } else {
                    e.to_string()
                };
                FetchOutcome::Transient { reason }
            }
        }
    }

    fn host_gate(&self, url: &str) -> Option<Arc<Semaphore>> {
        let host = Url::parse(url).ok()?.host_str()?.to_string();
        let mut gates = self.host_gates.lock().unwrap();
        Some(
            gates
                .entry(host)
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
                .clone(),
        )
    }
}
