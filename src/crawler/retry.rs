//! Retry controller: bounded attempts with exponential backoff
//!
//! This is the system's only failure-recovery mechanism. Every caller treats
//! a miss uniformly as "skip this unit of work"; nothing here can terminate
//! the run.
//!
//! | Condition | Action |
//! |-----------|--------|
//! | 2xx | return body |
//! | 404 | return immediately, no attempts consumed |
//! | transient failure `n` | sleep `base * 2^n`, try again |
//! | `max_attempts` transient failures | record in failure log, return exhausted |

use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::limiter::FetchLimiter;
use crate::state::FailureLog;
use chrono::Utc;
use std::sync::Mutex;
use std::time::Duration;

pub struct RetryingFetcher {
    fetcher: Fetcher,
    limiter: FetchLimiter,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryingFetcher {
    pub fn new(
        fetcher: Fetcher,
        limiter: FetchLimiter,
        max_attempts: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            max_attempts,
            base_delay,
        }
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    /// Fetches `url`, retrying transient failures with exponential backoff.
    ///
    /// Each attempt holds a global-limiter permit for its duration; the
    /// backoff sleep happens with the permit released. Returns only terminal
    /// outcomes: `Success`, `NotFound`, or `Exhausted`. An exhausted URL is
    /// appended to `failures` with its last-attempt time before returning.
    pub async fn fetch_with_retry(&self, url: &str, failures: &Mutex<FailureLog>) -> FetchOutcome {
        for attempt in 0..self.max_attempts {
            let outcome = {
                let _permit = self.limiter.acquire().await;
                self.fetcher.fetch(url).await
            };

            match outcome {
                FetchOutcome::Success { body } => return FetchOutcome::Success { body },
                FetchOutcome::NotFound => {
                    tracing::warn!("404 Not Found: {}", url);
                    return FetchOutcome::NotFound;
                }
                FetchOutcome::Transient { reason } => {
                    let wait = self.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        "{} for {}, retry {}/{} after {:?}",
                        reason,
                        url,
                        attempt + 1,
                        self.max_attempts,
                        wait
                    );
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(wait).await;
                    }
                }
                exhausted @ FetchOutcome::Exhausted { .. } => return exhausted,
            }
        }

        let last_attempt = Utc::now();
        failures
            .lock()
            .unwrap()
            .record_exhausted(url, last_attempt);

        FetchOutcome::Exhausted {
            url: url.to_string(),
            last_attempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::build_http_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn retrying(max_attempts: u32) -> RetryingFetcher {
        RetryingFetcher::new(
            Fetcher::new(build_http_client().unwrap(), 5),
            FetchLimiter::new(5),
            max_attempts,
            Duration::from_millis(5),
        )
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body"))
            .expect(1)
            .mount(&server)
            .await;

        let failures = Mutex::new(FailureLog::default());
        let outcome = retrying(5)
            .fetch_with_retry(&format!("{}/ok", server.uri()), &failures)
            .await;

        assert_eq!(outcome.into_body().as_deref(), Some("body"));
        assert!(failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_consumes_one_attempt_and_no_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let failures = Mutex::new(FailureLog::default());
        let start = std::time::Instant::now();
        let outcome = retrying(5)
            .fetch_with_retry(&format!("{}/gone", server.uri()), &failures)
            .await;

        assert!(matches!(outcome, FetchOutcome::NotFound));
        // a backoff sleep would dwarf this bound
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let failures = Mutex::new(FailureLog::default());
        let url = format!("{}/broken", server.uri());
        let outcome = retrying(3).fetch_with_retry(&url, &failures).await;

        assert!(matches!(outcome, FetchOutcome::Exhausted { .. }));
        let log = failures.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].url, url);
    }

    #[tokio::test]
    async fn test_backoff_delays_are_non_decreasing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let failures = Mutex::new(FailureLog::default());
        let base = Duration::from_millis(20);
        let retrying = RetryingFetcher::new(
            Fetcher::new(build_http_client().unwrap(), 5),
            FetchLimiter::new(5),
            3,
            base,
        );

        let start = std::time::Instant::now();
        retrying
            .fetch_with_retry(&format!("{}/broken", server.uri()), &failures)
            .await;

        // sleeps between 3 attempts: base * (2^0 + 2^1) = 60ms minimum
        assert!(start.elapsed() >= base * 3);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let failures = Mutex::new(FailureLog::default());
        let outcome = retrying(5)
            .fetch_with_retry(&format!("{}/flaky", server.uri()), &failures)
            .await;

        assert_eq!(outcome.into_body().as_deref(), Some("recovered"));
        assert!(failures.lock().unwrap().is_empty());
    }
}
