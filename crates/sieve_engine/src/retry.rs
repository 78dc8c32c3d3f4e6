use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sieve_logging::{sieve_debug, sieve_warn};
use tokio::time::{sleep, Instant};

use crate::fetch::PageFetcher;
use crate::progress::ProgressSink;
use crate::{EngineEvent, FetchError};

/// How long to wait between attempts and when to stop trying.
///
/// Both caps default to unset, which retries forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: Option<usize>,
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(25),
            max_attempts: None,
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    pub fn with_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay.min(max_delay);
        self.max_delay = max_delay.max(min_delay);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Uniformly drawn from `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        let low = self.min_delay.as_millis().min(self.max_delay.as_millis()) as u64;
        let high = self.min_delay.as_millis().max(self.max_delay.as_millis()) as u64;
        Duration::from_millis(rand::rng().random_range(low..=high))
    }

    fn allows_retry(&self, attempts: usize, elapsed: Duration) -> bool {
        let under_attempts = self.max_attempts.is_none_or(|max| attempts < max);
        let under_elapsed = self.max_elapsed.is_none_or(|max| elapsed < max);
        under_attempts && under_elapsed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("gave up on {url} after {attempts} attempt(s): {last}")]
pub struct RetryExhausted {
    pub url: String,
    pub attempts: usize,
    pub last: FetchError,
}

/// Retries a [`PageFetcher`] with randomized sleeps between attempts.
#[derive(Clone)]
pub struct BackoffFetcher {
    inner: Arc<dyn PageFetcher>,
    policy: RetryPolicy,
}

impl BackoffFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Fetch `url`, sleeping and retrying on transient failures until the
    /// policy runs out. With the default policy this only returns `Ok`.
    pub async fn fetch(&self, url: &str, sink: &dyn ProgressSink) -> Result<String, RetryExhausted> {
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.inner.fetch_page(url).await {
                Ok(page) => {
                    sieve_debug!("fetched {} ({} bytes, attempt {})", url, page.len(), attempt);
                    return Ok(page);
                }
                Err(err) => err,
            };

            if !err.kind.is_transient() || !self.policy.allows_retry(attempt, started.elapsed()) {
                sieve_warn!("giving up on {} after {} attempt(s): {}", url, attempt, err);
                return Err(RetryExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.policy.next_delay();
            sieve_warn!(
                "fetch {} failed (attempt {}): {}; retrying in {:?}",
                url,
                attempt,
                err,
                delay
            );
            sink.emit(EngineEvent::FetchRetry {
                url: url.to_string(),
                attempt,
                delay,
                failure: err.kind,
            });
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RetryPolicy;

    #[test]
    fn delays_stay_within_interval() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_secs(5) && delay <= Duration::from_secs(25));
        }
    }

    #[test]
    fn default_policy_never_stops() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry(10_000, Duration::from_secs(86_400)));
    }

    #[test]
    fn caps_stop_retrying() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        assert!(policy.allows_retry(2, Duration::ZERO));
        assert!(!policy.allows_retry(3, Duration::ZERO));

        let policy = RetryPolicy::default().with_max_elapsed(Duration::from_secs(1));
        assert!(!policy.allows_retry(1, Duration::from_secs(2)));
    }

    #[test]
    fn swapped_delays_are_reordered() {
        let policy =
            RetryPolicy::default().with_delays(Duration::from_millis(9), Duration::from_millis(3));
        assert_eq!(policy.min_delay, Duration::from_millis(3));
        assert_eq!(policy.max_delay, Duration::from_millis(9));
    }
}
