mod support;

use std::sync::Arc;
use std::time::Duration;

use sieve_engine::{BackoffFetcher, EngineEvent, FailureKind};
use support::{millis_policy, RecordingSink, ScriptedFetcher};

const URL: &str = "https://t.me/s/proxyfeed";

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    sieve_logging::initialize_for_tests();
    let fetcher = Arc::new(ScriptedFetcher::new().page(URL, "ok").flaky(URL, 4));
    let backoff = BackoffFetcher::new(fetcher.clone(), millis_policy());
    let sink = RecordingSink::new();

    let page = backoff.fetch(URL, sink.as_ref()).await.expect("eventually succeeds");

    assert_eq!(page, "ok");
    assert_eq!(fetcher.calls().len(), 5);
    let attempts: Vec<usize> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::FetchRetry { attempt, delay, .. } => {
                assert!(delay <= Duration::from_millis(2));
                Some(attempt)
            }
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn attempt_cap_surfaces_the_last_error() {
    let fetcher = Arc::new(ScriptedFetcher::new().always_failing(URL, FailureKind::HttpStatus(503)));
    let backoff = BackoffFetcher::new(fetcher.clone(), millis_policy().with_max_attempts(2));
    let sink = RecordingSink::new();

    let err = backoff.fetch(URL, sink.as_ref()).await.unwrap_err();

    assert_eq!(err.attempts, 2);
    assert_eq!(err.url, URL);
    assert_eq!(err.last.kind, FailureKind::HttpStatus(503));
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn elapsed_cap_stops_retrying() {
    let fetcher = Arc::new(ScriptedFetcher::new().always_failing(URL, FailureKind::Network));
    let policy = millis_policy()
        .with_delays(Duration::from_millis(5), Duration::from_millis(5))
        .with_max_elapsed(Duration::from_millis(30));
    let backoff = BackoffFetcher::new(fetcher.clone(), policy);
    let sink = RecordingSink::new();

    let err = backoff.fetch(URL, sink.as_ref()).await.unwrap_err();

    assert!(err.attempts >= 2);
    assert_eq!(err.last.kind, FailureKind::Network);
}

#[tokio::test]
async fn invalid_urls_are_not_retried() {
    let fetcher = Arc::new(ScriptedFetcher::new().always_failing(URL, FailureKind::InvalidUrl));
    let backoff = BackoffFetcher::new(fetcher.clone(), millis_policy());
    let sink = RecordingSink::new();

    let err = backoff.fetch(URL, sink.as_ref()).await.unwrap_err();

    assert_eq!(err.attempts, 1);
    assert!(sink.take().is_empty());
}
