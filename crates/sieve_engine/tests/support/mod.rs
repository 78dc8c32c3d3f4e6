#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sieve_engine::{EngineEvent, FailureKind, FetchError, PageFetcher, ProgressSink};

/// In-memory transport keyed by full URL.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    failures: Mutex<HashMap<String, usize>>,
    permanent: HashMap<String, FailureKind>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    /// Fail `times` transient attempts before serving the page.
    pub fn flaky(self, url: &str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(url.to_string(), times);
        self
    }

    pub fn always_failing(mut self, url: &str, kind: FailureKind) -> Self {
        self.permanent.insert(url.to_string(), kind);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(kind) = self.permanent.get(url) {
            return Err(FetchError {
                kind: kind.clone(),
                message: "scripted failure".into(),
            });
        }
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError {
                        kind: FailureKind::Network,
                        message: "connection reset".into(),
                    });
                }
            }
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Archive page with one message body per entry and an optional
/// continuation token.
pub fn channel_page(messages: &[&str], before: Option<&str>) -> String {
    let mut html = String::from("<html><head><title>feed</title></head><body><section>");
    if let Some(token) = before {
        html.push_str(&format!(
            r##"<a class="tme_messages_more" data-before="{token}" href="#"></a>"##
        ));
    }
    for message in messages {
        html.push_str(&format!(
            r#"<div class="tgme_widget_message_wrap"><div class="tgme_widget_message_text js-message_text" dir="auto">{message}</div></div>"#
        ));
    }
    html.push_str("</section></body></html>");
    html
}

pub fn millis_policy() -> sieve_engine::RetryPolicy {
    sieve_engine::RetryPolicy::default()
        .with_delays(Duration::from_millis(1), Duration::from_millis(2))
}
