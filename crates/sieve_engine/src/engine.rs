use std::sync::Arc;

use sieve_core::{dedupe, ChannelLedger, Classification};
use sieve_logging::sieve_info;

use crate::extract::{Extractor, MessageExtractor};
use crate::fetch::{FetchSettings, PageFetcher, ReqwestFetcher};
use crate::progress::ProgressSink;
use crate::retry::{BackoffFetcher, RetryPolicy};
use crate::scheduler::{ScheduleSettings, Scheduler};
use crate::walker::{ChannelUrls, DEFAULT_HOST};
use crate::{ChannelReport, FetchError};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub host: String,
    pub fetch: FetchSettings,
    pub retry: RetryPolicy,
    pub schedule: ScheduleSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            fetch: FetchSettings::default(),
            retry: RetryPolicy::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

/// Channel sets going into a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestInput {
    /// Channels to fetch this run.
    pub channels: Vec<String>,
    /// Every channel known before the run, including ones filtered out.
    pub known: Vec<String>,
    /// Channels already known to produce nothing.
    pub previously_invalid: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
    /// Deduplicated, sorted configs.
    pub configs: Vec<String>,
    pub classification: Classification,
    pub reports: Vec<ChannelReport>,
}

pub struct Engine {
    scheduler: Scheduler,
}

impl Engine {
    /// Engine over the real HTTP transport.
    pub fn new(config: EngineConfig) -> Result<Self, FetchError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone())?);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self, FetchError> {
        let urls = ChannelUrls::new(&config.host)?;
        let extractor: Arc<dyn Extractor> = Arc::new(MessageExtractor);
        let scheduler = Scheduler::new(
            BackoffFetcher::new(fetcher, config.retry),
            urls,
            extractor,
            config.schedule,
        );
        Ok(Self { scheduler })
    }

    /// Fetch every input channel, classify each one, and deduplicate the
    /// combined configs once all channels are done.
    pub async fn harvest(&self, input: HarvestInput, sink: Arc<dyn ProgressSink>) -> HarvestOutcome {
        let HarvestInput {
            channels,
            known,
            previously_invalid,
        } = input;
        sieve_info!("harvesting {} channel(s)", channels.len());

        let reports = self.scheduler.run(channels, sink).await;

        let mut ledger = ChannelLedger::new(known, previously_invalid);
        for report in &reports {
            ledger.record(&report.channel, report.configs.len());
        }
        let classification = ledger.finish();

        let raw_total: usize = reports.iter().map(|report| report.configs.len()).sum();
        let configs = dedupe(reports.iter().flat_map(|report| report.configs.iter().cloned()));
        sieve_info!(
            "harvest done: {} valid, {} invalid, {} config(s) from {} raw",
            classification.valid.len(),
            classification.invalid.len(),
            configs.len(),
            raw_total
        );

        HarvestOutcome {
            configs,
            classification,
            reports,
        }
    }
}
