use std::collections::BTreeSet;
use std::sync::Arc;

use sieve_core::{configs_from_line, NormalizedConfig};
use sieve_logging::{sieve_debug, sieve_error};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::extract::Extractor;
use crate::progress::ProgressSink;
use crate::retry::BackoffFetcher;
use crate::walker::{ChannelUrls, PaginationWalker};
use crate::{ChannelProgress, ChannelReport, EngineEvent};

pub const DEFAULT_THREADS: usize = 50;
pub const DEFAULT_DEPTH: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Channels processed at the same time.
    pub threads: usize,
    /// Archive pages per channel; each page holds about 20 messages.
    pub depth: usize,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            depth: DEFAULT_DEPTH,
        }
    }
}

/// Everything a channel task needs, cheap to clone into each task.
#[derive(Clone)]
struct ChannelWorker {
    fetcher: BackoffFetcher,
    urls: Arc<ChannelUrls>,
    extractor: Arc<dyn Extractor>,
    depth: usize,
}

impl ChannelWorker {
    async fn process(
        &self,
        index: usize,
        total: usize,
        channel: String,
        sink: &dyn ProgressSink,
    ) -> ChannelReport {
        let walk = PaginationWalker::new(&self.fetcher, &self.urls)
            .walk(&channel, self.depth, sink)
            .await;
        sink.emit(EngineEvent::PagesFetched(ChannelProgress {
            index,
            total,
            channel: channel.clone(),
            pages: walk.pages.len(),
        }));

        let candidates: BTreeSet<String> = walk
            .pages
            .iter()
            .flat_map(|page| self.extractor.extract(page))
            .collect();
        let configs: Vec<String> = candidates
            .iter()
            .flat_map(|line| configs_from_line(line))
            .map(NormalizedConfig::into_string)
            .collect();

        sieve_debug!(
            "{}: {} page(s), {} candidate line(s), {} config(s)",
            channel,
            walk.pages.len(),
            candidates.len(),
            configs.len()
        );
        sink.emit(EngineEvent::ChannelCompleted {
            channel: channel.clone(),
            configs: configs.len(),
        });

        ChannelReport {
            channel,
            pages: walk.pages.len(),
            candidates: candidates.len(),
            configs,
            complete: walk.complete,
        }
    }
}

/// Runs channels through fetch, extract and normalize with a bounded number
/// in flight. Each task keeps its own results; they are merged after join.
pub struct Scheduler {
    worker: ChannelWorker,
    threads: usize,
}

impl Scheduler {
    pub fn new(
        fetcher: BackoffFetcher,
        urls: ChannelUrls,
        extractor: Arc<dyn Extractor>,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            worker: ChannelWorker {
                fetcher,
                urls: Arc::new(urls),
                extractor,
                depth: settings.depth.max(1),
            },
            threads: settings.threads.max(1),
        }
    }

    /// Process every channel exactly once. Reports come back in completion
    /// order; a channel whose task panicked is logged and left out.
    pub async fn run(&self, channels: Vec<String>, sink: Arc<dyn ProgressSink>) -> Vec<ChannelReport> {
        let total = channels.len();
        let permits = Arc::new(Semaphore::new(self.threads));
        let mut tasks = JoinSet::new();

        for (index, channel) in channels.into_iter().enumerate() {
            let worker = self.worker.clone();
            let permits = permits.clone();
            let sink = sink.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                Some(worker.process(index, total, channel, sink.as_ref()).await)
            });
        }

        let mut reports = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => sieve_error!("channel task started after the scheduler closed"),
                Err(err) => sieve_error!("channel task failed: {}", err),
            }
        }
        reports
    }
}
