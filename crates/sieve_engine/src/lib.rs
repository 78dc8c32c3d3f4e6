//! Sieve engine: fetching, pagination, extraction, scheduling and stores.
mod decode;
mod engine;
mod extract;
mod fetch;
mod persist;
mod progress;
mod retry;
mod scheduler;
mod store;
mod types;
mod walker;

pub use decode::{decode_page, DecodedPage};
pub use engine::{Engine, EngineConfig, HarvestInput, HarvestOutcome};
pub use extract::{Extractor, MessageExtractor, MESSAGE_TEXT_SELECTOR};
pub use fetch::{FetchSettings, PageFetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use persist::{ensure_dir, AtomicFile, PersistError};
pub use progress::{NullSink, ProgressSink};
pub use retry::{BackoffFetcher, RetryExhausted, RetryPolicy};
pub use scheduler::{ScheduleSettings, Scheduler, DEFAULT_DEPTH, DEFAULT_THREADS};
pub use store::{ChannelListStore, ConfigTextStore, StoreError};
pub use types::{ChannelProgress, ChannelReport, EngineEvent, FailureKind, FetchError};
pub use walker::{continuation_token, ChannelUrls, PaginationWalker, Walk, DEFAULT_HOST};
