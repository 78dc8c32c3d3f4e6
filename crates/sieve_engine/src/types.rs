use std::fmt;
use std::time::Duration;

/// Position of a channel in the run, used for progress lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelProgress {
    pub index: usize,
    pub total: usize,
    pub channel: String,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A channel's page walk ended, either at the configured depth or early.
    PagesFetched(ChannelProgress),
    /// A fetch failed and will be attempted again after `delay`.
    FetchRetry {
        url: String,
        attempt: usize,
        delay: Duration,
        failure: FailureKind,
    },
    /// A channel finished extraction and normalization.
    ChannelCompleted { channel: String, configs: usize },
}

/// Everything one channel contributed to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: String,
    pub pages: usize,
    pub candidates: usize,
    pub configs: Vec<String>,
    /// False when a capped retry policy gave up before the walk finished.
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl FailureKind {
    /// Whether trying the same URL again can succeed. A malformed URL or an
    /// oversized page fails identically on every attempt.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FailureKind::InvalidUrl | FailureKind::TooLarge { .. })
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
