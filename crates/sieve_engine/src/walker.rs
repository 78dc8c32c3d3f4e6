use std::sync::LazyLock;

use regex::Regex;
use sieve_logging::{sieve_info, sieve_trace, sieve_warn};
use url::Url;

use crate::progress::ProgressSink;
use crate::retry::BackoffFetcher;
use crate::{FailureKind, FetchError};

pub const DEFAULT_HOST: &str = "https://t.me";

static CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-before="(\d+)""#).expect("static regex"));

/// First continuation token embedded in a page, if any.
pub fn continuation_token(page: &str) -> Option<&str> {
    CONTINUATION
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
}

/// Builds archive URLs: `<host>/s/<channel>` and `...?before=<token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUrls {
    base: Url,
}

impl ChannelUrls {
    /// `host` may carry a path prefix; it is kept with or without a trailing
    /// slash.
    pub fn new(host: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(host)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{host}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("{host}: not a base url"),
            ));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn page_url(&self, channel: &str, before: Option<&str>) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(&format!("s/{channel}"))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, format!("{channel}: {err}")))?;
        if let Some(token) = before {
            url.query_pairs_mut().append_pair("before", token);
        }
        Ok(url)
    }
}

/// Pages collected for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    pub pages: Vec<String>,
    /// False when fetching stopped on an error rather than on depth or a
    /// missing continuation token.
    pub complete: bool,
}

/// Follows continuation tokens through a channel's archive, one page at a time.
pub struct PaginationWalker<'a> {
    fetcher: &'a BackoffFetcher,
    urls: &'a ChannelUrls,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(fetcher: &'a BackoffFetcher, urls: &'a ChannelUrls) -> Self {
        Self { fetcher, urls }
    }

    /// Fetch up to `depth` pages (at least one), stopping early when a page
    /// carries no continuation token.
    pub async fn walk(&self, channel: &str, depth: usize, sink: &dyn ProgressSink) -> Walk {
        let depth = depth.max(1);
        let mut walk = Walk::default();
        let mut before: Option<String> = None;

        for iteration in 1..=depth {
            let url = match self.urls.page_url(channel, before.as_deref()) {
                Ok(url) => url,
                Err(err) => {
                    sieve_warn!("skipping channel {}: {}", channel, err);
                    return walk;
                }
            };
            let page = match self.fetcher.fetch(url.as_str(), sink).await {
                Ok(page) => page,
                Err(err) => {
                    sieve_warn!("stopping walk of {} at page {}: {}", channel, iteration, err);
                    return walk;
                }
            };

            before = continuation_token(&page).map(str::to_owned);
            walk.pages.push(page);

            if before.is_none() || iteration == depth {
                sieve_info!(
                    "{}: {} page(s) fetched (depth {})",
                    channel,
                    walk.pages.len(),
                    depth
                );
                break;
            }
            sieve_trace!("{}: continuing before {:?}", channel, before);
        }

        walk.complete = true;
        walk
    }
}
