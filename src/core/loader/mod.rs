use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::core::config::FeedDescriptor;
use crate::core::feed::fetcher::{
    fetch_document_with_retry, FetchError, FetchOutcome, Validators,
};
use crate::core::feed::parser::{parse_feed_bytes, render_entries, FeedParseError};
use crate::core::page::RenderedEntry;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("feed index {index} is out of range ({len} feeds configured)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("feed parse failed: {0}")]
    Parse(#[from] FeedParseError),
    #[error("feed load timed out after {0:?}")]
    TimedOut(Duration),
}

/// Resolves a feed descriptor to its rendered entries. The injected
/// counterpart of an ambient `loadFeed` global: one completion per call,
/// with the reader enforcing its timeout around the returned future.
pub trait FeedLoader {
    fn load(
        &self,
        feed: &FeedDescriptor,
    ) -> impl Future<Output = Result<Vec<RenderedEntry>, LoadError>> + Send;
}

#[derive(Debug, Clone, Default)]
struct CachedFeed {
    validators: Validators,
    entries: Vec<RenderedEntry>,
}

/// Fetch-parse-render pipeline over HTTP. Remembers cache validators per
/// URL so an unchanged feed revalidates with a 304 and re-serves the
/// previously rendered entries.
pub struct HttpFeedLoader {
    client: reqwest::Client,
    max_retries: usize,
    cache: Mutex<HashMap<String, CachedFeed>>,
}

impl HttpFeedLoader {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_retries: 2,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn cached(&self, url: &str) -> CachedFeed {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .unwrap_or_default()
    }

    fn store(&self, url: &str, cached: CachedFeed) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), cached);
    }
}

impl FeedLoader for HttpFeedLoader {
    async fn load(&self, feed: &FeedDescriptor) -> Result<Vec<RenderedEntry>, LoadError> {
        let cached = self.cached(&feed.url);
        let outcome =
            fetch_document_with_retry(&self.client, &feed.url, &cached.validators, self.max_retries)
                .await?;

        match outcome {
            FetchOutcome::NotModified => {
                tracing::debug!(url = %feed.url, "feed unchanged, serving cached entries");
                Ok(cached.entries)
            }
            FetchOutcome::Updated(document) => {
                let parsed = parse_feed_bytes(&document.body)?;
                let entries = render_entries(&parsed);
                tracing::debug!(
                    url = %feed.url,
                    feed_title = %parsed.title,
                    entries = entries.len(),
                    "feed loaded"
                );
                self.store(
                    &feed.url,
                    CachedFeed {
                        validators: document.validators,
                        entries: entries.clone(),
                    },
                );
                Ok(entries)
            }
        }
    }
}
