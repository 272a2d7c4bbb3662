//! Embeddable feed-reader core: an ordered feed configuration, a page model
//! whose menu visibility is a `menu-hidden` class marker, and an async
//! loader that replaces the page's rendered entries.

mod core;

use std::collections::BTreeMap;
use std::time::Duration;

pub use crate::core::config::{is_well_formed_url, ConfigError, FeedConfig, FeedDescriptor};
pub use crate::core::feed::fetcher::{FetchError, FetchOutcome, FetchedDocument, Validators};
pub use crate::core::feed::parser::FeedParseError;
pub use crate::core::feed::types::{FeedFormat, ParsedEntry, ParsedFeed};
pub use crate::core::loader::{FeedLoader, HttpFeedLoader, LoadError};
pub use crate::core::page::{ReaderPage, RenderedEntry, MENU_HIDDEN_CLASS};

const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Wires a validated [`FeedConfig`], a [`ReaderPage`], and an injected
/// [`FeedLoader`]. Feeds are addressed by zero-based index into the
/// configuration; each completed load fully replaces the page's container.
pub struct Reader<L: FeedLoader> {
    config: FeedConfig,
    page: ReaderPage,
    loader: L,
    load_timeout: Duration,
}

impl<L: FeedLoader> Reader<L> {
    /// Validates the configuration up front; a reader never starts with an
    /// empty list or a malformed descriptor.
    pub fn new(config: FeedConfig, loader: L) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            page: ReaderPage::new(),
            loader,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        })
    }

    /// Replaces the default 10s completion timeout on [`Reader::load_feed`].
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn page(&self) -> &ReaderPage {
        &self.page
    }

    pub fn menu_hidden(&self) -> bool {
        self.page.menu_hidden()
    }

    pub fn click_menu_icon(&mut self) {
        self.page.click_menu_icon();
    }

    /// Loads the feed at `index` and replaces the page's entries with the
    /// result. Completes in invocation order when awaited sequentially; a
    /// loader that never finishes surfaces as [`LoadError::TimedOut`]
    /// instead of an unbounded wait. Returns the rendered entry count.
    pub async fn load_feed(&mut self, index: usize) -> Result<usize, LoadError> {
        let len = self.config.len();
        let feed = self
            .config
            .get(index)
            .ok_or(LoadError::IndexOutOfRange { index, len })?;

        let entries = tokio::time::timeout(self.load_timeout, self.loader.load(feed))
            .await
            .map_err(|_| LoadError::TimedOut(self.load_timeout))??;

        tracing::info!(
            index,
            feed = %feed.name,
            entries = entries.len(),
            "feed loaded into page"
        );
        self.page.replace_entries(entries);
        Ok(self.page.entries().len())
    }

    /// Snapshot of reader state, keyed for stable ordering.
    pub fn health_report(&self) -> BTreeMap<String, String> {
        let mut report = BTreeMap::new();
        report.insert("feeds".to_string(), self.config.len().to_string());
        report.insert("entries".to_string(), self.page.entries().len().to_string());
        report.insert(
            "menu".to_string(),
            if self.page.menu_hidden() { "hidden" } else { "visible" }.to_string(),
        );
        report
    }
}
