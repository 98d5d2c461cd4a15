//! Quote feeds and the feed registry.
//!
//! A feed turns a [`Security`]'s configuration into a [`FeedResult`]. Both
//! built-in feeds share the same pipeline: expand the URL template, walk the
//! pages through the shared cache and merge what each page yields. They only
//! differ in how a page body becomes records.

pub mod html_table;
pub mod json;

pub use html_table::HtmlTableFeed;
pub use json::JsonFeed;

use crate::cache::PageCache;
use crate::config::QuoteFeedConfig;
use crate::domain::{LatestPrice, PriceRecord};
use crate::error::FeedError;
use crate::fetch::PageFetcher;
use crate::json::JsonPathConfig;
use crate::merge::{fetch_and_merge, MergeOptions, PREVIEW_RECORD_LIMIT};
use crate::result::{Extraction, FeedResult};
use crate::template::{TemplateVars, UrlTemplate};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A security and the feed configuration used to fetch its prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub name: String,
    pub ticker_symbol: Option<String>,
    pub isin: Option<String>,
    /// Feed id, e.g. `GENERIC_HTML_TABLE`.
    pub feed: String,
    pub feed_url: Option<String>,
    /// URL for latest prices; the historical URL is used when absent.
    pub latest_feed_url: Option<String>,
    /// Overrides the template's default failure threshold.
    pub max_failed_attempts: Option<u32>,
    pub json: JsonPathConfig,
    /// Paths for the latest-price URL. Ignored without `latest_feed_url`.
    pub latest_json: Option<JsonPathConfig>,
}

/// What a feed call is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Historical,
    /// Historical, but stops early once enough records are held.
    Preview,
    Latest,
}

impl RequestKind {
    /// The configured URL for this kind of request, if any.
    pub fn url(self, security: &Security) -> Option<&str> {
        match self {
            Self::Latest => non_empty(&security.latest_feed_url).or(non_empty(&security.feed_url)),
            Self::Historical | Self::Preview => non_empty(&security.feed_url),
        }
    }

    fn record_limit(self) -> Option<usize> {
        match self {
            Self::Preview => Some(PREVIEW_RECORD_LIMIT),
            Self::Historical | Self::Latest => None,
        }
    }
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.trim().is_empty())
}

/// Latest price and the errors met while determining it.
#[derive(Debug, Clone, Default)]
pub struct LatestQuote {
    pub price: Option<LatestPrice>,
    pub errors: Vec<FeedError>,
}

/// A source of historical and latest prices.
pub trait QuoteFeed: Send + Sync {
    /// Stable provider id used in configuration.
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    fn fetch_quotes(&self, security: &Security, kind: RequestKind, collect_raw: bool)
        -> FeedResult;

    fn historical_quotes(&self, security: &Security, collect_raw: bool) -> FeedResult {
        self.fetch_quotes(security, RequestKind::Historical, collect_raw)
    }

    /// The first records of the historical feed, with raw responses.
    fn preview_quotes(&self, security: &Security) -> FeedResult {
        self.fetch_quotes(security, RequestKind::Preview, true)
    }

    /// The last record of the latest-price URL. The previous close comes
    /// from the record before it; volume is not reported.
    fn latest_quote(&self, security: &Security) -> LatestQuote {
        let result = self.fetch_quotes(security, RequestKind::Latest, false);
        LatestQuote {
            price: result.latest().map(|price| LatestPrice {
                volume: None,
                ..price
            }),
            errors: result.errors,
        }
    }
}

/// The pipeline shared by the built-in feeds.
pub(crate) fn paged_quotes<F>(
    fetcher: &dyn PageFetcher,
    cache: &PageCache<String>,
    security: &Security,
    kind: RequestKind,
    collect_raw: bool,
    extract: F,
) -> FeedResult
where
    F: FnMut(&str, &str) -> Extraction<PriceRecord>,
{
    let Some(url) = kind.url(security) else {
        return FeedResult::with_error(FeedError::MissingFeedUrl {
            security: security.name.clone(),
        });
    };

    let template = match UrlTemplate::parse(url) {
        Ok(template) => template,
        Err(error) => return FeedResult::with_error(error),
    };

    let vars = TemplateVars::new(
        security.ticker_symbol.as_deref(),
        security.isin.as_deref(),
        Local::now().date_naive(),
    );
    let options = MergeOptions {
        max_failed_attempts: security
            .max_failed_attempts
            .unwrap_or_else(|| template.default_max_failed_attempts()),
        record_limit: kind.record_limit(),
        collect_raw,
    };

    fetch_and_merge(template.pages(&vars), fetcher, cache, &options, extract)
}

/// Feeds by provider id.
#[derive(Clone, Default)]
pub struct FeedRegistry {
    feeds: BTreeMap<&'static str, Arc<dyn QuoteFeed>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in feeds sharing one fetcher and one cache.
    pub fn with_builtin(fetcher: Arc<dyn PageFetcher>, cache: Arc<PageCache<String>>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlTableFeed::new(
            Arc::clone(&fetcher),
            Arc::clone(&cache),
        )));
        registry.register(Arc::new(JsonFeed::new(fetcher, cache)));
        registry
    }

    /// Built-in feeds with a cache sized by `config`.
    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &QuoteFeedConfig) -> Self {
        let cache = Arc::new(PageCache::new(config.cache.ttl(), config.cache.capacity));
        Self::with_builtin(fetcher, cache)
    }

    /// Add a feed, replacing any feed with the same id.
    pub fn register(&mut self, feed: Arc<dyn QuoteFeed>) {
        self.feeds.insert(feed.id(), feed);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn QuoteFeed>> {
        self.feeds.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.feeds.keys().copied()
    }

    pub fn feed_for(&self, security: &Security) -> Result<&Arc<dyn QuoteFeed>, FeedError> {
        self.get(&security.feed).ok_or_else(|| FeedError::UnknownFeed {
            security: security.name.clone(),
            feed: security.feed.clone(),
        })
    }

    /// Historical quotes through the security's configured feed.
    pub fn historical_quotes(&self, security: &Security, collect_raw: bool) -> FeedResult {
        match self.feed_for(security) {
            Ok(feed) => feed.historical_quotes(security, collect_raw),
            Err(error) => FeedResult::with_error(error),
        }
    }

    pub fn latest_quote(&self, security: &Security) -> LatestQuote {
        match self.feed_for(security) {
            Ok(feed) => feed.latest_quote(security),
            Err(error) => LatestQuote {
                price: None,
                errors: vec![error],
            },
        }
    }
}

impl std::fmt::Debug for FeedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedRegistry")
            .field("feeds", &self.feeds.keys().collect::<Vec<_>>())
            .finish()
    }
}
