//! Prices scraped from HTML tables.

use super::{paged_quotes, QuoteFeed, RequestKind, Security};
use crate::cache::PageCache;
use crate::domain::{EventRecord, PriceRecord};
use crate::fetch::PageFetcher;
use crate::result::{EventFeedResult, Extraction, FeedResult};
use crate::table::{extract_table, parse_html};
use std::sync::Arc;

/// Reads the first HTML table on each page whose header identifies a date
/// and a close column.
pub struct HtmlTableFeed {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<PageCache<String>>,
}

impl HtmlTableFeed {
    pub const ID: &'static str = "GENERIC_HTML_TABLE";

    pub fn new(fetcher: Arc<dyn PageFetcher>, cache: Arc<PageCache<String>>) -> Self {
        Self { fetcher, cache }
    }

    /// Price records of one HTML document. `source` names the document in
    /// error messages.
    pub fn quotes_from_html(html: &str, source: &str) -> FeedResult {
        let extraction = Self::extract_prices(html, source);
        FeedResult {
            series: extraction.records.into_iter().collect(),
            errors: extraction.errors,
            raw_responses: Vec::new(),
        }
    }

    /// Corporate events (dividends, splits) of one HTML document.
    pub fn events_from_html(html: &str, source: &str) -> EventFeedResult {
        extract_table::<EventRecord>(&parse_html(html), source, None).into()
    }

    fn extract_prices(html: &str, source: &str) -> Extraction<PriceRecord> {
        extract_table::<PriceRecord>(&parse_html(html), source, None)
    }
}

impl QuoteFeed for HtmlTableFeed {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "HTML table"
    }

    fn fetch_quotes(&self, security: &Security, kind: RequestKind, collect_raw: bool) -> FeedResult {
        paged_quotes(
            self.fetcher.as_ref(),
            &self.cache,
            security,
            kind,
            collect_raw,
            Self::extract_prices,
        )
    }
}
