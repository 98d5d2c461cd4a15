//! Prices read from JSON documents with configurable paths.

use super::{non_empty, paged_quotes, QuoteFeed, RequestKind, Security};
use crate::cache::PageCache;
use crate::fetch::PageFetcher;
use crate::json::{extract_records, JsonPaths};
use crate::result::FeedResult;
use std::sync::Arc;

pub struct JsonFeed {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<PageCache<String>>,
}

impl JsonFeed {
    pub const ID: &'static str = "GENERIC-JSON";

    pub fn new(fetcher: Arc<dyn PageFetcher>, cache: Arc<PageCache<String>>) -> Self {
        Self { fetcher, cache }
    }

    /// Price records of one JSON document.
    pub fn quotes_from_json(json: &str, source: &str, paths: &JsonPaths) -> FeedResult {
        let extraction = extract_records(json, source, paths);
        FeedResult {
            series: extraction.records.into_iter().collect(),
            errors: extraction.errors,
            raw_responses: Vec::new(),
        }
    }
}

impl QuoteFeed for JsonFeed {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "JSON"
    }

    fn fetch_quotes(&self, security: &Security, kind: RequestKind, collect_raw: bool) -> FeedResult {
        // latest paths belong to the latest URL; without one the whole
        // historical configuration is used
        let config = match (kind, &security.latest_json) {
            (RequestKind::Latest, Some(latest)) if non_empty(&security.latest_feed_url).is_some() => {
                latest
            }
            _ => &security.json,
        };

        // paths are checked before the URL so misconfiguration never fetches
        let paths = match JsonPaths::from_config(config, &security.name) {
            Ok(paths) => paths,
            Err(error) => return FeedResult::with_error(error),
        };

        paged_quotes(
            self.fetcher.as_ref(),
            &self.cache,
            security,
            kind,
            collect_raw,
            |body, url| extract_records(body, url, &paths),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::json::JsonPathConfig;
    use crate::money::factorize;

    struct Fixed(&'static str);

    impl PageFetcher for Fixed {
        fn fetch(&self, _url: &str) -> Result<String, FeedError> {
            Ok(self.0.to_string())
        }
    }

    fn feed(body: &'static str) -> JsonFeed {
        JsonFeed::new(Arc::new(Fixed(body)), Arc::new(PageCache::default()))
    }

    fn security() -> Security {
        Security {
            name: "Coin".into(),
            ticker_symbol: Some("BTC".into()),
            feed: JsonFeed::ID.into(),
            feed_url: Some("https://example.com/{TICKER}".into()),
            json: JsonPathConfig {
                date: Some("$.d[*]".into()),
                close: Some("$.c[*]".into()),
                ..JsonPathConfig::default()
            },
            ..Security::default()
        }
    }

    #[test]
    fn historical_from_configured_paths() {
        let feed = feed(r#"cb({"d": [1614556800, 1614643200], "c": [10, 11]})"#);
        let result = feed.historical_quotes(&security(), true);
        assert!(result.errors.is_empty());
        assert_eq!(result.series.len(), 2);
        assert_eq!(result.raw_responses.len(), 1);
        assert_eq!(result.raw_responses[0].source, "https://example.com/BTC");
    }

    #[test]
    fn latest_uses_latest_paths() {
        let feed = feed(r#"{"d": ["2021-03-01", "2021-03-02"], "c": [10, 11], "last": {"d": "2021-03-03", "c": 12}}"#);
        let mut security = security();
        security.latest_feed_url = Some("https://example.com/{TICKER}/last".into());
        security.latest_json = Some(JsonPathConfig {
            date: Some("$.last.d".into()),
            close: Some("$.last.c".into()),
            ..JsonPathConfig::default()
        });

        let latest = feed.latest_quote(&security);
        let price = latest.price.unwrap();
        assert_eq!(price.value, factorize(12.0));
        assert_eq!(price.previous_close, factorize(12.0));
        assert_eq!(price.volume, None);
    }

    #[test]
    fn latest_paths_need_latest_url() {
        let feed = feed(r#"{"d": ["2021-03-01", "2021-03-02"], "c": [10, 11], "last": {"d": "2021-03-03", "c": 12}}"#);
        let mut security = security();
        security.latest_json = Some(JsonPathConfig {
            date: Some("$.last.d".into()),
            close: Some("$.last.c".into()),
            ..JsonPathConfig::default()
        });

        let price = feed.latest_quote(&security).price.unwrap();
        assert_eq!(price.date, chrono::NaiveDate::from_ymd_opt(2021, 3, 2).unwrap());
        assert_eq!(price.value, factorize(11.0));
        assert_eq!(price.previous_close, factorize(10.0));
    }

    #[test]
    fn missing_path_is_reported() {
        let mut security = security();
        security.json.close = None;
        let result = feed("{}").historical_quotes(&security, false);
        assert!(matches!(
            result.errors[..],
            [FeedError::MissingPath { .. }]
        ));
    }
}
