//! Paginated fetch and merge.
//!
//! Walks a page sequence, fetching each page through the cache, extracting
//! records and merging them into one date-ordered series. Paging stops once
//! more than `max_failed_attempts` consecutive pages added no new date. The
//! sequence may be unbounded; stopping on the threshold is not an error.

use crate::cache::PageCache;
use crate::domain::PriceRecord;
use crate::fetch::PageFetcher;
use crate::result::{Extraction, FeedResult, RawResponse};
use tracing::{debug, info, warn};

/// Preview calls stop once this many records are held.
pub const PREVIEW_RECORD_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub max_failed_attempts: u32,
    /// Stop once at least this many records are held.
    pub record_limit: Option<usize>,
    /// Keep every fetched body in the result.
    pub collect_raw: bool,
}

/// Fetch and merge all pages of `pages`.
///
/// `extract` turns one page body into records; it receives the body and the
/// page URL. Transport errors are recorded and count as a page without new
/// records. A later record for an already-present date replaces the earlier
/// one but does not count as new.
pub fn fetch_and_merge<I, F>(
    pages: I,
    fetcher: &dyn PageFetcher,
    cache: &PageCache<String>,
    options: &MergeOptions,
    mut extract: F,
) -> FeedResult
where
    I: IntoIterator<Item = String>,
    F: FnMut(&str, &str) -> Extraction<PriceRecord>,
{
    let mut result = FeedResult::default();
    let mut consecutive_failures = 0u32;
    let mut pages_seen = 0usize;

    for url in pages {
        pages_seen += 1;
        let body = fetch_cached(&url, fetcher, cache, &mut result);

        if options.collect_raw {
            if let Some(body) = &body {
                result.raw_responses.push(RawResponse {
                    source: url.clone(),
                    content: body.clone(),
                });
            }
        }

        let added = match body {
            Some(body) => {
                let extraction = extract(&body, &url);
                for error in &extraction.errors {
                    warn!(%url, %error, "extraction error");
                }
                result.errors.extend(extraction.errors);
                result.series.merge(extraction.records)
            }
            None => 0,
        };

        if added > 0 {
            consecutive_failures = 0;
        } else {
            consecutive_failures += 1;
            if consecutive_failures > options.max_failed_attempts {
                debug!(%url, consecutive_failures, "no new records, stopping");
                break;
            }
        }

        if options
            .record_limit
            .is_some_and(|limit| result.series.len() >= limit)
        {
            break;
        }
    }

    info!(
        pages = pages_seen,
        records = result.series.len(),
        errors = result.errors.len(),
        "merge complete"
    );
    result
}

/// Look up `url` in the cache, fetching and storing it on a miss.
fn fetch_cached(
    url: &str,
    fetcher: &dyn PageFetcher,
    cache: &PageCache<String>,
    result: &mut FeedResult,
) -> Option<String> {
    if let Some(body) = cache.lookup(url) {
        debug!(url, "cache hit");
        return Some(body);
    }

    match fetcher.fetch(url) {
        Ok(body) => {
            cache.put(url, body.clone());
            Some(body)
        }
        Err(error) => {
            warn!(url, %error, "fetch failed");
            result.errors.push(error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapFetcher {
        pages: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl MapFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<String, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| FeedError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Page bodies are comma-separated day numbers of March 2021.
    fn days(body: &str, _url: &str) -> Extraction<PriceRecord> {
        Extraction {
            records: body
                .split(',')
                .filter_map(|d| d.trim().parse::<u32>().ok())
                .map(|d| {
                    PriceRecord::new(NaiveDate::from_ymd_opt(2021, 3, d).unwrap(), i64::from(d))
                })
                .collect(),
            errors: Vec::new(),
        }
    }

    fn pages(n: usize) -> impl Iterator<Item = String> {
        (1..=n).map(|p| format!("p{p}"))
    }

    #[test]
    fn stops_after_threshold() {
        let fetcher = MapFetcher::new(&[("p1", "1,2"), ("p2", "1,2"), ("p3", "1"), ("p4", "3")]);
        let cache = PageCache::default();
        let options = MergeOptions {
            max_failed_attempts: 1,
            ..MergeOptions::default()
        };

        let result = fetch_and_merge(pages(4), &fetcher, &cache, &options, days);
        assert_eq!(result.series.len(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn transport_errors_count_as_failures() {
        let fetcher = MapFetcher::new(&[("p1", "1"), ("p3", "3")]);
        let cache = PageCache::default();
        let options = MergeOptions {
            max_failed_attempts: 1,
            ..MergeOptions::default()
        };

        let result = fetch_and_merge(pages(3), &fetcher, &cache, &options, days);
        assert_eq!(result.series.len(), 2);
        assert!(matches!(
            result.errors[..],
            [FeedError::HttpStatus { status: 404, .. }]
        ));
    }

    #[test]
    fn cached_pages_are_not_fetched_again() {
        let fetcher = MapFetcher::new(&[("p1", "1,2")]);
        let cache = PageCache::default();
        let options = MergeOptions::default();

        let first = fetch_and_merge(pages(1), &fetcher, &cache, &options, days);
        let second = fetch_and_merge(pages(1), &fetcher, &cache, &options, days);
        assert_eq!(first.series, second.series);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn record_limit_and_raw_collection() {
        let fetcher = MapFetcher::new(&[("p1", "1,2"), ("p2", "3,4"), ("p3", "5")]);
        let cache = PageCache::default();
        let options = MergeOptions {
            max_failed_attempts: 5,
            record_limit: Some(3),
            collect_raw: true,
        };

        let result = fetch_and_merge(pages(3), &fetcher, &cache, &options, days);
        assert_eq!(result.series.len(), 4);
        assert_eq!(
            result.raw_responses,
            vec![
                RawResponse {
                    source: "p1".into(),
                    content: "1,2".into()
                },
                RawResponse {
                    source: "p2".into(),
                    content: "3,4".into()
                },
            ]
        );
    }

    #[test]
    fn later_page_overwrites_same_date() {
        let fetcher = MapFetcher::new(&[("p1", "1"), ("p2", "1,2")]);
        let cache = PageCache::default();
        let mut seen = 0;
        let result = fetch_and_merge(
            pages(2),
            &fetcher,
            &cache,
            &MergeOptions::default(),
            |body, url| {
                seen += 1;
                let mut out = days(body, url);
                if url == "p2" {
                    out.records[0].value = 99;
                }
                out
            },
        );

        assert_eq!(seen, 2);
        let first = result.series.first().unwrap();
        assert_eq!(first.value, 99);
    }
}
