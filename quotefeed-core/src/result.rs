//! Ingestion results: records plus everything that went wrong along the way.

use crate::domain::{EventRecord, LatestPrice, PriceRecord, PriceSeries};
use crate::error::{ErrorKind, FeedError};
use serde::Serialize;

/// Records and errors produced from one page.
#[derive(Debug, Clone)]
pub struct Extraction<R> {
    pub records: Vec<R>,
    pub errors: Vec<FeedError>,
}

impl<R> Extraction<R> {
    pub fn failed(error: FeedError) -> Self {
        Self {
            records: Vec::new(),
            errors: vec![error],
        }
    }
}

impl<R> Default for Extraction<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// The body returned for one page id, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawResponse {
    pub source: String,
    pub content: String,
}

/// Outcome of a historical or latest-price ingestion call.
///
/// Built by the engine and read-only afterwards:
///
/// ```compile_fail
/// let mut result = quotefeed_core::FeedResult::default();
/// result.errors.clear();
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeedResult {
    pub(crate) series: PriceSeries,
    pub(crate) errors: Vec<FeedError>,
    pub(crate) raw_responses: Vec<RawResponse>,
}

impl FeedResult {
    /// A result carrying only an error, e.g. a configuration problem found
    /// before any fetch.
    pub fn with_error(error: FeedError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn into_series(self) -> PriceSeries {
        self.series
    }

    pub fn errors(&self) -> &[FeedError] {
        &self.errors
    }

    /// Page bodies, when collected.
    pub fn raw_responses(&self) -> &[RawResponse] {
        &self.raw_responses
    }

    pub fn records(&self) -> impl DoubleEndedIterator<Item = &PriceRecord> {
        self.series.iter()
    }

    pub fn latest(&self) -> Option<LatestPrice> {
        LatestPrice::from_series(&self.series)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &FeedError> {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }
}

/// Outcome of a corporate-event extraction.
#[derive(Debug, Clone, Default)]
pub struct EventFeedResult {
    pub events: Vec<EventRecord>,
    pub errors: Vec<FeedError>,
}

impl From<Extraction<EventRecord>> for EventFeedResult {
    fn from(extraction: Extraction<EventRecord>) -> Self {
        Self {
            events: extraction.records,
            errors: extraction.errors,
        }
    }
}
