//! QuoteFeed Core: price ingestion from HTML tables and JSON documents.
//!
//! This crate contains the ingestion engine:
//! - Tabular documents and column schema inference from header text
//! - Locale-aware number and date parsing into fixed-point quotes
//! - A JSONPath subset for parallel date/value lists
//! - URL templates, a TTL/capacity-bounded page cache and the paginated merge loop
//! - Quote feeds, the feed registry and parallel refresh

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod json;
pub mod merge;
pub mod money;
pub mod parse;
pub mod refresh;
pub mod result;
pub mod table;
pub mod template;

pub use config::QuoteFeedConfig;
pub use domain::{EventKind, EventRecord, LatestPrice, PriceRecord, PriceSeries, Ratio};
pub use error::{ErrorKind, FeedError};
pub use feed::{FeedRegistry, HtmlTableFeed, JsonFeed, QuoteFeed, Security};
pub use result::{EventFeedResult, FeedResult};
