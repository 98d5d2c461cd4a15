//! Structured error types collected during ingestion.
//!
//! Errors never escape an ingestion call: they are accumulated in the
//! [`FeedResult`](crate::result::FeedResult) next to whatever records could be
//! extracted, and the caller decides whether a partial result is acceptable.

use crate::table::Role;
use thiserror::Error;

/// Coarse classification of a [`FeedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The page or document had no usable structure. The page yields nothing.
    Structural,
    /// A single row failed to parse and was dropped.
    Row,
    /// The page could not be fetched.
    Transport,
    /// The feed was misconfigured. Raised before any network call.
    Configuration,
}

/// An error recorded while fetching or extracting a feed.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("no table with extractable quotes found in {page}\n{raw}")]
    NoTableFound { page: String, raw: String },

    #[error("table in {page} contained no records\n{raw}")]
    NoRecords { page: String, raw: String },

    #[error("{page}: number of date ({dates}) and value ({values}) records do not match")]
    LengthMismatch {
        page: String,
        dates: usize,
        values: usize,
    },

    #[error("{page}: invalid JSON: {message}")]
    InvalidJson { page: String, message: String },

    #[error("invalid path expression {path:?}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("{page}: row {row}, column {role}: cannot parse {text:?}: {message}")]
    RowParse {
        page: String,
        row: usize,
        role: Role,
        text: String,
        message: String,
    },

    #[error("{url}: network error: {message}")]
    Network { url: String, message: String },

    #[error("{url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("missing feed URL for {security}")]
    MissingFeedUrl { security: String },

    #[error("missing {which} path for {security}")]
    MissingPath { security: String, which: String },

    #[error("invalid URL template {template:?}: {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("unknown feed {feed:?} for {security}")]
    UnknownFeed { security: String, feed: String },
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoTableFound { .. }
            | Self::NoRecords { .. }
            | Self::LengthMismatch { .. }
            | Self::InvalidJson { .. }
            | Self::InvalidPath { .. } => ErrorKind::Structural,
            Self::RowParse { .. } => ErrorKind::Row,
            Self::Network { .. } | Self::HttpStatus { .. } => ErrorKind::Transport,
            Self::MissingFeedUrl { .. }
            | Self::MissingPath { .. }
            | Self::InvalidTemplate { .. }
            | Self::UnknownFeed { .. } => ErrorKind::Configuration,
        }
    }
}
