//! Locale-aware cell parsing: numbers, fixed-point quotes and dates.

pub mod date;
pub mod number;

pub use date::parse_date;
pub use number::{parse_number, parse_quote, LanguageHint, NumberFormat};

use thiserror::Error;

/// Failure to convert a single cell's text into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("not a number: {0:?}")]
    Number(String),

    #[error("not a date: {0:?}")]
    Date(String),

    #[error("not a ratio: {0:?}")]
    Ratio(String),

    #[error("empty cell")]
    Empty,
}
