//! Numeric parsing without an explicit locale.
//!
//! Quote pages mix German (`1.234,56`), English (`1,234.56`) and Swiss
//! (`1'234.56`) notation, usually without declaring which one. The decimal
//! mark is always the rightmost separator of a well-formed number, which is
//! enough to disambiguate when no hint is available.
//!
//! Parsing is lenient in the same way a decimal formatter is: whitespace is
//! ignored, a leading sign is accepted and parsing stops at the first
//! character that cannot belong to the number (`"100,50 EUR"` is `100.5`).

use super::ParseError;
use crate::money;

/// Language hint supplied by the caller or by the document (`<html lang>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageHint {
    German,
    English,
}

impl LanguageHint {
    /// Map a language tag to a hint. Only the primary subtag is considered,
    /// so `de-CH` and `DE` both map to [`LanguageHint::German`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(|c: char| c == '-' || c == '_').next()?.to_ascii_lowercase();
        match primary.as_str() {
            "de" => Some(Self::German),
            "en" => Some(Self::English),
            _ => None,
        }
    }
}

/// Decimal and grouping separators of one number notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal: char,
    pub grouping: char,
}

impl NumberFormat {
    pub const GERMAN: Self = Self {
        decimal: ',',
        grouping: '.',
    };

    pub const ENGLISH: Self = Self {
        decimal: '.',
        grouping: ',',
    };

    pub const APOSTROPHE: Self = Self {
        decimal: '.',
        grouping: '\'',
    };

    /// Pick the notation for `text`.
    ///
    /// Order: explicit hint, then apostrophe grouping, then whichever of the
    /// last `.` and the last `,` appears later is taken as the decimal mark.
    pub fn detect(text: &str, hint: Option<LanguageHint>) -> Self {
        match hint {
            Some(LanguageHint::German) => return Self::GERMAN,
            Some(LanguageHint::English) => return Self::ENGLISH,
            None => {}
        }

        if text.contains(is_apostrophe) {
            return Self::APOSTROPHE;
        }

        if text.rfind(',') >= text.rfind('.') {
            Self::GERMAN
        } else {
            Self::ENGLISH
        }
    }

    /// Parse `text` with this notation.
    pub fn parse(&self, text: &str) -> Result<f64, ParseError> {
        let mut canonical = String::with_capacity(text.len());
        let mut chars = text.chars().filter(|c| !c.is_whitespace()).peekable();

        if let Some(&sign) = chars.peek() {
            if sign == '-' || sign == '+' {
                if sign == '-' {
                    canonical.push('-');
                }
                chars.next();
            }
        }

        let mut digits = 0usize;
        let mut seen_decimal = false;

        for c in chars {
            if c.is_ascii_digit() {
                canonical.push(c);
                digits += 1;
            } else if c == self.decimal && !seen_decimal {
                canonical.push('.');
                seen_decimal = true;
            } else if !seen_decimal && self.is_grouping(c) {
                continue;
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError::Number(text.to_string()));
        }

        canonical
            .parse::<f64>()
            .map_err(|_| ParseError::Number(text.to_string()))
    }

    fn is_grouping(&self, c: char) -> bool {
        if self.grouping == '\'' {
            is_apostrophe(c)
        } else {
            c == self.grouping
        }
    }
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Parse a free-text number, detecting its notation.
pub fn parse_number(text: &str, hint: Option<LanguageHint>) -> Result<f64, ParseError> {
    let text = text.trim();
    NumberFormat::detect(text, hint).parse(text)
}

/// Parse a free-text number into the engine's fixed-point quote.
pub fn parse_quote(text: &str, hint: Option<LanguageHint>) -> Result<i64, ParseError> {
    parse_number(text, hint).map(money::factorize)
}
