//! Feed URL templates.
//!
//! A feed URL may contain macros that are expanded per security and per page:
//!
//! | macro           | expands to                                   |
//! |-----------------|----------------------------------------------|
//! | `{TICKER}`      | ticker symbol of the security                |
//! | `{ISIN}`        | ISIN of the security                         |
//! | `{TODAY}`       | today as `YYYY-MM-DD`                        |
//! | `{TODAY:fmt}`   | today in the given chrono format             |
//! | `{PAGE}`        | page number, starting at 1                   |
//! | `{OFFSET:step}` | record offset `0, step, 2*step, ...`         |
//!
//! Templates with `{PAGE}` or `{OFFSET}` describe an unbounded page sequence;
//! the consumer decides when to stop. Unknown `{...}` groups are kept as
//! literal text.

use crate::error::FeedError;
use chrono::NaiveDate;
use std::fmt::{self, Write as _};
use url::form_urlencoded::byte_serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Ticker,
    Isin,
    Today(String),
    Page,
    Offset(u64),
}

/// Values substituted for the security-dependent macros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    pub ticker: Option<String>,
    pub isin: Option<String>,
    pub today: NaiveDate,
}

impl TemplateVars {
    pub fn new(ticker: Option<&str>, isin: Option<&str>, today: NaiveDate) -> Self {
        Self {
            ticker: ticker.map(ToString::to_string),
            isin: isin.map(ToString::to_string),
            today,
        }
    }
}

/// A parsed feed URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    parts: Vec<Part>,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, FeedError> {
        let invalid = |message: String| FeedError::InvalidTemplate {
            template: template.to_string(),
            message,
        };

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                literal.push_str(&rest[open..]);
                rest = "";
                break;
            };

            let body = &after[..close];
            let (name, arg) = match body.split_once(':') {
                Some((name, arg)) => (name, Some(arg)),
                None => (body, None),
            };

            let part = match (name, arg) {
                ("TICKER", None) => Some(Part::Ticker),
                ("ISIN", None) => Some(Part::Isin),
                ("PAGE", None) => Some(Part::Page),
                ("TODAY", None) => Some(Part::Today("%Y-%m-%d".to_string())),
                ("TODAY", Some(format)) => {
                    // a format must render from a date alone; time fields fail here
                    if render_date(NaiveDate::MIN, format).is_err() {
                        return Err(invalid(format!("invalid date format {format:?}")));
                    }
                    Some(Part::Today(format.to_string()))
                }
                ("OFFSET", Some(step)) => match step.trim().parse::<u64>() {
                    Ok(step) if step > 0 => Some(Part::Offset(step)),
                    _ => return Err(invalid(format!("invalid offset step {step:?}"))),
                },
                ("OFFSET", None) => return Err(invalid("OFFSET needs a step".to_string())),
                _ => None,
            };

            match part {
                Some(part) => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                }
                None => literal.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the template expands into more than one page.
    pub fn is_paginated(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::Page | Part::Offset(_)))
    }

    /// How many consecutive pages without new records the sequence tolerates
    /// before it is abandoned, unless configured otherwise.
    pub fn default_max_failed_attempts(&self) -> u32 {
        u32::from(self.is_paginated())
    }

    /// Expand the `index`-th page (zero based).
    pub fn expand(&self, vars: &TemplateVars, index: u64) -> String {
        let mut url = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => url.push_str(text),
                Part::Ticker => url.extend(byte_serialize(
                    vars.ticker.as_deref().unwrap_or_default().as_bytes(),
                )),
                Part::Isin => url.extend(byte_serialize(
                    vars.isin.as_deref().unwrap_or_default().as_bytes(),
                )),
                Part::Today(format) => url.push_str(
                    &render_date(vars.today, format).expect("date formats are checked in parse"),
                ),
                Part::Page => url.push_str(&(index + 1).to_string()),
                Part::Offset(step) => url.push_str(&index.saturating_mul(*step).to_string()),
            }
        }
        url
    }

    /// The page URLs for a security: one URL, or an unbounded sequence if
    /// the template is paginated.
    pub fn pages<'a>(&'a self, vars: &'a TemplateVars) -> Pages<'a> {
        Pages {
            template: self,
            vars,
            next: 0,
            exhausted: false,
        }
    }
}

fn render_date(date: NaiveDate, format: &str) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))?;
    Ok(out)
}

/// Lazy iterator over the page URLs of a template.
#[derive(Debug, Clone)]
pub struct Pages<'a> {
    template: &'a UrlTemplate,
    vars: &'a TemplateVars,
    next: u64,
    exhausted: bool,
}

impl Iterator for Pages<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }
        let url = self.template.expand(self.vars, self.next);
        self.next += 1;
        self.exhausted = !self.template.is_paginated();
        Some(url)
    }
}
