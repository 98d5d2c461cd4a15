//! Price records from parallel JSONPath lists.

use super::jsonpath::JsonPath;
use super::JsonPathConfig;
use crate::domain::PriceRecord;
use crate::error::FeedError;
use crate::money::factorize;
use crate::parse::parse_quote;
use crate::result::Extraction;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

/// 2200-01-01T00:00:00Z in seconds since the epoch.
const FUTURE_EPOCH_SECS: i64 = 7_258_118_400;

/// Days between the epoch and 2200-01-01.
const FUTURE_EPOCH_DAYS: i64 = FUTURE_EPOCH_SECS / 86_400;

/// Compiled paths of one JSON feed.
#[derive(Debug, Clone)]
pub struct JsonPaths {
    pub date: JsonPath,
    pub close: JsonPath,
    pub high: Option<JsonPath>,
    pub low: Option<JsonPath>,
    pub volume: Option<JsonPath>,
    /// chrono format for date strings; ISO and epoch numbers otherwise.
    pub date_format: Option<String>,
}

impl JsonPaths {
    pub fn new(date: &str, close: &str) -> Result<Self, FeedError> {
        Ok(Self {
            date: JsonPath::compile(date)?,
            close: JsonPath::compile(close)?,
            high: None,
            low: None,
            volume: None,
            date_format: None,
        })
    }

    /// Compile the paths configured for `security`. Date and close paths
    /// are mandatory.
    pub fn from_config(config: &JsonPathConfig, security: &str) -> Result<Self, FeedError> {
        let missing = |which: &str| FeedError::MissingPath {
            security: security.to_string(),
            which: which.to_string(),
        };
        let optional = |path: &Option<String>| -> Result<Option<JsonPath>, FeedError> {
            path.as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(JsonPath::compile)
                .transpose()
        };

        let date = config
            .date
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| missing("date"))?;
        let close = config
            .close
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| missing("close"))?;

        Ok(Self {
            date: JsonPath::compile(date)?,
            close: JsonPath::compile(close)?,
            high: optional(&config.high)?,
            low: optional(&config.low)?,
            volume: optional(&config.volume)?,
            date_format: config.date_format.clone().filter(|f| !f.is_empty()),
        })
    }
}

/// Extract price records from a JSON document.
///
/// Date and close lists must have the same length; otherwise the page yields
/// nothing. A record is kept only if its date decodes and its close is
/// positive. High, low and volume are taken from the same index when
/// configured.
pub fn extract_records(json: &str, page: &str, paths: &JsonPaths) -> Extraction<PriceRecord> {
    let document: Value = match serde_json::from_str(strip_js_callback(json)) {
        Ok(document) => document,
        Err(e) => {
            return Extraction::failed(FeedError::InvalidJson {
                page: page.to_string(),
                message: e.to_string(),
            })
        }
    };

    let dates = paths.date.evaluate(&document);
    let closes = paths.close.evaluate(&document);

    if dates.len() != closes.len() {
        return Extraction::failed(FeedError::LengthMismatch {
            page: page.to_string(),
            dates: dates.len(),
            values: closes.len(),
        });
    }

    let optional = |path: &Option<JsonPath>| path.as_ref().map(|p| p.evaluate(&document));
    let highs = optional(&paths.high);
    let lows = optional(&paths.low);
    let volumes = optional(&paths.volume);

    let mut out = Extraction::default();

    for (index, (date, close)) in dates.iter().zip(&closes).enumerate() {
        let Some(date) = decode_date(date, paths.date_format.as_deref()) else {
            debug!(page, index, value = %date, "skipping element with undecodable date");
            continue;
        };
        let value = decode_value(close).unwrap_or(0);
        if value <= 0 {
            continue;
        }

        out.records.push(PriceRecord {
            date,
            value,
            high: element(&highs, index).and_then(decode_value),
            low: element(&lows, index).and_then(decode_value),
            volume: element(&volumes, index).and_then(decode_volume),
        });
    }

    out
}

fn element<'a>(list: &Option<Vec<&'a Value>>, index: usize) -> Option<&'a Value> {
    list.as_ref().and_then(|l| l.get(index).copied())
}

/// Decode a date element: custom format if given, else an ISO-8601 date or
/// date-time string, else an epoch number.
pub fn decode_date(value: &Value, format: Option<&str>) -> Option<NaiveDate> {
    if let Some(format) = format {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return NaiveDate::parse_from_str(&text, format)
            .or_else(|_| NaiveDateTime::parse_from_str(&text, format).map(|dt| dt.date()))
            .ok();
    }

    match value {
        Value::String(s) => decode_iso_date(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(decode_epoch),
        _ => None,
    }
}

fn decode_iso_date(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    // date-time without offset: the date part is enough
    match text.get(..10) {
        Some(head) if matches!(text.as_bytes().get(10).copied(), Some(b'T' | b' ')) => {
            NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

/// Interpret an epoch number in UTC.
///
/// Values beyond year 2200 in seconds are taken as milliseconds; values
/// below the number of days until 2200 are taken as days; anything in
/// between is seconds.
pub fn decode_epoch(raw: i64) -> Option<NaiveDate> {
    let secs = if raw > FUTURE_EPOCH_SECS {
        raw / 1000
    } else if raw < FUTURE_EPOCH_DAYS {
        raw.checked_mul(86_400)?
    } else {
        raw
    };
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Decode a quote: JSON numbers directly, strings with the locale-aware
/// parser.
pub fn decode_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().map(factorize),
        Value::String(s) => parse_quote(s, None).ok(),
        _ => None,
    }
}

fn decode_volume(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

/// Remove a JSONP wrapper such as `callback({...});`.
pub fn strip_js_callback(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    let (Some(open), Some(close)) = (trimmed.find('('), trimmed.rfind(')')) else {
        return trimmed;
    };
    let callee = trimmed[..open].trim();
    let is_callee = !callee.is_empty()
        && callee
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'));

    if is_callee && open < close {
        trimmed[open + 1..close].trim()
    } else {
        trimmed
    }
}
