//! JSON feeds: a JSONPath subset and record extraction from parallel lists.

pub mod extract;
pub mod jsonpath;

use serde::{Deserialize, Serialize};

pub use extract::{
    decode_date, decode_epoch, decode_value, extract_records, strip_js_callback, JsonPaths,
};
pub use jsonpath::JsonPath;

/// Path expressions configured for a JSON feed, uncompiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonPathConfig {
    pub date: Option<String>,
    pub close: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub volume: Option<String>,
    pub date_format: Option<String>,
}
