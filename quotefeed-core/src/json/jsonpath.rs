//! A small JSONPath subset.
//!
//! Supported: `$`, `.key`, `['key']` / `["key"]`, `[n]` (negative counts
//! from the end), `[*]`, `.*` and `..key`.
//!
//! Evaluation always returns a list of matched nodes. When the last step is a
//! property that an object lacks, `null` is returned in its place so that
//! parallel lists (dates next to closes) stay index-aligned.

use crate::error::FeedError;
use serde_json::Value;
use std::fmt;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Child(String),
    Index(i64),
    Wildcard,
    Descendant(String),
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn compile(path: &str) -> Result<Self, FeedError> {
        let source = path.trim();
        let invalid = |message: &str| FeedError::InvalidPath {
            path: source.to_string(),
            message: message.to_string(),
        };

        let rest = source
            .strip_prefix('$')
            .ok_or_else(|| invalid("path must start with '$'"))?;
        let chars: Vec<char> = rest.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '.' if chars.get(i + 1) == Some(&'.') => {
                    let (name, next) = read_name(&chars, i + 2);
                    if name.is_empty() || name == "*" {
                        return Err(invalid("expected a property name after '..'"));
                    }
                    segments.push(Segment::Descendant(name));
                    i = next;
                }
                '.' => {
                    let (name, next) = read_name(&chars, i + 1);
                    match name.as_str() {
                        "" => return Err(invalid("expected a property name after '.'")),
                        "*" => segments.push(Segment::Wildcard),
                        _ => segments.push(Segment::Child(name)),
                    }
                    i = next;
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|c| *c == ']')
                        .map(|p| i + p)
                        .ok_or_else(|| invalid("unterminated '['"))?;
                    let inner: String = chars[i + 1..close].iter().collect();
                    segments.push(parse_bracket(inner.trim()).ok_or_else(|| {
                        invalid(&format!("unsupported bracket expression [{inner}]"))
                    })?);
                    i = close + 1;
                }
                c => return Err(invalid(&format!("unexpected character {c:?}"))),
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the path can match at most one node.
    pub fn is_definite(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Child(_) | Segment::Index(_)))
    }

    /// All nodes matched by the path, in document order.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        let last = self.segments.len().saturating_sub(1);

        for (position, segment) in self.segments.iter().enumerate() {
            let leaf = position == last;
            let mut next = Vec::new();

            for node in current {
                match segment {
                    Segment::Child(key) => {
                        if let Value::Object(map) = node {
                            match map.get(key) {
                                Some(found) => next.push(found),
                                None if leaf => next.push(&NULL),
                                None => {}
                            }
                        }
                    }
                    Segment::Index(index) => {
                        if let Value::Array(items) = node {
                            if let Some(found) = resolve_index(*index, items.len())
                                .and_then(|i| items.get(i))
                            {
                                next.push(found);
                            }
                        }
                    }
                    Segment::Wildcard => match node {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                    Segment::Descendant(key) => collect_descendants(node, key, &mut next),
                }
            }

            current = next;
        }

        current
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn read_name(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start.min(chars.len())..]
        .iter()
        .position(|c| *c == '.' || *c == '[')
        .map_or(chars.len(), |p| start + p);
    (chars[start.min(end)..end].iter().collect(), end)
}

fn parse_bracket(inner: &str) -> Option<Segment> {
    if inner == "*" {
        return Some(Segment::Wildcard);
    }

    for quote in ['\'', '"'] {
        if let Some(key) = inner
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return Some(Segment::Child(key.to_string()));
        }
    }

    inner.parse::<i64>().ok().map(Segment::Index)
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok()
    } else {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)
    }
}

fn collect_descendants<'a>(node: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                out.push(found);
            }
            for child in map.values() {
                collect_descendants(child, key, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_descendants(child, key, out);
            }
        }
        _ => {}
    }
}
