//! Domain records produced by the engine.
//!
//! All monetary fields are fixed-point `i64` values scaled by
//! [`QUOTE_SCALE`](crate::money::QUOTE_SCALE).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One historical price observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    /// Closing price.
    pub value: i64,
    pub high: Option<i64>,
    pub low: Option<i64>,
    pub volume: Option<i64>,
}

impl PriceRecord {
    /// Record with only a close value; high, low and volume are absent.
    pub fn new(date: NaiveDate, value: i64) -> Self {
        Self {
            date,
            value,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// The most recent price of a security together with the close before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPrice {
    pub date: NaiveDate,
    pub value: i64,
    pub high: Option<i64>,
    pub low: Option<i64>,
    pub volume: Option<i64>,
    pub previous_close: i64,
}

impl LatestPrice {
    /// Build the latest price from the last two records of a series.
    ///
    /// With a single record the previous close equals the record's own value.
    pub fn from_series(series: &PriceSeries) -> Option<Self> {
        let mut newest_first = series.iter().rev();
        let latest = newest_first.next()?;
        let previous_close = newest_first.next().map_or(latest.value, |p| p.value);

        Some(Self {
            date: latest.date,
            value: latest.value,
            high: latest.high,
            low: latest.low,
            volume: latest.volume,
            previous_close,
        })
    }
}

/// Date-keyed, ascending set of price records. At most one record per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSeries {
    records: BTreeMap<NaiveDate, PriceRecord>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record already held for its date.
    ///
    /// Returns `true` if the date was not present before.
    pub fn insert(&mut self, record: PriceRecord) -> bool {
        self.records.insert(record.date, record).is_none()
    }

    /// Insert all records with overwrite semantics; returns how many dates
    /// were new.
    pub fn merge<I: IntoIterator<Item = PriceRecord>>(&mut self, records: I) -> usize {
        records
            .into_iter()
            .map(|r| self.insert(r))
            .filter(|added| *added)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceRecord> {
        self.records.get(&date)
    }

    /// Records in ascending date order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PriceRecord> {
        self.records.values()
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.values().next()
    }

    pub fn last(&self) -> Option<&PriceRecord> {
        self.records.values().next_back()
    }

    pub fn into_vec(self) -> Vec<PriceRecord> {
        self.records.into_values().collect()
    }
}

impl FromIterator<PriceRecord> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PriceRecord>>(iter: I) -> Self {
        let mut series = Self::new();
        series.merge(iter);
        series
    }
}

impl IntoIterator for PriceSeries {
    type Item = PriceRecord;
    type IntoIter = std::collections::btree_map::IntoValues<NaiveDate, PriceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

/// Kind of a corporate event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Dividend,
    Split,
    RightsIssue,
    Other(String),
}

impl EventKind {
    /// Classify an event-type cell. Returns `None` for empty text.
    pub fn classify(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let lower = text.to_lowercase();
        let kind = if lower.contains("split") {
            Self::Split
        } else if lower.contains("dividend")
            || lower.contains("ausschüttung")
            || lower.contains("distribution")
        {
            Self::Dividend
        } else if lower.contains("bezugsrecht") || lower.contains("rights") {
            Self::RightsIssue
        } else {
            Self::Other(text.to_string())
        };
        Some(kind)
    }
}

/// Exchange ratio of a split or rights issue, e.g. `1:4`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub from: f64,
    pub to: f64,
}

/// One corporate event extracted from an event table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub date: NaiveDate,
    pub kind: EventKind,
    pub ratio: Option<Ratio>,
    pub amount: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    fn insert_overwrites_same_date() {
        let mut series = PriceSeries::new();
        assert!(series.insert(PriceRecord::new(day(1), 100)));
        assert!(!series.insert(PriceRecord::new(day(1), 200)));
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(day(1)).unwrap().value, 200);
    }

    #[test]
    fn iteration_is_date_ordered() {
        let series: PriceSeries = vec![
            PriceRecord::new(day(3), 3),
            PriceRecord::new(day(1), 1),
            PriceRecord::new(day(2), 2),
        ]
        .into_iter()
        .collect();

        let dates: Vec<_> = series.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(series.first().unwrap().value, 1);
        assert_eq!(series.last().unwrap().value, 3);
    }

    #[test]
    fn merge_counts_new_dates_only() {
        let mut series: PriceSeries = vec![PriceRecord::new(day(1), 1)].into_iter().collect();
        let added = series.merge(vec![PriceRecord::new(day(1), 5), PriceRecord::new(day(2), 2)]);
        assert_eq!(added, 1);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn latest_price_uses_previous_record() {
        let series: PriceSeries = vec![PriceRecord::new(day(1), 100), PriceRecord::new(day(2), 110)]
            .into_iter()
            .collect();
        let latest = LatestPrice::from_series(&series).unwrap();
        assert_eq!(latest.date, day(2));
        assert_eq!(latest.value, 110);
        assert_eq!(latest.previous_close, 100);
    }

    #[test]
    fn latest_price_single_record() {
        let series: PriceSeries = vec![PriceRecord::new(day(1), 100)].into_iter().collect();
        let latest = LatestPrice::from_series(&series).unwrap();
        assert_eq!(latest.previous_close, 100);
        assert!(LatestPrice::from_series(&PriceSeries::new()).is_none());
    }

    #[test]
    fn classify_events() {
        assert_eq!(EventKind::classify("Dividende"), Some(EventKind::Dividend));
        assert_eq!(EventKind::classify("Aktiensplit"), Some(EventKind::Split));
        assert_eq!(EventKind::classify("Bezugsrecht"), Some(EventKind::RightsIssue));
        assert_eq!(
            EventKind::classify("Spin-off"),
            Some(EventKind::Other("Spin-off".into()))
        );
        assert_eq!(EventKind::classify("  "), None);
    }
}
