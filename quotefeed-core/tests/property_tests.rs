//! Property tests for ingestion invariants.
//!
//! Uses proptest to verify:
//! 1. Number notation: German and English renderings of a value parse alike
//! 2. Schema inference: header columns are found in any order
//! 3. Merge: one record per date, ordered, and re-merging adds nothing
//! 4. Cache: never holds more than its capacity
//! 5. Pagination: page and offset placeholders expand per index

use chrono::NaiveDate;
use proptest::prelude::*;
use quotefeed_core::cache::PageCache;
use quotefeed_core::money::QUOTE_SCALE;
use quotefeed_core::parse::parse_quote;
use quotefeed_core::table::{
    extract_table, match_row, DocumentKind, Role, Row, Table, TabularDocument,
};
use quotefeed_core::template::{TemplateVars, UrlTemplate};
use quotefeed_core::{PriceRecord, PriceSeries};
use std::time::Duration;

// ── Strategies (proptest) ────────────────────────────────────────────

fn group(whole: u64, separator: char) -> String {
    let digits = whole.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

fn arb_record() -> impl Strategy<Value = PriceRecord> {
    (0..90i64, 1..1_000_000i64).prop_map(|(day, value)| {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() + chrono::Duration::days(day);
        PriceRecord::new(date, value)
    })
}

const HEADERS: [&str; 6] = ["Datum", "Schluss", "Hoch", "Tief", "Volumen", "Eröffnung"];

// ── 1. Number notation ───────────────────────────────────────────────

proptest! {
    /// A value with two decimals reads the same in either notation.
    #[test]
    fn notations_agree(whole in 0u64..10_000_000, cents in 0u64..100) {
        let german = format!("{},{cents:02}", group(whole, '.'));
        let english = format!("{}.{cents:02}", group(whole, ','));
        let swiss = format!("{}.{cents:02}", group(whole, '\''));

        let expected = whole as i64 * QUOTE_SCALE + cents as i64 * (QUOTE_SCALE / 100);
        let g = parse_quote(&german, None).unwrap();
        prop_assert_eq!(g, parse_quote(&english, None).unwrap());
        prop_assert_eq!(g, parse_quote(&swiss, None).unwrap());
        prop_assert!((g - expected).abs() <= 1, "{} parsed as {}", german, g);
    }
}

// ── 2. Schema inference ──────────────────────────────────────────────

proptest! {
    /// Shuffled headers map each role to its column, and rows are read
    /// through that mapping.
    #[test]
    fn header_order_is_irrelevant(headers in Just(HEADERS.to_vec()).prop_shuffle()) {
        let schema = match_row(&headers[..], DocumentKind::Quotes.columns());
        prop_assert!(schema.is_valid_for(DocumentKind::Quotes));

        let position = |name: &str| headers.iter().position(|h| *h == name);
        prop_assert_eq!(schema.index_of(Role::Date), position("Datum"));
        prop_assert_eq!(schema.index_of(Role::Close), position("Schluss"));
        prop_assert_eq!(schema.index_of(Role::Volume), position("Volumen"));

        let cells: Vec<&str> = headers
            .iter()
            .map(|h| match *h {
                "Datum" => "01.03.2021",
                "Schluss" => "100,50",
                "Hoch" => "101,00",
                "Tief" => "99,00",
                "Volumen" => "1200",
                _ => "n/a",
            })
            .collect();
        let doc = TabularDocument::new(vec![Table::new(
            vec![Row::header(&headers[..])],
            vec![Row::data(&cells[..])],
        )]);

        let extraction = extract_table::<PriceRecord>(&doc, "shuffled", None);
        prop_assert!(extraction.errors.is_empty());
        prop_assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        prop_assert_eq!(record.value, 100 * QUOTE_SCALE + QUOTE_SCALE / 2);
        prop_assert_eq!(record.high, Some(101 * QUOTE_SCALE));
        prop_assert_eq!(record.low, Some(99 * QUOTE_SCALE));
        prop_assert_eq!(record.volume, Some(1200));
    }
}

// ── 3. Merge ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn merge_keeps_one_record_per_date(records in prop::collection::vec(arb_record(), 0..120)) {
        let mut series = PriceSeries::new();
        let added = series.merge(records.clone());

        let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        dates.sort();
        dates.dedup();
        prop_assert_eq!(added, dates.len());
        prop_assert_eq!(series.len(), dates.len());

        let merged: Vec<NaiveDate> = series.iter().map(|r| r.date).collect();
        prop_assert_eq!(merged, dates);

        // the last record for each date wins
        for record in series.iter() {
            let last = records.iter().rev().find(|r| r.date == record.date).unwrap();
            prop_assert_eq!(record, last);
        }
    }

    #[test]
    fn remerge_adds_nothing(records in prop::collection::vec(arb_record(), 1..60)) {
        let mut series = PriceSeries::new();
        series.merge(records.clone());
        let before = series.clone().into_vec();

        prop_assert_eq!(series.merge(records), 0);
        prop_assert_eq!(series.into_vec(), before);
    }
}

// ── 4. Cache ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn cache_respects_capacity(
        capacity in 1usize..10,
        keys in prop::collection::vec(0u8..20, 1..80),
    ) {
        let cache = PageCache::new(Duration::from_secs(300), capacity);
        for (i, key) in keys.iter().enumerate() {
            cache.put(format!("k{key}"), i);
            prop_assert!(cache.len() <= capacity);
        }

        let (last_index, last_key) = keys.iter().enumerate().last().unwrap();
        prop_assert_eq!(cache.lookup(&format!("k{last_key}")), Some(last_index));
    }
}

// ── 5. Pagination ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn page_placeholders_follow_index(index in 0u64..10_000, step in 1u64..500) {
        let vars = TemplateVars::new(Some("ACME"), None, NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());

        let page = UrlTemplate::parse("https://q.example/{TICKER}?p={PAGE}").unwrap();
        prop_assert_eq!(
            page.expand(&vars, index),
            format!("https://q.example/ACME?p={}", index + 1)
        );

        let offset = UrlTemplate::parse(&format!("https://q.example/{{TICKER}}?skip={{OFFSET:{step}}}")).unwrap();
        prop_assert_eq!(
            offset.expand(&vars, index),
            format!("https://q.example/ACME?skip={}", index * step)
        );
    }
}
