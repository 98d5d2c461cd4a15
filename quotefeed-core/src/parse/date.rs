//! Date parsing for table cells.
//!
//! Patterns are tried in a fixed order and the first one that produces a
//! valid calendar date wins:
//!
//! | pattern            | example                    |
//! |--------------------|----------------------------|
//! | `y-M-d`            | `2021-03-01`               |
//! | `d.M.yy`           | `01.03.21` (year 20yy)     |
//! | `d.M.y`            | `1.3.2021`                 |
//! | `d. MMM y`         | `1. Mär 2021`, `1. März 2021`, `1. Mar. 2021` |
//! | `MMM d, y`         | `Mar 1, 2021`              |
//! | `EEEE, MMMM dd, y` | `Monday, March 01, 2021`   |

use super::ParseError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

type DatePattern = fn(&str) -> Option<NaiveDate>;

const PATTERNS: &[(&str, DatePattern)] = &[
    ("y-M-d", iso),
    ("d.M.yy", dotted_two_digit_year),
    ("d.M.y", dotted_full_year),
    ("d. MMM y", day_month_name_year),
    ("MMM d, y", english_month_day_year),
    ("EEEE, MMMM dd, y", english_weekday_month_day_year),
];

static DAY_MONTH_NAME_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.\s*([^\s\d.]+)\.?\s+(\d{4})$").unwrap());

static MONTH_NAME_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2}),\s*(\d{4})$").unwrap());

static WEEKDAY_MONTH_NAME_DAY_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+,\s+([A-Za-z]+)\s+(\d{1,2}),\s*(\d{4})$").unwrap());

const GERMAN_MONTHS: [&[&str]; 12] = [
    &["jan", "januar", "jän", "jänner"],
    &["feb", "februar"],
    &["mär", "mrz", "märz"],
    &["apr", "april"],
    &["mai"],
    &["jun", "juni"],
    &["jul", "juli"],
    &["aug", "august"],
    &["sep", "sept", "september"],
    &["okt", "oktober"],
    &["nov", "november"],
    &["dez", "dezember"],
];

const ENGLISH_MONTHS: [&[&str]; 12] = [
    &["jan", "january"],
    &["feb", "february"],
    &["mar", "march"],
    &["apr", "april"],
    &["may"],
    &["jun", "june"],
    &["jul", "july"],
    &["aug", "august"],
    &["sep", "sept", "september"],
    &["oct", "october"],
    &["nov", "november"],
    &["dec", "december"],
];

/// Parse a table cell into a date using the first matching pattern.
pub fn parse_date(text: &str) -> Result<NaiveDate, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    PATTERNS
        .iter()
        .find_map(|(_, pattern)| pattern(text))
        .ok_or_else(|| ParseError::Date(text.to_string()))
}

fn iso(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('-');
    let year = number(parts.next()?)?;
    let month = number(parts.next()?)?;
    let day = number(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn dotted_two_digit_year(text: &str) -> Option<NaiveDate> {
    let (day, month, year) = dotted(text)?;
    if year.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(2000 + number(year)? as i32, month, day)
}

fn dotted_full_year(text: &str) -> Option<NaiveDate> {
    let (day, month, year) = dotted(text)?;
    if year.len() == 2 || year.len() > 4 {
        return None;
    }
    NaiveDate::from_ymd_opt(number(year)? as i32, month, day)
}

fn dotted(text: &str) -> Option<(u32, u32, &str)> {
    let mut parts = text.split('.');
    let day = number(parts.next()?)?;
    let month = number(parts.next()?)?;
    let year = parts.next()?;
    if parts.next().is_some() || year.is_empty() || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((day, month, year))
}

fn day_month_name_year(text: &str) -> Option<NaiveDate> {
    let caps = DAY_MONTH_NAME_YEAR.captures(text)?;
    let day = number(&caps[1])?;
    let month = month_from_name(&caps[2], &GERMAN_MONTHS)
        .or_else(|| month_from_name(&caps[2], &ENGLISH_MONTHS))?;
    NaiveDate::from_ymd_opt(number(&caps[3])? as i32, month, day)
}

fn english_month_day_year(text: &str) -> Option<NaiveDate> {
    let caps = MONTH_NAME_DAY_YEAR.captures(text)?;
    let month = month_from_name(&caps[1], &ENGLISH_MONTHS)?;
    NaiveDate::from_ymd_opt(number(&caps[3])? as i32, month, number(&caps[2])?)
}

fn english_weekday_month_day_year(text: &str) -> Option<NaiveDate> {
    let caps = WEEKDAY_MONTH_NAME_DAY_YEAR.captures(text)?;
    let month = month_from_name(&caps[1], &ENGLISH_MONTHS)?;
    NaiveDate::from_ymd_opt(number(&caps[3])? as i32, month, number(&caps[2])?)
}

fn month_from_name(name: &str, table: &[&[&str]; 12]) -> Option<u32> {
    let name = name.to_lowercase();
    table
        .iter()
        .position(|names| names.contains(&name.as_str()))
        .map(|index| index as u32 + 1)
}

fn number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
