//! Fixed-point quote representation.
//!
//! Every monetary value in the engine (close, high, low, event amounts) is an
//! `i64` scaled by [`QUOTE_SCALE`]. Converting once at the parse boundary keeps
//! merging and comparison free of floating-point drift.

/// Number of decimal digits carried by a fixed-point quote.
pub const QUOTE_DIGITS: u32 = 8;

/// Scale factor applied to every quote: 10^8.
pub const QUOTE_SCALE: i64 = 10_i64.pow(QUOTE_DIGITS);

/// Convert a floating-point value into the fixed-point representation,
/// rounding half away from zero.
pub fn factorize(value: f64) -> i64 {
    (value * QUOTE_SCALE as f64).round() as i64
}

/// Render a fixed-point quote with at least two and at most eight decimals.
pub fn format_quote(quote: i64) -> String {
    let sign = if quote < 0 { "-" } else { "" };
    let abs = quote.unsigned_abs();
    let scale = QUOTE_SCALE as u64;
    let whole = abs / scale;
    let frac = format!("{:0width$}", abs % scale, width = QUOTE_DIGITS as usize);
    let trimmed = frac.trim_end_matches('0');
    let frac = if trimmed.len() < 2 {
        &frac[..2]
    } else {
        trimmed
    };
    format!("{sign}{whole}.{frac}")
}
