//! Locale-specific numeric text normalization.
//!
//! The source site formats percentages as `"45,67 %"` (comma decimal
//! separator, unit suffix) and large integers as `"1.234.567"` (period
//! thousands separators). These two functions are the only place those
//! format assumptions live.

use crate::error::ScrapeError;

/// Default delimiter separating a percentage value from its unit suffix.
pub const PERCENT_DELIMITER: &str = " %";

/// Parses a locale-formatted percentage such as `"45,67 %"` into `45.67`.
///
/// Splits on the first occurrence of `delimiter`, keeps the left segment
/// and swaps the comma decimal separator for a period. Some fields are
/// read as raw markup, where the delimiter is the literal `"&nbsp;"`.
pub fn parse_percentage(raw: &str, delimiter: &str) -> Result<f64, ScrapeError> {
    if raw.trim().is_empty() {
        return Err(ScrapeError::MalformedNumber { raw: raw.to_string() });
    }
    let value = match raw.split_once(delimiter) {
        Some((left, _)) => left,
        None => raw,
    };
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ScrapeError::MalformedNumber { raw: raw.to_string() })
}

/// Parses an integer with period thousands separators, e.g. `"1.234.567"`.
pub fn parse_integer(raw: &str) -> Result<u64, ScrapeError> {
    if raw.trim().is_empty() {
        return Err(ScrapeError::MalformedNumber { raw: raw.to_string() });
    }
    raw.trim()
        .replace('.', "")
        .parse::<u64>()
        .map_err(|_| ScrapeError::MalformedNumber { raw: raw.to_string() })
}
