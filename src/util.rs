// Utility helpers for parsing, ratios and console formatting.
//
// The loader leans on the forgiving parsers here so the rest of the code
// can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Share of `n` in `d` as a fraction in `0.0..=1.0`.
///
/// A zero denominator yields `0.0` rather than NaN; every percentage cell
/// in every worksheet goes through this.
pub fn percentage(n: u64, d: u64) -> f64 {
    if d == 0 {
        return 0.0;
    }
    n as f64 / d as f64
}

/// Parse an optional id column.
///
/// - Trims whitespace.
/// - Empty input is `Ok(None)` (the column was left blank).
/// - Anything that is not a non-negative integer is `Err(())` so the caller
///   can count the row as a parse error.
pub fn parse_id_safe(s: Option<&str>) -> Result<Option<u32>, ()> {
    let Some(s) = s else {
        return Ok(None);
    };
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<u32>().map(Some).map_err(|_| ())
}

/// Parse a `;`-separated list of sex ids, one item per attached person.
///
/// An empty column means no person at all. Within a non-empty column, a
/// blank item or `?` is a person whose sex was not recorded.
pub fn parse_sex_list(s: Option<&str>) -> Result<Vec<Option<u32>>, ()> {
    let s = match s {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Ok(Vec::new()),
    };
    s.split(';')
        .map(|item| {
            let item = item.trim();
            if item.is_empty() || item == "?" {
                Ok(None)
            } else {
                item.parse::<u32>().map(Some).map_err(|_| ())
            }
        })
        .collect()
}

/// Trim a text column, treating blank as missing.
pub fn non_empty(s: Option<String>) -> Option<String> {
    let s = s?;
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Used for counts in console messages (e.g. `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
