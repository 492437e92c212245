//! Field extraction primitives (C4, §4.1.4 "Field Extraction Primitives").
//!
//! Every function here is a leaf: pure, panic-free, and total over its
//! input. Grammar sub-parsers (`grammar::*`) build on these instead of
//! hand-rolling numeric parsing at each call site.

use tracing::warn;

use crate::error::ParseAnomaly;

/// Parses an integer that may contain thousands separators (`,`) and an
/// optional trailing multiplier suffix `T`/`M`/`B` (×10^3/10^6/10^9),
/// e.g. `"50,000"`, `"1.5M"`, `"3B"` (§4.4.6).
///
/// Never panics. Returns `None` (and logs a `ParseAnomaly`) for anything
/// that isn't a recognizable number.
pub fn parse_int_with_suffix(field: &'static str, text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (numeric_part, multiplier) = match trimmed.chars().last() {
        Some('T') | Some('t') => (&trimmed[..trimmed.len() - 1], 1_000i64),
        Some('M') | Some('m') => (&trimmed[..trimmed.len() - 1], 1_000_000i64),
        Some('B') | Some('b') => (&trimmed[..trimmed.len() - 1], 1_000_000_000i64),
        _ => (trimmed, 1i64),
    };

    let cleaned: String = numeric_part.chars().filter(|c| *c != ',').collect();

    if cleaned.is_empty() {
        warn!(anomaly = %ParseAnomaly::MalformedNumeric { field, text: text.to_string() }, "discarding field");
        return None;
    }

    match cleaned.parse::<f64>() {
        Ok(v) => Some((v * multiplier as f64) as i64),
        Err(_) => {
            warn!(anomaly = %ParseAnomaly::MalformedNumeric { field, text: text.to_string() }, "discarding field");
            None
        }
    }
}

/// Parses a plain comma-delimited integer (no multiplier suffix expected).
pub fn parse_int_commas(field: &'static str, text: &str) -> Option<i64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(anomaly = %ParseAnomaly::MalformedNumeric { field, text: text.to_string() }, "discarding field");
            None
        }
    }
}

/// Parses a percentage field that may carry a trailing `%`, a leading `-`,
/// or garbage text. Always returns a value clamped to `0..=100` — per §8,
/// `"-5%"`, `"high%"`, and `"%"` must all yield `0` without crashing.
pub fn parse_percent(field: &'static str, text: &str) -> u8 {
    let trimmed = text.trim().trim_end_matches('%');
    let value = trimmed.parse::<i64>().unwrap_or(0);
    clamp_percent(field, value)
}

/// Clamps an already-parsed integer into `0..=100`, logging if it moved.
pub fn clamp_percent(field: &'static str, value: i64) -> u8 {
    let clamped = value.clamp(0, 100);
    if clamped != value {
        warn!(anomaly = %ParseAnomaly::RangeViolation { field, value, clamped_to: clamped }, "clamped field");
    }
    clamped as u8
}

/// Clamps a sector index into `1..=bound`. Zero and negative values clamp to
/// `0` (meaning "no sector") rather than `1`, since a clamped-to-1 sector
/// would silently alias sector 1.
pub fn clamp_sector(field: &'static str, value: i64, bound: u32) -> u32 {
    if value <= 0 {
        if value != 0 {
            warn!(anomaly = %ParseAnomaly::RangeViolation { field, value, clamped_to: 0 }, "clamped field");
        }
        return 0;
    }
    let clamped = (value as u64).min(bound as u64) as u32;
    if clamped as i64 != value {
        warn!(anomaly = %ParseAnomaly::RangeViolation { field, value, clamped_to: clamped as i64 }, "clamped field");
    }
    clamped
}

/// Returns `s[start..end]` clamped to the string's actual byte length, never
/// panicking on out-of-range or non-char-boundary indices (§4.3 relies on
/// byte-exact offsets like `line[13:21]`, which real server output can
/// occasionally be too short to satisfy).
pub fn bounded_substring(s: &str, start: usize, end: usize) -> &str {
    let len = s.len();
    if start >= len {
        return "";
    }
    let mut end = end.min(len);
    let mut start = start;
    while end > start && !s.is_char_boundary(end) {
        end -= 1;
    }
    while start < end && !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..end]
}

/// Splits a line on runs of ASCII whitespace into positional parameters,
/// the way the density line (§4.4.5) and fighter-scan line (§4.4.6) are
/// addressed ("param 4", "param 10", ...).
pub fn positional_params(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// 1-indexed accessor ("param 1" is the first token).
pub fn param(params: &[&str], n: usize) -> Option<&str> {
    params.get(n.checked_sub(1)?).copied()
}
