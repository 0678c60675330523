//! Duration literal parsing and display
//!
//! Query text carries duration bounds as `<number><unit>` literals such as
//! `100ms` or `1.5s`. The translator stores them verbatim; this module
//! validates and normalizes them for display.

use std::time::Duration;
use thiserror::Error;

/// Errors for duration literals that cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration literal")]
    Empty,
    #[error("duration literal '{0}' is missing a unit (expected ns, us, ms, s, m or h)")]
    MissingUnit(String),
    #[error("duration literal '{literal}' has unknown unit '{unit}' (expected ns, us, ms, s, m or h)")]
    UnknownUnit { literal: String, unit: String },
    #[error("duration literal '{0}' has no valid number")]
    InvalidNumber(String),
    #[error("duration literal '{0}' is negative")]
    Negative(String),
    #[error("duration literal '{0}' is out of range")]
    OutOfRange(String),
}

const NANOS_PER_UNIT: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("μs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60.0 * 1e9),
    ("h", 3_600.0 * 1e9),
];

/// Parse a `<number><unit>` duration literal such as `100ms` or `1.5s`.
///
/// Units are `ns`, `us` (also `µs`), `ms`, `s`, `m` and `h`. Fractional
/// numbers are accepted; negative values, bare numbers without a unit and
/// values that do not fit a [`Duration`] are rejected.
pub fn parse_duration(literal: &str) -> Result<Duration, DurationError> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let unit_start = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '+' && c != '-')
        .ok_or_else(|| DurationError::MissingUnit(trimmed.to_string()))?;
    let (number, unit) = trimmed.split_at(unit_start);

    let value: f64 = number
        .parse()
        .map_err(|_| DurationError::InvalidNumber(trimmed.to_string()))?;
    if value.is_sign_negative() {
        return Err(DurationError::Negative(trimmed.to_string()));
    }

    let factor = NANOS_PER_UNIT
        .iter()
        .find_map(|(name, factor)| (*name == unit).then_some(*factor))
        .ok_or_else(|| DurationError::UnknownUnit {
            literal: trimmed.to_string(),
            unit: unit.to_string(),
        })?;

    let nanos = value * factor;
    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(DurationError::OutOfRange(trimmed.to_string()));
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Format a duration with the largest unit it fills, using at most two
/// decimals with trailing zeros trimmed. Zero renders as `0µs`.
pub fn format_duration(duration: Duration) -> String {
    const DISPLAY_UNITS: &[(&str, f64)] = &[
        ("h", 3_600.0 * 1e9),
        ("m", 60.0 * 1e9),
        ("s", 1e9),
        ("ms", 1e6),
        ("µs", 1e3),
        ("ns", 1.0),
    ];

    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0µs".to_string();
    }

    let nanos = nanos as f64;
    let (unit, factor) = DISPLAY_UNITS
        .iter()
        .find(|(_, factor)| nanos >= *factor)
        .copied()
        .unwrap_or(("ns", 1.0));

    let rendered = format!("{:.2}", nanos / factor);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered}{unit}")
}
