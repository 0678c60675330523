//! Trace id detection
//!
//! Search inputs are either query text or a bare trace id. Callers use
//! [`is_valid_trace_id`] to pick a trace lookup over a query search before
//! handing the input to the filter parser.

use regex::Regex;
use std::sync::LazyLock;

static TRACE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9a-f]{16}|[0-9a-f]{32})$").expect("valid trace id regex")
});

/// Check whether the input is a trace id: 32 hex characters (OTLP ids) or
/// 16 (shortened ids), matched case-insensitively.
pub fn is_valid_trace_id(input: &str) -> bool {
    TRACE_ID_REGEX.is_match(input)
}
