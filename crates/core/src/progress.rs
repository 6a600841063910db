//! Progress extraction from external tool output.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent regex is valid")
});

/// Extracts the rightmost percentage-like token from a chunk of tool output.
///
/// A single chunk may carry several `<number>%` substrings (fragment counts,
/// throttle figures); the output is append-only, so the last one is the most
/// recent progress figure. Returns `None` when the chunk contains no
/// percentage. The value is returned as parsed; callers clamp with
/// [`clamp_percent`] before committing it.
pub fn parse_progress(chunk: &str) -> Option<f32> {
    PERCENT_RE
        .captures_iter(chunk)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
}

/// Clamps a parsed percentage to the [0, 100] range.
pub fn clamp_percent(value: f32) -> f32 {
    value.clamp(0.0, 100.0)
}
