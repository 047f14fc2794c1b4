//! Display formatting for counts and durations.
//!
//! Counts at or above ten thousand are abbreviated with the `万` suffix the
//! upstream sites use themselves, so values copied verbatim from an API and
//! values we format ourselves look the same on the page.

use serde_json::Value;

const TEN_THOUSAND: i64 = 10_000;
const WAN: char = '万';

/// Abbreviate a count: `12345 -> "1.2万"`, `9999 -> "9999"`.
pub fn format_number(n: i64) -> String {
    if n >= TEN_THOUSAND {
        format!("{:.1}{}", n as f64 / TEN_THOUSAND as f64, WAN)
    } else {
        n.to_string()
    }
}

/// Format a count that arrived as text.
///
/// Text already carrying the `万` suffix, and text that is not an integer,
/// is returned unchanged.
pub fn format_number_str(s: &str) -> String {
    if s.contains(WAN) {
        return s.to_string();
    }
    match s.trim().parse::<i64>() {
        Ok(n) => format_number(n),
        Err(_) => s.to_string(),
    }
}

/// Format a count taken straight from a JSON payload.
pub fn format_number_value(v: &Value) -> String {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => format_number(i),
            None => n.to_string(),
        },
        Value::String(s) => format_number_str(s),
        _ => "0".to_string(),
    }
}

/// Render a length in seconds as `H:MM:SS`, or `M:SS` below one hour.
///
/// Accepts JSON numbers and numeric strings. Anything else yields `"00:00"`.
pub fn format_duration(v: &Value) -> String {
    let seconds = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match seconds {
        Some(secs) => format_seconds(secs.max(0)),
        None => "00:00".to_string(),
    }
}

fn format_seconds(secs: i64) -> String {
    let (m, s) = (secs / 60, secs % 60);
    let (h, m) = (m / 60, m % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
