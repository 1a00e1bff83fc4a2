//! Human-readable durations for refresh and retry settings.

use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to nanoseconds multiplier (order matters: "ms" must be tried before "m" and "s")
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
];

/// Parse duration strings like "1s", "500ms", "2.5s", "5m".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            return to_duration(val_str, *multiplier, s);
        }
    }

    to_duration(s, 1_000_000_000.0, s)
}

fn to_duration(val_str: &str, multiplier: f64, original: &str) -> Result<Duration> {
    let val: f64 = match val_str.trim().parse() {
        Ok(v) => v,
        Err(_) => bail!("Unknown duration format: {}", original),
    };
    if !val.is_finite() || val < 0.0 {
        bail!("Duration must be a non-negative number: {}", original);
    }
    Ok(Duration::from_nanos((val * multiplier) as u64))
}

/// Format a duration for display
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        "0s".to_string()
    } else if nanos < 1_000_000 {
        format!("{:.2}µs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{}ms", d.as_millis())
    } else if d.as_secs() < 120 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}
