//! Display formats for metric values.

use serde::{Deserialize, Serialize};

/// Placeholder shown on a card whose metric currently has no value.
pub const NO_DATA: &str = "no data";

/// How a metric value is rendered on its card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Fixed0,
    Fixed1,
    #[default]
    Fixed2,
    Fixed3,
    /// Ratio shown as a whole percentage (0.93 -> "93").
    Percent,
    /// Bytes shown as mebibytes with one decimal.
    Mb,
    /// Large counts with K/M suffixes.
    Count,
}

impl ValueFormat {
    pub fn apply(self, value: f64) -> String {
        match self {
            ValueFormat::Fixed0 => format!("{:.0}", value),
            ValueFormat::Fixed1 => format!("{:.1}", value),
            ValueFormat::Fixed2 => format!("{:.2}", value),
            ValueFormat::Fixed3 => format!("{:.3}", value),
            ValueFormat::Percent => format!("{:.0}", (value * 100.0).round()),
            ValueFormat::Mb => format!("{:.1}", value / 1024.0 / 1024.0),
            ValueFormat::Count => format_count(value),
        }
    }
}

/// Format a card value with its unit, or the placeholder when absent.
pub fn format_value(value: Option<f64>, format: ValueFormat, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => format.apply(v),
        Some(v) => format!("{} {}", format.apply(v), unit),
        None => NO_DATA.to_string(),
    }
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: f64) -> String {
    let magnitude = n.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{:.0}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_formats() {
        assert_eq!(ValueFormat::Fixed0.apply(12.6), "13");
        assert_eq!(ValueFormat::Fixed1.apply(12.64), "12.6");
        assert_eq!(ValueFormat::Fixed2.apply(0.9), "0.90");
        assert_eq!(ValueFormat::Fixed3.apply(0.12345), "0.123");
    }

    #[test]
    fn percent_and_mb() {
        assert_eq!(ValueFormat::Percent.apply(0.934), "93");
        assert_eq!(ValueFormat::Mb.apply(3.0 * 1024.0 * 1024.0), "3.0");
    }

    #[test]
    fn count_suffixes() {
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1_234.0), "1.2K");
        assert_eq!(format_count(1_234_567.0), "1.2M");
    }

    #[test]
    fn value_with_unit_or_placeholder() {
        assert_eq!(format_value(Some(0.5), ValueFormat::Fixed2, "s"), "0.50 s");
        assert_eq!(format_value(Some(7.0), ValueFormat::Fixed0, ""), "7");
        assert_eq!(format_value(None, ValueFormat::Fixed2, "s"), NO_DATA);
    }

    #[test]
    fn deserializes_from_config_names() {
        let f: ValueFormat = serde_json::from_str(r#""fixed0""#).unwrap();
        assert_eq!(f, ValueFormat::Fixed0);
        let f: ValueFormat = serde_json::from_str(r#""percent""#).unwrap();
        assert_eq!(f, ValueFormat::Percent);
    }
}
