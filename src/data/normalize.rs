//! Coercion of incoming metric values into numbers.

use serde::{Deserialize, Serialize};

/// A metric value as it arrives from a snapshot source.
///
/// Sources report numbers, numbers encoded as text (Prometheus query APIs
/// return `"0.93"`), or null. Anything else is kept so that one odd value
/// never fails the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    #[default]
    Null,
    Other(serde_json::Value),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(RawValue::Null, RawValue::Number)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Convert a raw value into a number, or `None` for "no data".
///
/// Non-finite results are treated as no data so that downstream scaling and
/// classification only ever see real numbers.
pub fn normalize(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Number(v) => *v,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Null | RawValue::Other(_) => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(normalize(&RawValue::Number(0.9)), Some(0.9));
        assert_eq!(normalize(&RawValue::Number(-3.0)), Some(-3.0));
    }

    #[test]
    fn numeric_text_is_parsed() {
        assert_eq!(normalize(&RawValue::from("0.93")), Some(0.93));
        assert_eq!(normalize(&RawValue::from(" 42 ")), Some(42.0));
        assert_eq!(normalize(&RawValue::from("1e3")), Some(1000.0));
    }

    #[test]
    fn garbage_is_no_data() {
        assert_eq!(normalize(&RawValue::from("n/a")), None);
        assert_eq!(normalize(&RawValue::from("")), None);
        assert_eq!(normalize(&RawValue::Null), None);
        assert_eq!(normalize(&RawValue::Other(serde_json::json!({"a": 1}))), None);
    }

    #[test]
    fn non_finite_is_no_data() {
        assert_eq!(normalize(&RawValue::from("NaN")), None);
        assert_eq!(normalize(&RawValue::from("+Inf")), None);
        assert_eq!(normalize(&RawValue::Number(f64::NAN)), None);
    }

    #[test]
    fn deserializes_mixed_json() {
        let values: Vec<RawValue> = serde_json::from_str(r#"[1, 2.5, "3", null, true]"#).unwrap();
        let normalized: Vec<Option<f64>> = values.iter().map(normalize).collect();
        assert_eq!(normalized, vec![Some(1.0), Some(2.5), Some(3.0), None, None]);
    }
}
