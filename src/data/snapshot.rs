//! Normalized metric snapshots.
//!
//! A [`MetricSnapshot`] is what the reconciliation engine consumes: every value
//! already coerced to `Option<f64>`, thresholds validated, and history kept as
//! raw points for the chart adapter to normalize on its own terms.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::metric::MetricId;
use super::normalize::{normalize, RawValue};
use super::status::Thresholds;
use crate::source::{RawSnapshot, WirePoint, WireThresholds};

/// One history sample: timestamp in seconds and the value as received.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub timestamp: f64,
    pub value: RawValue,
}

impl HistoryPoint {
    pub fn new(timestamp: f64, value: impl Into<RawValue>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

/// A polled set of current values, thresholds and short history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSnapshot {
    /// Current values keyed by metric id. `None` means "reported, but no value".
    pub values: BTreeMap<MetricId, Option<f64>>,
    /// Per-metric thresholds supplied with the snapshot.
    pub thresholds: HashMap<MetricId, Thresholds>,
    /// Short history window per metric.
    pub history: HashMap<MetricId, Vec<HistoryPoint>>,
    /// Headline membership, when the source designates one.
    pub prominent: Option<Vec<MetricId>>,
    /// Source-side timestamp of the snapshot (epoch seconds).
    pub last_updated: Option<f64>,
}

impl MetricSnapshot {
    /// The built-in snapshot used before any poll has succeeded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalize a wire snapshot.
    ///
    /// Malformed entries are dropped individually; a bad value never rejects
    /// the snapshot as a whole.
    pub fn from_raw(raw: RawSnapshot) -> Self {
        let values = raw
            .values
            .into_iter()
            .map(|(id, v)| (MetricId::from(id), normalize(&v)))
            .collect();

        let thresholds = raw
            .thresholds
            .into_iter()
            .filter_map(|(id, value)| {
                let Ok(t) = serde_json::from_value::<WireThresholds>(value) else {
                    debug!(metric = %id, "dropping malformed thresholds entry");
                    return None;
                };
                let thresholds = Thresholds {
                    warning: t.warning.as_ref().and_then(normalize),
                    critical: t.critical.as_ref().and_then(normalize),
                };
                if thresholds.is_consistent() {
                    Some((MetricId::from(id), thresholds))
                } else {
                    debug!(metric = %id, "dropping thresholds with warning above critical");
                    None
                }
            })
            .collect();

        let history = raw
            .history
            .into_iter()
            .map(|(id, points)| {
                let points = points
                    .into_iter()
                    .filter_map(|point| match point {
                        WirePoint::Pair(ts, value) => {
                            normalize(&ts).map(|timestamp| HistoryPoint { timestamp, value })
                        }
                        WirePoint::Other(_) => None,
                    })
                    .collect();
                (MetricId::from(id), points)
            })
            .collect();

        Self {
            values,
            thresholds,
            history,
            prominent: raw.prominent.map(|p| p.into_ids()),
            last_updated: raw.last_updated.as_ref().and_then(normalize),
        }
    }

    /// Current value of a metric, `None` when absent or null.
    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied().flatten()
    }

    /// Whether the snapshot reports the metric at all.
    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn thresholds(&self, id: &str) -> Option<&Thresholds> {
        self.thresholds.get(id)
    }

    pub fn history(&self, id: &str) -> &[HistoryPoint] {
        self.history.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Live metric ids selected by a configured pattern, in id order.
    pub fn matching<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a MetricId> + 'a {
        self.values.keys().filter(move |id| id.matches(pattern))
    }

    /// Builder-style helper used by sources and tests.
    pub fn with_value(mut self, id: &str, value: impl Into<Option<f64>>) -> Self {
        self.values.insert(MetricId::from(id), value.into());
        self
    }

    pub fn with_thresholds(mut self, id: &str, thresholds: Thresholds) -> Self {
        self.thresholds.insert(MetricId::from(id), thresholds);
        self
    }

    pub fn with_history(mut self, id: &str, points: Vec<HistoryPoint>) -> Self {
        self.history.insert(MetricId::from(id), points);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_normalizes_values() {
        let raw: RawSnapshot = serde_json::from_str(
            r#"{
                "values": {"cpu": 0.9, "load": "1.5", "broken": "n/a", "gone": null},
                "thresholds": {"cpu": {"warning": 0.85, "critical": "0.95"}},
                "history": {"cpu": [[1700000000, "0.8"], [1700000001, 0.9], ["bad", 1], {"x": 1}]}
            }"#,
        )
        .unwrap();

        let snapshot = MetricSnapshot::from_raw(raw);
        assert_eq!(snapshot.value("cpu"), Some(0.9));
        assert_eq!(snapshot.value("load"), Some(1.5));
        assert_eq!(snapshot.value("broken"), None);
        assert!(snapshot.contains("gone"));
        assert!(!snapshot.contains("missing"));

        let t = snapshot.thresholds("cpu").unwrap();
        assert_eq!(t.critical, Some(0.95));

        // Points with an unparseable timestamp or shape are dropped
        assert_eq!(snapshot.history("cpu").len(), 2);
        assert_eq!(snapshot.history("cpu")[0].value, RawValue::from("0.8"));
    }

    #[test]
    fn inconsistent_thresholds_are_dropped() {
        let raw: RawSnapshot = serde_json::from_str(
            r#"{"values": {"x": 1}, "thresholds": {"x": {"warning": 5, "critical": 1}}}"#,
        )
        .unwrap();
        let snapshot = MetricSnapshot::from_raw(raw);
        assert!(snapshot.thresholds("x").is_none());
    }

    #[test]
    fn matching_uses_base_name_patterns() {
        let snapshot = MetricSnapshot::empty()
            .with_value(r#"locks{db="b"}"#, 2.0)
            .with_value(r#"locks{db="a"}"#, 1.0)
            .with_value("lockstep", 3.0);

        let ids: Vec<&str> = snapshot.matching("locks").map(MetricId::as_str).collect();
        assert_eq!(ids, vec![r#"locks{db="a"}"#, r#"locks{db="b"}"#]);
    }
}
