//! Wire format for metric snapshots.
//!
//! These types match the JSON served by the dashboard backend. Every field is
//! optional so that a partially populated response still yields a snapshot;
//! validation happens in [`MetricSnapshot::from_raw`](crate::data::MetricSnapshot::from_raw).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::RawValue;

/// A complete snapshot as received from a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Current values keyed by metric id. The backend calls this `metrics`.
    #[serde(default, alias = "metrics")]
    pub values: BTreeMap<String, RawValue>,

    /// Per-metric thresholds. Kept as loose JSON so one malformed entry is
    /// dropped on its own instead of failing the snapshot.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub thresholds: BTreeMap<String, serde_json::Value>,

    /// Short history window per metric: `[[timestamp_seconds, value], ...]`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub history: BTreeMap<String, Vec<WirePoint>>,

    /// Metrics to show in the headline section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prominent: Option<Prominent>,

    /// In-band error reported by the backend (e.g. "no_data").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Backend timestamp of the snapshot, in epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<RawValue>,
}

/// Threshold pair for one metric; either bound may be numeric text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireThresholds {
    #[serde(default)]
    pub warning: Option<RawValue>,
    #[serde(default)]
    pub critical: Option<RawValue>,
}

/// One history sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WirePoint {
    /// `[timestamp, value]`
    Pair(RawValue, RawValue),
    /// Anything else; ignored.
    Other(serde_json::Value),
}

/// Headline membership, either a plain list or the backend's map of
/// per-metric display settings (only the keys are used).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prominent {
    List(Vec<String>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl Prominent {
    pub fn into_ids(self) -> Vec<crate::data::MetricId> {
        match self {
            Prominent::List(ids) => ids.into_iter().map(Into::into).collect(),
            Prominent::Map(map) => map.into_keys().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "values": {
                "process_cpu_usage": 0.42,
                "postgres_locks{database=\"db01\"}": "3"
            },
            "thresholds": {
                "process_cpu_usage": {"warning": 0.85, "critical": 0.95}
            },
            "history": {
                "process_cpu_usage": [[1700000000, "0.40"], [1700000001, 0.42]]
            },
            "prominent": ["process_cpu_usage"],
            "last_updated": 1700000001
        }"#;

        let snapshot: RawSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.values.len(), 2);
        assert_eq!(
            snapshot.values.get("process_cpu_usage"),
            Some(&RawValue::Number(0.42))
        );
        assert_eq!(snapshot.history["process_cpu_usage"].len(), 2);
        assert!(matches!(snapshot.prominent, Some(Prominent::List(ref l)) if l.len() == 1));
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_backend_shape_with_metrics_alias() {
        let json = r#"{
            "metrics": {"tx_pool_size": 12},
            "prominent": {"tx_pool_size": {"title": "Transaction Pool", "format": "fixed0"}},
            "error": null
        }"#;

        let snapshot: RawSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.values.get("tx_pool_size"), Some(&RawValue::Number(12.0)));
        let ids = snapshot.prominent.unwrap().into_ids();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].as_str(), "tx_pool_size");
    }

    #[test]
    fn test_in_band_error() {
        let snapshot: RawSnapshot = serde_json::from_str(r#"{"error": "no_data"}"#).unwrap();
        assert_eq!(snapshot.error.as_deref(), Some("no_data"));
        assert!(snapshot.values.is_empty());
    }

    #[test]
    fn test_empty_object() {
        let snapshot: RawSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.values.is_empty());
        assert!(snapshot.prominent.is_none());
    }
}
