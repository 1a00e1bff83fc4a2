//! Metric identifiers.
//!
//! A metric id is an opaque string that may carry a Prometheus-style label set,
//! e.g. `postgres_locks{database="db01"}`. Equality is exact string equality.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of a single metric series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(String);

impl MetricId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its label suffix (`name{k="v"}` -> `name`).
    pub fn base_name(&self) -> &str {
        base_name(&self.0)
    }

    /// Whether the id carries a label set.
    pub fn has_labels(&self) -> bool {
        self.0.contains('{')
    }

    /// Whether this id is selected by a configured pattern.
    ///
    /// A pattern matches by exact equality, or, when the pattern has no label
    /// suffix of its own, when it equals the id's base name.
    pub fn matches(&self, pattern: &str) -> bool {
        if self.0 == pattern {
            return true;
        }
        !pattern.contains('{') && self.base_name() == pattern
    }
}

/// Strip the label suffix from a raw metric key.
pub fn base_name(id: &str) -> &str {
    match id.find('{') {
        Some(idx) => &id[..idx],
        None => id,
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MetricId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for MetricId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
