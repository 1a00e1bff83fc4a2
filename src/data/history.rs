//! Rolling history for sources that only report current values.
//!
//! JSON snapshot endpoints ship their own short history window. Sources that
//! scrape Prometheus exposition text only see the latest value, so they record
//! each scrape here and attach the window to the snapshot they produce.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::metric::MetricId;
use super::normalize::normalize;
use super::snapshot::HistoryPoint;

/// Maximum number of historical points to keep per metric.
pub const MAX_HISTORY_SIZE: usize = 60;

#[derive(Debug, Clone, Default)]
struct Series {
    points: VecDeque<(f64, Option<f64>)>,
    /// Scrape number that last carried this metric.
    last_seen: u64,
}

/// Per-metric rolling window of `(timestamp, value)` samples.
///
/// A metric missing from a scrape keeps its window for up to `capacity`
/// further scrapes and is then forgotten, so label churn can't grow the map.
#[derive(Debug, Clone)]
pub struct History {
    series: HashMap<MetricId, Series>,
    capacity: usize,
    scrapes: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: capacity.max(1),
            scrapes: 0,
        }
    }

    /// Record one scrape taken at `timestamp` (seconds).
    ///
    /// Metrics that vanish from a scrape keep their window for a while; it
    /// stops growing until they reappear or it expires.
    pub fn record(&mut self, values: &BTreeMap<String, Option<f64>>, timestamp: f64) {
        self.scrapes += 1;
        let scrape = self.scrapes;
        for (id, value) in values {
            let series = self.series.entry(MetricId::from(id.as_str())).or_default();
            series.last_seen = scrape;
            // Out-of-order samples would break x ordering of the chart
            if series.points.back().is_some_and(|(ts, _)| *ts > timestamp) {
                continue;
            }
            series.points.push_back((timestamp, *value));
            if series.points.len() > self.capacity {
                series.points.pop_front();
            }
        }

        let retention = self.capacity as u64;
        self.series
            .retain(|_, series| scrape - series.last_seen <= retention);
    }

    /// The recorded window for a metric, oldest first.
    pub fn series(&self, id: &str) -> Vec<HistoryPoint> {
        self.series
            .get(id)
            .map(|series| {
                series
                    .points
                    .iter()
                    .map(|(ts, v)| HistoryPoint::new(*ts, *v))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Recorded windows of the metrics in `ids`, keyed by metric id.
    pub fn windows<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<MetricId, Vec<HistoryPoint>> {
        ids.into_iter()
            .filter(|id| self.series.contains_key(*id))
            .map(|id| (MetricId::from(id), self.series(id)))
            .collect()
    }

    pub fn len(&self, id: &str) -> usize {
        self.series.get(id).map_or(0, |s| s.points.len())
    }

    /// Number of metrics with a retained window.
    pub fn tracked(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Rate of change per second between the last two valued points.
///
/// Returns None if there's not enough history to calculate a rate.
pub fn rate(points: &[HistoryPoint]) -> Option<f64> {
    let mut valued = points
        .iter()
        .rev()
        .filter_map(|p| normalize(&p.value).map(|v| (p.timestamp, v)));
    let (t1, v1) = valued.next()?;
    let (t0, v0) = valued.next()?;

    let elapsed = t1 - t0;
    if elapsed > 0.0 {
        Some((v1 - v0) / elapsed)
    } else {
        None
    }
}
