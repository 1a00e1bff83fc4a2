//! Prometheus text exposition.
//!
//! Only the sample lines matter here: `name{labels} value [timestamp]`.
//! Comment lines and anything that doesn't parse are skipped.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::snapshot::{RawSnapshot, WirePoint};
use crate::data::{History, RawValue};

/// Parse exposition text into a map of metric id to value.
///
/// The id keeps the label block verbatim, so `locks{db="a"}` and
/// `locks{db="b"}` stay distinct. `NaN` and infinite samples are reported as
/// present but valueless.
pub fn parse_exposition(text: &str) -> BTreeMap<String, Option<f64>> {
    let mut values = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((id, value)) = parse_sample(line) {
            values.insert(id, value);
        }
    }
    values
}

fn parse_sample(line: &str) -> Option<(String, Option<f64>)> {
    let (id, rest) = match line.find('{') {
        Some(open) if line[..open].find(char::is_whitespace).is_none() => {
            let close = open + line[open..].rfind('}')?;
            (&line[..=close], &line[close + 1..])
        }
        _ => line.split_once(char::is_whitespace)?,
    };
    if id.is_empty() {
        return None;
    }
    let value: f64 = rest.split_whitespace().next()?.parse().ok()?;
    Some((id.to_string(), value.is_finite().then_some(value)))
}

/// Turns exposition scrapes into snapshots with a rolling history.
#[derive(Debug, Default)]
pub struct ExpositionDecoder {
    history: Mutex<History>,
}

impl ExpositionDecoder {
    /// Parse one scrape taken at `now` (epoch seconds).
    pub fn decode(&self, text: &str, now: f64) -> RawSnapshot {
        let values = parse_exposition(text);

        // Only series in this scrape get a window; vanished ones age out
        let mut history = self.history.lock();
        history.record(&values, now);
        let windows = history
            .windows(values.keys().map(String::as_str))
            .into_iter()
            .map(|(id, points)| {
                let points = points
                    .into_iter()
                    .map(|p| WirePoint::Pair(RawValue::Number(p.timestamp), p.value))
                    .collect();
                (id.to_string(), points)
            })
            .collect();
        drop(history);

        RawSnapshot {
            values: values
                .into_iter()
                .map(|(id, v)| (id, RawValue::from(v)))
                .collect(),
            history: windows,
            last_updated: Some(RawValue::Number(now)),
            ..RawSnapshot::default()
        }
    }
}
