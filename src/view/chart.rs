//! Chart adapter.
//!
//! Turns a metric's history into a [`ChartModel`] and hands it to a
//! [`ChartSurface`]. The surface decides whether anything changed, so
//! rendering the same series twice costs no mutation.

use super::tree::NodeId;
use crate::data::{normalize, HistoryPoint, Status};

/// Padding used when every value is zero.
pub const EPSILON: f64 = 0.5;

/// Smallest padding around a non-zero constant series. Keeps the range open
/// when 10% of the value underflows.
const MIN_PAD: f64 = f64::MIN_POSITIVE;

/// Number of histogram bins.
pub const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Values over time; missing values break the line.
    Line,
    /// Distribution of the values in the window.
    Histogram,
}

/// Presentation choices for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStyle {
    pub kind: ChartKind,
    /// Status of the owning card; colors the series.
    pub status: Status,
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub style: ChartStyle,
    /// Line charts: runs of consecutive valued points, split at gaps.
    pub segments: Vec<Vec<(f64, f64)>>,
    /// Histogram charts: counts per equal-width bin.
    pub bins: Vec<u64>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl ChartModel {
    /// Number of valued points in the model.
    pub fn points(&self) -> usize {
        match self.style.kind {
            ChartKind::Line => self.segments.iter().map(Vec::len).sum(),
            ChartKind::Histogram => self.bins.iter().sum::<u64>() as usize,
        }
    }

    /// The latest `width` values scaled to 0..=100 for a sparkline.
    /// Gaps become zero-height bars.
    pub fn sparkline(&self, width: usize) -> Vec<u64> {
        let [low, high] = self.y_bounds;
        let span = high - low;
        let mut bars: Vec<u64> = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                bars.push(0);
            }
            for (_, y) in segment {
                bars.push((((y - low) / span) * 100.0).round().clamp(0.0, 100.0) as u64);
            }
        }
        let skip = bars.len().saturating_sub(width);
        bars.split_off(skip)
    }
}

/// Where charts get drawn. Implemented by the view tree.
pub trait ChartSurface {
    /// Whether `container` exists and can hold a chart.
    fn contains(&self, container: NodeId) -> bool;

    /// Store `model` in `container`. Returns `false` when the stored model was
    /// already equal and nothing changed.
    fn draw(&mut self, container: NodeId, model: ChartModel) -> bool;
}

/// What [`ChartAdapter::render`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartOutcome {
    Drawn,
    Unchanged,
    /// The container is gone; nothing was drawn.
    MissingContainer,
}

pub struct ChartAdapter;

impl ChartAdapter {
    /// Render `series` into `container`.
    pub fn render<S>(
        surface: &mut S,
        container: NodeId,
        series: &[HistoryPoint],
        style: ChartStyle,
    ) -> ChartOutcome
    where
        S: ChartSurface + ?Sized,
    {
        if !surface.contains(container) {
            return ChartOutcome::MissingContainer;
        }
        let model = match style.kind {
            ChartKind::Line => line_model(series, style),
            ChartKind::Histogram => histogram_model(series, style),
        };
        if surface.draw(container, model) {
            ChartOutcome::Drawn
        } else {
            ChartOutcome::Unchanged
        }
    }
}

fn line_model(series: &[HistoryPoint], style: ChartStyle) -> ChartModel {
    let mut points: Vec<(f64, Option<f64>)> = series
        .iter()
        .filter(|p| p.timestamp.is_finite())
        .map(|p| (p.timestamp, normalize(&p.value)))
        .collect();
    // Stable, so equal timestamps keep their arrival order
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut segments = Vec::new();
    let mut run = Vec::new();
    for (x, y) in &points {
        match y {
            Some(y) => run.push((*x, *y)),
            None if !run.is_empty() => segments.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        segments.push(run);
    }

    let x_bounds = match (points.first(), points.last()) {
        (Some((first, _)), Some((last, _))) if last > first => [*first, *last],
        (Some((only, _)), _) => [only - EPSILON, only + EPSILON],
        _ => [0.0, 1.0],
    };
    let y_bounds = axis_bounds(segments.iter().flatten().map(|(_, y)| *y));

    ChartModel {
        style,
        segments,
        bins: Vec::new(),
        x_bounds,
        y_bounds,
    }
}

fn histogram_model(series: &[HistoryPoint], style: ChartStyle) -> ChartModel {
    let values: Vec<f64> = series.iter().filter_map(|p| normalize(&p.value)).collect();
    let x_bounds = axis_bounds(values.iter().copied());

    let mut bins = vec![0u64; HISTOGRAM_BINS];
    if !values.is_empty() {
        let [low, high] = x_bounds;
        let width = (high - low) / HISTOGRAM_BINS as f64;
        for v in &values {
            let index = (((v - low) / width).floor() as usize).min(HISTOGRAM_BINS - 1);
            bins[index] += 1;
        }
    }
    let tallest = bins.iter().copied().max().unwrap_or(0);
    let y_bounds = [0.0, tallest.max(1) as f64];

    ChartModel {
        style,
        segments: Vec::new(),
        bins,
        x_bounds,
        y_bounds,
    }
}

/// Axis range covering `values`, never empty or zero-height.
///
/// No values gives `[0, 1]`. A single distinct value `v` is padded by 10% of
/// `|v|`, or by [`EPSILON`] when `v` is zero. Bounds stay finite: at the ends
/// of the `f64` range the padded side is clamped and may touch `v`.
pub fn axis_bounds(values: impl IntoIterator<Item = f64>) -> [f64; 2] {
    let mut range: Option<(f64, f64)> = None;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        range = Some(match range {
            Some((low, high)) => (low.min(v), high.max(v)),
            None => (v, v),
        });
    }

    match range {
        None => [0.0, 1.0],
        Some((low, high)) if high > low => [low, high],
        Some((v, _)) => {
            let pad = if v == 0.0 {
                EPSILON
            } else {
                (v.abs() * 0.1).max(MIN_PAD)
            };
            [(v - pad).max(f64::MIN), (v + pad).min(f64::MAX)]
        }
    }
}
