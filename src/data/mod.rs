//! Data models and processing for metric snapshots.
//!
//! This module turns raw, loosely-typed snapshots into normalized values with
//! a status computed against thresholds.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "1s", "500ms")
//! - [`format`]: Display formats for metric values ("fixed2", "percent", "mb", ...)
//! - [`history`]: Rolling per-metric history for sources that do not supply one
//! - [`metric`]: The [`MetricId`] key type and pattern matching
//! - [`normalize`]: Coercion of heterogeneous values into numbers
//! - [`snapshot`]: The normalized [`MetricSnapshot`]
//! - [`status`]: Threshold classification ([`Status`], [`Thresholds`])
//!
//! ## Data Flow
//!
//! ```text
//! RawSnapshot (wire JSON / exposition text)
//!        │
//!        ▼
//! MetricSnapshot::from_raw()  ── normalize() every value
//!        │
//!        ├──▶ classify() against Thresholds
//!        │
//!        └──▶ history series handed to the chart adapter
//! ```

pub mod duration;
pub mod format;
pub mod history;
pub mod metric;
pub mod normalize;
pub mod snapshot;
pub mod status;

pub use format::ValueFormat;
pub use history::History;
pub use metric::MetricId;
pub use normalize::{normalize, RawValue};
pub use snapshot::{HistoryPoint, MetricSnapshot};
pub use status::{classify, classify_ratio, Status, Thresholds};
