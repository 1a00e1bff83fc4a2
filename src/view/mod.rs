//! Retained view state between the reconciler and the terminal renderer.
//!
//! - [`tree`]: the node arena that reconciliation patches
//! - [`chart`]: history series to chart models
//! - [`overlay`]: the single tooltip overlay

pub mod chart;
pub mod overlay;
pub mod tree;

pub use chart::{ChartAdapter, ChartKind, ChartModel, ChartOutcome, ChartStyle, ChartSurface};
pub use overlay::{TooltipManager, HIDE_DELAY};
pub use tree::{MutationStats, Node, NodeId, NodeKind, ViewTree};
