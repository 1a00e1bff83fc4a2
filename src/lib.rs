//! # dashwatch
//!
//! A live operational metrics dashboard for the terminal.
//!
//! Metrics are polled from a snapshot source on a fixed cadence, grouped into
//! configured sections and shown as cards with a current value, a status
//! color and a short history chart. Each poll is reconciled onto a retained
//! view tree: cards keep their identity across polls, unchanged values cost
//! no mutation, and responses that arrive after a newer request are dropped.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  source ──▶ poller ──▶ reconcile ──▶ view (tree) ──▶ ui ──▶ TTY  │
//! │  (fetch)   (dedup,     (diff and     (nodes,       (ratatui)     │
//! │            retry,       patch)        charts,                    │
//! │            staleness)                 tooltip)                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`SnapshotSource`] trait with file, HTTP and channel
//!   implementations, the JSON wire format and a Prometheus text parser
//! - **[`poller`]**: periodic acquisition with a dedup guard, request
//!   generations, bounded retry and last-good fallback
//! - **[`data`]**: metric ids, value normalization, status classification,
//!   formatting and rolling history
//! - **[`config`]**: section layout and per-metric display settings
//! - **[`reconcile`]**: the [`Dashboard`], which patches the view tree to
//!   match each snapshot
//! - **[`view`]**: the retained node tree, chart models and the tooltip overlay
//! - **[`app`]**, **[`events`]**, **[`ui`]**: terminal application state,
//!   input handling and rendering
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll a snapshot file
//! dashwatch --file metrics.json
//!
//! # Poll a Prometheus endpoint
//! dashwatch --url http://localhost:8080/actuator/prometheus --format prometheus
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use dashwatch::{ChannelSource, Dashboard, Poller, RawSnapshot, RetryPolicy, Settings};
//!
//! # tokio_test::block_on(async {
//! let (tx, source) = ChannelSource::create("in-process");
//! let poller = Poller::new(Box::new(source), RetryPolicy::default(), 30);
//! let mut dashboard = Dashboard::new(Settings::builtin());
//!
//! let snapshot: RawSnapshot =
//!     serde_json::from_str(r#"{"values": {"process_cpu_usage": 0.9}}"#).unwrap();
//! tx.send(snapshot).unwrap();
//!
//! let outcome = poller.poll().await;
//! dashboard.reconcile(&outcome.snapshot);
//! assert!(dashboard.card_node("System", "process_cpu_usage").is_some());
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod poller;
pub mod reconcile;
pub mod source;
pub mod ui;
pub mod view;

// Re-export main types for convenience
pub use app::App;
pub use config::{DisplayMode, MetricChart, MetricSpec, SectionConfig, Settings};
pub use data::{classify, classify_ratio, normalize, MetricId, MetricSnapshot, RawValue, Status, Thresholds};
pub use error::{ConfigError, SourceError};
pub use poller::{PollOutcome, PollStatus, Poller, RetryPolicy};
pub use reconcile::{CardKey, Dashboard, ReconcileReport, StatusCounts};
pub use source::{ChannelSource, FileSource, HttpSource, PayloadFormat, RawSnapshot, SnapshotSource};
pub use view::{ChartAdapter, ChartKind, TooltipManager, ViewTree};
