//! Terminal rendering with ratatui.
//!
//! - [`dashboard`]: sections and cards drawn from the view tree
//! - [`common`]: header, degraded banner, status bar and help
//! - [`theme`]: colors, with light/dark detection

pub mod common;
pub mod dashboard;
pub mod theme;

pub use common::{render_degraded_banner, render_header, render_help, render_status_bar};
pub use dashboard::render_dashboard;
pub use theme::Theme;
