//! Application state and navigation logic.

use std::time::{Duration, Instant};

use tracing::info;

use crate::config::Settings;
use crate::poller::{PollOutcome, PollStatus};
use crate::reconcile::{Dashboard, ReconcileReport};
use crate::ui::Theme;
use crate::view::NodeId;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    pub dashboard: Dashboard,
    source: String,
    pub interval_minutes: u32,
    degraded: Option<String>,
    last_status: Option<PollStatus>,
    last_fresh: Option<Instant>,
    refresh_requested: bool,

    // Scrolling (rows of dashboard content hidden above the viewport)
    pub scroll: u16,
    max_scroll: u16,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App showing `settings` for the source described by `source`.
    pub fn new(settings: Settings, source: impl Into<String>) -> Self {
        Self::with_theme(settings, source, Theme::auto_detect())
    }

    pub fn with_theme(settings: Settings, source: impl Into<String>, theme: Theme) -> Self {
        let interval_minutes = settings.interval_minutes;
        Self {
            running: true,
            show_help: false,
            dashboard: Dashboard::new(settings),
            source: source.into(),
            interval_minutes,
            degraded: None,
            last_status: None,
            last_fresh: None,
            refresh_requested: false,
            scroll: 0,
            max_scroll: 0,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        &self.source
    }

    /// Fold a poll outcome into the dashboard.
    ///
    /// Deduplicated and stale outcomes carry nothing new and are skipped.
    /// A degraded outcome still reconciles its fallback snapshot so the
    /// placeholders appear before the first success.
    pub fn apply(&mut self, outcome: PollOutcome) -> Option<ReconcileReport> {
        let report = match &outcome.status {
            PollStatus::Deduplicated | PollStatus::Stale => None,
            PollStatus::Fresh => {
                if self.degraded.take().is_some() {
                    info!(source = %self.source, "source recovered");
                }
                self.last_fresh = Some(Instant::now());
                Some(self.dashboard.reconcile(&outcome.snapshot))
            }
            PollStatus::Degraded { reason } => {
                self.degraded = Some(reason.clone());
                Some(self.dashboard.reconcile(&outcome.snapshot))
            }
        };
        self.last_status = Some(outcome.status);
        report
    }

    /// Reason the source is degraded, for the banner.
    pub fn degraded(&self) -> Option<&str> {
        self.degraded.as_deref()
    }

    pub fn last_status(&self) -> Option<&PollStatus> {
        self.last_status.as_ref()
    }

    /// Time since the last fresh snapshot, if there has been one.
    pub fn updated_ago(&self) -> Option<Duration> {
        self.last_fresh.map(|t| t.elapsed())
    }

    /// Ask the event loop to issue a user-initiated fetch.
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Take a pending refresh request, clearing it.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Manual reload.
    pub fn reload(&mut self) {
        self.request_refresh();
        self.set_status_message("Reloading...".to_string());
    }

    /// Move to the next (or previous) selectable history window and refetch.
    pub fn step_interval(&mut self, forward: bool) {
        let next = self
            .dashboard
            .settings()
            .step_interval(self.interval_minutes, forward);
        if next == self.interval_minutes {
            return;
        }
        self.interval_minutes = next;
        self.request_refresh();
        self.set_status_message(format!("History window: {} min", next));
    }

    /// Scroll up `n` rows. Scrolling drops any tooltip: its anchor moves.
    pub fn scroll_up(&mut self, n: u16) {
        self.dashboard.hide_all_tooltips();
        self.scroll = self.scroll.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: u16) {
        self.dashboard.hide_all_tooltips();
        self.scroll = self.scroll.saturating_add(n).min(self.max_scroll);
    }

    pub fn scroll_to_top(&mut self) {
        self.dashboard.hide_all_tooltips();
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.dashboard.hide_all_tooltips();
        self.scroll = self.max_scroll;
    }

    /// Record how far the content can scroll, as measured by the last layout.
    pub fn set_max_scroll(&mut self, max: u16) {
        self.max_scroll = max;
        self.scroll = self.scroll.min(max);
    }

    pub fn max_scroll(&self) -> u16 {
        self.max_scroll
    }

    /// Fold or unfold the `number`th section on screen (1-based).
    pub fn toggle_section(&mut self, number: usize) {
        let Some(section) = number
            .checked_sub(1)
            .and_then(|i| self.dashboard.section_order().get(i).copied())
        else {
            return;
        };
        self.fold(section);
    }

    /// Mouse click: a click on a section header folds or unfolds it.
    pub fn click(&mut self, column: u16, row: u16) {
        if let Some(section) = self.dashboard.section_at(column, row) {
            self.fold(section);
        }
    }

    fn fold(&mut self, section: NodeId) {
        let Some(collapsed) = self.dashboard.toggle_section(section) else {
            return;
        };
        let title = self
            .dashboard
            .tree()
            .get(section)
            .map(|n| n.title().to_string())
            .unwrap_or_default();
        let state = if collapsed { "collapsed" } else { "expanded" };
        self.set_status_message(format!("{} {}", title, state));
    }

    /// Pointer moved to a terminal cell.
    pub fn hover(&mut self, column: u16, row: u16) {
        self.dashboard.hover(column, row, Instant::now());
    }

    /// Esc: close help first, then any tooltip.
    pub fn dismiss(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else {
            self.dashboard.hide_all_tooltips();
        }
    }

    /// Run deferred work due at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.dashboard.tick(now);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }
}
