//! Common UI components shared by the dashboard screen.
//!
//! This module contains the header bar, degraded banner, status bar, and help overlay.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::Status;
use crate::poller::PollStatus;

/// Render the header bar with the overall health overview.
///
/// Displays: worst-status indicator, card counts by status, source and
/// history window, time since the last fresh snapshot.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let counts = app.dashboard.status_counts();
    let overall = app.dashboard.overall_status();

    let count_span = |n: usize, status: Status| {
        if n > 0 {
            Span::styled(n.to_string(), theme.status_style(status))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let updated = match (app.updated_ago(), app.last_status()) {
        (Some(ago), _) => format!(
            "updated {} ago",
            format_duration(Duration::from_secs(ago.as_secs()))
        ),
        (None, None) => "loading...".to_string(),
        (None, Some(_)) => "no data yet".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(" ● ", theme.status_style(overall)),
        Span::styled("DASHWATCH ", theme.header),
        Span::raw("│ "),
        count_span(counts.ok, Status::Ok),
        Span::raw(" ok "),
        count_span(counts.warning, Status::Warning),
        Span::raw(" warn "),
        count_span(counts.critical, Status::Critical),
        Span::raw(" crit "),
        count_span(counts.unknown, Status::Unknown),
        Span::raw(" n/a │ "),
        Span::raw(app.source_description().to_string()),
        Span::raw(format!(" │ {} min │ ", app.interval_minutes)),
        Span::styled(updated, Style::default().add_modifier(Modifier::DIM)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the persistent banner shown while the source is degraded.
pub fn render_degraded_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(reason) = app.degraded() else {
        return;
    };
    let text = format!(" ⚠ Source unavailable, showing last good data: {} ", reason);
    let paragraph = Paragraph::new(text).style(
        Style::default()
            .fg(app.theme.critical)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED),
    );
    frame.render_widget(paragraph, area);
}

/// Render the status bar at the bottom.
///
/// Shows temporary status messages first, then the poll state and controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = "r:reload [ ]:window ↑↓:scroll 1-9:fold ?:help q:quit";
    let report = app.dashboard.last_report();
    let status = match app.last_status() {
        None => format!(" Loading... | {}", controls),
        Some(PollStatus::Degraded { reason }) => format!(" Error: {} | {}", reason, controls),
        Some(_) => format!(
            " {} sections, {} cards ({} without data) | {}",
            report.sections, report.cards, report.placeholders, controls
        ),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let heading = |text: &'static str| {
        Line::from(vec![Span::styled(
            text,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        heading(" Navigation"),
        Line::from("  ↑/↓ j/k     Scroll"),
        Line::from("  PgUp/PgDn   Scroll a page"),
        Line::from("  Home/End    Jump to top/bottom"),
        Line::from("  Esc         Hide tooltip"),
        Line::from("  1-9         Fold/unfold section"),
        Line::from(""),
        heading(" Data"),
        Line::from("  r           Reload now"),
        Line::from("  [ / ]       Shorter/longer history"),
        Line::from(""),
        heading(" Mouse"),
        Line::from("  hover ⓘ     Show metric details"),
        Line::from("  click title Fold/unfold section"),
        Line::from("  wheel       Scroll"),
        Line::from(""),
        heading(" General"),
        Line::from("  ?           Toggle help"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 25u16.min(area.height.saturating_sub(2));
    let help_area = centered(area, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
