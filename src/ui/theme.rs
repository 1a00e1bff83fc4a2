//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Status;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for warning-level status.
    pub warning: Color,
    /// Color for critical-level status.
    pub critical: Color,
    /// Color for healthy status.
    pub healthy: Color,
    /// Color for cards without a usable value.
    pub unknown: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for the header bar title.
    pub header: Style,
    /// Style for card titles.
    pub card_title: Style,
    /// Style for the info marker that opens a tooltip.
    pub marker: Style,
    /// Style for the tooltip overlay.
    pub tooltip: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            unknown: Color::DarkGray,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            card_title: Style::default().fg(Color::Gray),
            marker: Style::default().fg(Color::Cyan),
            tooltip: Style::default().fg(Color::White).bg(Color::Black),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            unknown: Color::Gray,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            card_title: Style::default().fg(Color::DarkGray),
            marker: Style::default().fg(Color::Blue),
            tooltip: Style::default().fg(Color::Black).bg(Color::White),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn status_color(&self, status: Status) -> Color {
        match status {
            Status::Ok => self.healthy,
            Status::Unknown => self.unknown,
            Status::Warning => self.warning,
            Status::Critical => self.critical,
        }
    }

    /// Get style for a status
    pub fn status_style(&self, status: Status) -> Style {
        let style = Style::default().fg(self.status_color(status));
        match status {
            Status::Critical => style.add_modifier(Modifier::BOLD),
            Status::Unknown => style.add_modifier(Modifier::DIM),
            _ => style,
        }
    }

    /// Border color for a section: its configured accent, or the theme border.
    pub fn accent(&self, accent: Option<&str>) -> Color {
        accent.and_then(parse_hex_color).unwrap_or(self.border)
    }
}

/// Parse `#rrggbb` (or `#rgb`) into an RGB color.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match digits.len() {
        6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            let expand = |i: usize| channel(i..i + 1).map(|v| v * 17);
            Some(Color::Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#3498db"), Some(Color::Rgb(0x34, 0x98, 0xdb)));
        assert_eq!(parse_hex_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_hex_color("3498db"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        // Multi-byte input must not panic on slicing
        assert_eq!(parse_hex_color("#ééé"), None);
        assert_eq!(parse_hex_color("#aéééé"), None);
    }

    #[test]
    fn test_accent_falls_back_to_border() {
        let theme = Theme::dark();
        assert_eq!(theme.accent(None), theme.border);
        assert_eq!(theme.accent(Some("red")), theme.border);
        assert_eq!(theme.accent(Some("#000000")), Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_status_style_colors() {
        let theme = Theme::dark();
        assert_eq!(theme.status_style(Status::Ok).fg, Some(theme.healthy));
        assert_eq!(theme.status_style(Status::Critical).fg, Some(theme.critical));
        assert!(theme
            .status_style(Status::Critical)
            .add_modifier
            .contains(Modifier::BOLD));
    }
}
