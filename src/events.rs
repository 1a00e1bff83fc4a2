use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;

/// Rows moved by PgUp/PgDn.
const PAGE: u16 = 10;

/// Rows moved per mouse wheel notch.
const WHEEL: u16 = 3;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Reload
        KeyCode::Char('r') => app.reload(),

        // History window
        KeyCode::Char('[') => app.step_interval(false),
        KeyCode::Char(']') => app.step_interval(true),

        // Scrolling
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(PAGE),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        // Fold sections
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(n) = c.to_digit(10) {
                app.toggle_section(n as usize);
            }
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Esc => app.dismiss(),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Hover over an info marker
        MouseEventKind::Moved => app.hover(mouse.column, mouse.row),

        // Click on a section header
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),

        // Scroll wheel
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL),
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL),

        _ => {}
    }
}
