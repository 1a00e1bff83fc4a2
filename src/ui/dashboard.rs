//! Dashboard screen: sections of metric cards drawn from the view tree.
//!
//! Rendering runs in two passes. The layout pass places every visible
//! section header and card and writes the screen rectangles back into the
//! tree, so pointer hit tests and tooltip anchors see what is on screen.
//! The draw pass then reads the tree and paints it.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::config::DisplayMode;
use crate::ui::Theme;
use crate::view::overlay::place;
use crate::view::{ChartKind, ChartModel, Node, NodeId, NodeKind, TooltipManager, ViewTree};

/// Preferred card width; the grid fits as many as the width allows.
pub const CARD_WIDTH: u16 = 32;

/// Card height including its border.
pub const CARD_HEIGHT: u16 = 8;

/// Blank rows after each section.
const SECTION_GAP: u16 = 1;

/// Info marker drawn in a card's top border.
pub const MARKER: &str = "ⓘ";

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Placement of one section in content coordinates (y counts from the top of
/// the scrollable content, x from its left edge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSlot {
    pub node: NodeId,
    pub header: Rect,
    pub cards: Vec<(NodeId, Rect)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub sections: Vec<SectionSlot>,
    /// Total content height.
    pub height: u16,
}

/// Grid layout for `sections` in a content area `width` cells wide.
///
/// A collapsed section keeps its header row and places none of its cards.
pub fn layout(tree: &ViewTree, sections: &[NodeId], width: u16) -> Layout {
    let columns = (width / CARD_WIDTH).max(1);
    let card_width = width / columns;
    let mut y: u16 = 0;
    let mut slots = Vec::with_capacity(sections.len());

    for &section in sections {
        let header = Rect::new(0, y, width, 1);
        y = y.saturating_add(1);

        let cards: Vec<NodeId> = if tree.get(section).is_some_and(Node::collapsed) {
            Vec::new()
        } else {
            tree.children(section)
                .iter()
                .copied()
                .filter(|id| tree.get(*id).is_some_and(|n| n.kind() == NodeKind::Card))
                .collect()
        };
        let placed = cards
            .iter()
            .enumerate()
            .map(|(i, card)| {
                let col = i as u16 % columns;
                let row = i as u16 / columns;
                let rect = Rect::new(
                    col.saturating_mul(card_width),
                    y.saturating_add(row.saturating_mul(CARD_HEIGHT)),
                    card_width,
                    CARD_HEIGHT,
                );
                (*card, rect)
            })
            .collect();

        let rows = (cards.len() as u16).div_ceil(columns);
        y = y
            .saturating_add(rows.saturating_mul(CARD_HEIGHT))
            .saturating_add(SECTION_GAP);
        slots.push(SectionSlot {
            node: section,
            header,
            cards: placed,
        });
    }

    Layout {
        sections: slots,
        height: y,
    }
}

/// Screen rectangle for a content rectangle, when it is fully inside the
/// viewport after scrolling.
fn to_screen(rect: Rect, area: Rect, scroll: u16) -> Option<Rect> {
    let top = rect.y.checked_sub(scroll)?;
    if top.saturating_add(rect.height) > area.height || rect.right() > area.width {
        return None;
    }
    Some(Rect::new(
        area.x + rect.x,
        area.y + top,
        rect.width,
        rect.height,
    ))
}

/// Cell holding the info marker of a card drawn at `card`.
fn marker_rect(card: Rect) -> Rect {
    Rect::new(card.right().saturating_sub(3), card.y, 2, 1)
}

/// Lay out the dashboard in `area` and write the screen rectangles into the
/// tree. Returns the placement used.
pub fn apply_layout(app: &mut App, area: Rect) -> Layout {
    let sections = app.dashboard.section_order();
    let plan = layout(app.dashboard.tree(), &sections, area.width);
    app.set_max_scroll(plan.height.saturating_sub(area.height));
    let scroll = app.scroll;

    let tree = app.dashboard.tree_mut();
    tree.clear_layout();
    for slot in &plan.sections {
        if let Some(rect) = to_screen(slot.header, area, scroll) {
            tree.set_bounds(slot.node, rect);
        }
        for (card, rect) in &slot.cards {
            if let Some(rect) = to_screen(*rect, area, scroll) {
                tree.set_bounds(*card, rect);
                tree.set_hotspot(*card, marker_rect(rect));
            }
        }
    }
    plan
}

/// Render the dashboard content area, including the tooltip overlay.
pub fn render_dashboard(frame: &mut Frame, app: &mut App, area: Rect) {
    let plan = apply_layout(app, area);
    let theme = &app.theme;
    let tree = app.dashboard.tree();

    if plan.sections.is_empty() {
        let text = Paragraph::new(" Waiting for the first snapshot...")
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(text, area);
        return;
    }

    for (index, slot) in plan.sections.iter().enumerate() {
        let Some(section) = tree.get(slot.node) else {
            continue;
        };
        let accent = theme.accent(section.accent());
        if let Some(rect) = section.bounds() {
            render_section_header(frame, theme, section, index + 1, accent, rect);
        }
        for (card, _) in &slot.cards {
            let Some(node) = tree.get(*card) else {
                continue;
            };
            if let Some(rect) = node.bounds() {
                render_card(frame, theme, tree, *card, section.display(), accent, rect);
            }
        }
    }

    if let Some(overlay) = app.dashboard.tooltip().overlay() {
        if let Some(rect) = tooltip_rect(tree, app.dashboard.tooltip(), frame.area()) {
            render_tooltip(frame, theme, tree, overlay, rect);
        }
    }
}

/// Where the live tooltip is drawn in `frame`: beside its card when there is
/// room, and never on top of it.
pub fn tooltip_rect(tree: &ViewTree, tooltip: &TooltipManager, frame: Rect) -> Option<Rect> {
    let bounds = tree.get(tooltip.overlay()?)?.bounds()?;
    let card = tooltip
        .anchor()
        .and_then(|id| tree.get(id))
        .and_then(Node::bounds)
        .unwrap_or(Rect::new(bounds.x, bounds.y, 0, 0));
    Some(place(bounds, card, frame))
}

fn render_section_header(
    frame: &mut Frame,
    theme: &Theme,
    section: &Node,
    number: usize,
    accent: Color,
    area: Rect,
) {
    let status = section.status();
    let fold = if section.collapsed() { "▸" } else { "▾" };
    let mut spans = vec![
        Span::styled(format!("{} ", fold), Style::default().fg(accent)),
        Span::styled(format!("{} ", number), Style::default().add_modifier(Modifier::DIM)),
        Span::styled(
            section.title().to_string(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(status.symbol(), theme.status_style(status)),
    ];
    if section.collapsed() {
        spans.push(Span::styled(
            format!(" ({} cards)", section.children().len()),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_card(
    frame: &mut Frame,
    theme: &Theme,
    tree: &ViewTree,
    id: NodeId,
    display: DisplayMode,
    accent: Color,
    area: Rect,
) {
    let Some(card) = tree.get(id) else {
        return;
    };
    let title_width = area.width.saturating_sub(7) as usize;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(accent))
        .title_top(Span::styled(
            format!(" {} ", truncate(card.title(), title_width)),
            theme.card_title,
        ))
        .title_top(Line::from(Span::styled(MARKER, theme.marker)).right_aligned());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let status = card.status();
    let value = Line::from(vec![
        Span::styled(
            card.text().to_string(),
            theme.status_style(status).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            status.symbol(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(value), Rect { height: 1, ..inner });

    let model = tree
        .children(id)
        .iter()
        .filter_map(|id| tree.get(*id))
        .find(|n| n.kind() == NodeKind::Chart)
        .and_then(Node::chart);

    let mut chart_area = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
        ..inner
    };
    if display == DisplayMode::Counter && chart_area.height > 0 {
        let row = Rect { height: 1, ..chart_area };
        let spark = model
            .map(|m| sparkline(&m.sparkline(inner.width.saturating_sub(10) as usize)))
            .unwrap_or_default();
        let line = Line::from(vec![
            Span::styled(format!("{:<9} ", card.detail()), theme.card_title),
            Span::styled(spark, Style::default().fg(theme.status_color(status))),
        ]);
        frame.render_widget(Paragraph::new(line), row);
        chart_area.y += 1;
        chart_area.height = chart_area.height.saturating_sub(1);
    }

    if let Some(model) = model {
        if chart_area.height > 0 {
            render_chart(frame, theme, model, chart_area);
        }
    }
}

fn render_chart(frame: &mut Frame, theme: &Theme, model: &ChartModel, area: Rect) {
    let color = theme.status_color(model.style.status);
    match model.style.kind {
        ChartKind::Line => {
            let datasets: Vec<Dataset> = model
                .segments
                .iter()
                .map(|segment| {
                    Dataset::default()
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(color))
                        .data(segment)
                })
                .collect();
            let chart = Chart::new(datasets)
                .x_axis(Axis::default().bounds(model.x_bounds))
                .y_axis(Axis::default().bounds(model.y_bounds));
            frame.render_widget(chart, area);
        }
        ChartKind::Histogram => {
            let bins = model.bins.len().max(1) as u16;
            let bars: Vec<Bar> = model
                .bins
                .iter()
                .map(|count| Bar::default().value(*count).text_value(String::new()))
                .collect();
            let chart = BarChart::default()
                .data(BarGroup::default().bars(&bars))
                .bar_width((area.width / bins).max(1))
                .bar_gap(0)
                .bar_style(Style::default().fg(color));
            frame.render_widget(chart, area);
        }
    }
}

fn render_tooltip(frame: &mut Frame, theme: &Theme, tree: &ViewTree, overlay: NodeId, rect: Rect) {
    let Some(node) = tree.get(overlay) else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.highlight));
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(node.text().to_string())
            .block(block)
            .style(theme.tooltip),
        rect,
    );
}

/// Map 0..=100 bar heights to block characters.
fn sparkline(values: &[u64]) -> String {
    values
        .iter()
        .map(|&v| SPARKLINE_CHARS[(v.min(100) * 7 / 100) as usize])
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
