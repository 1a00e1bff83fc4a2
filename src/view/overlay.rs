//! Tooltip overlay.
//!
//! A dashboard has one [`TooltipManager`], and the manager keeps at most one
//! overlay node in the tree. Hiding is deferred by [`HIDE_DELAY`] so the
//! pointer can cross the gap between two info markers without flicker.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use super::tree::{NodeId, NodeKind, ViewTree};

/// Delay between [`TooltipManager::hide`] and the overlay going away.
pub const HIDE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Live {
    node: NodeId,
    anchor: NodeId,
}

#[derive(Debug, Default)]
pub struct TooltipManager {
    live: Option<Live>,
    hide_at: Option<Instant>,
}

impl TooltipManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` beside `anchor`, replacing any live tooltip.
    ///
    /// Does nothing if the anchor is gone or has not been laid out.
    pub fn show(
        &mut self,
        tree: &mut ViewTree,
        anchor: NodeId,
        text: &str,
        _now: Instant,
    ) -> Option<NodeId> {
        let rect = tree.anchor_rect(anchor)?;
        self.hide_at = None;

        if let Some(live) = self.live {
            let same = live.anchor == anchor
                && tree.get(live.node).is_some_and(|n| n.text() == text);
            if same {
                return Some(live.node);
            }
            self.destroy(tree);
        }

        let node = tree.create(tree.root(), NodeKind::Overlay, "tooltip")?;
        tree.set_text(node, text);
        tree.set_bounds(node, overlay_rect(rect, text));
        self.live = Some(Live { node, anchor });
        Some(node)
    }

    /// Schedule the live tooltip for removal after [`HIDE_DELAY`].
    pub fn hide(&mut self, now: Instant) {
        if self.live.is_some() && self.hide_at.is_none() {
            self.hide_at = Some(now + HIDE_DELAY);
        }
    }

    /// Remove the tooltip if its scheduled hide is due. Returns whether it did.
    pub fn tick(&mut self, tree: &mut ViewTree, now: Instant) -> bool {
        match self.hide_at {
            Some(due) if now >= due => {
                self.destroy(tree);
                true
            }
            _ => false,
        }
    }

    /// Remove the tooltip immediately and cancel any scheduled hide.
    pub fn hide_all(&mut self, tree: &mut ViewTree) {
        self.destroy(tree);
    }

    fn destroy(&mut self, tree: &mut ViewTree) {
        self.hide_at = None;
        if let Some(live) = self.live.take() {
            tree.remove(live.node);
        }
    }

    /// Replace the text of the live tooltip, resizing it in place.
    ///
    /// Used when the anchor's hint changes under an open tooltip.
    pub fn update_text(&mut self, tree: &mut ViewTree, text: &str) -> bool {
        let Some(live) = self.live else {
            return false;
        };
        if !tree.set_text(live.node, text) {
            return false;
        }
        if let Some(rect) = tree.anchor_rect(live.anchor) {
            tree.set_bounds(live.node, overlay_rect(rect, text));
        }
        true
    }

    /// The node the live tooltip is attached to.
    pub fn anchor(&self) -> Option<NodeId> {
        self.live.map(|l| l.anchor)
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.live.map(|l| l.node)
    }

    pub fn is_visible(&self) -> bool {
        self.live.is_some()
    }

    pub fn hide_pending(&self) -> bool {
        self.hide_at.is_some()
    }
}

/// Box to the right of the anchor, sized to fit the text plus a border.
fn overlay_rect(anchor: Rect, text: &str) -> Rect {
    let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let height = text.lines().count().max(1) as u16;
    Rect::new(
        anchor.right().saturating_add(1),
        anchor.top(),
        width.saturating_add(4),
        height.saturating_add(2),
    )
}

/// Final on-screen box for a tooltip of `preferred` size, kept inside `frame`
/// and off `avoid` (the anchor card).
///
/// Tries the preferred spot, then left of `avoid`, then below it, then above
/// it. When nothing fits the box is clamped into the frame.
pub fn place(preferred: Rect, avoid: Rect, frame: Rect) -> Rect {
    let width = preferred.width.min(frame.width);
    let height = preferred.height.min(frame.height);
    let clamp_x = |x: u16| x.clamp(frame.x, frame.right().saturating_sub(width));

    let mut candidates = vec![Rect::new(preferred.x, preferred.y, width, height)];
    if let Some(x) = avoid.x.checked_sub(width.saturating_add(1)) {
        candidates.push(Rect::new(x, preferred.y, width, height));
    }
    candidates.push(Rect::new(clamp_x(avoid.x), avoid.bottom(), width, height));
    if let Some(y) = avoid.y.checked_sub(height) {
        candidates.push(Rect::new(clamp_x(avoid.x), y, width, height));
    }

    candidates
        .into_iter()
        .find(|r| frame.union(*r) == frame && !r.intersects(avoid))
        .unwrap_or_else(|| clamp_into(preferred, frame))
}

/// Shift (and if needed shrink) `rect` so it lies inside `bounds`.
pub fn clamp_into(rect: Rect, bounds: Rect) -> Rect {
    let width = rect.width.min(bounds.width);
    let height = rect.height.min(bounds.height);
    let x = rect.x.clamp(bounds.x, bounds.right().saturating_sub(width));
    let y = rect.y.clamp(bounds.y, bounds.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}
