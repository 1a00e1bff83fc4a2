//! Retained view tree.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Every setter compares before
//! writing and only counts a mutation when something actually changed, which
//! is what lets a second reconciliation of the same snapshot report zero work.
//!
//! Layout (on-screen bounds and info-marker hotspots) is written by the
//! renderer each frame and is not counted as a mutation. Neither is the
//! collapsed flag of a section, which only the user toggles.

use std::collections::HashMap;

use ratatui::layout::{Position, Rect};

use super::chart::{ChartModel, ChartSurface};
use crate::config::DisplayMode;
use crate::data::Status;

/// Handle to a node in a [`ViewTree`]. Never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Section,
    Card,
    Chart,
    Overlay,
}

/// Counters of tree mutations since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub created: usize,
    pub removed: usize,
    pub updated: usize,
    pub reordered: usize,
    pub charts: usize,
}

impl MutationStats {
    pub fn total(&self) -> usize {
        self.created + self.removed + self.updated + self.reordered + self.charts
    }

    /// Mutations made after `earlier` was taken.
    pub fn since(&self, earlier: &MutationStats) -> MutationStats {
        MutationStats {
            created: self.created - earlier.created,
            removed: self.removed - earlier.removed,
            updated: self.updated - earlier.updated,
            reordered: self.reordered - earlier.reordered,
            charts: self.charts - earlier.charts,
        }
    }
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    key: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    title: String,
    text: String,
    detail: String,
    hint: String,
    status: Status,
    accent: Option<String>,
    display: DisplayMode,
    chart: Option<ChartModel>,
    bounds: Option<Rect>,
    hotspot: Option<Rect>,
    collapsed: bool,
}

impl Node {
    fn new(kind: NodeKind, key: &str, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            key: key.to_string(),
            parent,
            children: Vec::new(),
            title: String::new(),
            text: String::new(),
            detail: String::new(),
            hint: String::new(),
            status: Status::Unknown,
            accent: None,
            display: DisplayMode::Compact,
            chart: None,
            bounds: None,
            hotspot: None,
            collapsed: false,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Stable identity key (category name, metric id, ...).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Displayed value for cards, tooltip text for overlays.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Secondary line (rate of a counter card).
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Hover hint shown by the tooltip.
    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Section color as configured (`#rrggbb`).
    pub fn accent(&self) -> Option<&str> {
        self.accent.as_deref()
    }

    pub fn display(&self) -> DisplayMode {
        self.display
    }

    pub fn chart(&self) -> Option<&ChartModel> {
        self.chart.as_ref()
    }

    /// On-screen bounds from the last layout, if the node was visible.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// On-screen bounds of the node's info marker.
    pub fn hotspot(&self) -> Option<Rect> {
        self.hotspot
    }

    /// Whether a section is folded to its header.
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }
}

/// Arena of view nodes rooted at a single [`NodeKind::Root`].
#[derive(Debug, Clone)]
pub struct ViewTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    stats: MutationStats,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(NodeKind::Root, "", None));
        Self {
            nodes,
            root,
            next_id: 1,
            stats: MutationStats::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Children of a node, empty if the node is gone.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(Node::children).unwrap_or(&[])
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    /// Live nodes of a given kind, in no particular order.
    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    /// Whether `id` is `ancestor` or lies in its subtree.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent);
        }
        false
    }

    /// Append a new node under `parent`. Returns `None` if the parent is gone.
    pub fn create(&mut self, parent: NodeId, kind: NodeKind, key: &str) -> Option<NodeId> {
        let id = NodeId(self.next_id);
        self.nodes.get_mut(&parent)?.children.push(id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind, key, Some(parent)));
        self.stats.created += 1;
        Some(id)
    }

    /// Remove a node and its subtree. Removing the root is refused.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.nodes.get(&id).map(|n| n.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| *child != id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children);
                self.stats.removed += 1;
            }
        }
        true
    }

    /// Write `value` into a node field if it differs.
    fn update<T, F>(&mut self, id: NodeId, value: T, field: F) -> bool
    where
        T: PartialEq,
        F: FnOnce(&mut Node) -> &mut T,
    {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let slot = field(node);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.stats.updated += 1;
        true
    }

    pub fn set_title(&mut self, id: NodeId, title: &str) -> bool {
        if self.get(id).is_some_and(|n| n.title == title) {
            return false;
        }
        self.update(id, title.to_string(), |n| &mut n.title)
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
        if self.get(id).is_some_and(|n| n.text == text) {
            return false;
        }
        self.update(id, text.to_string(), |n| &mut n.text)
    }

    pub fn set_detail(&mut self, id: NodeId, detail: &str) -> bool {
        if self.get(id).is_some_and(|n| n.detail == detail) {
            return false;
        }
        self.update(id, detail.to_string(), |n| &mut n.detail)
    }

    pub fn set_hint(&mut self, id: NodeId, hint: &str) -> bool {
        if self.get(id).is_some_and(|n| n.hint == hint) {
            return false;
        }
        self.update(id, hint.to_string(), |n| &mut n.hint)
    }

    pub fn set_status(&mut self, id: NodeId, status: Status) -> bool {
        self.update(id, status, |n| &mut n.status)
    }

    pub fn set_accent(&mut self, id: NodeId, accent: &str) -> bool {
        if self.get(id).is_some_and(|n| n.accent.as_deref() == Some(accent)) {
            return false;
        }
        self.update(id, Some(accent.to_string()), |n| &mut n.accent)
    }

    pub fn set_display(&mut self, id: NodeId, display: DisplayMode) -> bool {
        self.update(id, display, |n| &mut n.display)
    }

    /// Reorder the children of `parent` to match `order`.
    ///
    /// `order` must be a permutation of the current children; anything else
    /// is refused. Nothing is counted when the order is already right.
    pub fn reorder_children(&mut self, parent: NodeId, order: &[NodeId]) -> bool {
        let Some(node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        if node.children == order {
            return false;
        }
        let mut current = node.children.clone();
        let mut wanted = order.to_vec();
        current.sort_unstable();
        wanted.sort_unstable();
        if current != wanted {
            return false;
        }
        node.children = order.to_vec();
        self.stats.reordered += 1;
        true
    }

    /// Forget all layout; the renderer sets it again for visible nodes.
    ///
    /// Overlays keep their position, which is set when they are created.
    pub fn clear_layout(&mut self) {
        for node in self.nodes.values_mut() {
            if node.kind != NodeKind::Overlay {
                node.bounds = None;
                node.hotspot = None;
            }
        }
    }

    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.bounds = Some(bounds);
        }
    }

    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.collapsed = collapsed;
        }
    }

    pub fn set_hotspot(&mut self, id: NodeId, hotspot: Rect) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.hotspot = Some(hotspot);
        }
    }

    /// The card whose info marker covers the given cell.
    pub fn hotspot_at(&self, column: u16, row: u16) -> Option<NodeId> {
        self.nodes.iter().find_map(|(id, node)| {
            node.hotspot
                .filter(|r| r.contains(Position::new(column, row)))
                .map(|_| *id)
        })
    }

    /// Rectangle a tooltip should be placed beside: the info marker when it
    /// was laid out, otherwise the whole node.
    pub fn anchor_rect(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(&id)?;
        node.hotspot.or(node.bounds)
    }
}

impl ChartSurface for ViewTree {
    fn contains(&self, container: NodeId) -> bool {
        self.nodes
            .get(&container)
            .is_some_and(|n| n.kind == NodeKind::Chart)
    }

    fn draw(&mut self, container: NodeId, model: ChartModel) -> bool {
        let Some(node) = self.nodes.get_mut(&container) else {
            return false;
        };
        if node.chart.as_ref() == Some(&model) {
            return false;
        }
        node.chart = Some(model);
        self.stats.charts += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_remove_subtree() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let section = tree.create(root, NodeKind::Section, "DB").unwrap();
        let card = tree.create(section, NodeKind::Card, "db_conn").unwrap();
        let chart = tree.create(card, NodeKind::Chart, "chart").unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree.is_within(chart, section));
        assert!(!tree.is_within(section, card));

        assert!(tree.remove(section));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(chart));
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.stats().removed, 3);
        assert!(!tree.remove(root));
    }

    #[test]
    fn create_under_missing_parent_fails() {
        let mut tree = ViewTree::new();
        let section = tree.create(tree.root(), NodeKind::Section, "a").unwrap();
        tree.remove(section);
        assert!(tree.create(section, NodeKind::Card, "x").is_none());
    }

    #[test]
    fn setters_only_count_real_changes() {
        let mut tree = ViewTree::new();
        let card = tree.create(tree.root(), NodeKind::Card, "cpu").unwrap();
        let before = tree.stats();

        assert!(tree.set_text(card, "0.90"));
        assert!(!tree.set_text(card, "0.90"));
        assert!(tree.set_status(card, Status::Warning));
        assert!(!tree.set_status(card, Status::Warning));
        assert!(tree.set_accent(card, "#3498db"));
        assert!(!tree.set_accent(card, "#3498db"));

        assert_eq!(tree.stats().since(&before).updated, 3);
        assert_eq!(tree.get(card).unwrap().text(), "0.90");
    }

    #[test]
    fn reorder_only_when_different() {
        let mut tree = ViewTree::new();
        let root = tree.root();
        let a = tree.create(root, NodeKind::Section, "a").unwrap();
        let b = tree.create(root, NodeKind::Section, "b").unwrap();

        assert!(!tree.reorder_children(root, &[a, b]));
        assert!(tree.reorder_children(root, &[b, a]));
        assert_eq!(tree.children(root), &[b, a]);
        // Not a permutation
        assert!(!tree.reorder_children(root, &[a]));
        assert_eq!(tree.stats().reordered, 1);
    }

    #[test]
    fn hotspot_lookup_and_layout_reset() {
        let mut tree = ViewTree::new();
        let card = tree.create(tree.root(), NodeKind::Card, "cpu").unwrap();
        tree.set_bounds(card, Rect::new(0, 0, 20, 5));
        tree.set_hotspot(card, Rect::new(18, 0, 1, 1));

        assert_eq!(tree.hotspot_at(18, 0), Some(card));
        assert_eq!(tree.hotspot_at(5, 2), None);
        assert_eq!(tree.anchor_rect(card), Some(Rect::new(18, 0, 1, 1)));

        let before = tree.stats();
        tree.clear_layout();
        assert_eq!(tree.stats(), before);
        assert_eq!(tree.anchor_rect(card), None);
    }
}
