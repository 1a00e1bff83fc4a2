//! Snapshot reconciliation.
//!
//! [`Dashboard`] owns the view tree and patches it to match each snapshot.
//! Sections and cards keep stable identities across polls: a node is created
//! the first time its key shows up, updated in place while the key persists,
//! and removed only when configuration stops asking for it.
//!
//! ```text
//! root
//!  ├── section "KPI"          (headline, always first)
//!  │    ├── card tx_pool_size
//!  │    │    └── chart
//!  │    └── card process_cpu_usage
//!  ├── section "PostgreSQL"   (by priority)
//!  │    └── card db_conn      ("no data" placeholder)
//!  └── overlay                (tooltip, at most one)
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use ratatui::layout::Position;
use tracing::debug;

use crate::config::{DisplayMode, MetricSpec, SectionConfig, Settings};
use crate::data::format::format_value;
use crate::data::history::rate;
use crate::data::metric::base_name;
use crate::data::{classify, classify_ratio, MetricId, MetricSnapshot, Status, Thresholds};
use crate::view::{
    ChartAdapter, ChartOutcome, ChartStyle, MutationStats, NodeId, NodeKind, TooltipManager,
    ViewTree,
};

/// Identity of a card: its category and the metric (or unmatched pattern) it shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardKey {
    pub category: String,
    pub metric: MetricId,
}

impl CardKey {
    pub fn new(category: &str, metric: impl Into<MetricId>) -> Self {
        Self {
            category: category.to_string(),
            metric: metric.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CardEntity {
    node: NodeId,
    chart: Option<NodeId>,
    status: Status,
}

/// Card counts by status, for the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub ok: usize,
    pub unknown: usize,
    pub warning: usize,
    pub critical: usize,
}

impl StatusCounts {
    fn add(&mut self, status: Status) {
        match status {
            Status::Ok => self.ok += 1,
            Status::Unknown => self.unknown += 1,
            Status::Warning => self.warning += 1,
            Status::Critical => self.critical += 1,
        }
    }
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Tree mutations made by the pass.
    pub mutations: MutationStats,
    pub sections: usize,
    pub cards: usize,
    /// Cards showing the "no data" placeholder.
    pub placeholders: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.mutations.total() == 0
    }
}

/// Dashboard state: the view tree, identity maps and tooltip.
#[derive(Debug)]
pub struct Dashboard {
    settings: Settings,
    tree: ViewTree,
    sections: HashMap<String, NodeId>,
    cards: HashMap<CardKey, CardEntity>,
    tooltip: TooltipManager,
    last_reconciled: Option<Instant>,
    last_report: ReconcileReport,
}

impl Dashboard {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            tree: ViewTree::new(),
            sections: HashMap::new(),
            cards: HashMap::new(),
            tooltip: TooltipManager::new(),
            last_reconciled: None,
            last_report: ReconcileReport::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    /// Mutable tree access for the renderer's layout pass.
    pub fn tree_mut(&mut self) -> &mut ViewTree {
        &mut self.tree
    }

    /// Patch the tree to reflect `snapshot`.
    pub fn reconcile(&mut self, snapshot: &MetricSnapshot) -> ReconcileReport {
        let before = self.tree.stats();
        let plan = self.plan(snapshot);

        // Sections that configuration no longer declares
        let wanted: HashSet<&str> = plan.iter().map(|(s, _)| s.category.as_str()).collect();
        let stale: Vec<String> = self
            .sections
            .keys()
            .filter(|c| !wanted.contains(c.as_str()))
            .cloned()
            .collect();
        for category in stale {
            if let Some(node) = self.sections.remove(&category) {
                self.release(node);
                self.cards.retain(|key, _| key.category != category);
            }
        }

        let root = self.tree.root();
        let mut order = Vec::with_capacity(plan.len());
        let mut placeholders = 0;
        let mut cards = 0;
        for (section, keys) in &plan {
            let Some(node) = self.ensure_section(root, section) else {
                continue;
            };
            placeholders += keys.iter().filter(|k| !snapshot.contains(k.as_str())).count();
            cards += keys.len();
            self.reconcile_cards(node, section, keys, snapshot);
            order.push(node);
        }

        // Overlay stays after the sections
        let rest: Vec<NodeId> = self
            .tree
            .children(root)
            .iter()
            .filter(|id| !order.contains(id))
            .copied()
            .collect();
        order.extend(rest);
        self.tree.reorder_children(root, &order);

        let report = ReconcileReport {
            mutations: self.tree.stats().since(&before),
            sections: plan.len(),
            cards,
            placeholders,
        };
        debug!(
            sections = report.sections,
            cards = report.cards,
            placeholders = report.placeholders,
            mutations = report.mutations.total(),
            "reconciled snapshot"
        );
        self.last_reconciled = Some(Instant::now());
        self.last_report = report;
        report
    }

    /// Sections in display order with the card keys each must show.
    fn plan(&self, snapshot: &MetricSnapshot) -> Vec<(SectionConfig, Vec<MetricId>)> {
        let headline = self.settings.headline.as_str();
        let mut owned: HashSet<MetricId> = HashSet::new();
        let mut keyed: Vec<(SectionConfig, Vec<MetricId>)> = Vec::new();

        // Ownership follows declaration order, display follows priority
        for section in &self.settings.sections {
            let keys = if section.category == headline {
                headline_keys(section, snapshot)
            } else {
                owned_keys(section, snapshot, &mut owned)
            };
            keyed.push((section.clone(), keys));
        }

        keyed.sort_by_key(|(s, _)| (s.category != headline, s.priority));
        keyed
    }

    fn ensure_section(&mut self, root: NodeId, section: &SectionConfig) -> Option<NodeId> {
        let node = match self.sections.get(&section.category) {
            Some(node) => *node,
            None => {
                let node = self.tree.create(root, NodeKind::Section, &section.category)?;
                self.sections.insert(section.category.clone(), node);
                node
            }
        };
        self.tree.set_title(node, &section.category);
        self.tree.set_accent(node, &section.color);
        self.tree.set_display(node, section.display);
        Some(node)
    }

    fn reconcile_cards(
        &mut self,
        section_node: NodeId,
        section: &SectionConfig,
        keys: &[MetricId],
        snapshot: &MetricSnapshot,
    ) {
        let category = section.category.as_str();

        let stale: Vec<CardKey> = self
            .cards
            .keys()
            .filter(|k| k.category == category && !keys.contains(&k.metric))
            .cloned()
            .collect();
        for key in stale {
            if let Some(card) = self.cards.remove(&key) {
                self.release(card.node);
            }
        }

        let mut order = Vec::with_capacity(keys.len());
        let mut worst = Status::Ok;
        for metric in keys {
            let key = CardKey::new(category, metric.clone());
            let Some(entity) = self.ensure_card(section_node, key.clone()) else {
                continue;
            };
            let entity = self.update_card(entity, metric, section.display, snapshot);
            worst = worst.max(entity.status);
            self.cards.insert(key, entity);
            order.push(entity.node);
        }
        self.tree.reorder_children(section_node, &order);
        self.tree.set_status(section_node, worst);
    }

    fn ensure_card(&mut self, section_node: NodeId, key: CardKey) -> Option<CardEntity> {
        if let Some(entity) = self.cards.get(&key) {
            return Some(*entity);
        }
        let node = self
            .tree
            .create(section_node, NodeKind::Card, key.metric.as_str())?;
        let entity = CardEntity {
            node,
            chart: None,
            status: Status::Unknown,
        };
        self.cards.insert(key, entity);
        Some(entity)
    }

    fn update_card(
        &mut self,
        mut entity: CardEntity,
        metric: &MetricId,
        display: DisplayMode,
        snapshot: &MetricSnapshot,
    ) -> CardEntity {
        let spec = self.settings.metric_spec(metric).cloned().unwrap_or_default();
        let value = snapshot.value(metric.as_str());
        let thresholds = resolve_thresholds(metric, snapshot, &spec);
        let status = match &spec.ratio_of {
            Some(denominator) => {
                let denominator = denominator_for(metric, denominator, snapshot);
                classify_ratio(value, snapshot.value(&denominator), thresholds.as_ref())
            }
            None => classify(value, thresholds.as_ref()),
        };

        let node = entity.node;
        let title = spec.title.as_deref().unwrap_or(metric.as_str());
        self.tree.set_title(node, title);
        self.tree
            .set_text(node, &format_value(value, spec.format, &spec.unit));
        if self.tree.set_status(node, status) {
            debug!(
                metric = %metric,
                from = entity.status.class(),
                to = status.class(),
                "status changed"
            );
        }
        let hint = hint_text(metric, title, &spec, thresholds.as_ref());
        if self.tree.set_hint(node, &hint) && self.tooltip.anchor() == Some(node) {
            self.tooltip.update_text(&mut self.tree, &hint);
        }

        let history = snapshot.history(metric.as_str());
        let detail = match display {
            DisplayMode::Counter => rate(history)
                .map(|r| format!("{:+.1}/s", r))
                .unwrap_or_default(),
            DisplayMode::Compact => String::new(),
        };
        self.tree.set_detail(node, &detail);

        match spec.chart.kind() {
            Some(kind) => {
                let chart = match entity.chart.filter(|c| self.tree.contains(*c)) {
                    Some(chart) => Some(chart),
                    None => self.tree.create(node, NodeKind::Chart, "chart"),
                };
                if let Some(chart) = chart {
                    let outcome = ChartAdapter::render(
                        &mut self.tree,
                        chart,
                        history,
                        ChartStyle { kind, status },
                    );
                    if outcome == ChartOutcome::MissingContainer {
                        debug!(metric = %metric, "chart container missing");
                    }
                }
                entity.chart = chart;
            }
            None => {
                if let Some(chart) = entity.chart.take() {
                    self.tree.remove(chart);
                }
            }
        }

        entity.status = status;
        entity
    }

    /// Remove a node, dropping the tooltip first if it hangs off that subtree.
    fn release(&mut self, node: NodeId) {
        if self
            .tooltip
            .anchor()
            .is_some_and(|anchor| self.tree.is_within(anchor, node))
        {
            self.tooltip.hide_all(&mut self.tree);
        }
        self.tree.remove(node);
    }

    /// Statuses of the cards the header summarizes. Headline cards duplicate
    /// metrics shown elsewhere and are left out.
    fn counted_statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.cards
            .iter()
            .filter(|(key, _)| key.category != self.settings.headline)
            .map(|(_, card)| card.status)
    }

    /// Worst status across the counted cards; `Ok` for an empty dashboard.
    pub fn overall_status(&self) -> Status {
        self.counted_statuses().max().unwrap_or(Status::Ok)
    }

    /// Card counts by status, over the same cards as [`Self::overall_status`].
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for status in self.counted_statuses() {
            counts.add(status);
        }
        counts
    }

    /// When the last reconciliation ran.
    pub fn last_reconciled(&self) -> Option<Instant> {
        self.last_reconciled
    }

    pub fn last_report(&self) -> ReconcileReport {
        self.last_report
    }

    pub fn section_node(&self, category: &str) -> Option<NodeId> {
        self.sections.get(category).copied()
    }

    pub fn card_node(&self, category: &str, metric: &str) -> Option<NodeId> {
        self.cards
            .get(&CardKey::new(category, metric))
            .map(|c| c.node)
    }

    /// Section nodes in display order.
    pub fn section_order(&self) -> Vec<NodeId> {
        self.tree
            .children(self.tree.root())
            .iter()
            .copied()
            .filter(|id| {
                self.tree
                    .get(*id)
                    .is_some_and(|n| n.kind() == NodeKind::Section)
            })
            .collect()
    }

    pub fn tooltip(&self) -> &TooltipManager {
        &self.tooltip
    }

    /// Fold or unfold a section. Returns the new collapsed state, or `None`
    /// if `section` is not a live section.
    ///
    /// Folding drops a tooltip anchored inside the section. The flag is view
    /// state and survives reconciliation untouched.
    pub fn toggle_section(&mut self, section: NodeId) -> Option<bool> {
        let node = self.tree.get(section).filter(|n| n.kind() == NodeKind::Section)?;
        let collapsed = !node.collapsed();
        self.tree.set_collapsed(section, collapsed);
        if collapsed
            && self
                .tooltip
                .anchor()
                .is_some_and(|anchor| self.tree.is_within(anchor, section))
        {
            self.tooltip.hide_all(&mut self.tree);
        }
        Some(collapsed)
    }

    /// Section whose header was laid out at a terminal cell.
    pub fn section_at(&self, column: u16, row: u16) -> Option<NodeId> {
        let cell = Position::new(column, row);
        self.section_order().into_iter().find(|id| {
            self.tree
                .get(*id)
                .and_then(|n| n.bounds())
                .is_some_and(|r| r.contains(cell))
        })
    }

    /// Show a card's hint beside it.
    pub fn show_tooltip(&mut self, card: NodeId, now: Instant) -> Option<NodeId> {
        let hint = self.tree.get(card)?.hint().to_string();
        self.tooltip.show(&mut self.tree, card, &hint, now)
    }

    /// Pointer moved to a cell: show the tooltip of the info marker under it,
    /// or schedule the current one to hide.
    pub fn hover(&mut self, column: u16, row: u16, now: Instant) {
        match self.tree.hotspot_at(column, row) {
            Some(card) => {
                self.show_tooltip(card, now);
            }
            None => self.tooltip.hide(now),
        }
    }

    pub fn hide_tooltip(&mut self, now: Instant) {
        self.tooltip.hide(now);
    }

    pub fn hide_all_tooltips(&mut self) {
        self.tooltip.hide_all(&mut self.tree);
    }

    /// Run deferred work (tooltip hide) that is due at `now`.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.tooltip.tick(&mut self.tree, now)
    }
}

/// Cards for a regular section. Metrics already owned by an earlier section
/// are skipped; a pattern with no live match keeps a placeholder slot.
fn owned_keys(
    section: &SectionConfig,
    snapshot: &MetricSnapshot,
    owned: &mut HashSet<MetricId>,
) -> Vec<MetricId> {
    let mut keys = Vec::new();
    for pattern in &section.metrics {
        let matches: Vec<&MetricId> = snapshot.matching(pattern).collect();
        if matches.is_empty() {
            let placeholder = MetricId::from(pattern.as_str());
            if owned.insert(placeholder.clone()) {
                keys.push(placeholder);
            }
            continue;
        }
        for id in matches {
            if owned.insert(id.clone()) {
                keys.push(id.clone());
            }
        }
    }
    keys
}

/// Cards for the headline section: the snapshot's prominent set when it
/// names one, otherwise the section's own patterns. Ownership does not apply.
fn headline_keys(section: &SectionConfig, snapshot: &MetricSnapshot) -> Vec<MetricId> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    match &snapshot.prominent {
        Some(prominent) => {
            for id in prominent {
                if seen.insert(id.clone()) {
                    keys.push(id.clone());
                }
            }
        }
        None => {
            for pattern in &section.metrics {
                let matches: Vec<MetricId> = snapshot.matching(pattern).cloned().collect();
                let ids = if matches.is_empty() {
                    vec![MetricId::from(pattern.as_str())]
                } else {
                    matches
                };
                for id in ids {
                    if seen.insert(id.clone()) {
                        keys.push(id);
                    }
                }
            }
        }
    }
    keys
}

/// Snapshot thresholds win over configured ones; each is looked up by exact
/// id first, then by base name.
fn resolve_thresholds(
    metric: &MetricId,
    snapshot: &MetricSnapshot,
    spec: &MetricSpec,
) -> Option<Thresholds> {
    snapshot
        .thresholds(metric.as_str())
        .or_else(|| snapshot.thresholds(metric.base_name()))
        .copied()
        .or(spec.thresholds)
}

/// Denominator for a ratio metric. A labelled numerator prefers the
/// denominator with the same label set when the snapshot has one.
fn denominator_for(metric: &MetricId, denominator: &MetricId, snapshot: &MetricSnapshot) -> String {
    if metric.has_labels() && !denominator.has_labels() {
        let labels = &metric.as_str()[base_name(metric.as_str()).len()..];
        let labelled = format!("{}{}", denominator, labels);
        if snapshot.contains(&labelled) {
            return labelled;
        }
    }
    denominator.to_string()
}

fn hint_text(
    metric: &MetricId,
    title: &str,
    spec: &MetricSpec,
    thresholds: Option<&Thresholds>,
) -> String {
    let mut lines = vec![spec
        .description
        .clone()
        .unwrap_or_else(|| title.to_string())];
    if title != metric.as_str() {
        lines.push(metric.to_string());
    }
    if let Some(t) = thresholds {
        let bound = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{}", v));
        let subject = if spec.ratio_of.is_some() { "ratio " } else { "" };
        lines.push(format!(
            "{}warning ≥ {}  critical ≥ {}",
            subject,
            bound(t.warning),
            bound(t.critical)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HistoryPoint;
    use ratatui::layout::Rect;

    fn settings(sections: Vec<SectionConfig>, metrics: Vec<MetricSpec>) -> Settings {
        Settings {
            sections,
            metrics,
            ..Settings::builtin()
        }
    }

    fn db_and_system() -> Settings {
        settings(
            vec![
                SectionConfig::new("System", &["cpu"], "#f39c12", 5),
                SectionConfig::new("Database", &["db_conn", "db_locks"], "#3498db", 2),
            ],
            vec![MetricSpec::new("cpu", "CPU").thresholds(0.85, 0.95)],
        )
    }

    fn text(dashboard: &Dashboard, node: NodeId) -> String {
        dashboard.tree().get(node).unwrap().text().to_string()
    }

    #[test]
    fn second_reconcile_is_noop() {
        let mut dashboard = Dashboard::new(db_and_system());
        let snapshot = MetricSnapshot::empty()
            .with_value("cpu", 0.5)
            .with_value("db_locks", 3.0)
            .with_history("cpu", vec![HistoryPoint::new(1.0, 0.4), HistoryPoint::new(2.0, 0.5)]);

        let first = dashboard.reconcile(&snapshot);
        assert!(first.mutations.created > 0);

        let second = dashboard.reconcile(&snapshot);
        assert!(second.is_noop(), "unexpected mutations: {:?}", second.mutations);
    }

    #[test]
    fn identities_survive_value_changes() {
        let mut dashboard = Dashboard::new(db_and_system());
        dashboard.reconcile(&MetricSnapshot::empty().with_value("cpu", 0.5));
        let card = dashboard.card_node("System", "cpu").unwrap();
        let section = dashboard.section_node("System").unwrap();

        let report = dashboard.reconcile(&MetricSnapshot::empty().with_value("cpu", 0.6));
        assert_eq!(dashboard.card_node("System", "cpu"), Some(card));
        assert_eq!(dashboard.section_node("System"), Some(section));
        assert_eq!(report.mutations.created, 0);
        assert_eq!(report.mutations.removed, 0);
        assert_eq!(text(&dashboard, card), "0.60");
    }

    #[test]
    fn missing_metric_keeps_placeholder_slot() {
        let mut dashboard = Dashboard::new(db_and_system());
        let report =
            dashboard.reconcile(&MetricSnapshot::empty().with_value("db_locks", 3.0));

        let section = dashboard.section_node("Database").unwrap();
        let conn = dashboard.card_node("Database", "db_conn").unwrap();
        let locks = dashboard.card_node("Database", "db_locks").unwrap();
        assert_eq!(dashboard.tree().children(section), &[conn, locks]);
        assert_eq!(text(&dashboard, conn), "no data");
        assert_eq!(dashboard.tree().get(conn).unwrap().status(), Status::Unknown);
        assert_eq!(text(&dashboard, locks), "3.00");
        assert!(report.placeholders >= 1);

        // The slot fills in place once the metric shows up
        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value("db_locks", 3.0)
                .with_value("db_conn", 12.0),
        );
        assert_eq!(dashboard.card_node("Database", "db_conn"), Some(conn));
        assert_eq!(text(&dashboard, conn), "12.00");
    }

    #[test]
    fn cpu_at_ninety_percent_warns() {
        let mut dashboard = Dashboard::new(db_and_system());
        dashboard.reconcile(&MetricSnapshot::empty().with_value("cpu", 0.90));

        let card = dashboard.card_node("System", "cpu").unwrap();
        assert_eq!(dashboard.tree().get(card).unwrap().status(), Status::Warning);
        assert_eq!(dashboard.overall_status(), Status::Warning);
        let section = dashboard.section_node("System").unwrap();
        assert_eq!(dashboard.tree().get(section).unwrap().status(), Status::Warning);
    }

    #[test]
    fn snapshot_thresholds_override_config() {
        let mut dashboard = Dashboard::new(db_and_system());
        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value("cpu", 0.90)
                .with_thresholds("cpu", Thresholds::new(0.5, 0.8)),
        );
        let card = dashboard.card_node("System", "cpu").unwrap();
        assert_eq!(dashboard.tree().get(card).unwrap().status(), Status::Critical);
    }

    #[test]
    fn sections_follow_priority_with_headline_first() {
        let mut dashboard = Dashboard::new(settings(
            vec![
                SectionConfig::new("Late", &["a"], "#000000", 9),
                SectionConfig::new("Early", &["b"], "#000000", 1),
                SectionConfig::new("KPI", &["c"], "#000000", 50),
                SectionConfig::new("Tied", &["d"], "#000000", 1),
            ],
            vec![],
        ));
        dashboard.reconcile(&MetricSnapshot::empty());

        let titles: Vec<String> = dashboard
            .section_order()
            .into_iter()
            .map(|id| dashboard.tree().get(id).unwrap().title().to_string())
            .collect();
        assert_eq!(titles, vec!["KPI", "Early", "Tied", "Late"]);
    }

    #[test]
    fn first_declared_section_owns_metric() {
        let mut dashboard = Dashboard::new(settings(
            vec![
                SectionConfig::new("KPI", &["locks"], "#000000", 0),
                SectionConfig::new("Transactions", &[r#"locks{db="a"}"#], "#000000", 1),
                SectionConfig::new("PostgreSQL", &["locks"], "#000000", 2),
            ],
            vec![],
        ));
        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value(r#"locks{db="a"}"#, 1.0)
                .with_value(r#"locks{db="b"}"#, 2.0),
        );

        assert!(dashboard.card_node("Transactions", r#"locks{db="a"}"#).is_some());
        assert!(dashboard.card_node("PostgreSQL", r#"locks{db="a"}"#).is_none());
        assert!(dashboard.card_node("PostgreSQL", r#"locks{db="b"}"#).is_some());
        // The headline duplicates both
        assert!(dashboard.card_node("KPI", r#"locks{db="a"}"#).is_some());
        assert!(dashboard.card_node("KPI", r#"locks{db="b"}"#).is_some());
    }

    #[test]
    fn headline_follows_prominent_set() {
        let mut dashboard = Dashboard::new(settings(
            vec![SectionConfig::new("KPI", &["a"], "#000000", 0)],
            vec![],
        ));
        let mut snapshot = MetricSnapshot::empty().with_value("a", 1.0).with_value("b", 2.0);
        snapshot.prominent = Some(vec![MetricId::from("b"), MetricId::from("missing")]);
        dashboard.reconcile(&snapshot);

        let section = dashboard.section_node("KPI").unwrap();
        let b = dashboard.card_node("KPI", "b").unwrap();
        let missing = dashboard.card_node("KPI", "missing").unwrap();
        assert_eq!(dashboard.tree().children(section), &[b, missing]);
        assert!(dashboard.card_node("KPI", "a").is_none());
        assert_eq!(text(&dashboard, missing), "no data");

        // Dropping a metric from the set removes its card
        snapshot.prominent = Some(vec![MetricId::from("b")]);
        let report = dashboard.reconcile(&snapshot);
        assert!(dashboard.card_node("KPI", "missing").is_none());
        assert!(report.mutations.removed >= 1);
    }

    #[test]
    fn cards_follow_pattern_order_and_id_order() {
        let mut dashboard = Dashboard::new(settings(
            vec![SectionConfig::new("DB", &["z_metric", "locks"], "#000000", 1)],
            vec![],
        ));
        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value(r#"locks{db="b"}"#, 1.0)
                .with_value(r#"locks{db="a"}"#, 1.0)
                .with_value("z_metric", 1.0),
        );
        let section = dashboard.section_node("DB").unwrap();
        let keys: Vec<String> = dashboard
            .tree()
            .children(section)
            .iter()
            .map(|id| dashboard.tree().get(*id).unwrap().key().to_string())
            .collect();
        assert_eq!(keys, vec!["z_metric", r#"locks{db="a"}"#, r#"locks{db="b"}"#]);
    }

    #[test]
    fn vanished_metric_removes_card_and_its_tooltip() {
        let mut dashboard = Dashboard::new(settings(
            vec![SectionConfig::new("DB", &["locks"], "#000000", 1)],
            vec![],
        ));
        dashboard.reconcile(&MetricSnapshot::empty().with_value(r#"locks{db="a"}"#, 1.0));
        let card = dashboard.card_node("DB", r#"locks{db="a"}"#).unwrap();

        dashboard.tree_mut().set_bounds(card, Rect::new(0, 0, 20, 5));
        dashboard.show_tooltip(card, Instant::now()).unwrap();
        assert!(dashboard.tooltip().is_visible());

        // Another label set replaces it: the old card goes, tooltip with it
        dashboard.reconcile(&MetricSnapshot::empty().with_value(r#"locks{db="b"}"#, 1.0));
        assert!(!dashboard.tree().contains(card));
        assert!(!dashboard.tooltip().is_visible());
        assert_eq!(dashboard.tree().count(NodeKind::Overlay), 0);
    }

    #[test]
    fn ratio_metric_classifies_share_of_denominator() {
        let mut dashboard = Dashboard::new(settings(
            vec![SectionConfig::new("JVM", &["mem_used"], "#000000", 1)],
            vec![MetricSpec::new("mem_used", "Heap").thresholds(0.75, 0.9).ratio_of("mem_max")],
        ));

        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value("mem_used", 800.0)
                .with_value("mem_max", 1000.0),
        );
        let card = dashboard.card_node("JVM", "mem_used").unwrap();
        assert_eq!(dashboard.tree().get(card).unwrap().status(), Status::Warning);

        // Zero denominator: no coloring
        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value("mem_used", 800.0)
                .with_value("mem_max", 0.0),
        );
        assert_eq!(dashboard.tree().get(card).unwrap().status(), Status::Unknown);
    }

    #[test]
    fn counter_sections_show_rate() {
        let mut dashboard = Dashboard::new(settings(
            vec![SectionConfig::new("Tx", &["tx_total"], "#000000", 1)
                .with_display(DisplayMode::Counter)],
            vec![],
        ));
        dashboard.reconcile(
            &MetricSnapshot::empty().with_value("tx_total", 300.0).with_history(
                "tx_total",
                vec![HistoryPoint::new(0.0, 100.0), HistoryPoint::new(10.0, 300.0)],
            ),
        );
        let card = dashboard.card_node("Tx", "tx_total").unwrap();
        assert_eq!(dashboard.tree().get(card).unwrap().detail(), "+20.0/s");
    }

    #[test]
    fn hover_shows_and_schedules_hide() {
        let mut dashboard = Dashboard::new(db_and_system());
        dashboard.reconcile(&MetricSnapshot::empty().with_value("cpu", 0.5));
        let card = dashboard.card_node("System", "cpu").unwrap();
        dashboard.tree_mut().set_hotspot(card, Rect::new(10, 3, 1, 1));

        let start = Instant::now();
        dashboard.hover(10, 3, start);
        assert_eq!(dashboard.tooltip().anchor(), Some(card));
        let overlay = dashboard.tooltip().overlay().unwrap();
        assert!(dashboard.tree().get(overlay).unwrap().text().contains("cpu"));

        dashboard.hover(0, 0, start);
        assert!(dashboard.tooltip().hide_pending());
        assert!(dashboard.tick(start + crate::view::HIDE_DELAY));
        assert!(!dashboard.tooltip().is_visible());
    }

    #[test]
    fn header_dot_and_counts_skip_headline() {
        let mut dashboard = Dashboard::new(settings(
            vec![
                SectionConfig::new("KPI", &["cpu"], "#000000", 0),
                SectionConfig::new("System", &["load"], "#000000", 1),
            ],
            vec![MetricSpec::new("cpu", "CPU").thresholds(0.85, 0.95)],
        ));
        // cpu only shows up in the headline, where it is critical
        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value("cpu", 0.99)
                .with_value("load", 1.0),
        );
        let cpu = dashboard.card_node("KPI", "cpu").unwrap();
        assert_eq!(dashboard.tree().get(cpu).unwrap().status(), Status::Critical);

        let counts = dashboard.status_counts();
        assert_eq!(counts.critical, 0);
        assert_eq!(counts.ok, 1);
        assert_eq!(dashboard.overall_status(), Status::Ok);
    }

    #[test]
    fn open_tooltip_follows_hint_changes() {
        let mut dashboard = Dashboard::new(db_and_system());
        dashboard.reconcile(&MetricSnapshot::empty().with_value("cpu", 0.5));
        let card = dashboard.card_node("System", "cpu").unwrap();
        dashboard.tree_mut().set_bounds(card, Rect::new(0, 0, 20, 5));
        let overlay = dashboard.show_tooltip(card, Instant::now()).unwrap();
        assert!(dashboard.tree().get(overlay).unwrap().text().contains("0.85"));

        dashboard.reconcile(
            &MetricSnapshot::empty()
                .with_value("cpu", 0.5)
                .with_thresholds("cpu", Thresholds::new(0.6, 0.7)),
        );
        assert_eq!(dashboard.tooltip().overlay(), Some(overlay));
        let text = dashboard.tree().get(overlay).unwrap().text().to_string();
        assert!(text.contains("warning ≥ 0.6"));
        assert!(!text.contains("0.85"));
    }

    #[test]
    fn folding_a_section_is_view_state() {
        let mut dashboard = Dashboard::new(db_and_system());
        let snapshot = MetricSnapshot::empty().with_value("cpu", 0.5);
        dashboard.reconcile(&snapshot);
        let system = dashboard.section_node("System").unwrap();
        let card = dashboard.card_node("System", "cpu").unwrap();
        dashboard.tree_mut().set_bounds(system, Rect::new(0, 4, 40, 1));
        dashboard.tree_mut().set_bounds(card, Rect::new(0, 5, 20, 5));
        dashboard.show_tooltip(card, Instant::now()).unwrap();
        let before = dashboard.tree().stats();

        assert_eq!(dashboard.section_at(3, 4), Some(system));
        assert_eq!(dashboard.section_at(3, 6), None);
        assert_eq!(dashboard.toggle_section(system), Some(true));
        assert!(!dashboard.tooltip().is_visible());

        // Reconciling again neither unfolds it nor counts as work
        assert!(dashboard.reconcile(&snapshot).is_noop());
        assert!(dashboard.tree().get(system).unwrap().collapsed());
        assert_eq!(dashboard.toggle_section(system), Some(false));
        assert_eq!(dashboard.toggle_section(card), None);
        assert_eq!(dashboard.tree().stats().since(&before).removed, 1);
    }
}
