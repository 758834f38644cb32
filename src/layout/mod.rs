//! Reactive layout engine for proof trees.
//!
//! The host owns the [`ProofDocument`] and the [`RenderSurface`]; it calls
//! [`LayoutEngine::on_structure_changed`] after any premise insertion,
//! removal or reorder and [`LayoutEngine::on_size_changed`] after a node's
//! content is re-measured. Each handler runs to completion and leaves every
//! affected attribute consistent with the current tree shape before it
//! returns. Handlers are idempotent: replaying a notification writes nothing.

mod anchor;
mod borders;
mod text;
pub(crate) mod types;
mod width;

pub use anchor::{anchor_leaf, anchor_point, label_rect};
pub use borders::derive_borders;
pub use text::{measure_label, measure_proposition};
pub use types::*;
pub use width::share_width;

use anchor::AnchorTracker;
use width::{WidthCommit, should_commit};

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace, warn};

use crate::config::LayoutConfig;
use crate::error::LayoutWarning;
use crate::geometry::{Rect, compensate_scale, merge_rects};
use crate::ir::{Entity, ForestId, LabelId, NodeId, ProofDocument, TreeId};
use crate::navigation::{
    enclosing_forest, forest_ancestry, is_forest_attached, premises, subtree_nodes,
};
use crate::surface::RenderSurface;

#[derive(Debug)]
pub struct LayoutEngine {
    config: LayoutConfig,
    floor: f32,
    nodes: HashMap<NodeId, NodeLayout>,
    // Forest each node sat in when last derived; lets a node notification
    // reach the row it left.
    homes: HashMap<NodeId, ForestId>,
    commits: HashMap<NodeId, WidthCommit>,
    tracker: AnchorTracker,
    warnings: Vec<LayoutWarning>,
    warned: HashMap<ForestId, usize>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        let floor = config.floor_width();
        Self {
            config,
            floor,
            nodes: HashMap::new(),
            homes: HashMap::new(),
            commits: HashMap::new(),
            tracker: AnchorTracker::default(),
            warnings: Vec::new(),
            warned: HashMap::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Premise width floor in local units.
    pub fn floor_width(&self) -> f32 {
        self.floor
    }

    pub fn node_layout(&self, node: NodeId) -> Option<&NodeLayout> {
        self.nodes.get(&node)
    }

    /// Premise width last committed for `conclusion`, with the conclusion
    /// width it was derived from.
    pub fn committed_share(&self, conclusion: NodeId) -> Option<(f32, f32)> {
        self.commits
            .get(&conclusion)
            .map(|commit| (commit.width, commit.share))
    }

    pub fn anchor(&self, label: LabelId) -> Option<&AnchorPlacement> {
        self.tracker.placement(label)
    }

    pub fn subscription(&self, label: LabelId) -> Option<&Subscription> {
        self.tracker.subscription(label)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.tracker.subscriptions()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.tracker.live()
    }

    /// Subscriptions established and released over the engine's lifetime.
    pub fn subscription_totals(&self) -> (u64, u64) {
        self.tracker.totals()
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Full pass over the document: every node, every conclusion, every
    /// labelled forest.
    #[instrument(level = "debug", skip_all)]
    pub fn attach<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
    ) -> LayoutUpdate {
        let mut update = LayoutUpdate::default();
        self.sweep(doc, surface, &mut update);
        let nodes: Vec<NodeId> = doc.nodes().collect();
        for node in &nodes {
            self.refresh_node(doc, surface, *node, &mut update);
        }
        for node in &nodes {
            self.refresh_width(doc, surface, *node, &mut update);
        }
        let forests: Vec<ForestId> = doc.forests().collect();
        for forest in forests {
            self.resolve_labels(doc, surface, forest, &mut update);
        }
        debug!(
            nodes = nodes.len(),
            subscriptions = self.tracker.live(),
            "attached"
        );
        update
    }

    /// Changes the display scale and re-lays the whole document out.
    pub fn set_scale<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        scale: f32,
    ) -> LayoutUpdate {
        if !scale.is_finite() || scale <= 0.0 {
            warn!(scale, "ignoring invalid display scale");
            return LayoutUpdate::default();
        }
        self.config.scale = scale;
        self.commits.clear();
        self.attach(doc, surface)
    }

    /// Structural-change handler. `Forest(f)` re-derives every premise of
    /// `f` and the conclusion owning it. `Node(n)` does the same for the row
    /// `n` sits in, plus `n`'s own width share; when `n` left a row since it
    /// was last derived, that row is re-derived too. Propagation stops at the
    /// conclusion owning the row.
    #[instrument(level = "debug", skip(self, doc, surface))]
    pub fn on_structure_changed<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        target: Entity,
    ) -> LayoutUpdate {
        let mut update = LayoutUpdate::default();
        let former = match target {
            Entity::Node(node) => self.homes.get(&node).copied(),
            Entity::Forest(_) => None,
        };
        self.sweep(doc, surface, &mut update);

        let mut label_forests: Vec<ForestId> = Vec::new();
        match target {
            Entity::Forest(forest) => {
                if doc.forest(forest).is_none() {
                    trace!(?forest, "notification for a removed forest");
                    return update;
                }
                self.refresh_forest(doc, surface, forest, &mut label_forests, &mut update);
            }
            Entity::Node(node) => {
                let current = enclosing_forest(doc, node);
                if let Some(left) = former.filter(|left| Some(*left) != current) {
                    if doc.forest(left).is_some() {
                        trace!(?node, forest = ?left, "node left its row");
                        self.refresh_forest(doc, surface, left, &mut label_forests, &mut update);
                    }
                }
                if !doc.contains_node(node) {
                    trace!(?node, "notification for a removed node");
                } else {
                    match current {
                        Some(forest) => self.refresh_forest(
                            doc,
                            surface,
                            forest,
                            &mut label_forests,
                            &mut update,
                        ),
                        None => self.refresh_node(doc, surface, node, &mut update),
                    }
                    self.refresh_width(doc, surface, node, &mut update);
                    label_forests.extend(doc.node_forest(node));
                }
            }
        }

        let mut seen = HashSet::new();
        for forest in label_forests {
            if seen.insert(forest) {
                self.resolve_labels(doc, surface, forest, &mut update);
            }
        }
        update
    }

    /// Size-change handler: re-reads `node`'s content box, re-shares its
    /// width among its premises (subject to the hysteresis guard) and moves
    /// every label pinned beside it.
    #[instrument(level = "debug", skip(self, doc, surface))]
    pub fn on_size_changed<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        node: NodeId,
    ) -> LayoutUpdate {
        let mut update = LayoutUpdate::default();
        if !doc.contains_node(node) {
            return update;
        }
        let measured = surface.node_rect(node).map(|r| r.size()).unwrap_or_default();
        self.nodes.entry(node).or_default().measured = measured;
        self.refresh_width(doc, surface, node, &mut update);
        for label in self.tracker.watching(node) {
            self.refresh_anchor(surface, label, &mut update);
        }
        update
    }

    /// The label's own box changed size.
    pub fn on_label_size_changed<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        label: LabelId,
    ) -> LayoutUpdate {
        let mut update = LayoutUpdate::default();
        if doc.contains_label(label) {
            self.refresh_anchor(surface, label, &mut update);
        }
        update
    }

    /// Cancels the tracking subscription of `label` and detaches its anchor.
    /// Returns whether a subscription was live.
    pub fn release_anchor<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        label: LabelId,
    ) -> bool {
        let mut update = LayoutUpdate::default();
        self.release(surface, label, true, &mut update);
        !update.released.is_empty()
    }

    /// Union of the content boxes of `tree` and all nested premises.
    pub fn tree_bounds<S: RenderSurface + ?Sized>(
        &self,
        doc: &ProofDocument,
        surface: &S,
        tree: TreeId,
    ) -> Option<Rect> {
        merge_rects(
            subtree_nodes(doc, tree)
                .into_iter()
                .filter_map(|node| surface.node_rect(node)),
        )
    }

    // Premises of `forest`, then its owning conclusion and that conclusion's
    // width share. Collects the forests whose labels need re-resolving.
    fn refresh_forest<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        forest: ForestId,
        label_forests: &mut Vec<ForestId>,
        update: &mut LayoutUpdate,
    ) {
        for tree in premises(doc, forest) {
            let Some(node) = doc.tree_node(tree) else {
                continue;
            };
            self.refresh_node(doc, surface, node, update);
            label_forests.extend(doc.node_forest(node));
        }
        if let Some(owner) = doc.forest_owner(forest) {
            self.refresh_node(doc, surface, owner, update);
            self.refresh_width(doc, surface, owner, update);
        }
        label_forests.extend(forest_ancestry(doc, forest));
    }

    fn refresh_node<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        node: NodeId,
        update: &mut LayoutUpdate,
    ) {
        match enclosing_forest(doc, node) {
            Some(forest) => {
                self.homes.insert(node, forest);
            }
            None => {
                self.homes.remove(&node);
            }
        }
        let borders = derive_borders(doc, node);
        let measured = surface.node_rect(node).map(|r| r.size()).unwrap_or_default();
        let fresh = !self.nodes.contains_key(&node);
        let entry = self.nodes.entry(node).or_default();
        entry.measured = measured;
        entry.forest_inhabited = borders.bottom;
        if fresh || entry.borders != borders {
            entry.borders = borders;
            surface.set_borders(node, borders);
            update.borders.push(node);
        }
    }

    fn refresh_width<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        conclusion: NodeId,
        update: &mut LayoutUpdate,
    ) {
        let premise_nodes: Vec<NodeId> = doc
            .node_forest(conclusion)
            .map(|forest| premises(doc, forest))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tree| doc.tree_node(tree))
            .collect();

        if premise_nodes.is_empty() {
            if let Some(previous) = self.commits.remove(&conclusion) {
                self.clear_min_widths(surface, &previous.premises, update);
                update.commits.push(conclusion);
            }
            return;
        }

        let measured = surface
            .node_rect(conclusion)
            .map(|r| r.width)
            .unwrap_or(0.0);
        let width = compensate_scale(measured, self.config.effective_scale());
        let tolerance = self.config.hysteresis_tolerance;
        if !should_commit(self.commits.get(&conclusion), width, &premise_nodes, tolerance) {
            trace!(?conclusion, width, "width change within tolerance");
            return;
        }

        let Some(share) = share_width(width, premise_nodes.len(), self.floor) else {
            return;
        };
        for node in &premise_nodes {
            let entry = self.nodes.entry(*node).or_default();
            if entry.min_width != Some(share) {
                entry.min_width = Some(share);
                surface.set_min_width(*node, Some(share));
                update.min_widths.push(*node);
            }
        }
        let previous = self.commits.insert(
            conclusion,
            WidthCommit {
                width,
                share,
                premises: premise_nodes,
            },
        );
        if let Some(previous) = previous {
            self.clear_min_widths(surface, &previous.premises, update);
        }
        debug!(?conclusion, width, share, "committed premise width");
        update.commits.push(conclusion);
    }

    // Clears minimum widths of former premises that no commit covers anymore.
    fn clear_min_widths<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        former: &[NodeId],
        update: &mut LayoutUpdate,
    ) {
        for node in former {
            let covered = self
                .commits
                .values()
                .any(|commit| commit.premises.contains(node));
            if covered {
                continue;
            }
            if let Some(entry) = self.nodes.get_mut(node) {
                if entry.min_width.take().is_some() {
                    surface.set_min_width(*node, None);
                    update.min_widths.push(*node);
                }
            }
        }
    }

    fn resolve_labels<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        forest: ForestId,
        update: &mut LayoutUpdate,
    ) {
        let labels: Vec<LabelId> = match doc.forest(forest) {
            Some(entry) => entry.labels().to_vec(),
            None => return,
        };
        if !is_forest_attached(doc, forest) {
            for label in labels {
                self.release(surface, label, true, update);
            }
            self.warned.remove(&forest);
            return;
        }
        let Some((&label, ignored)) = labels.split_first() else {
            self.warned.remove(&forest);
            return;
        };

        if ignored.is_empty() {
            self.warned.remove(&forest);
        } else {
            if self.warned.get(&forest) != Some(&labels.len()) {
                let warning = LayoutWarning::MultipleLabels {
                    forest,
                    count: labels.len(),
                    kept: label,
                };
                warn!(%warning, "inference label conflict");
                self.warnings.push(warning);
                self.warned.insert(forest, labels.len());
            }
            for extra in ignored {
                self.release(surface, *extra, true, update);
            }
        }

        match anchor_leaf(doc, forest) {
            Some(leaf) => {
                let current = self.tracker.subscription(label).copied();
                let keep = current
                    .map(|sub| sub.forest == forest && sub.leaf == leaf)
                    .unwrap_or(false);
                if !keep {
                    if current.is_some() {
                        self.release(surface, label, false, update);
                    }
                    let id = self.tracker.subscribe(label, forest, leaf);
                    trace!(?label, ?leaf, ?id, "anchor subscription established");
                    update.established.push(id);
                }
                self.refresh_anchor(surface, label, update);
            }
            None => {
                self.release(surface, label, true, update);
            }
        }
    }

    fn refresh_anchor<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        label: LabelId,
        update: &mut LayoutUpdate,
    ) {
        let Some(sub) = self.tracker.subscription(label).copied() else {
            return;
        };
        let placement = surface.node_rect(sub.leaf).map(|rect| {
            let anchor = anchor_point(rect);
            AnchorPlacement {
                leaf: sub.leaf,
                anchor,
                label_rect: label_rect(anchor, surface.label_size(label), self.config.label_gap),
            }
        });
        let anchor_moved = self.tracker.placement(label).map(|p| p.anchor)
            != placement.map(|p| p.anchor);
        if self.tracker.set_placement(label, placement) {
            if anchor_moved {
                surface.set_anchor(label, placement.map(|p| p.anchor));
            }
            update.anchors.push(label);
        }
    }

    // Drops the label's subscription; with `detach` its anchor is cleared too.
    fn release<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        label: LabelId,
        detach: bool,
        update: &mut LayoutUpdate,
    ) {
        if let Some(sub) = self.tracker.release(label) {
            trace!(?label, id = ?sub.id, "anchor subscription released");
            update.released.push(sub.id);
        }
        if detach && self.tracker.set_placement(label, None) {
            surface.set_anchor(label, None);
            update.anchors.push(label);
        }
    }

    // Releases subscriptions whose label or leaf disappeared, whose label now
    // belongs to another forest or whose forest was cut off from the root,
    // and forgets state of removed nodes and forests.
    fn sweep<S: RenderSurface + ?Sized>(
        &mut self,
        doc: &ProofDocument,
        surface: &mut S,
        update: &mut LayoutUpdate,
    ) {
        let stale: Vec<(LabelId, bool)> = self
            .tracker
            .subscriptions()
            .filter_map(|sub| {
                let label_alive = doc.contains_label(sub.label);
                let valid = label_alive
                    && doc.contains_node(sub.leaf)
                    && doc.label_forest(sub.label) == Some(sub.forest)
                    && is_forest_attached(doc, sub.forest);
                (!valid).then_some((sub.label, label_alive))
            })
            .collect();
        let mut moved = Vec::new();
        for (label, label_alive) in stale {
            if label_alive {
                self.release(surface, label, true, update);
                moved.extend(
                    doc.label_forest(label)
                        .filter(|forest| is_forest_attached(doc, *forest)),
                );
            } else {
                self.release(surface, label, false, update);
                self.tracker.set_placement(label, None);
            }
        }

        let dead: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|node| !doc.contains_node(**node))
            .copied()
            .collect();
        if !dead.is_empty() {
            for node in &dead {
                self.nodes.remove(node);
            }
            self.homes.retain(|node, _| doc.contains_node(*node));
            // Committed premise lists keep dead ids so the next pass sees
            // the row as changed.
            self.commits.retain(|conclusion, _| doc.contains_node(*conclusion));
            trace!(removed = dead.len(), "forgot removed nodes");
        }

        self.warned.retain(|forest, _| doc.forest(*forest).is_some());

        for forest in moved {
            self.resolve_labels(doc, surface, forest, update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::surface::RecordingSurface;

    fn fast_config() -> LayoutConfig {
        LayoutConfig {
            min_width_floor: Some(10.0),
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    fn two_premises() -> (ProofDocument, ForestId, NodeId, Vec<TreeId>) {
        let mut doc = ProofDocument::new();
        let root = doc.root_forest();
        let conclusion = doc.add_tree("A ∧ B");
        doc.push_premise(root, conclusion).unwrap();
        let forest = doc.ensure_forest(conclusion).unwrap();
        let trees: Vec<TreeId> = ["A", "B"]
            .into_iter()
            .map(|text| {
                let tree = doc.add_tree(text);
                doc.push_premise(forest, tree).unwrap();
                tree
            })
            .collect();
        let node = doc.tree_node(conclusion).unwrap();
        (doc, forest, node, trees)
    }

    #[test]
    fn destroyed_premise_forces_recommit() {
        let (mut doc, forest, conclusion, trees) = two_premises();
        let mut surface = RecordingSurface::new();
        surface.set_node_rect(conclusion, Rect::new(0.0, 0.0, 80.0, 20.0));
        let mut engine = LayoutEngine::new(fast_config());
        engine.attach(&doc, &mut surface);
        assert_eq!(engine.committed_share(conclusion), Some((80.0, 40.0)));

        doc.remove_tree(trees[1]).unwrap();
        let update = engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        assert_eq!(update.commits, vec![conclusion]);
        assert_eq!(engine.committed_share(conclusion), Some((80.0, 80.0)));
    }

    #[test]
    fn emptied_forest_drops_commit() {
        let (mut doc, forest, conclusion, trees) = two_premises();
        let mut surface = RecordingSurface::new();
        let mut engine = LayoutEngine::new(fast_config());
        engine.attach(&doc, &mut surface);
        for tree in trees {
            doc.remove_premise(tree).unwrap();
        }
        engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        assert_eq!(engine.committed_share(conclusion), None);
        assert!(!engine.node_layout(conclusion).unwrap().forest_inhabited);
    }

    #[test]
    fn label_conflict_is_reported_again_after_resolution() {
        let (mut doc, forest, _, _) = two_premises();
        let mut surface = RecordingSurface::new();
        let mut engine = LayoutEngine::new(fast_config());
        doc.add_label(forest, "R1").unwrap();
        let extra = doc.add_label(forest, "R2").unwrap();
        engine.attach(&doc, &mut surface);
        assert_eq!(engine.warnings().len(), 1);

        doc.remove_label(extra).unwrap();
        engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        doc.add_label(forest, "R3").unwrap();
        engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        assert_eq!(engine.warnings().len(), 2);
    }

    #[test]
    fn conflict_bookkeeping_is_dropped_with_its_forest() {
        let (mut doc, forest, conclusion, _) = two_premises();
        doc.add_label(forest, "R1").unwrap();
        doc.add_label(forest, "R2").unwrap();
        let mut surface = RecordingSurface::new();
        let mut engine = LayoutEngine::new(fast_config());
        engine.attach(&doc, &mut surface);
        assert!(engine.warned.contains_key(&forest));

        let root = doc.root_forest();
        let tree = doc.node_owner(conclusion).unwrap();
        doc.remove_tree(tree).unwrap();
        engine.on_structure_changed(&doc, &mut surface, Entity::Forest(root));
        assert!(engine.warned.is_empty());
        assert!(engine.homes.is_empty());
        assert_eq!(engine.warnings().len(), 1);
    }

    #[test]
    fn unknown_targets_are_ignored() {
        let (mut doc, forest, conclusion, _) = two_premises();
        let mut surface = RecordingSurface::new();
        let mut engine = LayoutEngine::new(fast_config());
        engine.attach(&doc, &mut surface);
        let tree = doc.node_owner(conclusion).unwrap();
        doc.remove_tree(tree).unwrap();

        engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        let update = engine.on_structure_changed(&doc, &mut surface, Entity::Node(conclusion));
        assert!(update.is_empty());
        assert!(engine.on_size_changed(&doc, &mut surface, conclusion).is_empty());
    }

    #[test]
    fn unmeasured_leaf_leaves_label_unplaced() {
        let (mut doc, forest, _, trees) = two_premises();
        let label = doc.add_label(forest, "∧I").unwrap();
        let mut surface = RecordingSurface::new();
        let mut engine = LayoutEngine::new(fast_config());
        engine.attach(&doc, &mut surface);
        assert!(engine.subscription(label).is_some());
        assert!(engine.anchor(label).is_none());

        let leaf = doc.tree_node(trees[1]).unwrap();
        surface.set_node_rect(leaf, Rect::from_origin_size(Default::default(), Size::new(10.0, 10.0)));
        let update = engine.on_size_changed(&doc, &mut surface, leaf);
        assert_eq!(update.anchors, vec![label]);
        assert_eq!(surface.anchor(label).map(|p| p.x), Some(10.0));
    }
}
