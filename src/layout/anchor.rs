use std::collections::HashMap;

use crate::geometry::{Point, Rect, Size};
use crate::ir::{ForestId, LabelId, NodeId, ProofDocument};
use crate::navigation::{forest_rightmost_leaf, next_sibling_tree};

use super::{AnchorPlacement, Subscription, SubscriptionId};

/// Node a forest's label should be pinned beside: the forest's rightmost
/// leaf, provided nothing sits to its right in the leaf's own row.
pub fn anchor_leaf(doc: &ProofDocument, forest: ForestId) -> Option<NodeId> {
    let leaf = forest_rightmost_leaf(doc, forest)?;
    let tree = doc.node_owner(leaf)?;
    match next_sibling_tree(doc, tree) {
        Some(_) => None,
        None => Some(leaf),
    }
}

/// Right edge, vertical midpoint.
pub fn anchor_point(leaf: Rect) -> Point {
    Point::new(leaf.right(), leaf.mid_y())
}

/// Label box placed `gap` to the right of `anchor`, centred on it.
pub fn label_rect(anchor: Point, label: Option<Size>, gap: f32) -> Option<Rect> {
    let size = label?;
    Some(Rect::new(
        anchor.x + gap,
        anchor.y - size.height / 2.0,
        size.width,
        size.height,
    ))
}

/// Live label subscriptions. Holds at most one subscription per label.
#[derive(Debug, Default)]
pub(super) struct AnchorTracker {
    next_id: u64,
    subscriptions: HashMap<LabelId, Subscription>,
    placements: HashMap<LabelId, AnchorPlacement>,
    established: u64,
    released: u64,
}

impl AnchorTracker {
    pub fn subscription(&self, label: LabelId) -> Option<&Subscription> {
        self.subscriptions.get(&label)
    }

    pub fn placement(&self, label: LabelId) -> Option<&AnchorPlacement> {
        self.placements.get(&label)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    pub fn live(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn totals(&self) -> (u64, u64) {
        (self.established, self.released)
    }

    /// Labels pinned beside `node`.
    pub fn watching(&self, node: NodeId) -> Vec<LabelId> {
        let mut labels: Vec<LabelId> = self
            .subscriptions
            .values()
            .filter(|sub| sub.leaf == node)
            .map(|sub| sub.label)
            .collect();
        labels.sort();
        labels
    }

    /// Binds `label` to `leaf`. The caller releases any previous subscription
    /// for the label first.
    pub fn subscribe(&mut self, label: LabelId, forest: ForestId, leaf: NodeId) -> SubscriptionId {
        debug_assert!(!self.subscriptions.contains_key(&label));
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.insert(
            label,
            Subscription {
                id,
                label,
                forest,
                leaf,
            },
        );
        self.established += 1;
        id
    }

    pub fn release(&mut self, label: LabelId) -> Option<Subscription> {
        let sub = self.subscriptions.remove(&label)?;
        self.released += 1;
        Some(sub)
    }

    pub fn set_placement(&mut self, label: LabelId, placement: Option<AnchorPlacement>) -> bool {
        let previous = match placement {
            Some(placement) => self.placements.insert(label, placement),
            None => self.placements.remove(&label),
        };
        previous != placement
    }
}
