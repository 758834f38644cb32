use serde::Serialize;

use crate::geometry::{Point, Rect, Size};
use crate::ir::{ForestId, LabelId, NodeId};

/// Connecting lines drawn around a node's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Borders {
    /// Line continuing to the previous sibling premise.
    pub left: bool,
    /// Line continuing to the next sibling premise.
    pub right: bool,
    /// Inference line under the content; only conclusions have one.
    pub bottom: bool,
}

/// Derived layout attributes of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodeLayout {
    /// Last measured content size, as reported by the surface.
    pub measured: Size,
    pub borders: Borders,
    pub forest_inhabited: bool,
    /// Minimum content width in local units; `None` when the node is not a
    /// premise of a non-empty forest.
    pub min_width: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPlacement {
    pub leaf: NodeId,
    pub anchor: Point,
    pub label_rect: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// A live binding of a label to the node it is pinned beside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub label: LabelId,
    pub forest: ForestId,
    pub leaf: NodeId,
}

/// What a single notification changed. Empty when the notification was a
/// no-op, e.g. a replay or a size change absorbed by the hysteresis guard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutUpdate {
    pub borders: Vec<NodeId>,
    pub min_widths: Vec<NodeId>,
    pub commits: Vec<NodeId>,
    pub anchors: Vec<LabelId>,
    pub established: Vec<SubscriptionId>,
    pub released: Vec<SubscriptionId>,
}

impl LayoutUpdate {
    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
            && self.min_widths.is_empty()
            && self.commits.is_empty()
            && self.anchors.is_empty()
            && self.established.is_empty()
            && self.released.is_empty()
    }

    pub fn merge(&mut self, other: LayoutUpdate) {
        self.borders.extend(other.borders);
        self.min_widths.extend(other.min_widths);
        self.commits.extend(other.commits);
        self.anchors.extend(other.anchors);
        self.established.extend(other.established);
        self.released.extend(other.released);
    }
}
