use crate::ir::{ForestId, LabelId, NodeId, TreeId};
use thiserror::Error;

/// Failures of host-side document mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("unknown tree {0:?}")]
    UnknownTree(TreeId),
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("unknown forest {0:?}")]
    UnknownForest(ForestId),
    #[error("unknown inference label {0:?}")]
    UnknownLabel(LabelId),
    #[error("tree {tree:?} is already a premise of forest {forest:?}")]
    TreeAlreadyPlaced { tree: TreeId, forest: ForestId },
    #[error("inserting tree {tree:?} into forest {forest:?} would nest it inside itself")]
    WouldCreateCycle { tree: TreeId, forest: ForestId },
    #[error("the root forest cannot be removed")]
    RootForest,
}

/// Non-fatal configuration problems found while laying out a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutWarning {
    #[error("forest {forest:?} has {count} inference labels; only {kept:?} is anchored")]
    MultipleLabels {
        forest: ForestId,
        count: usize,
        kept: LabelId,
    },
}
