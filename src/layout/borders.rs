use crate::ir::{NodeId, ProofDocument};
use crate::navigation::{is_forest_inhabited, next_sibling_tree, prev_sibling_tree};

use super::Borders;

/// Border-continuity rule: a side line is drawn towards every existing
/// sibling premise, the underline only under a node with premises.
pub fn derive_borders(doc: &ProofDocument, node: NodeId) -> Borders {
    let tree = doc.node_owner(node);
    Borders {
        left: tree
            .and_then(|tree| prev_sibling_tree(doc, tree))
            .is_some(),
        right: tree
            .and_then(|tree| next_sibling_tree(doc, tree))
            .is_some(),
        bottom: is_forest_inhabited(doc, node),
    }
}
