//! Role-aware queries over the current shape of a [`ProofDocument`].
//!
//! Every query is total: an absent sibling, forest or owner is `None`, never
//! an error. Stale ids behave like absent ones.

use crate::ir::{ForestEntry, ForestId, NodeId, ProofDocument, TreeId};

/// First tree to the right of `tree` in its forest, skipping interstitials.
pub fn next_sibling_tree(doc: &ProofDocument, tree: TreeId) -> Option<TreeId> {
    let slot = doc.tree_slot(tree)?;
    let entries = doc.forest(slot.forest)?.entries();
    entries
        .get(slot.entry + 1..)?
        .iter()
        .find_map(ForestEntry::tree)
}

/// First tree to the left of `tree` in its forest, skipping interstitials.
pub fn prev_sibling_tree(doc: &ProofDocument, tree: TreeId) -> Option<TreeId> {
    let slot = doc.tree_slot(tree)?;
    let entries = doc.forest(slot.forest)?.entries();
    entries
        .get(..slot.entry)?
        .iter()
        .rev()
        .find_map(ForestEntry::tree)
}

/// Forest that lists the tree owning `node` as a premise.
pub fn enclosing_forest(doc: &ProofDocument, node: NodeId) -> Option<ForestId> {
    let tree = doc.node_owner(node)?;
    doc.tree_slot(tree).map(|slot| slot.forest)
}

/// Tree whose node owns `forest`. `None` for the root forest.
pub fn enclosing_tree(doc: &ProofDocument, forest: ForestId) -> Option<TreeId> {
    let node = doc.forest_owner(forest)?;
    doc.node_owner(node)
}

/// Conclusion node owning `forest`. `None` for the root forest.
pub fn enclosing_node(doc: &ProofDocument, forest: ForestId) -> Option<NodeId> {
    doc.forest_owner(forest)
}

/// Conclusion whose forest directly contains `node`'s tree.
pub fn parent_conclusion(doc: &ProofDocument, node: NodeId) -> Option<NodeId> {
    enclosing_forest(doc, node).and_then(|forest| enclosing_node(doc, forest))
}

pub fn tree_index(doc: &ProofDocument, tree: TreeId) -> Option<usize> {
    doc.tree_slot(tree).map(|slot| slot.index)
}

pub fn premise_count(doc: &ProofDocument, forest: ForestId) -> usize {
    doc.forest(forest).map(|f| f.tree_count()).unwrap_or(0)
}

pub fn premises(doc: &ProofDocument, forest: ForestId) -> Vec<TreeId> {
    doc.forest(forest)
        .map(|f| f.trees().collect())
        .unwrap_or_default()
}

pub fn last_tree(doc: &ProofDocument, forest: ForestId) -> Option<TreeId> {
    doc.forest(forest)?.trees().next_back()
}

/// A node is a conclusion only when its forest holds at least one tree; an
/// empty forest counts as no forest.
pub fn is_forest_inhabited(doc: &ProofDocument, node: NodeId) -> bool {
    doc.node_forest(node)
        .map(|forest| premise_count(doc, forest) > 0)
        .unwrap_or(false)
}

/// Follows "last tree of the forest" downwards until a tree without premises
/// is reached and returns that tree's node.
pub fn rightmost_leaf(doc: &ProofDocument, tree: TreeId) -> Option<NodeId> {
    let mut current = tree;
    loop {
        let next = doc
            .tree_forest(current)
            .and_then(|forest| last_tree(doc, forest));
        match next {
            Some(deeper) => current = deeper,
            None => return doc.tree_node(current),
        }
    }
}

/// Rightmost leaf reachable from `forest`. An empty forest resolves to its
/// own conclusion node.
pub fn forest_rightmost_leaf(doc: &ProofDocument, forest: ForestId) -> Option<NodeId> {
    match last_tree(doc, forest) {
        Some(tree) => rightmost_leaf(doc, tree),
        None => enclosing_node(doc, forest),
    }
}

/// `forest` followed by every forest enclosing it, innermost first.
pub fn forest_ancestry(doc: &ProofDocument, forest: ForestId) -> Vec<ForestId> {
    let mut chain = Vec::new();
    let mut current = Some(forest);
    while let Some(id) = current {
        if doc.forest(id).is_none() || chain.contains(&id) {
            break;
        }
        chain.push(id);
        current = enclosing_node(doc, id).and_then(|node| enclosing_forest(doc, node));
    }
    chain
}

/// Whether `forest` is still reachable from the document's root forest. A
/// forest inside a detached subtree is not.
pub fn is_forest_attached(doc: &ProofDocument, forest: ForestId) -> bool {
    forest_ancestry(doc, forest).last() == Some(&doc.root_forest())
}

/// Nodes of `tree` and all of its nested premises, in pre-order.
pub fn subtree_nodes(doc: &ProofDocument, tree: TreeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree];
    while let Some(current) = stack.pop() {
        let Some(node) = doc.tree_node(current) else {
            continue;
        };
        out.push(node);
        if let Some(forest) = doc.node_forest(node) {
            stack.extend(premises(doc, forest).into_iter().rev());
        }
    }
    out
}
