use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::error::DocumentError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Index);

        impl $name {
            /// Arena slot and generation, stable for the lifetime of the entity.
            pub fn raw_parts(self) -> (usize, u64) {
                self.0.into_raw_parts()
            }
        }
    };
}

entity_id!(
    /// A positioned slot holding one node (and, through it, a forest of premises).
    TreeId
);
entity_id!(
    /// A single proposition display unit.
    NodeId
);
entity_id!(
    /// An ordered row of sibling premise trees.
    ForestId
);
entity_id!(
    /// Inference-rule text attached to a forest.
    LabelId
);

/// Identity carried by a structural-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Node(NodeId),
    Forest(ForestId),
}

#[derive(Debug, Clone)]
pub struct ProofNode {
    pub content: String,
    forest: Option<ForestId>,
}

impl ProofNode {
    pub fn forest(&self) -> Option<ForestId> {
        self.forest
    }
}

#[derive(Debug, Clone)]
pub struct ProofTree {
    node: NodeId,
}

impl ProofTree {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// One child of a forest. Interstitial entries occupy a position in the row
/// but never take part in sibling relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestEntry {
    Tree(TreeId),
    Interstitial,
}

impl ForestEntry {
    pub fn tree(&self) -> Option<TreeId> {
        match self {
            ForestEntry::Tree(tree) => Some(*tree),
            ForestEntry::Interstitial => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Forest {
    entries: Vec<ForestEntry>,
    labels: Vec<LabelId>,
}

impl Forest {
    pub fn entries(&self) -> &[ForestEntry] {
        &self.entries
    }

    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    pub fn trees(&self) -> impl DoubleEndedIterator<Item = TreeId> + '_ {
        self.entries.iter().filter_map(ForestEntry::tree)
    }

    pub fn tree_count(&self) -> usize {
        self.trees().count()
    }
}

#[derive(Debug, Clone)]
pub struct InferenceLabel {
    pub text: String,
}

/// Where a tree currently sits inside its enclosing forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSlot {
    pub forest: ForestId,
    /// Position in the forest's entry list, interstitials included.
    pub entry: usize,
    /// Position among sibling trees only.
    pub index: usize,
}

// Upward relations. Only lookups: nothing here keeps an entity alive.
#[derive(Debug, Default)]
struct ParentIndex {
    tree_slot: HashMap<TreeId, TreeSlot>,
    forest_owner: HashMap<ForestId, NodeId>,
    node_owner: HashMap<NodeId, TreeId>,
    label_forest: HashMap<LabelId, ForestId>,
}

/// Host-owned proof structure.
///
/// Ownership runs strictly downwards (tree → node → forest → trees); every
/// upward query goes through a side index that each mutation keeps current.
/// The layout engine only reads this structure.
#[derive(Debug)]
pub struct ProofDocument {
    trees: Arena<ProofTree>,
    nodes: Arena<ProofNode>,
    forests: Arena<Forest>,
    labels: Arena<InferenceLabel>,
    root: ForestId,
    parents: ParentIndex,
}

impl Default for ProofDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofDocument {
    pub fn new() -> Self {
        let mut forests = Arena::new();
        let root = ForestId(forests.insert(Forest::default()));
        Self {
            trees: Arena::new(),
            nodes: Arena::new(),
            forests,
            labels: Arena::new(),
            root,
            parents: ParentIndex::default(),
        }
    }

    /// The top-level forest. It has no enclosing node.
    pub fn root_forest(&self) -> ForestId {
        self.root
    }

    pub fn tree(&self, id: TreeId) -> Option<&ProofTree> {
        self.trees.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Option<&ProofNode> {
        self.nodes.get(id.0)
    }

    pub fn forest(&self, id: ForestId) -> Option<&Forest> {
        self.forests.get(id.0)
    }

    pub fn label(&self, id: LabelId) -> Option<&InferenceLabel> {
        self.labels.get(id.0)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn contains_label(&self, id: LabelId) -> bool {
        self.labels.contains(id.0)
    }

    pub fn tree_node(&self, tree: TreeId) -> Option<NodeId> {
        self.tree(tree).map(ProofTree::node)
    }

    pub fn node_forest(&self, node: NodeId) -> Option<ForestId> {
        self.node(node).and_then(ProofNode::forest)
    }

    pub fn tree_forest(&self, tree: TreeId) -> Option<ForestId> {
        self.tree_node(tree).and_then(|node| self.node_forest(node))
    }

    pub fn tree_slot(&self, tree: TreeId) -> Option<TreeSlot> {
        self.parents.tree_slot.get(&tree).copied()
    }

    pub fn forest_owner(&self, forest: ForestId) -> Option<NodeId> {
        self.parents.forest_owner.get(&forest).copied()
    }

    pub fn node_owner(&self, node: NodeId) -> Option<TreeId> {
        self.parents.node_owner.get(&node).copied()
    }

    pub fn label_forest(&self, label: LabelId) -> Option<ForestId> {
        self.parents.label_forest.get(&label).copied()
    }

    pub fn trees(&self) -> impl Iterator<Item = TreeId> + '_ {
        self.trees.iter().map(|(idx, _)| TreeId(idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|(idx, _)| NodeId(idx))
    }

    pub fn forests(&self) -> impl Iterator<Item = ForestId> + '_ {
        self.forests.iter().map(|(idx, _)| ForestId(idx))
    }

    pub fn labels(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.labels.iter().map(|(idx, _)| LabelId(idx))
    }

    /// Creates a detached tree holding a fresh leaf node.
    #[instrument(level = "trace", skip(self))]
    pub fn add_tree(&mut self, content: &str) -> TreeId {
        let node = NodeId(self.nodes.insert(ProofNode {
            content: content.to_string(),
            forest: None,
        }));
        let tree = TreeId(self.trees.insert(ProofTree { node }));
        self.parents.node_owner.insert(node, tree);
        tree
    }

    pub fn set_content(&mut self, node: NodeId, content: &str) -> Result<(), DocumentError> {
        let entry = self
            .nodes
            .get_mut(node.0)
            .ok_or(DocumentError::UnknownNode(node))?;
        entry.content = content.to_string();
        Ok(())
    }

    /// Returns the premise forest of `tree`, creating an empty one if needed.
    #[instrument(level = "trace", skip(self))]
    pub fn ensure_forest(&mut self, tree: TreeId) -> Result<ForestId, DocumentError> {
        let node = self.tree_node(tree).ok_or(DocumentError::UnknownTree(tree))?;
        if let Some(existing) = self.node_forest(node) {
            return Ok(existing);
        }
        let forest = ForestId(self.forests.insert(Forest::default()));
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.forest = Some(forest);
        }
        self.parents.forest_owner.insert(forest, node);
        Ok(forest)
    }

    /// Places a detached tree at entry `position` of `forest` (clamped to the end).
    #[instrument(level = "trace", skip(self))]
    pub fn insert_premise(
        &mut self,
        forest: ForestId,
        position: usize,
        tree: TreeId,
    ) -> Result<(), DocumentError> {
        if !self.trees.contains(tree.0) {
            return Err(DocumentError::UnknownTree(tree));
        }
        if !self.forests.contains(forest.0) {
            return Err(DocumentError::UnknownForest(forest));
        }
        if let Some(slot) = self.tree_slot(tree) {
            return Err(DocumentError::TreeAlreadyPlaced {
                tree,
                forest: slot.forest,
            });
        }
        if self.forest_is_within(forest, tree) {
            return Err(DocumentError::WouldCreateCycle { tree, forest });
        }
        let entries = &mut self.forests[forest.0].entries;
        let position = position.min(entries.len());
        entries.insert(position, ForestEntry::Tree(tree));
        self.reindex(forest);
        Ok(())
    }

    pub fn push_premise(&mut self, forest: ForestId, tree: TreeId) -> Result<(), DocumentError> {
        self.insert_premise(forest, usize::MAX, tree)
    }

    /// Inserts a non-tree entry at `position` (clamped to the end).
    pub fn insert_interstitial(
        &mut self,
        forest: ForestId,
        position: usize,
    ) -> Result<(), DocumentError> {
        let entries = &mut self
            .forests
            .get_mut(forest.0)
            .ok_or(DocumentError::UnknownForest(forest))?
            .entries;
        let position = position.min(entries.len());
        entries.insert(position, ForestEntry::Interstitial);
        self.reindex(forest);
        Ok(())
    }

    /// Detaches `tree` from its forest without destroying it. Returns the
    /// forest it was removed from, if it was placed.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_premise(&mut self, tree: TreeId) -> Result<Option<ForestId>, DocumentError> {
        if !self.trees.contains(tree.0) {
            return Err(DocumentError::UnknownTree(tree));
        }
        let Some(slot) = self.parents.tree_slot.remove(&tree) else {
            return Ok(None);
        };
        if let Some(forest) = self.forests.get_mut(slot.forest.0) {
            forest.entries.retain(|entry| *entry != ForestEntry::Tree(tree));
        }
        self.reindex(slot.forest);
        Ok(Some(slot.forest))
    }

    /// Moves `tree` to entry `position` of `forest`. Returns the forest it left.
    pub fn move_premise(
        &mut self,
        tree: TreeId,
        forest: ForestId,
        position: usize,
    ) -> Result<Option<ForestId>, DocumentError> {
        if !self.forests.contains(forest.0) {
            return Err(DocumentError::UnknownForest(forest));
        }
        if self.forest_is_within(forest, tree) {
            return Err(DocumentError::WouldCreateCycle { tree, forest });
        }
        let previous = self.remove_premise(tree)?;
        self.insert_premise(forest, position, tree)?;
        Ok(previous)
    }

    /// Destroys `tree` with its node, forest, labels and every nested premise.
    /// Returns the forest the tree was placed in, if any.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_tree(&mut self, tree: TreeId) -> Result<Option<ForestId>, DocumentError> {
        let previous = self.remove_premise(tree)?;
        let mut stack = vec![tree];
        while let Some(current) = stack.pop() {
            self.parents.tree_slot.remove(&current);
            let Some(removed) = self.trees.remove(current.0) else {
                continue;
            };
            self.parents.node_owner.remove(&removed.node);
            let Some(node) = self.nodes.remove(removed.node.0) else {
                continue;
            };
            let Some(forest_id) = node.forest else {
                continue;
            };
            self.parents.forest_owner.remove(&forest_id);
            if let Some(forest) = self.forests.remove(forest_id.0) {
                for label in forest.labels {
                    self.labels.remove(label.0);
                    self.parents.label_forest.remove(&label);
                }
                stack.extend(forest.entries.iter().filter_map(ForestEntry::tree));
            }
        }
        trace!(?tree, "removed subtree");
        Ok(previous)
    }

    /// Attaches a new inference label after any labels `forest` already has.
    pub fn add_label(&mut self, forest: ForestId, text: &str) -> Result<LabelId, DocumentError> {
        if !self.forests.contains(forest.0) {
            return Err(DocumentError::UnknownForest(forest));
        }
        let label = LabelId(self.labels.insert(InferenceLabel {
            text: text.to_string(),
        }));
        self.forests[forest.0].labels.push(label);
        self.parents.label_forest.insert(label, forest);
        Ok(label)
    }

    /// Reassigns `label` to `forest`. Returns the forest it was attached to.
    pub fn move_label(
        &mut self,
        label: LabelId,
        forest: ForestId,
    ) -> Result<ForestId, DocumentError> {
        if !self.forests.contains(forest.0) {
            return Err(DocumentError::UnknownForest(forest));
        }
        let previous = self.detach_label(label)?;
        self.forests[forest.0].labels.push(label);
        self.parents.label_forest.insert(label, forest);
        Ok(previous)
    }

    pub fn remove_label(&mut self, label: LabelId) -> Result<ForestId, DocumentError> {
        let previous = self.detach_label(label)?;
        self.labels.remove(label.0);
        Ok(previous)
    }

    fn detach_label(&mut self, label: LabelId) -> Result<ForestId, DocumentError> {
        if !self.labels.contains(label.0) {
            return Err(DocumentError::UnknownLabel(label));
        }
        let previous = self
            .parents
            .label_forest
            .remove(&label)
            .ok_or(DocumentError::UnknownLabel(label))?;
        if let Some(forest) = self.forests.get_mut(previous.0) {
            forest.labels.retain(|existing| *existing != label);
        }
        Ok(previous)
    }

    // True when `forest` is `tree`'s own forest or nested anywhere below it.
    fn forest_is_within(&self, forest: ForestId, tree: TreeId) -> bool {
        let mut current = forest;
        loop {
            let Some(owner) = self.forest_owner(current) else {
                return false;
            };
            let Some(owner_tree) = self.node_owner(owner) else {
                return false;
            };
            if owner_tree == tree {
                return true;
            }
            match self.tree_slot(owner_tree) {
                Some(slot) => current = slot.forest,
                None => return false,
            }
        }
    }

    fn reindex(&mut self, forest: ForestId) {
        let Some(entries) = self.forests.get(forest.0).map(|f| f.entries.clone()) else {
            return;
        };
        let mut index = 0;
        for (entry, item) in entries.iter().enumerate() {
            if let ForestEntry::Tree(tree) = item {
                self.parents.tree_slot.insert(
                    *tree,
                    TreeSlot {
                        forest,
                        entry,
                        index,
                    },
                );
                index += 1;
            }
        }
    }
}
