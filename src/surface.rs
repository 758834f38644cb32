//! Rendering boundary.
//!
//! The engine never paints. It reads measured content boxes through
//! [`RenderSurface`] and writes derived attributes back through it.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, Size};
use crate::ir::{ForestId, LabelId, NodeId, ProofDocument, TreeId};
use crate::layout::{Borders, measure_label, measure_proposition};
use crate::navigation::premises;

pub trait RenderSurface {
    /// Content box of `node` in surface coordinates. `None` until the node
    /// has been attached and measured.
    fn node_rect(&self, node: NodeId) -> Option<Rect>;

    fn label_size(&self, label: LabelId) -> Option<Size>;

    fn set_borders(&mut self, node: NodeId, borders: Borders);

    /// Minimum content width in local units; `None` clears it.
    fn set_min_width(&mut self, node: NodeId, width: Option<f32>);

    /// Absolute anchor of an inference label; `None` detaches it.
    fn set_anchor(&mut self, label: LabelId, anchor: Option<Point>);
}

/// In-memory surface: measurements are set by hand (or by [`arrange`]) and
/// every write from the engine is recorded.
///
/// [`arrange`]: RecordingSurface::arrange
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    rects: HashMap<NodeId, Rect>,
    label_sizes: HashMap<LabelId, Size>,
    borders: HashMap<NodeId, Borders>,
    min_widths: HashMap<NodeId, f32>,
    anchors: HashMap<LabelId, Point>,
    writes: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_node_rect(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }

    /// Resizes a node in place, keeping its origin.
    pub fn set_node_size(&mut self, node: NodeId, size: Size) {
        let rect = self.rects.entry(node).or_default();
        rect.width = size.width;
        rect.height = size.height;
    }

    pub fn set_label_size(&mut self, label: LabelId, size: Size) {
        self.label_sizes.insert(label, size);
    }

    pub fn forget_node(&mut self, node: NodeId) {
        self.rects.remove(&node);
    }

    pub fn borders(&self, node: NodeId) -> Option<Borders> {
        self.borders.get(&node).copied()
    }

    pub fn min_width(&self, node: NodeId) -> Option<f32> {
        self.min_widths.get(&node).copied()
    }

    pub fn anchor(&self, label: LabelId) -> Option<Point> {
        self.anchors.get(&label).copied()
    }

    /// Number of writes received from the engine so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Sizes every node from its proposition text (widened to any minimum
    /// width written so far) and stacks premises above their conclusion,
    /// each premise row centred under its conclusion's span.
    pub fn arrange(&mut self, doc: &ProofDocument, config: &LayoutConfig) {
        let scale = config.effective_scale();
        let mut sizes = HashMap::new();
        for node in doc.nodes() {
            let Some(entry) = doc.node(node) else {
                continue;
            };
            let mut size = measure_proposition(&entry.content, config);
            if let Some(min_width) = self.min_widths.get(&node) {
                size.width = size.width.max(*min_width);
            }
            sizes.insert(node, size);
        }
        for label in doc.labels() {
            if let Some(entry) = doc.label(label) {
                let size = measure_label(&entry.text, config);
                self.label_sizes
                    .insert(label, Size::new(size.width * scale, size.height * scale));
            }
        }

        let row_height = sizes.values().map(|s| s.height).fold(0.0, f32::max);
        let root = doc.root_forest();
        let depth = forest_depth(doc, root);
        let mut placer = Placer {
            doc,
            sizes: &sizes,
            spans: HashMap::new(),
            row_height,
            depth,
            scale,
            out: &mut self.rects,
        };
        let mut x = 0.0;
        for tree in premises(doc, root) {
            let span = placer.span(tree);
            placer.place(tree, x, 0);
            x += span;
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn node_rect(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    fn label_size(&self, label: LabelId) -> Option<Size> {
        self.label_sizes.get(&label).copied()
    }

    fn set_borders(&mut self, node: NodeId, borders: Borders) {
        self.writes += 1;
        self.borders.insert(node, borders);
    }

    fn set_min_width(&mut self, node: NodeId, width: Option<f32>) {
        self.writes += 1;
        match width {
            Some(width) => self.min_widths.insert(node, width),
            None => self.min_widths.remove(&node),
        };
    }

    fn set_anchor(&mut self, label: LabelId, anchor: Option<Point>) {
        self.writes += 1;
        match anchor {
            Some(point) => self.anchors.insert(label, point),
            None => self.anchors.remove(&label),
        };
    }
}

fn forest_depth(doc: &ProofDocument, forest: ForestId) -> usize {
    premises(doc, forest)
        .into_iter()
        .map(|tree| {
            1 + doc
                .tree_forest(tree)
                .map(|inner| forest_depth(doc, inner))
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}

struct Placer<'a> {
    doc: &'a ProofDocument,
    sizes: &'a HashMap<NodeId, Size>,
    spans: HashMap<TreeId, f32>,
    row_height: f32,
    depth: usize,
    scale: f32,
    out: &'a mut HashMap<NodeId, Rect>,
}

impl Placer<'_> {
    fn node_size(&self, tree: TreeId) -> Size {
        self.doc
            .tree_node(tree)
            .and_then(|node| self.sizes.get(&node).copied())
            .unwrap_or_default()
    }

    fn children(&self, tree: TreeId) -> Vec<TreeId> {
        self.doc
            .tree_forest(tree)
            .map(|forest| premises(self.doc, forest))
            .unwrap_or_default()
    }

    fn span(&mut self, tree: TreeId) -> f32 {
        if let Some(span) = self.spans.get(&tree) {
            return *span;
        }
        let row: f32 = self
            .children(tree)
            .into_iter()
            .map(|child| self.span(child))
            .sum();
        let span = row.max(self.node_size(tree).width);
        self.spans.insert(tree, span);
        span
    }

    fn place(&mut self, tree: TreeId, x: f32, level: usize) {
        let span = self.span(tree);
        let size = self.node_size(tree);
        let rows_above = self.depth.saturating_sub(level + 1);
        let y = rows_above as f32 * self.row_height;
        if let Some(node) = self.doc.tree_node(tree) {
            let local = Rect::new(x + (span - size.width) / 2.0, y, size.width, size.height);
            let global = Rect::new(
                local.x * self.scale,
                local.y * self.scale,
                local.width * self.scale,
                local.height * self.scale,
            );
            self.out.insert(node, global);
        }

        let children = self.children(tree);
        let row: f32 = children.iter().map(|child| self.span(*child)).sum();
        let mut cursor = x + (span - row) / 2.0;
        for child in children {
            let child_span = self.span(child);
            self.place(child, cursor, level + 1);
            cursor += child_span;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn arrange_stacks_premises_above_conclusion() {
        let mut doc = ProofDocument::new();
        let root = doc.root_forest();
        let conclusion = doc.add_tree("A ∧ B");
        doc.push_premise(root, conclusion).unwrap();
        let forest = doc.ensure_forest(conclusion).unwrap();
        let a = doc.add_tree("A");
        let b = doc.add_tree("B");
        doc.push_premise(forest, a).unwrap();
        doc.push_premise(forest, b).unwrap();

        let mut surface = RecordingSurface::new();
        surface.arrange(&doc, &fast_config());

        let c_rect = surface.node_rect(doc.tree_node(conclusion).unwrap()).unwrap();
        let a_rect = surface.node_rect(doc.tree_node(a).unwrap()).unwrap();
        let b_rect = surface.node_rect(doc.tree_node(b).unwrap()).unwrap();
        assert!(a_rect.y < c_rect.y, "premises sit above the conclusion");
        assert_eq!(a_rect.y, b_rect.y);
        assert!(a_rect.right() <= b_rect.x + 1e-3, "premises keep row order");
    }

    #[test]
    fn arrange_honours_written_min_width() {
        let mut doc = ProofDocument::new();
        let root = doc.root_forest();
        let tree = doc.add_tree("A");
        doc.push_premise(root, tree).unwrap();
        let node = doc.tree_node(tree).unwrap();

        let mut surface = RecordingSurface::new();
        surface.set_min_width(node, Some(200.0));
        surface.arrange(&doc, &fast_config());
        assert_eq!(surface.node_rect(node).unwrap().width, 200.0);
    }

    #[test]
    fn arrange_applies_scale() {
        let mut doc = ProofDocument::new();
        let root = doc.root_forest();
        let tree = doc.add_tree("A");
        doc.push_premise(root, tree).unwrap();
        let node = doc.tree_node(tree).unwrap();

        let mut plain = RecordingSurface::new();
        plain.arrange(&doc, &fast_config());
        let mut scaled = RecordingSurface::new();
        let config = LayoutConfig {
            scale: 2.0,
            ..fast_config()
        };
        scaled.arrange(&doc, &config);
        let plain_width = plain.node_rect(node).unwrap().width;
        let scaled_width = scaled.node_rect(node).unwrap().width;
        assert!((scaled_width - plain_width * 2.0).abs() < 1e-3);
    }

    #[test]
    fn writes_are_counted() {
        let mut doc = ProofDocument::new();
        let tree = doc.add_tree("A");
        let node = doc.tree_node(tree).unwrap();
        let mut surface = RecordingSurface::new();
        surface.set_borders(node, Borders::default());
        surface.set_min_width(node, None);
        assert_eq!(surface.writes(), 2);
        assert_eq!(surface.min_width(node), None);
    }
}
