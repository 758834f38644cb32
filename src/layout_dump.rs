use crate::geometry::{Point, Rect, merge_rects};
use crate::ir::{ForestId, LabelId, NodeId, ProofDocument, TreeId};
use crate::layout::{Borders, LayoutEngine};
use crate::navigation::{enclosing_forest, tree_index};
use crate::surface::RenderSurface;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Snapshot of every derived attribute, for debugging and regression diffs.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub floor_width: f32,
    pub scale: f32,
    pub bounds: Option<Rect>,
    pub nodes: Vec<NodeDump>,
    pub labels: Vec<LabelDump>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub content: String,
    pub forest: Option<String>,
    pub index: Option<usize>,
    pub rect: Option<Rect>,
    pub borders: Borders,
    pub forest_inhabited: bool,
    pub min_width: Option<f32>,
    pub committed_share: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub id: String,
    pub text: String,
    pub forest: Option<String>,
    pub leaf: Option<String>,
    pub anchor: Option<Point>,
    pub label_rect: Option<Rect>,
    pub subscribed: bool,
}

impl LayoutDump {
    pub fn capture<S: RenderSurface + ?Sized>(
        engine: &LayoutEngine,
        doc: &ProofDocument,
        surface: &S,
    ) -> Self {
        let mut node_ids: Vec<NodeId> = doc.nodes().collect();
        node_ids.sort();
        let nodes = node_ids
            .into_iter()
            .filter_map(|node| {
                let entry = doc.node(node)?;
                let layout = engine.node_layout(node).copied().unwrap_or_default();
                let tree = doc.node_owner(node);
                Some(NodeDump {
                    id: node_key(node),
                    content: entry.content.clone(),
                    forest: enclosing_forest(doc, node).map(forest_key),
                    index: tree.and_then(|tree| tree_index(doc, tree)),
                    rect: surface.node_rect(node),
                    borders: layout.borders,
                    forest_inhabited: layout.forest_inhabited,
                    min_width: layout.min_width,
                    committed_share: engine.committed_share(node).map(|(_, share)| share),
                })
            })
            .collect();

        let mut label_ids: Vec<LabelId> = doc.labels().collect();
        label_ids.sort();
        let labels = label_ids
            .into_iter()
            .filter_map(|label| {
                let entry = doc.label(label)?;
                let placement = engine.anchor(label);
                Some(LabelDump {
                    id: label_key(label),
                    text: entry.text.clone(),
                    forest: doc.label_forest(label).map(forest_key),
                    leaf: placement.map(|p| node_key(p.leaf)),
                    anchor: placement.map(|p| p.anchor),
                    label_rect: placement.and_then(|p| p.label_rect),
                    subscribed: engine.subscription(label).is_some(),
                })
            })
            .collect();

        let roots: Vec<TreeId> = doc
            .forest(doc.root_forest())
            .map(|forest| forest.trees().collect())
            .unwrap_or_default();
        let bounds = merge_rects(
            roots
                .into_iter()
                .filter_map(|tree| engine.tree_bounds(doc, surface, tree)),
        );

        LayoutDump {
            floor_width: engine.floor_width(),
            scale: engine.config().effective_scale(),
            bounds,
            nodes,
            labels,
            warnings: engine.warnings().iter().map(|w| w.to_string()).collect(),
        }
    }
}

fn node_key(node: NodeId) -> String {
    let (slot, generation) = node.raw_parts();
    format!("n{slot}.{generation}")
}

fn forest_key(forest: ForestId) -> String {
    let (slot, generation) = forest.raw_parts();
    format!("f{slot}.{generation}")
}

fn label_key(label: LabelId) -> String {
    let (slot, generation) = label.raw_parts();
    format!("l{slot}.{generation}")
}

pub fn write_layout_dump<S: RenderSurface + ?Sized>(
    path: &Path,
    engine: &LayoutEngine,
    doc: &ProofDocument,
    surface: &S,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::capture(engine, doc, surface);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
