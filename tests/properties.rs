use proptest::prelude::*;

use prooftree_layout::geometry::Rect;
use prooftree_layout::layout::share_width;
use prooftree_layout::navigation::{next_sibling_tree, prev_sibling_tree};
use prooftree_layout::{
    Entity, ForestId, LayoutConfig, LayoutEngine, ProofDocument, RecordingSurface, TreeId,
};

fn config() -> LayoutConfig {
    LayoutConfig {
        min_width_floor: Some(20.0),
        fast_text_metrics: true,
        ..LayoutConfig::default()
    }
}

/// Conclusion over a row built from `entries`: `true` is a premise tree,
/// `false` an interstitial.
fn row(entries: &[bool]) -> (ProofDocument, ForestId, Vec<TreeId>) {
    let mut doc = ProofDocument::new();
    let root = doc.root_forest();
    let conclusion = doc.add_tree("C");
    doc.push_premise(root, conclusion).unwrap();
    let forest = doc.ensure_forest(conclusion).unwrap();
    let mut trees = Vec::new();
    for (idx, is_tree) in entries.iter().enumerate() {
        if *is_tree {
            let tree = doc.add_tree(&format!("P{idx}"));
            doc.push_premise(forest, tree).unwrap();
            trees.push(tree);
        } else {
            doc.insert_interstitial(forest, usize::MAX).unwrap();
        }
    }
    (doc, forest, trees)
}

proptest! {
    #[test]
    fn share_is_even_split_or_floor(
        width in 0.0f32..2000.0,
        premises in 1usize..24,
        floor in 0.0f32..100.0,
    ) {
        let share = share_width(width, premises, floor).unwrap();
        prop_assert!(share >= floor);
        let even = width / premises as f32;
        prop_assert!((share - even.max(floor)).abs() < 1e-3);
        if even >= floor {
            prop_assert!((share * premises as f32 - width).abs() < 1e-2);
        }
    }

    #[test]
    fn borders_follow_siblings(
        entries in prop::collection::vec(any::<bool>(), 0..12),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let (mut doc, forest, mut trees) = row(&entries);
        let mut surface = RecordingSurface::new();
        surface.arrange(&doc, &config());
        let mut engine = LayoutEngine::new(config());
        engine.attach(&doc, &mut surface);

        for pick in removals {
            if trees.is_empty() {
                break;
            }
            let tree = trees.remove(pick.index(trees.len()));
            doc.remove_tree(tree).unwrap();
            engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        }

        for tree in &trees {
            let node = doc.tree_node(*tree).unwrap();
            let borders = engine.node_layout(node).unwrap().borders;
            prop_assert_eq!(borders.left, prev_sibling_tree(&doc, *tree).is_some());
            prop_assert_eq!(borders.right, next_sibling_tree(&doc, *tree).is_some());
            prop_assert!(!borders.bottom);
        }
        let owner = doc.forest_owner(forest).unwrap();
        prop_assert_eq!(engine.node_layout(owner).unwrap().borders.bottom, !trees.is_empty());
    }

    #[test]
    fn node_notifications_keep_borders_current(
        entries in prop::collection::vec(any::<bool>(), 0..8),
        inserts in prop::collection::vec(any::<prop::sample::Index>(), 1..6),
        detaches in prop::collection::vec(any::<prop::sample::Index>(), 0..3),
    ) {
        let (mut doc, forest, mut trees) = row(&entries);
        let mut surface = RecordingSurface::new();
        surface.arrange(&doc, &config());
        let mut engine = LayoutEngine::new(config());
        engine.attach(&doc, &mut surface);

        for (idx, pick) in inserts.into_iter().enumerate() {
            let tree = doc.add_tree(&format!("N{idx}"));
            let len = doc.forest(forest).unwrap().entries().len();
            doc.insert_premise(forest, pick.index(len + 1), tree).unwrap();
            trees.push(tree);
            let node = doc.tree_node(tree).unwrap();
            engine.on_structure_changed(&doc, &mut surface, Entity::Node(node));
        }
        for pick in detaches {
            if trees.is_empty() {
                break;
            }
            let tree = trees.remove(pick.index(trees.len()));
            doc.remove_premise(tree).unwrap();
            let node = doc.tree_node(tree).unwrap();
            engine.on_structure_changed(&doc, &mut surface, Entity::Node(node));
        }

        for tree in &trees {
            let node = doc.tree_node(*tree).unwrap();
            let borders = engine.node_layout(node).unwrap().borders;
            prop_assert_eq!(borders.left, prev_sibling_tree(&doc, *tree).is_some());
            prop_assert_eq!(borders.right, next_sibling_tree(&doc, *tree).is_some());
            prop_assert_eq!(surface.borders(node), Some(borders));
        }
        let owner = doc.forest_owner(forest).unwrap();
        prop_assert_eq!(engine.node_layout(owner).unwrap().borders.bottom, !trees.is_empty());
    }

    #[test]
    fn notifications_are_idempotent(
        entries in prop::collection::vec(any::<bool>(), 1..10),
        labels in 0usize..3,
    ) {
        let (mut doc, forest, _) = row(&entries);
        for idx in 0..labels {
            doc.add_label(forest, &format!("R{idx}")).unwrap();
        }
        let mut surface = RecordingSurface::new();
        surface.arrange(&doc, &config());
        let mut engine = LayoutEngine::new(config());
        engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        engine.attach(&doc, &mut surface);
        let writes = surface.writes();

        let update = engine.on_structure_changed(&doc, &mut surface, Entity::Forest(forest));
        prop_assert!(update.is_empty());
        prop_assert!(engine.attach(&doc, &mut surface).is_empty());
        prop_assert_eq!(surface.writes(), writes);
        prop_assert!(engine.live_subscriptions() <= 1);
    }

    #[test]
    fn small_moves_never_commit(
        premises in 1usize..6,
        base in 40.0f32..400.0,
        delta in -4.9f32..4.9,
    ) {
        let (doc, forest, _) = row(&vec![true; premises]);
        let conclusion = doc.forest_owner(forest).unwrap();
        let mut surface = RecordingSurface::new();
        surface.set_node_rect(conclusion, Rect::new(0.0, 40.0, base, 20.0));
        let mut engine = LayoutEngine::new(config());
        engine.attach(&doc, &mut surface);

        surface.set_node_rect(conclusion, Rect::new(0.0, 40.0, base + delta, 20.0));
        let update = engine.on_size_changed(&doc, &mut surface, conclusion);
        prop_assert!(update.commits.is_empty());
        prop_assert!(update.min_widths.is_empty());
    }
}
