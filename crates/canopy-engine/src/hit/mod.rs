//! Hit-testing.
//!
//! Every attached hit-test node is a candidate. Candidates are ordered by
//! z-index descending, then by paint position descending (the node drawn on top
//! wins among equal z), and the first one containing the point wins.
//!
//! Containment is tested in the candidate's local space: the root-space point is
//! mapped through the inverse of the node's world transform and compared against
//! its axis-aligned bounds. Nodes whose world transform cannot be inverted are
//! skipped.

use glam::Vec2;
use indextree::NodeId;

use crate::scene::{to_local, world_transform, SceneTree, SortKey};

/// Reusable hit-test state; keeps its scratch buffers between queries.
#[derive(Debug, Default)]
pub struct HitTester {
    order: Vec<NodeId>,
    candidates: Vec<(SortKey, NodeId)>,
}

impl HitTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topmost attached hit-test node containing `point` (root space, logical px).
    pub fn find_target(&mut self, tree: &SceneTree, point: Vec2) -> Option<NodeId> {
        tree.paint_order_into(&mut self.order);

        self.candidates.clear();
        for (pos, &id) in self.order.iter().enumerate() {
            let Some(node) = tree.get(id) else { continue };
            if node.as_hit_test().is_some() {
                self.candidates.push((SortKey::new(node.z_index(), pos as u32), id));
            }
        }

        // Keys are unique (paint position), so an unstable sort is deterministic.
        self.candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        self.candidates
            .iter()
            .map(|&(_, id)| id)
            .find(|&id| hits(tree, id, point))
    }
}

/// One-shot [`HitTester::find_target`].
pub fn find_target(tree: &SceneTree, point: Vec2) -> Option<NodeId> {
    HitTester::new().find_target(tree, point)
}

/// True if `id` is a hit-test node whose bounds contain the root-space `point`.
pub fn hits(tree: &SceneTree, id: NodeId, point: Vec2) -> bool {
    let Some(node) = tree.get(id).and_then(|n| n.as_hit_test()) else {
        return false;
    };
    match to_local(&world_transform(tree, id), point) {
        Some(local) => node.bounds.contains(local),
        None => {
            log::trace!("hit: node {id} has a singular transform; skipped");
            false
        }
    }
}
