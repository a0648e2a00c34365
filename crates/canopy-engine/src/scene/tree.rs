use glam::Mat4;
use indextree::{Arena, NodeId};

use crate::error::SceneError;
use crate::event::HitTestNode;
use crate::render::{RenderNode, VertexArrayId};
use crate::upload::UniformValue;

use super::node::{NodeKind, SceneNode};
use super::ZIndex;

/// Arena-backed scene tree with a container root.
///
/// Nodes are created detached with [`SceneTree::insert`] and become visible to
/// hit-testing and drawing once attached under the root. Removing a node destroys
/// its whole subtree.
#[derive(Debug)]
pub struct SceneTree {
    arena: Arena<SceneNode>,
    root: NodeId,
    next_serial: u64,
    changed: bool,
    released: Vec<VertexArrayId>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(SceneNode::container());
        Self {
            arena,
            root,
            next_serial: 1,
            changed: true,
            released: Vec::new(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds a detached node and returns its id.
    pub fn insert(&mut self, mut node: SceneNode) -> NodeId {
        node.serial = self.next_serial;
        self.next_serial += 1;
        self.arena.new_node(node)
    }

    /// True while `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some() && !id.is_removed(&self.arena)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.contains(id).then(|| self.arena[id].get())
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.get(id).ok_or(SceneError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        if !self.contains(id) {
            return Err(SceneError::UnknownNode(id));
        }
        Ok(self.arena[id].get_mut())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.contains(id).then(|| self.arena[id].parent()).flatten()
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.contains(id)
            .then(|| id.children(&self.arena))
            .into_iter()
            .flatten()
    }

    /// `id` followed by its ancestors up to the topmost one.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.contains(id)
            .then(|| id.ancestors(&self.arena))
            .into_iter()
            .flatten()
    }

    /// Ancestor chain from the topmost ancestor down to `id` inclusive.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path
    }

    /// True if `id` is the root or has the root among its ancestors.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == self.root)
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.iter().filter(|n| !n.is_removed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).next().is_none()
    }

    // ── mutation surface ──────────────────────────────────────────────────

    /// Appends `child` to `parent`, detaching it from its previous parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check_movable(parent, child)?;
        parent.checked_append(child, &mut self.arena)?;
        self.changed = true;
        Ok(())
    }

    /// Removes `child` from `parent` and destroys its subtree.
    ///
    /// Returns `false` without touching anything if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, SceneError> {
        self.node(parent)?;
        self.node(child)?;
        if self.parent(child) != Some(parent) {
            return Ok(false);
        }
        self.destroy(child);
        self.changed = true;
        Ok(true)
    }

    /// Inserts `child` before `reference` among `parent`'s children, or appends it
    /// when `reference` is not one of them.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), SceneError> {
        self.check_movable(parent, child)?;
        if !self.contains(reference) || self.parent(reference) != Some(parent) {
            return self.add_child(parent, child);
        }
        if reference != child {
            reference.checked_insert_before(child, &mut self.arena)?;
        }
        self.changed = true;
        Ok(())
    }

    /// Removes and destroys every child of `parent`. Returns how many were removed.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<usize, SceneError> {
        self.node(parent)?;
        let children: Vec<NodeId> = self.children(parent).collect();
        for &child in &children {
            self.destroy(child);
        }
        if !children.is_empty() {
            self.changed = true;
        }
        Ok(children.len())
    }

    /// Destroys a node that was created but is no longer wanted, wherever it is.
    pub fn discard(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.node(id)?;
        if id == self.root {
            return Err(SceneError::RootMove);
        }
        if self.is_attached(id) {
            self.changed = true;
        }
        self.destroy(id);
        Ok(())
    }

    fn check_movable(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(SceneError::RootMove);
        }
        Ok(())
    }

    fn destroy(&mut self, id: NodeId) {
        for n in id.descendants(&self.arena) {
            if let NodeKind::Render(r) = &self.arena[n].get().kind {
                self.released.push(r.vertex_array());
            }
        }
        id.remove_subtree(&mut self.arena);
        log::trace!("scene: destroyed subtree at {id}");
    }

    // ── properties ────────────────────────────────────────────────────────

    pub fn set_z_index(&mut self, id: NodeId, z: impl Into<ZIndex>) -> Result<(), SceneError> {
        let z = z.into();
        let node = self.node_mut(id)?;
        if node.z_index != z {
            node.z_index = z;
            self.changed = true;
        }
        Ok(())
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Mat4) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        if node.transform != transform {
            node.transform = transform;
            self.changed = true;
        }
        Ok(())
    }

    /// Recomputes a render node's buffers from `props`.
    ///
    /// `P` must be exactly the node layout's `Props` type. Float literals in
    /// props default to `f64`, so spell out `f32` where the layout expects it.
    pub fn update<P: 'static>(&mut self, id: NodeId, props: &P) -> Result<(), SceneError> {
        let render = self.render_node_mut(id)?;
        let expected = render.props_type();
        render.update(props).ok_or(SceneError::PropsType {
            id,
            expected,
            actual: std::any::type_name::<P>(),
        })??;
        self.changed = true;
        Ok(())
    }

    /// Sets several uniforms on a render node. Unknown names and type mismatches fail.
    pub fn set_uniforms<'a, I>(&mut self, id: NodeId, values: I) -> Result<(), SceneError>
    where
        I: IntoIterator<Item = (&'a str, UniformValue)>,
    {
        let render = self.render_node_mut(id)?;
        let mut changed = false;
        for (name, value) in values {
            changed |= render.set_uniform(name, value)?;
        }
        self.changed |= changed;
        Ok(())
    }

    pub fn set_uniform(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), SceneError> {
        self.set_uniforms(id, [(name, value.into())])
    }

    pub fn hit_test(&self, id: NodeId) -> Result<&HitTestNode, SceneError> {
        let node = self.node(id)?;
        node.as_hit_test().ok_or(SceneError::WrongKind {
            id,
            expected: "hit-test",
            actual: node.kind.name(),
        })
    }

    /// Mutable access to a hit-test payload (bounds, cursor, handlers).
    pub fn hit_test_mut(&mut self, id: NodeId) -> Result<&mut HitTestNode, SceneError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::HitTest(h) => Ok(h),
            other => Err(SceneError::WrongKind {
                id,
                expected: "hit-test",
                actual: other.name(),
            }),
        }
    }

    pub fn render_node(&self, id: NodeId) -> Result<&RenderNode, SceneError> {
        let node = self.node(id)?;
        node.as_render().ok_or(SceneError::WrongKind {
            id,
            expected: "render",
            actual: node.kind.name(),
        })
    }

    pub(crate) fn render_node_mut(&mut self, id: NodeId) -> Result<&mut RenderNode, SceneError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Render(r) => Ok(r),
            other => Err(SceneError::WrongKind {
                id,
                expected: "render",
                actual: other.name(),
            }),
        }
    }

    // ── traversal ─────────────────────────────────────────────────────────

    /// Attached nodes in draw order: depth-first pre-order, with each node's
    /// children stably sorted by ascending z-index.
    pub fn paint_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.paint_order_into(&mut out);
        out
    }

    /// Like [`SceneTree::paint_order`], reusing `out`'s allocation.
    pub fn paint_order_into(&self, out: &mut Vec<NodeId>) {
        out.clear();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let start = stack.len();
            stack.extend(id.children(&self.arena));
            let siblings = &mut stack[start..];
            siblings.sort_by_key(|c| self.arena[*c].get().z_index);
            siblings.reverse();
        }
    }

    // ── bookkeeping ───────────────────────────────────────────────────────

    /// True if anything visible changed since the last [`SceneTree::take_changed`].
    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    #[inline]
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    #[inline]
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    pub(crate) fn take_released(&mut self) -> Vec<VertexArrayId> {
        std::mem::take(&mut self.released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Bounds;

    fn hit(tree: &mut SceneTree, z: i32) -> NodeId {
        tree.insert(SceneNode::hit_test(HitTestNode::new(Bounds::from_size(10.0, 10.0))).with_z_index(z))
    }

    fn children(tree: &SceneTree, id: NodeId) -> Vec<NodeId> {
        tree.children(id).collect()
    }

    // ── structure ─────────────────────────────────────────────────────────

    #[test]
    fn new_nodes_are_detached() {
        let mut tree = SceneTree::new();
        let a = hit(&mut tree, 0);
        assert!(!tree.is_attached(a));
        assert!(tree.is_empty());
    }

    #[test]
    fn add_child_reparents() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let c1 = tree.insert(SceneNode::container());
        let c2 = tree.insert(SceneNode::container());
        let a = hit(&mut tree, 0);
        tree.add_child(root, c1).unwrap();
        tree.add_child(root, c2).unwrap();

        tree.add_child(c1, a).unwrap();
        tree.add_child(c2, a).unwrap();

        assert!(children(&tree, c1).is_empty());
        assert_eq!(children(&tree, c2), vec![a]);
        assert_eq!(tree.parent(a), Some(c2));
    }

    #[test]
    fn add_child_rejects_cycles() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let outer = tree.insert(SceneNode::container());
        let inner = tree.insert(SceneNode::container());
        tree.add_child(root, outer).unwrap();
        tree.add_child(outer, inner).unwrap();

        assert!(matches!(tree.add_child(inner, outer), Err(SceneError::Tree(_))));
        assert!(matches!(tree.add_child(outer, outer), Err(SceneError::Tree(_))));
        assert!(matches!(tree.add_child(outer, root), Err(SceneError::RootMove)));
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn remove_child_destroys_subtree() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let c = tree.insert(SceneNode::container());
        let a = hit(&mut tree, 0);
        tree.add_child(root, c).unwrap();
        tree.add_child(c, a).unwrap();
        assert_eq!(tree.len(), 3);

        assert!(tree.remove_child(root, c).unwrap());
        assert!(!tree.contains(c));
        assert!(!tree.contains(a));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_child_of_other_parent_is_a_noop() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let c = tree.insert(SceneNode::container());
        let a = hit(&mut tree, 0);
        tree.add_child(root, c).unwrap();
        tree.add_child(root, a).unwrap();
        tree.take_changed();

        assert!(!tree.remove_child(c, a).unwrap());
        assert!(tree.contains(a));
        assert!(!tree.is_changed());
    }

    #[test]
    fn insert_before_places_at_reference() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 0);
        let b = hit(&mut tree, 0);
        let c = hit(&mut tree, 0);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        tree.insert_before(root, c, b).unwrap();
        assert_eq!(children(&tree, root), vec![a, c, b]);
    }

    #[test]
    fn insert_before_unknown_reference_appends() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let other = tree.insert(SceneNode::container());
        let stray = hit(&mut tree, 0);
        let a = hit(&mut tree, 0);
        let b = hit(&mut tree, 0);
        tree.add_child(other, stray).unwrap();
        tree.add_child(root, a).unwrap();

        tree.insert_before(root, b, stray).unwrap();
        assert_eq!(children(&tree, root), vec![a, b]);
    }

    #[test]
    fn insert_before_moves_existing_child() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 0);
        let b = hit(&mut tree, 0);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        tree.insert_before(root, b, a).unwrap();
        assert_eq!(children(&tree, root), vec![b, a]);
    }

    #[test]
    fn clear_children_then_readd() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 0);
        let b = hit(&mut tree, 0);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        assert_eq!(tree.clear_children(root).unwrap(), 2);
        assert!(tree.is_empty());

        let c = hit(&mut tree, 0);
        tree.add_child(root, c).unwrap();
        assert_eq!(children(&tree, root), vec![c]);
    }

    #[test]
    fn serials_are_not_reused() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 0);
        tree.add_child(root, a).unwrap();
        let serial = tree.node(a).unwrap().serial();
        tree.remove_child(root, a).unwrap();

        let b = hit(&mut tree, 0);
        assert_ne!(tree.node(b).unwrap().serial(), serial);
        assert!(tree.node(a).is_err());
    }

    // ── traversal ─────────────────────────────────────────────────────────

    #[test]
    fn paint_order_sorts_each_level_by_z() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let high = hit(&mut tree, 5);
        let group = tree.insert(SceneNode::container().with_z_index(1));
        let low = hit(&mut tree, -1);
        let g_top = hit(&mut tree, 9);
        let g_bottom = hit(&mut tree, 0);
        tree.add_child(root, high).unwrap();
        tree.add_child(root, group).unwrap();
        tree.add_child(root, low).unwrap();
        tree.add_child(group, g_top).unwrap();
        tree.add_child(group, g_bottom).unwrap();

        assert_eq!(tree.paint_order(), vec![root, low, group, g_bottom, g_top, high]);
    }

    #[test]
    fn paint_order_keeps_insertion_order_for_equal_z() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let ids: Vec<NodeId> = (0..5).map(|_| hit(&mut tree, 2)).collect();
        for &id in &ids {
            tree.add_child(root, id).unwrap();
        }

        assert_eq!(&tree.paint_order()[1..], &ids[..]);
    }

    #[test]
    fn paint_order_follows_z_changes_without_structural_mutation() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 0);
        let b = hit(&mut tree, 0);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();

        tree.set_z_index(a, 3).unwrap();
        assert_eq!(tree.paint_order(), vec![root, b, a]);
    }

    #[test]
    fn paint_order_skips_detached_nodes() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 0);
        let _detached = hit(&mut tree, 0);
        tree.add_child(root, a).unwrap();

        assert_eq!(tree.paint_order(), vec![root, a]);
    }

    // ── change tracking ───────────────────────────────────────────────────

    #[test]
    fn unchanged_properties_do_not_mark_changed() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = hit(&mut tree, 4);
        tree.add_child(root, a).unwrap();
        tree.take_changed();

        tree.set_z_index(a, 4).unwrap();
        tree.set_transform(a, Mat4::IDENTITY).unwrap();
        assert!(!tree.take_changed());

        tree.set_transform(a, Mat4::from_translation(glam::Vec3::new(1.0, 0.0, 0.0))).unwrap();
        assert!(tree.take_changed());
    }

    #[test]
    fn wrong_kind_is_reported() {
        let mut tree = SceneTree::new();
        let c = tree.insert(SceneNode::container());
        assert!(matches!(
            tree.hit_test(c),
            Err(SceneError::WrongKind { expected: "hit-test", actual: "container", .. })
        ));
        assert!(matches!(
            tree.update(c, &()),
            Err(SceneError::WrongKind { expected: "render", actual: "container", .. })
        ));
    }
}
