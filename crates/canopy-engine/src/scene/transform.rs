use glam::{Mat2, Mat4, Vec2};
use indextree::NodeId;

use super::SceneTree;

/// Composes the local transforms from the topmost ancestor down to `id`.
///
/// The result maps `id`'s local coordinates into root space:
/// `T_root * … * T_parent * T_node`. Unknown nodes yield identity.
pub fn world_transform(tree: &SceneTree, id: NodeId) -> Mat4 {
    tree.ancestors(id).fold(Mat4::IDENTITY, |acc, ancestor| {
        let local = tree.get(ancestor).map_or(Mat4::IDENTITY, |n| n.transform());
        local * acc
    })
}

/// Maps a root-space point into the local space of a node with world transform `world`.
///
/// Points live on the z = 0 plane, so an affine `world` is inverted through its
/// x/y part only and a zero z scale does not make it singular. Projective
/// matrices fall back to the full 4×4 inverse.
///
/// Returns `None` when `world` cannot be inverted or the result is not finite.
pub fn to_local(world: &Mat4, point: Vec2) -> Option<Vec2> {
    let local = if is_affine(world) {
        let linear = Mat2::from_cols(world.x_axis.truncate().truncate(), world.y_axis.truncate().truncate());
        let det = linear.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        linear.inverse() * (point - world.w_axis.truncate().truncate())
    } else {
        let det = world.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        world.inverse().project_point3(point.extend(0.0)).truncate()
    };
    local.is_finite().then_some(local)
}

fn is_affine(m: &Mat4) -> bool {
    m.x_axis.w == 0.0 && m.y_axis.w == 0.0 && m.z_axis.w == 0.0 && m.w_axis.w == 1.0
}

/// Maps a point in `id`'s local space into root space.
pub fn to_world(tree: &SceneTree, id: NodeId, local: Vec2) -> Vec2 {
    world_transform(tree, id).project_point3(local.extend(0.0)).truncate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneNode;
    use glam::Vec3;

    fn translate(x: f32, y: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, 0.0))
    }

    #[test]
    fn composes_root_to_node() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let parent = tree.insert(SceneNode::container().with_transform(translate(30.0, 30.0)));
        let child = tree.insert(SceneNode::container().with_transform(translate(20.0, 20.0)));
        tree.add_child(root, parent).unwrap();
        tree.add_child(parent, child).unwrap();

        let world = world_transform(&tree, child);
        assert_eq!(world.project_point3(Vec3::ZERO).truncate(), Vec2::new(50.0, 50.0));
        assert_eq!(to_local(&world, Vec2::new(65.0, 65.0)), Some(Vec2::new(15.0, 15.0)));
    }

    #[test]
    fn ancestor_transform_applies_after_local() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let parent = tree.insert(
            SceneNode::container().with_transform(Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0))),
        );
        let child = tree.insert(SceneNode::container().with_transform(translate(10.0, 0.0)));
        tree.add_child(root, parent).unwrap();
        tree.add_child(parent, child).unwrap();

        // Translation happens in the parent's (scaled) space.
        assert_eq!(to_world(&tree, child, Vec2::ZERO), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn identity_without_transforms() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.insert(SceneNode::container());
        tree.add_child(root, a).unwrap();
        assert_eq!(world_transform(&tree, a), Mat4::IDENTITY);
    }

    #[test]
    fn singular_transform_has_no_local_point() {
        let collapsed = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(to_local(&collapsed, Vec2::new(1.0, 1.0)), None);

        let poisoned = Mat4::from_translation(Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(to_local(&poisoned, Vec2::new(1.0, 1.0)), None);
    }

    #[test]
    fn flattened_z_still_inverts() {
        let flat = Mat4::from_scale(Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(to_local(&flat, Vec2::new(5.0, 5.0)), Some(Vec2::new(2.5, 2.5)));

        let moved = Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0)) * flat;
        assert_eq!(to_local(&moved, Vec2::new(14.0, 28.0)), Some(Vec2::new(2.0, 4.0)));
    }

    #[test]
    fn projective_matrix_uses_full_inverse() {
        let mut m = Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0));
        m.w_axis.w = 2.0;
        // (x + 4) / 2 = 3  =>  x = 2
        assert_eq!(to_local(&m, Vec2::new(3.0, 0.0)), Some(Vec2::new(2.0, 0.0)));
    }
}
