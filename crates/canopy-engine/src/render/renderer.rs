use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use indextree::NodeId;

use crate::coords::ColorRgba;
use crate::scene::SceneTree;
use crate::upload::{Tracked, UniformSet};

use super::backend::{GpuBackend, ProgramDesc, ProgramId, RasterState};
use super::program::ProgramInfo;

/// Counters for one rendered frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draws: u32,
    /// Render nodes passed over because they had nothing to draw.
    pub skipped: u32,
    pub uniform_uploads: usize,
    pub attribute_uploads: usize,
    /// The backend could not acquire a frame; nothing was drawn.
    pub frame_skipped: bool,
}

/// Draws a scene tree through a [`GpuBackend`].
///
/// Owns the per-program uniform state so that values shared by several nodes
/// are only re-uploaded when they actually differ.
#[derive(Debug)]
pub struct Renderer {
    clear_color: ColorRgba,
    backing: Tracked<(u32, u32)>,
    uniform_sets: HashMap<ProgramId, UniformSet>,
    order: Vec<NodeId>,
}

impl Renderer {
    pub fn new(clear_color: ColorRgba) -> Self {
        Self {
            clear_color,
            backing: Tracked::new((0, 0)),
            uniform_sets: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[inline]
    pub fn clear_color(&self) -> ColorRgba {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    /// Builds `desc` and starts tracking its uniforms.
    pub fn register_program(&mut self, gpu: &mut dyn GpuBackend, desc: &ProgramDesc) -> Result<Rc<ProgramInfo>> {
        let info = Rc::new(ProgramInfo::build(gpu, desc)?);
        self.uniform_sets.insert(info.id(), UniformSet::new(&info));
        Ok(info)
    }

    /// Draws every attached render node in paint order.
    ///
    /// `backing` is the surface size in physical pixels; the viewport is only
    /// reset when it changes.
    pub fn render(
        &mut self,
        tree: &mut SceneTree,
        gpu: &mut dyn GpuBackend,
        backing: (u32, u32),
    ) -> Result<FrameStats> {
        let mut stats = FrameStats::default();

        for vao in tree.take_released() {
            gpu.release_vertex_array(vao);
        }

        self.backing.set(backing);
        if self.backing.take_dirty() {
            gpu.set_viewport(backing.0, backing.1);
            log::debug!("render: viewport {}x{}", backing.0, backing.1);
        }
        gpu.set_raster_state(&RasterState::FLAT_2D);

        if !gpu.begin_frame(self.clear_color).context("begin frame")? {
            stats.frame_skipped = true;
            return Ok(stats);
        }

        tree.paint_order_into(&mut self.order);

        let mut bound: Option<ProgramId> = None;
        for &id in &self.order {
            let Ok(node) = tree.render_node_mut(id) else {
                continue;
            };
            if !node.counts().is_drawable() {
                stats.skipped += 1;
                continue;
            }

            let program = node.program().id();
            let Some(uniforms) = self.uniform_sets.get_mut(&program) else {
                log::warn!("render: node {id} uses unregistered program {program:?}; skipped");
                stats.skipped += 1;
                continue;
            };
            if bound != Some(program) {
                gpu.use_program(program);
                bound = Some(program);
            }
            node.draw(gpu, uniforms, &mut stats);
        }

        gpu.end_frame().context("end frame")?;

        log::trace!(
            "render: {} draws, {} skipped, {} uniform / {} attribute uploads",
            stats.draws,
            stats.skipped,
            stats.uniform_uploads,
            stats.attribute_uploads
        );
        Ok(stats)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(ColorRgba::TRANSPARENT)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use super::*;
    use crate::render::{DrawCall, RenderNode};
    use crate::scene::{NodeKind, SceneNode};
    use crate::test_support::{rect_program, BackendCall, RecordingBackend, RectLayout};

    fn render_node(tree: &mut SceneTree, gpu: &mut RecordingBackend, info: &Rc<ProgramInfo>, z: i32) -> NodeId {
        let vao = gpu.create_vertex_array(info.id()).unwrap();
        let node = RenderNode::new(info.clone(), vao, RectLayout).unwrap();
        let id = tree.insert(SceneNode::new(NodeKind::Render(node)).with_z_index(z));
        let root = tree.root();
        tree.add_child(root, id).unwrap();
        id
    }

    fn setup() -> (Renderer, RecordingBackend, Rc<ProgramInfo>, SceneTree) {
        let mut gpu = RecordingBackend::default();
        let mut renderer = Renderer::default();
        let info = renderer.register_program(&mut gpu, &rect_program()).unwrap();
        (renderer, gpu, info, SceneTree::new())
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn draws_in_z_order() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let high = render_node(&mut tree, &mut gpu, &info, 5);
        let low = render_node(&mut tree, &mut gpu, &info, -1);
        tree.update(high, &vec![[0.0f32, 0.0, 1.0, 1.0]]).unwrap();
        tree.update(low, &vec![[0.0f32, 0.0, 1.0, 1.0]]).unwrap();

        renderer.render(&mut tree, &mut gpu, (100, 100)).unwrap();

        let vao = |id| tree.render_node(id).unwrap().vertex_array();
        assert_eq!(gpu.draws(), vec![vao(low), vao(high)]);
    }

    #[test]
    fn mistyped_props_name_both_types() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let n = render_node(&mut tree, &mut gpu, &info, 0);
        tree.take_changed();

        let err = tree.update(n, &vec![[0.0f64, 0.0, 1.0, 1.0]]).unwrap_err();
        match err {
            crate::SceneError::PropsType { id, expected, actual } => {
                assert_eq!(id, n);
                assert!(expected.contains("f32"), "{expected}");
                assert!(actual.contains("f64"), "{actual}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!tree.take_changed());

        let rects: Vec<[f32; 4]> = vec![[0.0, 0.0, 1.0, 1.0]];
        tree.update(n, &rects).unwrap();
        let stats = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(stats.draws, 1);
    }

    #[test]
    fn undrawable_nodes_are_skipped() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let empty = render_node(&mut tree, &mut gpu, &info, 0);
        let zero = render_node(&mut tree, &mut gpu, &info, 0);
        tree.update(zero, &Vec::<[f32; 4]>::new()).unwrap();
        let _ = empty;

        let stats = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(stats.draws, 0);
        assert_eq!(stats.skipped, 2);
        assert!(gpu.draws().is_empty());
    }

    // ── upload elision ────────────────────────────────────────────────────

    #[test]
    fn second_frame_uploads_nothing() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let n = render_node(&mut tree, &mut gpu, &info, 0);
        tree.update(n, &vec![[1.0f32, 2.0, 3.0, 4.0]]).unwrap();
        tree.set_uniform(n, "u_tint", Vec4::ONE).unwrap();

        let first = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(first.uniform_uploads, 2);
        assert_eq!(first.attribute_uploads, 1);

        let second = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(second.uniform_uploads, 0);
        assert_eq!(second.attribute_uploads, 0);
        assert_eq!(second.draws, 1);
    }

    #[test]
    fn shared_uniform_uploads_once_per_distinct_value() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let proj = Mat4::orthographic_rh(0.0, 10.0, 10.0, 0.0, -1.0, 1.0);
        let a = render_node(&mut tree, &mut gpu, &info, 0);
        let b = render_node(&mut tree, &mut gpu, &info, 1);
        for id in [a, b] {
            tree.update(id, &vec![[0.0f32, 0.0, 1.0, 1.0]]).unwrap();
            tree.set_uniform(id, "u_projection", proj).unwrap();
        }
        tree.set_uniform(a, "u_tint", Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        tree.set_uniform(b, "u_tint", Vec4::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        gpu.clear_calls();
        renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();

        // Projection is identical for both nodes: never re-sent. Tint alternates.
        let tint_loc = info.uniform("u_tint").unwrap().2;
        let uploads: Vec<_> = gpu
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::UploadUniform { location, .. } => Some(*location),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![tint_loc, tint_loc]);
    }

    #[test]
    fn uniform_change_uploads_exactly_once() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let n = render_node(&mut tree, &mut gpu, &info, 0);
        tree.update(n, &vec![[0.0f32, 0.0, 1.0, 1.0]]).unwrap();
        renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();

        tree.set_uniform(n, "u_projection", Mat4::from_translation(Vec3::X)).unwrap();
        let stats = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(stats.uniform_uploads, 1);
        assert_eq!(renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap().uniform_uploads, 0);
    }

    // ── frame plumbing ────────────────────────────────────────────────────

    #[test]
    fn viewport_only_set_on_resize() {
        let (mut renderer, mut gpu, _, mut tree) = setup();
        renderer.render(&mut tree, &mut gpu, (100, 50)).unwrap();
        renderer.render(&mut tree, &mut gpu, (100, 50)).unwrap();
        renderer.render(&mut tree, &mut gpu, (200, 100)).unwrap();

        let viewports: Vec<_> = gpu
            .calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetViewport(w, h) => Some((*w, *h)),
                _ => None,
            })
            .collect();
        assert_eq!(viewports, vec![(100, 50), (200, 100)]);
    }

    #[test]
    fn program_bound_once_per_run() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        for z in 0..3 {
            let n = render_node(&mut tree, &mut gpu, &info, z);
            tree.update(n, &vec![[0.0f32, 0.0, 1.0, 1.0]]).unwrap();
        }
        renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(gpu.count(|c| matches!(c, BackendCall::UseProgram(_))), 1);
        assert_eq!(
            gpu.count(|c| matches!(c, BackendCall::Draw(_, DrawCall { instance_count: Some(1), .. }))),
            3
        );
    }

    #[test]
    fn skipped_frame_draws_nothing() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let n = render_node(&mut tree, &mut gpu, &info, 0);
        tree.update(n, &vec![[0.0f32, 0.0, 1.0, 1.0]]).unwrap();
        gpu.skip_frames(1);

        let stats = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert!(stats.frame_skipped);
        assert!(gpu.draws().is_empty());

        // Dirty state survives the skipped frame.
        let stats = renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert_eq!(stats.attribute_uploads, 1);
    }

    #[test]
    fn removed_nodes_release_their_vertex_arrays() {
        let (mut renderer, mut gpu, info, mut tree) = setup();
        let n = render_node(&mut tree, &mut gpu, &info, 0);
        let vao = tree.render_node(n).unwrap().vertex_array();
        let root = tree.root();
        tree.remove_child(root, n).unwrap();

        renderer.render(&mut tree, &mut gpu, (10, 10)).unwrap();
        assert!(gpu.calls().contains(&BackendCall::ReleaseVertexArray(vao)));
        assert_eq!(gpu.live_vertex_arrays(), 0);
    }
}
