use std::rc::Rc;

use anyhow::{Context, Result};
use glam::Mat4;
use indextree::NodeId;

use crate::event::{DispatchOutcome, Dispatcher, EventKind, Handler, HitTestNode, HostSurface, PointerInput};
use crate::render::{FrameRequester, FrameStats, GpuBackend, ProgramDesc, ProgramInfo, RenderNode, RenderScheduler, Renderer};
use crate::scene::{NodeKind, SceneNode, SceneTree};
use crate::upload::BufferLayout;

use super::SceneConfig;

/// The scene bound to one drawing surface.
///
/// Mutations go through [`SceneGraph::tree_mut`] and become visible after
/// [`SceneGraph::commit`], which schedules a redraw. The host calls
/// [`SceneGraph::on_refresh`] from its refresh callback.
pub struct SceneGraph {
    tree: SceneTree,
    dispatcher: Dispatcher,
    scheduler: RenderScheduler,
    renderer: Renderer,
}

impl SceneGraph {
    pub fn new(config: SceneConfig, requester: Box<dyn FrameRequester>) -> Self {
        Self {
            tree: SceneTree::new(),
            dispatcher: Dispatcher::new(config.default_cursor, config.handler_errors),
            scheduler: RenderScheduler::new(requester),
            renderer: Renderer::new(config.clear_color),
        }
    }

    #[inline]
    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    // ── construction ──────────────────────────────────────────────────────

    /// Builds a program. Fails if any declared uniform or attribute has no location.
    pub fn register_program(&mut self, gpu: &mut dyn GpuBackend, desc: &ProgramDesc) -> Result<Rc<ProgramInfo>> {
        self.renderer
            .register_program(gpu, desc)
            .with_context(|| format!("registering program `{}`", desc.label))
    }

    /// Creates a detached render node drawing with `program`.
    pub fn create_render_node<L: BufferLayout>(
        &mut self,
        gpu: &mut dyn GpuBackend,
        program: &Rc<ProgramInfo>,
        layout: L,
    ) -> Result<NodeId> {
        let vao = gpu
            .create_vertex_array(program.id())
            .with_context(|| format!("creating vertex array for `{}`", program.label()))?;

        match RenderNode::new(program.clone(), vao, layout) {
            Ok(node) => Ok(self.tree.insert(SceneNode::new(NodeKind::Render(node)))),
            Err(err) => {
                gpu.release_vertex_array(vao);
                Err(err).with_context(|| format!("initializing `{}` render node", program.label()))
            }
        }
    }

    pub fn create_hit_test(&mut self, node: HitTestNode) -> NodeId {
        self.tree.insert(SceneNode::hit_test(node))
    }

    pub fn create_container(&mut self) -> NodeId {
        self.tree.insert(SceneNode::container())
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Dispatches one raw input, then commits whatever the handlers changed.
    pub fn dispatch(&mut self, surface: &mut dyn HostSurface, input: PointerInput) -> Result<DispatchOutcome> {
        let outcome = self.dispatcher.dispatch(&mut self.tree, surface, input);
        self.commit();
        outcome
    }

    /// The pointer left the surface.
    pub fn pointer_left(&mut self, surface: &mut dyn HostSurface, input: PointerInput) -> Result<()> {
        let result = self.dispatcher.pointer_left(&mut self.tree, surface, input);
        self.commit();
        result
    }

    /// Handler run for `kind` when no node handles it. `None` clears it.
    pub fn set_surface_handler(&mut self, kind: EventKind, handler: Option<Handler>) {
        self.dispatcher.set_surface_handler(kind, handler);
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.dispatcher.hovered(&self.tree)
    }

    pub fn cursor(&self) -> &str {
        self.dispatcher.cursor()
    }

    // ── rendering ─────────────────────────────────────────────────────────

    /// Schedules a redraw if the tree changed. Returns whether it did.
    pub fn commit(&mut self) -> bool {
        if !self.tree.is_changed() {
            return false;
        }
        self.scheduler.request_redraw();
        true
    }

    /// Schedules a redraw regardless of changes.
    pub fn request_redraw(&mut self) -> bool {
        self.scheduler.request_redraw()
    }

    /// The host is about to refresh without having been asked (exposure,
    /// restore). The next [`SceneGraph::on_refresh`] draws.
    pub fn host_refresh(&mut self) {
        self.scheduler.mark_pending();
    }

    #[inline]
    pub fn is_redraw_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Host refresh callback. Renders if a redraw was pending.
    ///
    /// A frame the backend could not acquire is re-requested.
    pub fn on_refresh(&mut self, gpu: &mut dyn GpuBackend, surface: &dyn HostSurface) -> Result<Option<FrameStats>> {
        if !self.scheduler.take_pending() {
            return Ok(None);
        }
        self.tree.take_changed();

        let stats = self
            .renderer
            .render(&mut self.tree, gpu, surface.backing_size())
            .context("rendering scene")?;

        if stats.frame_skipped {
            log::debug!("scene: frame skipped, retrying");
            self.scheduler.request_redraw();
        }
        Ok(Some(stats))
    }

    /// Logical-pixel to clip-space projection for the surface's current size.
    pub fn projection(&self, surface: &dyn HostSurface) -> Mat4 {
        surface.viewport().projection()
    }
}
