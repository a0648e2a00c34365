use winit::window::WindowId;

use crate::event::HostSurface;
use crate::graph::SceneGraph;
use crate::input::InputState;
use crate::render::GpuBackend;
use crate::window::RuntimeCtx;

/// Passed to [`App::mount`](super::App::mount) once per window.
pub struct MountCtx<'a> {
    pub window_id: WindowId,
    pub scene: &'a mut SceneGraph,
    pub gpu: &'a mut dyn GpuBackend,
    pub surface: &'a dyn HostSurface,
}

/// Passed to [`App::on_frame`](super::App::on_frame) before a scene is redrawn.
///
/// Changes made to `scene` here are drawn in the same frame.
pub struct FrameCtx<'a> {
    pub window_id: WindowId,
    pub scene: &'a mut SceneGraph,
    pub gpu: &'a mut dyn GpuBackend,
    pub surface: &'a dyn HostSurface,
    pub input: &'a InputState,
    pub runtime: &'a mut RuntimeCtx,
}
