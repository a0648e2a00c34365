use anyhow::Result;
use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::graph::SceneConfig;

use super::ctx::{FrameCtx, MountCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Settings for the scene of a new window.
    fn scene_config(&mut self, window_id: WindowId) -> SceneConfig {
        let _ = window_id;
        SceneConfig::default()
    }

    /// Registers programs and builds the initial scene for a window.
    fn mount(&mut self, ctx: &mut MountCtx<'_>) -> Result<()>;

    /// Called once when a window's GPU context or scene could not be set up.
    /// The window is closed afterwards.
    fn on_init_error(&mut self, window_id: WindowId, err: &anyhow::Error) {
        log::error!("window {window_id:?}: initialization failed: {err:#}");
    }

    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called before each redraw of a window's scene.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }
}
