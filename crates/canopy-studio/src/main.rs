mod board;
mod field;

use std::time::Instant;

use anyhow::Result;
use canopy_engine::coords::ColorRgba;
use canopy_engine::core::{App, AppControl, FrameCtx, MountCtx};
use canopy_engine::device::GpuInit;
use canopy_engine::event::{handler, EventKind};
use canopy_engine::graph::SceneConfig;
use canopy_engine::logging::{init_logging, LoggingConfig};
use canopy_engine::scene::{world_transform, NodeId};
use canopy_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

const CARD_COUNT: usize = 12;

struct Studio {
    faces: Vec<NodeId>,
    field: Option<NodeId>,
    started: Instant,
}

impl Studio {
    fn new() -> Self {
        Self {
            faces: Vec::new(),
            field: None,
            started: Instant::now(),
        }
    }
}

impl App for Studio {
    fn scene_config(&mut self, _window_id: WindowId) -> SceneConfig {
        SceneConfig {
            clear_color: ColorRgba::from_rgba8(24, 26, 32, 255),
            ..SceneConfig::default()
        }
    }

    fn mount(&mut self, ctx: &mut MountCtx<'_>) -> Result<()> {
        let program = ctx.scene.register_program(ctx.gpu, &board::card_program())?;
        self.field = Some(field::build(ctx.scene, ctx.gpu, &program)?);
        self.faces = board::build(ctx.scene, ctx.gpu, &program, CARD_COUNT)?;

        ctx.scene.set_surface_handler(
            EventKind::Click,
            Some(handler(|ev, _tree| {
                log::info!("studio: background click at {:?}", ev.point());
                Ok(())
            })),
        );
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let projection = ctx.scene.projection(ctx.surface);
        for &node in self.faces.iter().chain(&self.field) {
            let mvp = projection * world_transform(ctx.scene.tree(), node);
            if let Err(err) = ctx.scene.tree_mut().set_uniform(node, "u_projection", mvp) {
                log::warn!("studio: {err}");
            }
        }

        if let Some(field) = self.field {
            let area = ctx.surface.bounding_rect();
            let frame = field::FieldFrame {
                time: self.started.elapsed().as_secs_f32(),
                width: area.width,
                height: area.height,
            };
            if let Err(err) = ctx.scene.tree_mut().update(field, &frame) {
                log::warn!("studio: {err}");
            }
            ctx.runtime.request_redraw(ctx.window_id);
        }
        AppControl::Continue
    }
}

fn main() {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Canopy Studio".to_owned(),
        initial_size: LogicalSize::new(
            (board::CARD_W as f64 + 24.0) * 4.0 + 24.0,
            (board::CARD_H as f64 + 24.0) * 3.0 + 24.0,
        ),
    };

    if let Err(e) = Runtime::run(config, GpuInit::default(), Studio::new()) {
        log::error!("canopy runtime error: {e:#}");
        std::process::exit(1);
    }
}
