use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{
    ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, TouchPhase as WinitTouchPhase,
    WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{CursorIcon, Window, WindowId};

use crate::coords::Bounds;
use crate::core::{App as CoreApp, AppControl, FrameCtx, MountCtx};
use crate::device::{Gpu, GpuInit};
use crate::event::{DispatchOutcome, HostSurface, PointerInput};
use crate::graph::SceneGraph;
use crate::input::{ButtonState, InputState, Modifiers, MouseButton, TouchPhase, WheelDelta};
use crate::render::{FrameRequester, WgpuBackend};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "canopy".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn create_window(&mut self, config: RuntimeConfig) {
        self.commands.push(Command::CreateWindow(config));
    }

    pub fn close_window(&mut self, id: WindowId) {
        self.commands.push(Command::CloseWindow(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }

    /// Schedules another frame for `id` once the current one is presented.
    /// Calling it from every frame hook keeps the window animating.
    pub fn request_redraw(&mut self, id: WindowId) {
        self.commands.push(Command::RequestRedraw(id));
    }
}

enum Command {
    CreateWindow(RuntimeConfig),
    CloseWindow(WindowId),
    RequestRedraw(WindowId),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    pub fn run<A>(initial: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

// ── host surface ──────────────────────────────────────────────────────────

/// A window seen as a [`HostSurface`]. Client space is the window's logical
/// pixel space, so the surface rectangle always starts at the origin.
struct WindowSurface {
    window: Arc<Window>,
    cursor: String,
}

impl WindowSurface {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            cursor: "default".to_owned(),
        }
    }

    fn to_logical(&self, pos: PhysicalPosition<f64>) -> Vec2 {
        let logical = pos.to_logical::<f64>(self.window.scale_factor());
        Vec2::new(logical.x as f32, logical.y as f32)
    }
}

impl HostSurface for WindowSurface {
    fn bounding_rect(&self) -> Bounds {
        let size: LogicalSize<f32> = self.window.inner_size().to_logical(self.window.scale_factor());
        Bounds::from_size(size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn set_cursor(&mut self, cursor: &str) {
        if self.cursor == cursor {
            return;
        }
        self.cursor = cursor.to_owned();
        self.window.set_cursor(cursor_icon(cursor));
    }

    fn backing_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Asks winit for a `RedrawRequested` event.
struct WindowRedraw(Arc<Window>);

impl FrameRequester for WindowRedraw {
    fn request_frame(&self) {
        self.0.request_redraw();
    }
}

// ── per-window state ──────────────────────────────────────────────────────

struct WindowEntry {
    id: WindowId,
    window: Arc<Window>,
    surface: WindowSurface,
    input: InputState,
    backend: WgpuBackend,
    scene: SceneGraph,
}

fn dispatch_logged(
    id: WindowId,
    scene: &mut SceneGraph,
    surface: &mut WindowSurface,
    input: PointerInput,
) -> Option<DispatchOutcome> {
    let kind = input.kind;
    match scene.dispatch(surface, input) {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            log::error!("window {id:?}: {kind:?} dispatch failed: {err:#}");
            None
        }
    }
}

impl WindowEntry {
    /// Acquires the GPU, then lets the app mount its scene.
    fn build<A: CoreApp>(app: &mut A, gpu_init: GpuInit, window: Arc<Window>) -> Result<Self> {
        let id = window.id();
        let size = window.inner_size();
        let gpu = pollster::block_on(Gpu::new(
            window.clone(),
            (size.width.max(1), size.height.max(1)),
            gpu_init,
        ))
        .context("GPU initialization failed")?;

        let mut backend = WgpuBackend::new(gpu);
        let surface = WindowSurface::new(window.clone());
        let mut scene = SceneGraph::new(app.scene_config(id), Box::new(WindowRedraw(window.clone())));

        app.mount(&mut MountCtx {
            window_id: id,
            scene: &mut scene,
            gpu: &mut backend,
            surface: &surface,
        })
        .context("failed to mount scene")?;
        scene.commit();

        Ok(Self {
            id,
            window,
            surface,
            input: InputState::default(),
            backend,
            scene,
        })
    }

    fn dispatch(&mut self, input: PointerInput) -> Option<DispatchOutcome> {
        dispatch_logged(self.id, &mut self.scene, &mut self.surface, input)
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.input.modifiers = map_modifiers(m.state());
            }

            WindowEvent::Focused(focused) => {
                if let Some(cancel) = self.input.focus_changed(*focused) {
                    self.dispatch(cancel);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let pos = self.surface.to_logical(*position);
                for input in self.input.pointer_moved(pos) {
                    self.dispatch(input);
                }
            }

            WindowEvent::CursorLeft { .. } => {
                if let Some(input) = self.input.pointer_left() {
                    if let Err(err) = self.scene.pointer_left(&mut self.surface, input) {
                        log::error!("window {:?}: pointer leave failed: {err:#}", self.id);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let state = match state {
                    ElementState::Pressed => ButtonState::Pressed,
                    ElementState::Released => ButtonState::Released,
                };
                self.mouse_button(map_mouse_button(*button), state);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => WheelDelta::Line { x: *x, y: *y },
                    MouseScrollDelta::PixelDelta(p) => {
                        let v = self.surface.to_logical(*p);
                        WheelDelta::Pixel { x: v.x, y: v.y }
                    }
                };
                if let Some(input) = self.input.wheel(delta) {
                    self.dispatch(input);
                }
            }

            WindowEvent::Touch(touch) => {
                let pos = self.surface.to_logical(touch.location);
                let input = self.input.touch(touch.id, map_touch_phase(touch.phase), pos);
                self.dispatch(input);
            }

            _ => {}
        }
    }

    /// Dispatches a button change; a release over the pressed node is followed by a click.
    fn mouse_button(&mut self, button: MouseButton, state: ButtonState) {
        let Self {
            id,
            scene,
            surface,
            input,
            ..
        } = self;
        input.button_gesture(button, state, |pointer| {
            dispatch_logged(*id, scene, surface, pointer).map(|outcome| outcome.target)
        });
    }

    fn resize(&mut self) {
        let size = self.window.inner_size();
        self.backend.resize((size.width, size.height));
        self.scene.request_redraw();
    }

    /// Runs the app's frame hook, then draws the scene.
    fn redraw<A: CoreApp>(&mut self, app: &mut A, runtime: &mut RuntimeCtx) -> AppControl {
        if !self.scene.is_redraw_pending() {
            self.scene.host_refresh();
        }

        let control = app.on_frame(&mut FrameCtx {
            window_id: self.id,
            scene: &mut self.scene,
            gpu: &mut self.backend,
            surface: &self.surface,
            input: &self.input,
            runtime,
        });

        self.window.pre_present_notify();
        match self.scene.on_refresh(&mut self.backend, &self.surface) {
            Ok(_) => control,
            Err(err) => {
                log::error!("window {:?}: {err:#}", self.id);
                AppControl::Exit
            }
        }
    }
}

// ── event loop ────────────────────────────────────────────────────────────

struct AppState<A>
where
    A: CoreApp + 'static,
{
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    windows: HashMap<WindowId, WindowEntry>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(initial: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            initial,
            gpu_init,
            app,
            windows: HashMap::new(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Opens a window and mounts its scene. Setup failures go to
    /// `App::on_init_error` and the window is dropped.
    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop, config: RuntimeConfig) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let window = Arc::new(event_loop.create_window(attrs).context("failed to create window")?);
        let id = window.id();

        match WindowEntry::build(&mut self.app, self.gpu_init.clone(), window) {
            Ok(entry) => {
                log::info!("window {id:?} ready");
                self.windows.insert(id, entry);
            }
            Err(err) => self.app.on_init_error(id, &err),
        }
        Ok(())
    }

    fn destroy_window_entry(&mut self, id: WindowId) {
        self.windows.remove(&id);
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::CreateWindow(cfg) => {
                    if let Err(e) = self.create_window_entry(event_loop, cfg) {
                        log::error!("failed to create window: {e:#}");
                        self.request_exit();
                    }
                }
                Command::CloseWindow(id) => self.destroy_window_entry(id),
                Command::RequestRedraw(id) => {
                    if let Some(entry) = self.windows.get_mut(&id) {
                        entry.scene.request_redraw();
                    }
                }
                Command::Exit => self.request_exit(),
            }
        }

        if self.windows.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.windows.is_empty() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop, self.initial.clone()) {
            log::error!("failed to create initial window: {e:#}");
        }
        if self.windows.is_empty() {
            self.request_exit();
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        // Frames are only drawn when a scene asks for one.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.windows.get_mut(&window_id) else {
            return;
        };

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit();
            event_loop.exit();
            return;
        }

        entry.handle_input(&event);

        match &event {
            WindowEvent::CloseRequested => {
                self.destroy_window_entry(window_id);
                if self.windows.is_empty() {
                    self.request_exit();
                    event_loop.exit();
                }
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => entry.resize(),

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();
                if entry.redraw(&mut self.app, &mut runtime_ctx) == AppControl::Exit {
                    runtime_ctx.exit();
                }
                self.apply_commands(event_loop, runtime_ctx);
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

// ── translation ───────────────────────────────────────────────────────────

/// Maps a CSS cursor name to a winit cursor. Unknown names fall back to the arrow.
fn cursor_icon(name: &str) -> CursorIcon {
    name.parse().unwrap_or_else(|_| {
        log::warn!("unknown cursor `{name}`; using default");
        CursorIcon::Default
    })
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_touch_phase(p: WinitTouchPhase) -> TouchPhase {
    match p {
        WinitTouchPhase::Started => TouchPhase::Started,
        WinitTouchPhase::Moved => TouchPhase::Moved,
        WinitTouchPhase::Ended => TouchPhase::Ended,
        WinitTouchPhase::Cancelled => TouchPhase::Cancelled,
    }
}
