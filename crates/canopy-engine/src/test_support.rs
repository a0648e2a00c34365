//! In-memory doubles for the GPU backend, host surface and frame requester.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::coords::{Bounds, ColorRgba};
use crate::error::SceneError;
use crate::event::HostSurface;
use crate::render::{
    AttributeFormat, AttributeLocation, DrawCall, FrameRequester, GpuBackend, ProgramDesc, ProgramId,
    ProgramInfo, RasterState, UniformLocation, VertexArrayId,
};
use crate::upload::{BufferLayout, BufferWriter, DrawCounts, UniformKind, UniformValue};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateProgram(String),
    CreateVertexArray(VertexArrayId),
    ReleaseVertexArray(VertexArrayId),
    SetViewport(u32, u32),
    SetRasterState(RasterState),
    BeginFrame(ColorRgba),
    UseProgram(ProgramId),
    UploadUniform {
        program: ProgramId,
        location: UniformLocation,
        value: UniformValue,
    },
    UploadAttribute {
        vao: VertexArrayId,
        location: AttributeLocation,
        data: Vec<f32>,
    },
    Draw(VertexArrayId, DrawCall),
    EndFrame,
}

/// Backend that records every call. Locations follow declaration order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    programs: Vec<ProgramDesc>,
    hidden: HashSet<String>,
    vaos: HashMap<u32, ProgramId>,
    next_vao: u32,
    skip_frames: usize,
    fail_vertex_arrays: bool,
}

impl RecordingBackend {
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Makes `name` unresolvable in every program.
    pub fn hide_location(&mut self, name: &str) {
        self.hidden.insert(name.to_owned());
    }

    /// The next `n` frames report an unavailable surface.
    pub fn skip_frames(&mut self, n: usize) {
        self.skip_frames = n;
    }

    pub fn fail_vertex_arrays(&mut self) {
        self.fail_vertex_arrays = true;
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vaos.len()
    }

    pub fn register(&mut self, desc: ProgramDesc) -> Rc<ProgramInfo> {
        Rc::new(ProgramInfo::build(self, &desc).unwrap())
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn draws(&self) -> Vec<VertexArrayId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw(vao, _) => Some(*vao),
                _ => None,
            })
            .collect()
    }

    fn program(&self, id: ProgramId) -> Option<&ProgramDesc> {
        self.programs.get(id.0 as usize)
    }
}

impl GpuBackend for RecordingBackend {
    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId> {
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(desc.clone());
        self.calls.push(BackendCall::CreateProgram(desc.label.clone()));
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if self.hidden.contains(name) {
            return None;
        }
        let i = self.program(program)?.uniforms.iter().position(|u| u.name == name)?;
        Some(UniformLocation(i as u32))
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        if self.hidden.contains(name) {
            return None;
        }
        let i = self.program(program)?.attributes.iter().position(|a| a.name == name)?;
        Some(AttributeLocation(i as u32))
    }

    fn create_vertex_array(&mut self, program: ProgramId) -> Result<VertexArrayId> {
        if self.fail_vertex_arrays {
            bail!("out of vertex arrays");
        }
        let vao = VertexArrayId(self.next_vao);
        self.next_vao += 1;
        self.vaos.insert(vao.0, program);
        self.calls.push(BackendCall::CreateVertexArray(vao));
        Ok(vao)
    }

    fn release_vertex_array(&mut self, vao: VertexArrayId) {
        self.vaos.remove(&vao.0);
        self.calls.push(BackendCall::ReleaseVertexArray(vao));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(BackendCall::SetViewport(width, height));
    }

    fn set_raster_state(&mut self, state: &RasterState) {
        self.calls.push(BackendCall::SetRasterState(*state));
    }

    fn begin_frame(&mut self, clear: ColorRgba) -> Result<bool> {
        self.calls.push(BackendCall::BeginFrame(clear));
        if self.skip_frames > 0 {
            self.skip_frames -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(BackendCall::UseProgram(program));
    }

    fn upload_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue) {
        self.calls.push(BackendCall::UploadUniform {
            program,
            location,
            value: *value,
        });
    }

    fn upload_attribute(&mut self, vao: VertexArrayId, location: AttributeLocation, data: &[f32]) {
        self.calls.push(BackendCall::UploadAttribute {
            vao,
            location,
            data: data.to_vec(),
        });
    }

    fn draw(&mut self, vao: VertexArrayId, call: DrawCall) {
        self.calls.push(BackendCall::Draw(vao, call));
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push(BackendCall::EndFrame);
        Ok(())
    }
}

/// Host surface with a fixed rectangle that remembers cursor pushes.
#[derive(Debug)]
pub struct TestSurface {
    rect: Bounds,
    dpr: f32,
    cursors: Vec<String>,
}

impl TestSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            rect: Bounds::from_size(width, height),
            dpr: 1.0,
            cursors: Vec::new(),
        }
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.rect.x = x;
        self.rect.y = y;
        self
    }

    pub fn with_dpr(mut self, dpr: f32) -> Self {
        self.dpr = dpr;
        self
    }

    pub fn cursor(&self) -> &str {
        self.cursors.last().map(String::as_str).unwrap_or("default")
    }

    pub fn cursor_pushes(&self) -> usize {
        self.cursors.len()
    }
}

impl HostSurface for TestSurface {
    fn bounding_rect(&self) -> Bounds {
        self.rect
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn set_cursor(&mut self, cursor: &str) {
        self.cursors.push(cursor.to_owned());
    }
}

/// Frame requester that counts host callbacks.
#[derive(Debug, Clone, Default)]
pub struct CountingRequester(pub Rc<Cell<usize>>);

impl CountingRequester {
    pub fn requests(&self) -> usize {
        self.0.get()
    }
}

impl FrameRequester for CountingRequester {
    fn request_frame(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Instanced unit-quad program: one `vec4` rect per instance plus a tint.
pub fn rect_program() -> ProgramDesc {
    ProgramDesc::new("rects", "")
        .with_uniform("u_projection", UniformKind::Mat4)
        .with_uniform("u_tint", UniformKind::Vec4)
        .with_instance_attribute("a_rect", AttributeFormat::Float32x4)
}

/// Layout for [`rect_program`]: props are `[x, y, w, h]` rects.
#[derive(Debug, Default)]
pub struct RectLayout;

impl BufferLayout for RectLayout {
    type Props = Vec<[f32; 4]>;

    fn attributes(&self) -> &[&'static str] {
        &["a_rect"]
    }

    fn write(&mut self, props: &Self::Props, out: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        let data = out.attribute("a_rect", props.len() * 4)?;
        for (dst, rect) in data.chunks_exact_mut(4).zip(props) {
            dst.copy_from_slice(rect);
        }
        Ok(DrawCounts::instanced(6, props.len() as u32))
    }
}
