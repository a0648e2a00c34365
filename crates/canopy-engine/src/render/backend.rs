use anyhow::Result;

use crate::coords::ColorRgba;
use crate::upload::{UniformKind, UniformValue};

/// Handle to a linked GPU program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProgramId(pub u32);

/// Handle to the per-node vertex input state (one buffer per attribute).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexArrayId(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeLocation(pub u32);

/// Vertex attribute format. Data is always `f32`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    Float32x2,
    Float32x4,
}

impl AttributeFormat {
    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            AttributeFormat::Float32x2 => 2,
            AttributeFormat::Float32x4 => 4,
        }
    }

    #[inline]
    pub const fn byte_size(self) -> u64 {
        self.components() as u64 * 4
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    pub format: AttributeFormat,
    /// Advances once per instance instead of once per vertex.
    pub instanced: bool,
}

/// Everything a backend needs to build a program.
///
/// `source` is WGSL. Uniforms are declared in order as the members of one uniform
/// block at `@group(0) @binding(0)`; attribute `i` is read from `@location(i)`.
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    pub label: String,
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub uniforms: Vec<UniformDecl>,
    pub attributes: Vec<AttributeDecl>,
}

impl ProgramDesc {
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            vertex_entry: "vs_main".to_owned(),
            fragment_entry: "fs_main".to_owned(),
            uniforms: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_entries(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_entry = vertex.into();
        self.fragment_entry = fragment.into();
        self
    }

    pub fn with_uniform(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, format: AttributeFormat) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.into(),
            format,
            instanced: false,
        });
        self
    }

    pub fn with_instance_attribute(
        mut self,
        name: impl Into<String>,
        format: AttributeFormat,
    ) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.into(),
            format,
            instanced: true,
        });
        self
    }
}

/// Fixed rasterization state for a flat 2D compositor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RasterState {
    /// Standard alpha compositing (`src_alpha`, `one_minus_src_alpha`).
    pub alpha_blend: bool,
    pub cull_faces: bool,
    pub depth_test: bool,
    pub dither: bool,
    pub stencil_test: bool,
    pub scissor_test: bool,
}

impl RasterState {
    pub const FLAT_2D: Self = Self {
        alpha_blend: true,
        cull_faces: false,
        depth_test: false,
        dither: false,
        stencil_test: false,
        scissor_test: false,
    };
}

/// One draw call. `instance_count: None` is a non-instanced draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub vertex_count: u32,
    pub instance_count: Option<u32>,
}

/// Immediate-mode drawing API the scene graph drives.
///
/// Calls between `begin_frame` and `end_frame` describe one frame. Uniform uploads
/// apply to the given program and persist until overwritten.
pub trait GpuBackend {
    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId>;

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation>;

    fn create_vertex_array(&mut self, program: ProgramId) -> Result<VertexArrayId>;

    fn release_vertex_array(&mut self, vao: VertexArrayId);

    /// Backing buffer size in physical pixels.
    fn set_viewport(&mut self, width: u32, height: u32);

    fn set_raster_state(&mut self, state: &RasterState);

    /// Acquires the frame target and clears it. `Ok(false)` skips this frame.
    fn begin_frame(&mut self, clear: ColorRgba) -> Result<bool>;

    fn use_program(&mut self, program: ProgramId);

    fn upload_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue);

    fn upload_attribute(&mut self, vao: VertexArrayId, location: AttributeLocation, data: &[f32]);

    fn draw(&mut self, vao: VertexArrayId, call: DrawCall);

    fn end_frame(&mut self) -> Result<()>;
}
