//! Drawing: the backend seam, program metadata, render nodes and the frame loop.
//!
//! Geometry is in logical pixels (top-left origin, +Y down); programs map it to
//! clip space with a projection uniform.

mod backend;
mod node;
mod program;
mod renderer;
mod scheduler;
mod wgpu_backend;

pub use backend::{
    AttributeDecl, AttributeFormat, AttributeLocation, DrawCall, GpuBackend, ProgramDesc, ProgramId,
    RasterState, UniformDecl, UniformLocation, VertexArrayId,
};
pub use node::RenderNode;
pub use program::ProgramInfo;
pub use renderer::{FrameStats, Renderer};
pub use scheduler::{FrameRequester, RenderScheduler};
pub use wgpu_backend::WgpuBackend;
