//! Buffer/uniform upload layer.
//!
//! Responsibilities:
//! - dirty-track uniform values so unchanged values are never re-sent to the GPU
//! - keep one reusable backing array per vertex attribute name
//! - let render nodes rebuild attribute data from application props

mod buffer_pool;
mod layout;
mod tracked;
mod uniform;

pub use buffer_pool::BufferPool;
pub use layout::{BufferLayout, BufferWriter, DrawCounts};
pub use tracked::Tracked;
pub use uniform::{Uniform, UniformData, UniformKind, UniformSet, UniformValue};

pub(crate) use layout::ErasedLayout;
