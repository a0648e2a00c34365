//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and wires each window to a GPU
//! backend and a scene graph.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
