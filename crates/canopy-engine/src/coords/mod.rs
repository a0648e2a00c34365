//! Coordinate and geometry types shared by the scene, hit-testing and rendering.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left of the drawing surface
//! - +X right, +Y down
//!
//! Shaders convert to clip space using the projection from [`Viewport`].

mod bounds;
mod color;
mod viewport;

pub use bounds::Bounds;
pub use color::ColorRgba;
pub use viewport::Viewport;

pub use glam::{Mat4, Vec2, Vec3, Vec4};
