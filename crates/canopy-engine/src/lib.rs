//! Canopy engine crate.
//!
//! A retained-mode 2D scene graph drawn on a GPU surface: a node tree with
//! z-ordered siblings and nested transforms, pointer hit-testing and event
//! dispatch with capture and bubble phases, coalesced redraws, and a minimal
//! uniform/attribute upload layer over a pluggable GPU backend.

pub mod coords;
pub mod core;
pub mod device;
pub mod event;
pub mod graph;
pub mod hit;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod upload;
pub mod window;

mod error;

pub use error::SceneError;

#[cfg(test)]
mod test_support;
