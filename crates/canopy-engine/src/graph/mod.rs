//! One scene per drawing surface: tree, dispatcher, scheduler and renderer together.

mod config;
mod scene_graph;

pub use config::SceneConfig;
pub use scene_graph::SceneGraph;
