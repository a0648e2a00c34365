//! Scene node tree.
//!
//! Responsibilities:
//! - own every node in one arena, with container/render/hit-test payloads
//! - expose the mutation surface used by reconciliation adapters
//! - provide the z-ordered walk shared by drawing and hit-testing
//! - compose local transforms into world transforms

mod key;
mod node;
mod transform;
mod tree;
mod z_index;

pub use indextree::NodeId;
pub use key::SortKey;
pub use node::{NodeKind, SceneNode};
pub use transform::{to_local, to_world, world_transform};
pub use tree::SceneTree;
pub use z_index::ZIndex;
