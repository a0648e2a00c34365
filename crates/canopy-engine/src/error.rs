use indextree::NodeId;

use crate::event::EventKind;
use crate::upload::UniformKind;

/// Errors produced by the scene graph core.
///
/// Backend, host and handler failures travel as `anyhow::Error`; this enum covers the
/// conditions the core itself detects.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0} is not part of the scene")]
    UnknownNode(NodeId),

    #[error("node {id} is a {actual} node, not a {expected} node")]
    WrongKind {
        id: NodeId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("the root node cannot be re-parented")]
    RootMove,

    #[error("invalid tree operation: {0}")]
    Tree(#[from] indextree::NodeError),

    #[error("program `{program}` has no active uniform `{name}`")]
    MissingUniform { program: String, name: String },

    #[error("program `{program}` has no active attribute `{name}`")]
    MissingAttribute { program: String, name: String },

    #[error("uniform `{name}` expects {expected:?}, got {actual:?}")]
    UniformType {
        name: String,
        expected: UniformKind,
        actual: UniformKind,
    },

    #[error("node {id} takes props of type `{expected}`, got `{actual}`")]
    PropsType {
        id: NodeId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("attribute `{name}` has {len} floats, not a multiple of {components}")]
    AttributeLength {
        name: String,
        len: usize,
        components: u32,
    },

    #[error("{0:?} is synthesized by the dispatcher and cannot be dispatched as input")]
    SyntheticEvent(EventKind),
}
