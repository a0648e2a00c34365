use glam::Mat4;

use crate::event::HitTestNode;
use crate::render::RenderNode;

use super::ZIndex;

/// What a scene node carries besides its place in the tree.
#[derive(Debug)]
pub enum NodeKind {
    /// Grouping and coordinate-frame boundary; draws and hits nothing itself.
    Container,
    Render(RenderNode),
    HitTest(HitTestNode),
}

impl NodeKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::Render(_) => "render",
            NodeKind::HitTest(_) => "hit-test",
        }
    }
}

/// One node of the scene tree.
///
/// Parent/child links live in the tree's arena; the node itself holds only its
/// ordering key, local transform and payload.
#[derive(Debug)]
pub struct SceneNode {
    pub(crate) serial: u64,
    pub(crate) z_index: ZIndex,
    pub(crate) transform: Mat4,
    pub(crate) kind: NodeKind,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            serial: 0,
            z_index: ZIndex::default(),
            transform: Mat4::IDENTITY,
            kind,
        }
    }

    pub fn container() -> Self {
        Self::new(NodeKind::Container)
    }

    pub fn hit_test(node: HitTestNode) -> Self {
        Self::new(NodeKind::HitTest(node))
    }

    pub fn with_z_index(mut self, z: impl Into<ZIndex>) -> Self {
        self.z_index = z.into();
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Unique for the lifetime of the owning tree; never reused after removal.
    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    #[inline]
    pub fn z_index(&self) -> ZIndex {
        self.z_index
    }

    /// Local transform mapping this node's space into its parent's.
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_hit_test(&self) -> Option<&HitTestNode> {
        match &self.kind {
            NodeKind::HitTest(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_render(&self) -> Option<&RenderNode> {
        match &self.kind {
            NodeKind::Render(r) => Some(r),
            _ => None,
        }
    }
}
