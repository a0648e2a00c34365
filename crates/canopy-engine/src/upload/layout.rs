use std::any::Any;

use crate::error::SceneError;
use crate::render::ProgramInfo;

use super::BufferPool;

/// How many vertices (and optionally instances) a render node draws.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DrawCounts {
    pub vertex_count: u32,
    /// `None` issues an ordinary draw; `Some(n)` issues one instanced draw of `n` copies.
    pub instance_count: Option<u32>,
}

impl DrawCounts {
    pub const NONE: Self = Self::vertices(0);

    #[inline]
    pub const fn vertices(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            instance_count: None,
        }
    }

    #[inline]
    pub const fn instanced(vertex_count: u32, instance_count: u32) -> Self {
        Self {
            vertex_count,
            instance_count: Some(instance_count),
        }
    }

    /// False for zero vertices or an explicit zero instance count.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.vertex_count > 0 && self.instance_count != Some(0)
    }
}

/// Turns application-level props into vertex attribute data for one render node.
pub trait BufferLayout: 'static {
    type Props: 'static;

    /// Attribute names this layout writes. Each must be declared by the program
    /// the render node draws with.
    fn attributes(&self) -> &[&'static str];

    /// Writes static geometry once, when the render node is created.
    fn init(&mut self, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        let _ = writer;
        Ok(DrawCounts::NONE)
    }

    /// Recomputes attribute data from `props`.
    fn write(
        &mut self,
        props: &Self::Props,
        writer: &mut BufferWriter<'_>,
    ) -> Result<DrawCounts, SceneError>;
}

/// Write access to a render node's pooled attribute arrays.
///
/// Every attribute written through it is re-uploaded before the next draw.
pub struct BufferWriter<'a> {
    program: &'a ProgramInfo,
    pool: &'a mut BufferPool,
    dirty: &'a mut [bool],
}

impl<'a> BufferWriter<'a> {
    pub(crate) fn new(program: &'a ProgramInfo, pool: &'a mut BufferPool, dirty: &'a mut [bool]) -> Self {
        Self { program, pool, dirty }
    }

    /// Returns a view of exactly `len` floats for attribute `name` to be filled in.
    pub fn attribute(&mut self, name: &str, len: usize) -> Result<&mut [f32], SceneError> {
        let Some((index, decl, _)) = self.program.attribute(name) else {
            return Err(SceneError::MissingAttribute {
                program: self.program.label().to_owned(),
                name: name.to_owned(),
            });
        };

        let components = decl.format.components();
        if len % components as usize != 0 {
            return Err(SceneError::AttributeLength {
                name: name.to_owned(),
                len,
                components,
            });
        }

        if let Some(flag) = self.dirty.get_mut(index) {
            *flag = true;
        }
        Ok(self.pool.slice_mut(name, len))
    }

    /// Copies `data` into attribute `name`.
    pub fn write(&mut self, name: &str, data: &[f32]) -> Result<(), SceneError> {
        self.attribute(name, data.len())?.copy_from_slice(data);
        Ok(())
    }
}

/// Object-safe view of a [`BufferLayout`] with its props type erased.
pub(crate) trait ErasedLayout {
    fn attributes(&self) -> &[&'static str];

    fn init(&mut self, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError>;

    fn props_type(&self) -> &'static str;

    /// `None` when `props` is not the layout's props type.
    fn write_any(
        &mut self,
        props: &dyn Any,
        writer: &mut BufferWriter<'_>,
    ) -> Option<Result<DrawCounts, SceneError>>;
}

impl<L: BufferLayout> ErasedLayout for L {
    fn attributes(&self) -> &[&'static str] {
        BufferLayout::attributes(self)
    }

    fn init(&mut self, writer: &mut BufferWriter<'_>) -> Result<DrawCounts, SceneError> {
        BufferLayout::init(self, writer)
    }

    fn props_type(&self) -> &'static str {
        std::any::type_name::<L::Props>()
    }

    fn write_any(
        &mut self,
        props: &dyn Any,
        writer: &mut BufferWriter<'_>,
    ) -> Option<Result<DrawCounts, SceneError>> {
        let props = props.downcast_ref::<L::Props>()?;
        Some(self.write(props, writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counts_are_not_drawable() {
        assert!(!DrawCounts::NONE.is_drawable());
        assert!(!DrawCounts::instanced(6, 0).is_drawable());
        assert!(!DrawCounts::instanced(0, 10).is_drawable());
        assert!(DrawCounts::instanced(6, 1).is_drawable());
        assert!(DrawCounts::vertices(3).is_drawable());
    }
}
