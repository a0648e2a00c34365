use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::SceneError;
use crate::upload::{BufferLayout, BufferPool, BufferWriter, DrawCounts, ErasedLayout, UniformSet, UniformValue};

use super::backend::{DrawCall, GpuBackend, VertexArrayId};
use super::program::ProgramInfo;
use super::renderer::FrameStats;

/// Scene payload that draws with one program and its own attribute buffers.
pub struct RenderNode {
    program: Rc<ProgramInfo>,
    vao: VertexArrayId,
    layout: Box<dyn ErasedLayout>,
    pool: BufferPool,
    dirty_attributes: Vec<bool>,
    counts: DrawCounts,
    /// Desired value per program uniform; `None` leaves the program's slot as is.
    uniforms: Vec<Option<UniformValue>>,
}

impl RenderNode {
    pub(crate) fn new<L: BufferLayout>(
        program: Rc<ProgramInfo>,
        vao: VertexArrayId,
        layout: L,
    ) -> Result<Self, SceneError> {
        let mut layout: Box<dyn ErasedLayout> = Box::new(layout);
        if let Some(name) = layout.attributes().iter().find(|n| program.attribute(n).is_none()) {
            return Err(SceneError::MissingAttribute {
                program: program.label().to_owned(),
                name: (*name).to_owned(),
            });
        }
        let mut pool = BufferPool::new();
        let mut dirty_attributes = vec![false; program.attribute_count()];

        let counts = layout.init(&mut BufferWriter::new(&program, &mut pool, &mut dirty_attributes))?;
        let uniforms = vec![None; program.uniform_count()];

        Ok(Self {
            program,
            vao,
            layout,
            pool,
            dirty_attributes,
            counts,
            uniforms,
        })
    }

    #[inline]
    pub fn program(&self) -> &Rc<ProgramInfo> {
        &self.program
    }

    #[inline]
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vao
    }

    #[inline]
    pub fn counts(&self) -> DrawCounts {
        self.counts
    }

    #[inline]
    pub fn buffers(&self) -> &BufferPool {
        &self.pool
    }

    /// The value this node requests for uniform `name`, if it set one.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        let (index, _, _) = self.program.uniform(name)?;
        self.uniforms.get(index).copied().flatten()
    }

    /// Type name of the props [`SceneTree::update`](crate::scene::SceneTree::update) accepts.
    pub fn props_type(&self) -> &'static str {
        self.layout.props_type()
    }

    pub fn has_dirty_attributes(&self) -> bool {
        self.dirty_attributes.iter().any(|d| *d)
    }

    /// Rebuilds attribute data from `props`. `None` means the props type is wrong.
    pub(crate) fn update(&mut self, props: &dyn Any) -> Option<Result<(), SceneError>> {
        let mut writer = BufferWriter::new(&self.program, &mut self.pool, &mut self.dirty_attributes);
        let result = self.layout.write_any(props, &mut writer)?;
        Some(result.map(|counts| self.counts = counts))
    }

    /// Stores the requested value for uniform `name`; returns whether it changed.
    pub(crate) fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<bool, SceneError> {
        let Some((index, decl, _)) = self.program.uniform(name) else {
            return Err(SceneError::MissingUniform {
                program: self.program.label().to_owned(),
                name: name.to_owned(),
            });
        };
        if decl.kind != value.kind() {
            return Err(SceneError::UniformType {
                name: name.to_owned(),
                expected: decl.kind,
                actual: value.kind(),
            });
        }

        let slot = &mut self.uniforms[index];
        if *slot == Some(value) {
            return Ok(false);
        }
        *slot = Some(value);
        Ok(true)
    }

    /// Uploads whatever changed and issues this node's draw call.
    ///
    /// The caller has already bound the program and checked the counts.
    pub(crate) fn draw(
        &mut self,
        gpu: &mut dyn GpuBackend,
        uniforms: &mut UniformSet,
        stats: &mut FrameStats,
    ) {
        for (index, value) in self.uniforms.iter().enumerate() {
            if let Some(value) = value {
                uniforms.assign(index, *value);
            }
        }
        stats.uniform_uploads += uniforms.upload_dirty(gpu);

        for (index, dirty) in self.dirty_attributes.iter_mut().enumerate() {
            if !*dirty {
                continue;
            }
            let Some((decl, loc)) = self.program.attribute_at(index) else {
                continue;
            };
            let data = self.pool.get(&decl.name).unwrap_or(&[]);
            gpu.upload_attribute(self.vao, loc, data);
            *dirty = false;
            stats.attribute_uploads += 1;
        }

        gpu.draw(
            self.vao,
            DrawCall {
                vertex_count: self.counts.vertex_count,
                instance_count: self.counts.instance_count,
            },
        );
        stats.draws += 1;
    }
}

impl fmt::Debug for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderNode")
            .field("program", &self.program.label())
            .field("vao", &self.vao)
            .field("counts", &self.counts)
            .finish_non_exhaustive()
    }
}
