use glam::{Mat4, Vec4};

use crate::coords::ColorRgba;
use crate::render::{GpuBackend, ProgramId, ProgramInfo, UniformLocation};

use super::Tracked;

/// Shader-side type of a uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Vec4,
    Mat4,
}

/// A uniform value as handed to the backend.
///
/// Equality is numeric for scalars and component-wise for vectors and matrices.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    pub fn zeroed(kind: UniformKind) -> Self {
        match kind {
            UniformKind::Float => UniformValue::Float(0.0),
            UniformKind::Vec4 => UniformValue::Vec4(Vec4::ZERO),
            UniformKind::Mat4 => UniformValue::Mat4(Mat4::ZERO),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

impl From<ColorRgba> for UniformValue {
    fn from(c: ColorRgba) -> Self {
        UniformValue::Vec4(c.to_vec4())
    }
}

/// Types that can live in a [`Uniform`] slot.
pub trait UniformData: Copy + PartialEq + 'static {
    fn to_value(&self) -> UniformValue;
}

impl UniformData for f32 {
    fn to_value(&self) -> UniformValue {
        UniformValue::Float(*self)
    }
}

impl UniformData for Vec4 {
    fn to_value(&self) -> UniformValue {
        UniformValue::Vec4(*self)
    }
}

impl UniformData for Mat4 {
    fn to_value(&self) -> UniformValue {
        UniformValue::Mat4(*self)
    }
}

impl UniformData for UniformValue {
    fn to_value(&self) -> UniformValue {
        *self
    }
}

/// One dirty-tracked uniform slot.
#[derive(Debug, Clone)]
pub struct Uniform<T> {
    value: Tracked<T>,
}

impl<T: UniformData> Uniform<T> {
    pub fn new(value: T) -> Self {
        Self { value: Tracked::new(value) }
    }

    #[inline]
    pub fn get(&self) -> T {
        *self.value.get()
    }

    /// Returns whether the stored value changed.
    #[inline]
    pub fn set(&mut self, value: T) -> bool {
        self.value.set(value)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.value.is_dirty()
    }

    /// Pushes the value to the backend if it changed since the last upload.
    ///
    /// Returns whether an upload call was issued.
    pub fn upload(
        &mut self,
        gpu: &mut dyn GpuBackend,
        program: ProgramId,
        location: UniformLocation,
    ) -> bool {
        if !self.value.take_dirty() {
            return false;
        }
        gpu.upload_uniform(program, location, &self.value.get().to_value());
        true
    }
}

/// Uniform slots of one program, shared by every render node bound to it.
#[derive(Debug)]
pub struct UniformSet {
    program: ProgramId,
    slots: Vec<(UniformLocation, Uniform<UniformValue>)>,
}

impl UniformSet {
    pub fn new(info: &ProgramInfo) -> Self {
        let slots = info
            .uniforms()
            .map(|(decl, loc)| (loc, Uniform::new(UniformValue::zeroed(decl.kind))))
            .collect();
        Self {
            program: info.id(),
            slots,
        }
    }

    #[inline]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Assigns slot `index`. Out-of-range indices are ignored.
    pub fn assign(&mut self, index: usize, value: UniformValue) -> bool {
        match self.slots.get_mut(index) {
            Some((_, slot)) => slot.set(value),
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<UniformValue> {
        self.slots.get(index).map(|(_, slot)| slot.get())
    }

    /// Uploads every dirty slot; returns the number of upload calls issued.
    pub fn upload_dirty(&mut self, gpu: &mut dyn GpuBackend) -> usize {
        let mut issued = 0;
        for (loc, slot) in &mut self.slots {
            if slot.upload(gpu, self.program, *loc) {
                issued += 1;
            }
        }
        issued
    }
}
