use anyhow::{Context, Result};

use crate::error::SceneError;

use super::backend::{
    AttributeDecl, AttributeLocation, GpuBackend, ProgramDesc, ProgramId, UniformDecl,
    UniformLocation,
};

/// A built program with every declared uniform and attribute location resolved.
///
/// Shared by all render nodes drawing with it.
#[derive(Debug)]
pub struct ProgramInfo {
    id: ProgramId,
    label: String,
    uniforms: Vec<(UniformDecl, UniformLocation)>,
    attributes: Vec<(AttributeDecl, AttributeLocation)>,
}

impl ProgramInfo {
    /// Builds `desc` on `gpu` and resolves its locations.
    ///
    /// Fails if any declared uniform or attribute has no location.
    pub fn build(gpu: &mut dyn GpuBackend, desc: &ProgramDesc) -> Result<Self> {
        let id = gpu
            .create_program(desc)
            .with_context(|| format!("failed to build program `{}`", desc.label))?;

        let mut uniforms = Vec::with_capacity(desc.uniforms.len());
        for decl in &desc.uniforms {
            let loc = gpu.uniform_location(id, &decl.name).ok_or_else(|| {
                SceneError::MissingUniform {
                    program: desc.label.clone(),
                    name: decl.name.clone(),
                }
            })?;
            uniforms.push((decl.clone(), loc));
        }

        let mut attributes = Vec::with_capacity(desc.attributes.len());
        for decl in &desc.attributes {
            let loc = gpu.attribute_location(id, &decl.name).ok_or_else(|| {
                SceneError::MissingAttribute {
                    program: desc.label.clone(),
                    name: decl.name.clone(),
                }
            })?;
            attributes.push((decl.clone(), loc));
        }

        log::debug!(
            "program `{}` ready: {} uniforms, {} attributes",
            desc.label,
            uniforms.len(),
            attributes.len()
        );

        Ok(Self {
            id,
            label: desc.label.clone(),
            uniforms,
            attributes,
        })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&UniformDecl, UniformLocation)> + '_ {
        self.uniforms.iter().map(|(d, l)| (d, *l))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&AttributeDecl, AttributeLocation)> + '_ {
        self.attributes.iter().map(|(d, l)| (d, *l))
    }

    #[inline]
    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Index, declaration and location of uniform `name`.
    pub fn uniform(&self, name: &str) -> Option<(usize, &UniformDecl, UniformLocation)> {
        self.uniforms
            .iter()
            .enumerate()
            .find(|(_, (d, _))| d.name == name)
            .map(|(i, (d, l))| (i, d, *l))
    }

    /// Index, declaration and location of attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<(usize, &AttributeDecl, AttributeLocation)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, (d, _))| d.name == name)
            .map(|(i, (d, l))| (i, d, *l))
    }

    pub(crate) fn attribute_at(&self, index: usize) -> Option<(&AttributeDecl, AttributeLocation)> {
        self.attributes.get(index).map(|(d, l)| (d, *l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::AttributeFormat;
    use crate::test_support::RecordingBackend;
    use crate::upload::UniformKind;

    fn desc() -> ProgramDesc {
        ProgramDesc::new("rects", "")
            .with_uniform("u_projection", UniformKind::Mat4)
            .with_instance_attribute("a_rect", AttributeFormat::Float32x4)
    }

    #[test]
    fn resolves_declared_locations() {
        let mut gpu = RecordingBackend::default();
        let info = ProgramInfo::build(&mut gpu, &desc()).unwrap();

        assert_eq!(info.uniform_count(), 1);
        assert_eq!(info.attribute("a_rect").map(|(i, _, _)| i), Some(0));
        assert!(info.uniform("u_missing").is_none());
    }

    #[test]
    fn missing_uniform_fails_fast() {
        let mut gpu = RecordingBackend::default();
        gpu.hide_location("u_projection");

        let err = ProgramInfo::build(&mut gpu, &desc()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SceneError>(),
            Some(SceneError::MissingUniform { name, .. }) if name == "u_projection"
        ));
    }

    #[test]
    fn missing_attribute_fails_fast() {
        let mut gpu = RecordingBackend::default();
        gpu.hide_location("a_rect");

        let err = ProgramInfo::build(&mut gpu, &desc()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SceneError>(),
            Some(SceneError::MissingAttribute { .. })
        ));
    }
}
