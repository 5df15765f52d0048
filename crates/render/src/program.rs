//! Shader programs and their declared interfaces.

use crate::device::{ProgramHandle, RenderDevice, ShaderStage};

/// Shape of a declared uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: UniformType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    /// Shader input slot.
    pub location: u32,
    /// `f32` components per vertex.
    pub components: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDecl {
    pub name: String,
    pub unit: u32,
}

/// Everything a program exposes by name. Locations are resolved against
/// this after linking; a name that is not declared has no location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramInterface {
    pub uniforms: Vec<UniformDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub samplers: Vec<SamplerDecl>,
}

impl ProgramInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform(mut self, name: &str, ty: UniformType) -> Self {
        self.uniforms.push(UniformDecl {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn attribute(mut self, name: &str, location: u32, components: u32) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.to_string(),
            location,
            components,
        });
        self
    }

    pub fn sampler(mut self, name: &str, unit: u32) -> Self {
        self.samplers.push(SamplerDecl {
            name: name.to_string(),
            unit,
        });
        self
    }

    /// Index of a uniform in declaration order.
    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }

    pub fn find_attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn find_sampler(&self, name: &str) -> Option<&SamplerDecl> {
        self.samplers.iter().find(|s| s.name == name)
    }
}

/// Vertex and fragment source plus the interface they implement.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
    pub interface: ProgramInterface,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgramError {
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link: {log}")]
    Link { log: String },
}

/// Compile both stages and link them.
///
/// Shader objects are released whether or not linking succeeds. A failure
/// is logged with its diagnostic and returned; callers keep a null program
/// for the affected material and carry on.
pub fn build_program<D: RenderDevice + ?Sized>(
    device: &mut D,
    source: &ProgramSource,
) -> Result<ProgramHandle, ProgramError> {
    let result = compile_and_link(device, source);
    match &result {
        Ok(program) => tracing::info!(label = %source.label, ?program, "program linked"),
        Err(e) => tracing::error!(label = %source.label, "{e}"),
    }
    result
}

fn compile_and_link<D: RenderDevice + ?Sized>(
    device: &mut D,
    source: &ProgramSource,
) -> Result<ProgramHandle, ProgramError> {
    let vertex = device.compile_shader(ShaderStage::Vertex, &source.vertex)?;
    let fragment = match device.compile_shader(ShaderStage::Fragment, &source.fragment) {
        Ok(fragment) => fragment,
        Err(e) => {
            device.release_shader(vertex);
            return Err(e);
        }
    };
    let linked = device.link_program(vertex, fragment, &source.interface, &source.label);
    device.release_shader(vertex);
    device.release_shader(fragment);
    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_device::DebugDevice;

    fn source(vertex: &str, fragment: &str) -> ProgramSource {
        ProgramSource {
            label: "test".into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            interface: ProgramInterface::new()
                .uniform("projection", UniformType::Mat4)
                .uniform("tint", UniformType::Vec4)
                .attribute("position", 0, 3)
                .sampler("diffuse_map", 0),
        }
    }

    #[test]
    fn builds_and_resolves_declared_names() {
        let mut device = DebugDevice::new();
        let program = build_program(&mut device, &source("fn vs_main() {}", "fn fs_main() {}"))
            .unwrap();
        assert!(device.uniform_location(program, "tint").is_some());
        assert!(device.uniform_location(program, "missing").is_none());
        assert!(device.attribute_location(program, "position").is_some());
        assert_eq!(device.sampler_unit(program, "diffuse_map"), Some(0));
        assert_eq!(device.live_shader_count(), 0);
    }

    #[test]
    fn fragment_compile_failure_releases_vertex_shader() {
        let mut device = DebugDevice::new();
        let err = build_program(&mut device, &source("fn vs_main() {}", "   ")).unwrap_err();
        assert!(matches!(
            err,
            ProgramError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(device.live_shader_count(), 0);
    }

    #[test]
    fn link_failure_releases_both_shaders() {
        let mut device = DebugDevice::new();
        let err = build_program(&mut device, &source("fn main() {}", "fn fs_main() {}"))
            .unwrap_err();
        assert!(matches!(err, ProgramError::Link { .. }));
        assert_eq!(device.live_shader_count(), 0);
    }

    #[test]
    fn interface_lookup_by_name() {
        let interface = source("", "").interface;
        assert_eq!(interface.uniform_index("tint"), Some(1));
        assert_eq!(interface.find_attribute("position").map(|a| a.components), Some(3));
        assert!(interface.find_sampler("normal_map").is_none());
    }
}
