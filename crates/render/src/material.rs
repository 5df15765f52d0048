//! Material kinds, their uniform schemas and the material registry.
//!
//! A material pairs a linked program with a value for every uniform its
//! kind declares. Locations are resolved once at creation; binding replays
//! the cached locations every time.

use crate::device::{AttributeLocation, ProgramHandle, RenderDevice, UniformData, UniformLocation};
use crate::geometry::{GeometryBuffer, VertexAttribute};
use crate::program::{ProgramInterface, UniformType};
use crate::texture::{TextureId, TextureResource};
use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Index of a material in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    /// Single-light Phong shading with an optional diffuse texture.
    Phong,
    /// Unlit per-vertex colour multiplied by a tint.
    VertexColor,
}

/// A material-specific uniform value, tagged by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    /// Device shape this value is uploaded as.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            Self::Scalar(_) => UniformType::Float,
            Self::Bool(_) => UniformType::Int,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
        }
    }

    pub fn to_uniform_data(self) -> UniformData {
        match self {
            Self::Scalar(v) => UniformData::Float(v),
            Self::Bool(v) => UniformData::Int(v as i32),
            Self::Vec2(v) => UniformData::Vec2(v),
            Self::Vec3(v) => UniformData::Vec3(v),
            Self::Vec4(v) => UniformData::Vec4(v),
        }
    }
}

/// Uniforms shared by every material, set from per-frame/per-node state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalUniform {
    Projection,
    ModelView,
    NormalMatrix,
    LightEnabled,
    LightPosition,
}

impl GlobalUniform {
    pub fn uniform_type(self) -> UniformType {
        match self {
            Self::Projection | Self::ModelView | Self::NormalMatrix => UniformType::Mat4,
            Self::LightEnabled => UniformType::Int,
            Self::LightPosition => UniformType::Vec3,
        }
    }
}

/// Values for the global uniforms of one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalUniforms {
    pub projection: Mat4,
    pub model_view: Mat4,
    pub normal: Mat4,
    pub light_enabled: bool,
    /// Eye-space light position.
    pub light_position: Vec3,
}

impl GlobalUniforms {
    fn data(&self, global: GlobalUniform) -> UniformData {
        match global {
            GlobalUniform::Projection => UniformData::Mat4(self.projection),
            GlobalUniform::ModelView => UniformData::Mat4(self.model_view),
            GlobalUniform::NormalMatrix => UniformData::Mat4(self.normal),
            GlobalUniform::LightEnabled => UniformData::Int(self.light_enabled as i32),
            GlobalUniform::LightPosition => UniformData::Vec3(self.light_position),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeSlot {
    pub name: &'static str,
    pub source: VertexAttribute,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GlobalSlot {
    pub name: &'static str,
    pub global: GlobalUniform,
}

/// A material-specific uniform. The default fixes the value's shape.
#[derive(Debug, Clone, Copy)]
pub struct UniformSlot {
    pub name: &'static str,
    pub default: UniformValue,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureSlot {
    pub name: &'static str,
    pub required: bool,
}

/// Everything a material kind expects its program to expose.
#[derive(Debug)]
pub struct MaterialSchema {
    pub attributes: &'static [AttributeSlot],
    pub globals: &'static [GlobalSlot],
    pub uniforms: &'static [UniformSlot],
    pub textures: &'static [TextureSlot],
}

const PHONG: MaterialSchema = MaterialSchema {
    attributes: &[
        AttributeSlot {
            name: "position",
            source: VertexAttribute::Position,
            required: true,
        },
        AttributeSlot {
            name: "normal",
            source: VertexAttribute::Normal,
            required: true,
        },
        AttributeSlot {
            name: "texcoord",
            source: VertexAttribute::Texcoord,
            required: false,
        },
    ],
    globals: &[
        GlobalSlot {
            name: "projection",
            global: GlobalUniform::Projection,
        },
        GlobalSlot {
            name: "model_view",
            global: GlobalUniform::ModelView,
        },
        GlobalSlot {
            name: "normal_matrix",
            global: GlobalUniform::NormalMatrix,
        },
        GlobalSlot {
            name: "light_enabled",
            global: GlobalUniform::LightEnabled,
        },
        GlobalSlot {
            name: "light_position",
            global: GlobalUniform::LightPosition,
        },
    ],
    uniforms: &[
        UniformSlot {
            name: "use_texture",
            default: UniformValue::Bool(false),
        },
        UniformSlot {
            name: "ka",
            default: UniformValue::Scalar(0.3),
        },
        UniformSlot {
            name: "kd",
            default: UniformValue::Scalar(0.7),
        },
        UniformSlot {
            name: "ks",
            default: UniformValue::Scalar(0.4),
        },
        UniformSlot {
            name: "shininess",
            default: UniformValue::Scalar(32.0),
        },
        UniformSlot {
            name: "ambient_color",
            default: UniformValue::Vec3(Vec3::ONE),
        },
        UniformSlot {
            name: "diffuse_color",
            default: UniformValue::Vec3(Vec3::ONE),
        },
        UniformSlot {
            name: "specular_color",
            default: UniformValue::Vec3(Vec3::ONE),
        },
    ],
    textures: &[TextureSlot {
        name: "diffuse_map",
        required: false,
    }],
};

const VERTEX_COLOR: MaterialSchema = MaterialSchema {
    attributes: &[
        AttributeSlot {
            name: "position",
            source: VertexAttribute::Position,
            required: true,
        },
        AttributeSlot {
            name: "color",
            source: VertexAttribute::Color,
            required: false,
        },
    ],
    globals: &[
        GlobalSlot {
            name: "projection",
            global: GlobalUniform::Projection,
        },
        GlobalSlot {
            name: "model_view",
            global: GlobalUniform::ModelView,
        },
    ],
    uniforms: &[UniformSlot {
        name: "tint",
        default: UniformValue::Vec4(Vec4::ONE),
    }],
    textures: &[],
};

impl MaterialKind {
    pub fn schema(self) -> &'static MaterialSchema {
        match self {
            Self::Phong => &PHONG,
            Self::VertexColor => &VERTEX_COLOR,
        }
    }
}

impl MaterialSchema {
    /// The program interface that satisfies this schema exactly.
    ///
    /// Attributes take shader locations in declaration order; samplers take
    /// texture units the same way.
    pub fn interface(&self) -> ProgramInterface {
        let mut interface = ProgramInterface::new();
        for slot in self.globals {
            interface = interface.uniform(slot.name, slot.global.uniform_type());
        }
        for slot in self.uniforms {
            interface = interface.uniform(slot.name, slot.default.uniform_type());
        }
        for (location, slot) in self.attributes.iter().enumerate() {
            let components = match slot.source {
                VertexAttribute::Position | VertexAttribute::Normal => 3,
                VertexAttribute::Texcoord => 2,
                VertexAttribute::Color => 4,
            };
            interface = interface.attribute(slot.name, location as u32, components);
        }
        for (unit, slot) in self.textures.iter().enumerate() {
            interface = interface.sampler(slot.name, unit as u32);
        }
        interface
    }

    fn uniform(&self, name: &str) -> Option<&UniformSlot> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// Overrides for a material's uniform defaults and its texture bindings.
#[derive(Debug, Clone, Default)]
pub struct MaterialValues {
    uniforms: Vec<(String, UniformValue)>,
    textures: Vec<(String, TextureId)>,
}

impl MaterialValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: UniformValue) -> Self {
        self.uniforms.push((name.to_string(), value));
        self
    }

    pub fn with_texture(mut self, slot: &str, texture: TextureId) -> Self {
        self.textures.push((slot.to_string(), texture));
        self
    }

    pub fn texture_ids(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.textures.iter().map(|(_, id)| *id)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterialError {
    #[error("{0:?} material has no linked program")]
    NullProgram(MaterialKind),
    #[error("{kind:?} program has no uniform `{name}`")]
    MissingUniform { kind: MaterialKind, name: String },
    #[error("{kind:?} program has no attribute `{name}`")]
    MissingAttribute { kind: MaterialKind, name: String },
    #[error("{kind:?} program has no sampler `{name}`")]
    MissingTexture { kind: MaterialKind, name: String },
    #[error("uniform `{name}` expects {expected:?}, got {found:?}")]
    TypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
    #[error("{kind:?} materials have no uniform or texture slot `{name}`")]
    UnknownUniform { kind: MaterialKind, name: String },
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
}

#[derive(Debug, Clone)]
struct BoundAttribute {
    source: VertexAttribute,
    location: AttributeLocation,
}

#[derive(Debug, Clone)]
struct BoundUniform {
    name: &'static str,
    location: UniformLocation,
    value: UniformValue,
}

#[derive(Debug, Clone)]
struct BoundTexture {
    unit: u32,
    texture: Option<TextureId>,
}

#[derive(Debug, Clone)]
struct Bindings {
    program: ProgramHandle,
    attributes: Vec<BoundAttribute>,
    globals: Vec<(GlobalUniform, UniformLocation)>,
    uniforms: Vec<BoundUniform>,
    textures: Vec<BoundTexture>,
}

#[derive(Debug, Clone)]
enum MaterialState {
    Ready(Bindings),
    /// Registered so nodes can reference it, but never drawn.
    Disabled(MaterialError),
}

#[derive(Debug, Clone)]
pub struct Material {
    pub kind: MaterialKind,
    state: MaterialState,
}

impl Material {
    pub fn program(&self) -> Option<ProgramHandle> {
        match &self.state {
            MaterialState::Ready(b) => Some(b.program),
            MaterialState::Disabled(_) => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self.state, MaterialState::Ready(_))
    }

    /// Why this material cannot draw, if it cannot.
    pub fn disabled_reason(&self) -> Option<&MaterialError> {
        match &self.state {
            MaterialState::Ready(_) => None,
            MaterialState::Disabled(e) => Some(e),
        }
    }

    /// Current value of a material-specific uniform.
    pub fn value(&self, name: &str) -> Option<UniformValue> {
        match &self.state {
            MaterialState::Ready(b) => b.uniforms.iter().find(|u| u.name == name).map(|u| u.value),
            MaterialState::Disabled(_) => None,
        }
    }
}

/// Owns every material of a session.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// Resolve and cache every location `kind` names against `program`.
    pub fn create<D: RenderDevice + ?Sized>(
        &mut self,
        device: &D,
        kind: MaterialKind,
        program: Option<ProgramHandle>,
        values: &MaterialValues,
    ) -> Result<MaterialId, MaterialError> {
        let program = program.ok_or(MaterialError::NullProgram(kind))?;
        let bindings = resolve(device, kind, program, values)?;
        self.materials.push(Material {
            kind,
            state: MaterialState::Ready(bindings),
        });
        let id = MaterialId(self.materials.len() - 1);
        tracing::info!(?kind, ?program, material = id.0, "material created");
        Ok(id)
    }

    /// Like [`create`](Self::create), but a failure registers a disabled
    /// material instead of returning an error. Nodes using it are skipped.
    pub fn create_or_disable<D: RenderDevice + ?Sized>(
        &mut self,
        device: &D,
        kind: MaterialKind,
        program: Option<ProgramHandle>,
        values: &MaterialValues,
    ) -> MaterialId {
        match self.create(device, kind, program, values) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(?kind, "material unusable: {e}");
                self.materials.push(Material {
                    kind,
                    state: MaterialState::Disabled(e),
                });
                MaterialId(self.materials.len() - 1)
            }
        }
    }

    /// Replace one material-specific uniform value.
    pub fn set_value(
        &mut self,
        id: MaterialId,
        name: &str,
        value: UniformValue,
    ) -> Result<(), MaterialError> {
        let material = self
            .materials
            .get_mut(id.0)
            .ok_or(MaterialError::UnknownMaterial(id))?;
        let kind = material.kind;
        let bindings = match &mut material.state {
            MaterialState::Ready(b) => b,
            MaterialState::Disabled(e) => return Err(e.clone()),
        };
        let slot = bindings
            .uniforms
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| MaterialError::UnknownUniform {
                kind,
                name: name.to_string(),
            })?;
        check_shape(name, slot.value.uniform_type(), value.uniform_type())?;
        slot.value = value;
        Ok(())
    }

    /// Make `id` the active material: program, globals, specific uniforms
    /// and textures. Prior program and texture bindings are replaced.
    pub fn bind<D: RenderDevice + ?Sized>(
        &self,
        device: &mut D,
        id: MaterialId,
        globals: &GlobalUniforms,
        textures: &[TextureResource],
    ) -> Result<(), MaterialError> {
        let bindings = self.bindings(id)?;
        let mut texture_handles = Vec::with_capacity(bindings.textures.len());
        for bound in &bindings.textures {
            if let Some(texture) = bound.texture {
                let resource = textures
                    .get(texture.0)
                    .ok_or(MaterialError::UnknownTexture(texture))?;
                texture_handles.push((bound.unit, resource.handle()));
            }
        }

        device.use_program(bindings.program);
        for (global, location) in &bindings.globals {
            device.set_uniform(*location, globals.data(*global));
        }
        for uniform in &bindings.uniforms {
            device.set_uniform(uniform.location, uniform.value.to_uniform_data());
        }
        for (unit, handle) in texture_handles {
            device.bind_texture(unit, handle);
        }
        Ok(())
    }

    /// Point the material's attribute locations at `geometry`'s streams and
    /// bind its index buffer. Streams the mesh lacks are disabled.
    pub fn bind_geometry<D: RenderDevice + ?Sized>(
        &self,
        device: &mut D,
        id: MaterialId,
        geometry: &GeometryBuffer,
    ) -> Result<(), MaterialError> {
        let bindings = self.bindings(id)?;
        for attribute in &bindings.attributes {
            match geometry.attribute(attribute.source) {
                Some(buffer) => device.bind_attribute(attribute.location, buffer),
                None => device.disable_attribute(attribute.location),
            }
        }
        device.bind_index_buffer(geometry.indices);
        Ok(())
    }

    fn bindings(&self, id: MaterialId) -> Result<&Bindings, MaterialError> {
        let material = self
            .materials
            .get(id.0)
            .ok_or(MaterialError::UnknownMaterial(id))?;
        match &material.state {
            MaterialState::Ready(b) => Ok(b),
            MaterialState::Disabled(e) => Err(e.clone()),
        }
    }
}

fn check_shape(name: &str, expected: UniformType, found: UniformType) -> Result<(), MaterialError> {
    if expected == found {
        Ok(())
    } else {
        Err(MaterialError::TypeMismatch {
            name: name.to_string(),
            expected,
            found,
        })
    }
}

fn uniform_location<D: RenderDevice + ?Sized>(
    device: &D,
    kind: MaterialKind,
    program: ProgramHandle,
    name: &str,
    ty: UniformType,
) -> Result<UniformLocation, MaterialError> {
    let location =
        device
            .uniform_location(program, name)
            .ok_or_else(|| MaterialError::MissingUniform {
                kind,
                name: name.to_string(),
            })?;
    if let Some(declared) = device.uniform_type(program, location) {
        check_shape(name, declared, ty)?;
    }
    Ok(location)
}

fn resolve<D: RenderDevice + ?Sized>(
    device: &D,
    kind: MaterialKind,
    program: ProgramHandle,
    values: &MaterialValues,
) -> Result<Bindings, MaterialError> {
    let schema = kind.schema();

    for (name, value) in &values.uniforms {
        let slot = schema
            .uniform(name)
            .ok_or_else(|| MaterialError::UnknownUniform {
                kind,
                name: name.clone(),
            })?;
        check_shape(name, slot.default.uniform_type(), value.uniform_type())?;
    }
    for (name, _) in &values.textures {
        if !schema.textures.iter().any(|t| t.name == name) {
            return Err(MaterialError::UnknownUniform {
                kind,
                name: name.clone(),
            });
        }
    }

    let mut attributes = Vec::new();
    for slot in schema.attributes {
        match device.attribute_location(program, slot.name) {
            Some(location) => attributes.push(BoundAttribute {
                source: slot.source,
                location,
            }),
            None if slot.required => {
                return Err(MaterialError::MissingAttribute {
                    kind,
                    name: slot.name.to_string(),
                });
            }
            None => tracing::debug!(?kind, attribute = slot.name, "optional attribute absent"),
        }
    }

    let globals = schema
        .globals
        .iter()
        .map(|slot| {
            uniform_location(device, kind, program, slot.name, slot.global.uniform_type())
                .map(|location| (slot.global, location))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let uniforms = schema
        .uniforms
        .iter()
        .map(|slot| {
            // Last override wins.
            let value = values
                .uniforms
                .iter()
                .rev()
                .find(|(name, _)| name == slot.name)
                .map_or(slot.default, |(_, v)| *v);
            uniform_location(device, kind, program, slot.name, value.uniform_type()).map(
                |location| BoundUniform {
                    name: slot.name,
                    location,
                    value,
                },
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut textures = Vec::new();
    for slot in schema.textures {
        let texture = values
            .textures
            .iter()
            .rev()
            .find(|(name, _)| name == slot.name)
            .map(|(_, id)| *id);
        match device.sampler_unit(program, slot.name) {
            Some(unit) => textures.push(BoundTexture { unit, texture }),
            None if slot.required || texture.is_some() => {
                return Err(MaterialError::MissingTexture {
                    kind,
                    name: slot.name.to_string(),
                });
            }
            None => {}
        }
    }

    Ok(Bindings {
        program,
        attributes,
        globals,
        uniforms,
        textures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_device::{DebugDevice, DeviceCommand};
    use crate::device::{ClearState, ShaderStage};
    use meshview_assets::{PLACEHOLDER_TEXEL, cube};

    fn link(device: &mut DebugDevice, interface: &ProgramInterface) -> ProgramHandle {
        let vs = device
            .compile_shader(ShaderStage::Vertex, "fn vs_main() {}")
            .unwrap();
        let fs = device
            .compile_shader(ShaderStage::Fragment, "fn fs_main() {}")
            .unwrap();
        device.link_program(vs, fs, interface, "test").unwrap()
    }

    fn globals() -> GlobalUniforms {
        GlobalUniforms {
            projection: Mat4::IDENTITY,
            model_view: Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            normal: Mat4::IDENTITY,
            light_enabled: true,
            light_position: Vec3::new(0.0, 10.0, 0.0),
        }
    }

    fn uniforms_set(device: &DebugDevice, program: ProgramHandle) -> Vec<(String, UniformData)> {
        device
            .commands()
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::SetUniform { location, data } => Some((
                    device.uniform_name(program, *location).unwrap().to_string(),
                    *data,
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn phong_binds_globals_and_specifics_with_dispatch() {
        let mut device = DebugDevice::new();
        let program = link(&mut device, &MaterialKind::Phong.schema().interface());
        let mut registry = MaterialRegistry::new();
        let values = MaterialValues::new()
            .with("use_texture", UniformValue::Bool(true))
            .with("ka", UniformValue::Scalar(0.5));
        let id = registry
            .create(&device, MaterialKind::Phong, Some(program), &values)
            .unwrap();

        device.begin_frame(ClearState::default());
        registry.bind(&mut device, id, &globals(), &[]).unwrap();

        let set = uniforms_set(&device, program);
        assert_eq!(set.len(), 5 + 8);
        assert!(set.contains(&("use_texture".into(), UniformData::Int(1))));
        assert!(set.contains(&("ka".into(), UniformData::Float(0.5))));
        assert!(set.contains(&("light_enabled".into(), UniformData::Int(1))));
        assert!(set.contains(&(
            "diffuse_color".into(),
            UniformData::Vec3(Vec3::ONE)
        )));
        assert_eq!(device.rejected_uniforms(), 0);
        assert_eq!(device.commands()[1], DeviceCommand::UseProgram(program));
    }

    #[test]
    fn null_program_is_a_configuration_error() {
        let device = DebugDevice::new();
        let mut registry = MaterialRegistry::new();
        let err = registry
            .create(&device, MaterialKind::Phong, None, &MaterialValues::new())
            .unwrap_err();
        assert_eq!(err, MaterialError::NullProgram(MaterialKind::Phong));
        assert!(registry.is_empty());
    }

    #[test]
    fn disabled_material_is_registered_but_unusable() {
        let mut device = DebugDevice::new();
        let mut registry = MaterialRegistry::new();
        let id = registry.create_or_disable(
            &device,
            MaterialKind::VertexColor,
            None,
            &MaterialValues::new(),
        );
        let material = registry.get(id).unwrap();
        assert!(!material.is_usable());
        assert!(material.program().is_none());
        assert!(registry.bind(&mut device, id, &globals(), &[]).is_err());
    }

    #[test]
    fn unresolved_uniform_name_fails_creation() {
        let mut device = DebugDevice::new();
        let mut interface = MaterialKind::Phong.schema().interface();
        interface.uniforms.retain(|u| u.name != "shininess");
        let program = link(&mut device, &interface);
        let mut registry = MaterialRegistry::new();
        let err = registry
            .create(&device, MaterialKind::Phong, Some(program), &MaterialValues::new())
            .unwrap_err();
        assert!(matches!(err, MaterialError::MissingUniform { ref name, .. } if name == "shininess"));
    }

    #[test]
    fn missing_required_attribute_fails_but_optional_is_tolerated() {
        let mut device = DebugDevice::new();
        let mut registry = MaterialRegistry::new();

        let mut no_uv = MaterialKind::Phong.schema().interface();
        no_uv.attributes.retain(|a| a.name != "texcoord");
        let program = link(&mut device, &no_uv);
        assert!(registry
            .create(&device, MaterialKind::Phong, Some(program), &MaterialValues::new())
            .is_ok());

        let mut no_normal = MaterialKind::Phong.schema().interface();
        no_normal.attributes.retain(|a| a.name != "normal");
        let program = link(&mut device, &no_normal);
        let err = registry
            .create(&device, MaterialKind::Phong, Some(program), &MaterialValues::new())
            .unwrap_err();
        assert!(matches!(err, MaterialError::MissingAttribute { .. }));
    }

    #[test]
    fn value_shape_must_match_schema_and_program() {
        let mut device = DebugDevice::new();
        let program = link(&mut device, &MaterialKind::Phong.schema().interface());
        let mut registry = MaterialRegistry::new();
        let wrong = MaterialValues::new().with("ka", UniformValue::Vec3(Vec3::ONE));
        let err = registry
            .create(&device, MaterialKind::Phong, Some(program), &wrong)
            .unwrap_err();
        assert_eq!(
            err,
            MaterialError::TypeMismatch {
                name: "ka".into(),
                expected: UniformType::Float,
                found: UniformType::Vec3,
            }
        );

        let mut interface = MaterialKind::Phong.schema().interface();
        for u in &mut interface.uniforms {
            if u.name == "kd" {
                u.ty = UniformType::Vec4;
            }
        }
        let program = link(&mut device, &interface);
        let err = registry
            .create(&device, MaterialKind::Phong, Some(program), &MaterialValues::new())
            .unwrap_err();
        assert!(matches!(err, MaterialError::TypeMismatch { ref name, .. } if name == "kd"));
    }

    #[test]
    fn unknown_value_name_is_rejected() {
        let mut device = DebugDevice::new();
        let program = link(&mut device, &MaterialKind::VertexColor.schema().interface());
        let mut registry = MaterialRegistry::new();
        let values = MaterialValues::new().with("glow", UniformValue::Scalar(1.0));
        let err = registry
            .create(&device, MaterialKind::VertexColor, Some(program), &values)
            .unwrap_err();
        assert!(matches!(err, MaterialError::UnknownUniform { .. }));
    }

    #[test]
    fn set_value_updates_next_bind() {
        let mut device = DebugDevice::new();
        let program = link(&mut device, &MaterialKind::VertexColor.schema().interface());
        let mut registry = MaterialRegistry::new();
        let id = registry
            .create(&device, MaterialKind::VertexColor, Some(program), &MaterialValues::new())
            .unwrap();
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        registry.set_value(id, "tint", UniformValue::Vec4(red)).unwrap();
        assert!(registry
            .set_value(id, "tint", UniformValue::Scalar(1.0))
            .is_err());
        assert_eq!(registry.get(id).unwrap().value("tint"), Some(UniformValue::Vec4(red)));

        device.begin_frame(ClearState::default());
        registry.bind(&mut device, id, &globals(), &[]).unwrap();
        assert!(uniforms_set(&device, program).contains(&("tint".into(), UniformData::Vec4(red))));
        assert!(matches!(
            registry.set_value(MaterialId(7), "tint", UniformValue::Vec4(red)),
            Err(MaterialError::UnknownMaterial(_))
        ));
    }

    #[test]
    fn textures_bind_to_sampler_units() {
        let mut device = DebugDevice::new();
        let program = link(&mut device, &MaterialKind::Phong.schema().interface());
        let textures = vec![TextureResource::with_placeholder(
            &mut device,
            PLACEHOLDER_TEXEL,
            "beer",
        )];
        let mut registry = MaterialRegistry::new();
        let values = MaterialValues::new().with_texture("diffuse_map", TextureId(0));
        let id = registry
            .create(&device, MaterialKind::Phong, Some(program), &values)
            .unwrap();

        device.begin_frame(ClearState::default());
        registry.bind(&mut device, id, &globals(), &textures).unwrap();
        assert!(device.commands().contains(&DeviceCommand::BindTexture {
            unit: 0,
            texture: textures[0].handle(),
        }));
        assert_eq!(
            registry.bind(&mut device, id, &globals(), &[]),
            Err(MaterialError::UnknownTexture(TextureId(0)))
        );
    }

    #[test]
    fn geometry_streams_follow_attribute_locations() {
        let mut device = DebugDevice::new();
        let program = link(&mut device, &MaterialKind::VertexColor.schema().interface());
        let mut registry = MaterialRegistry::new();
        let id = registry
            .create(&device, MaterialKind::VertexColor, Some(program), &MaterialValues::new())
            .unwrap();
        let geometry = GeometryBuffer::upload(&mut device, &cube(None)).unwrap();

        device.begin_frame(ClearState::default());
        registry.bind_geometry(&mut device, id, &geometry).unwrap();
        let color = device.attribute_location(program, "color").unwrap();
        assert!(device.commands().contains(&DeviceCommand::DisableAttribute(color)));
        assert!(device.commands().contains(&DeviceCommand::BindIndexBuffer(geometry.indices)));
    }

    #[test]
    fn schema_interface_orders_locations() {
        let interface = MaterialKind::Phong.schema().interface();
        assert_eq!(interface.find_attribute("texcoord").unwrap().location, 2);
        assert_eq!(interface.find_sampler("diffuse_map").unwrap().unit, 0);
        assert_eq!(interface.uniforms.len(), 13);
    }
}
