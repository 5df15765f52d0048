//! The graphics-device seam.
//!
//! [`RenderDevice`] is a small immediate-style command surface: resources
//! are created once and addressed by handle, programs expose named
//! uniform/attribute locations, and each frame is a sequence of state
//! changes and indexed draws between `begin_frame` and `end_frame`.

use crate::program::{ProgramError, ProgramInterface, UniformType};
use glam::{Mat4, Vec2, Vec3, Vec4};
use meshview_assets::ImageData;
use meshview_common::DrawMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Location of a uniform within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Vertex input slot within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Tightly packed `f32` vertex attribute data.
    Vertex,
    /// `u32` indices.
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// A value for `set_uniform`. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformData {
    pub fn uniform_type(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Int(_) => UniformType::Int,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// Values written to the colour and depth attachments at frame start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    pub color: [f32; 4],
    pub depth: f32,
}

impl Default for ClearState {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no render target attached")]
    NoTarget,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramHandle),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureHandle),
    #[error("draw issued without an active program")]
    NoActiveProgram,
    #[error("draw issued without an index buffer")]
    MissingIndexBuffer,
}

/// Graphics device used by the frame renderer.
///
/// Depth testing is always on with "less or equal" comparison.
/// `use_program` resets every texture unit to the device's default texture;
/// attribute bindings persist until rebound or disabled.
pub trait RenderDevice {
    /// Upload an immutable buffer.
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8], label: &str) -> BufferHandle;

    fn create_texture(&mut self, image: &ImageData, label: &str) -> TextureHandle;

    /// Replace a texture's contents, resizing it if needed.
    fn update_texture(&mut self, texture: TextureHandle, image: &ImageData)
    -> Result<(), DeviceError>;

    fn compile_shader(&mut self, stage: ShaderStage, source: &str)
    -> Result<ShaderHandle, ProgramError>;

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
        interface: &ProgramInterface,
        label: &str,
    ) -> Result<ProgramHandle, ProgramError>;

    fn release_shader(&mut self, shader: ShaderHandle);

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Declared type of the uniform at `location`.
    fn uniform_type(&self, program: ProgramHandle, location: UniformLocation)
    -> Option<UniformType>;

    fn attribute_location(&self, program: ProgramHandle, name: &str)
    -> Option<AttributeLocation>;

    /// Texture unit a named sampler reads from.
    fn sampler_unit(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Current drawable size in pixels.
    fn viewport_size(&self) -> (u32, u32);

    fn begin_frame(&mut self, clear: ClearState);

    fn use_program(&mut self, program: ProgramHandle);

    /// Set a uniform of the active program.
    fn set_uniform(&mut self, location: UniformLocation, data: UniformData);

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    fn bind_attribute(&mut self, location: AttributeLocation, buffer: BufferHandle);

    fn disable_attribute(&mut self, location: AttributeLocation);

    fn bind_index_buffer(&mut self, buffer: BufferHandle);

    fn draw_indexed(&mut self, mode: DrawMode, index_count: u32);

    /// Submit everything recorded since `begin_frame`.
    fn end_frame(&mut self) -> Result<(), DeviceError>;
}
