//! Scene composition and frame rendering over an abstract graphics device.
//!
//! # Invariants
//! - Geometry buffers are uploaded once and never modified.
//! - Every uniform a material kind names has a resolved location in the
//!   material's program, or the material is disabled.
//! - Scene nodes reference geometry and materials by pool index; nothing is
//!   freed before the session ends.
//! - Asset completions are applied at frame start, never mid-frame.
//! - A failing program, material, mesh or image is skipped; the rest of
//!   the scene keeps rendering.
//!
//! # Devices
//! [`RenderDevice`] is the only graphics seam. [`DebugDevice`] records
//! commands for headless runs and tests; the wgpu implementation lives in
//! `meshview-render-wgpu`.

mod config;
mod debug_device;
mod device;
mod error;
mod frame;
mod geometry;
mod material;
mod program;
mod scene;
mod session;
mod showcase;
mod texture;

pub use config::{ConfigError, ViewerConfig};
pub use debug_device::{DebugBuffer, DebugDevice, DeviceCommand};
pub use device::{
    AttributeLocation, BufferHandle, BufferKind, ClearState, DeviceError, ProgramHandle,
    RenderDevice, ShaderHandle, ShaderStage, TextureHandle, UniformData, UniformLocation,
};
pub use error::RenderError;
pub use frame::{FrameInputs, FrameRenderer, FrameStats};
pub use geometry::{GeometryBuffer, GeometryId, VertexAttribute};
pub use material::{
    AttributeSlot, GlobalSlot, GlobalUniform, GlobalUniforms, Material, MaterialError, MaterialId, MaterialKind,
    MaterialRegistry, MaterialSchema, MaterialValues, TextureSlot, UniformSlot, UniformValue,
};
pub use program::{
    AttributeDecl, ProgramError, ProgramInterface, ProgramSource, SamplerDecl, UniformDecl,
    UniformType, build_program,
};
pub use scene::{Scene, SceneNode};
pub use session::{AssetReport, RenderSession};
pub use showcase::{Showcase, ShowcaseAssets, assemble_showcase};
pub use texture::{TextureId, TextureResource};

pub fn crate_info() -> &'static str {
    "meshview-render v0.1.0"
}
