//! wgpu backend for the meshview renderer.
//!
//! [`WgpuDevice`] implements `RenderDevice`: programs become one pipeline per
//! draw mode, named uniforms live in a generated WGSL uniform block, and a
//! frame is replayed into a single render pass.
//!
//! # Invariants
//! - The WGSL uniform struct and the CPU block layout come from the same
//!   program interface.
//! - Only texture unit 0 is supported; unbound samplers read a white texel.
//! - Depth test is "less or equal"; back faces are not culled.

mod gpu;
mod layout;
mod shaders;

pub use gpu::WgpuDevice;
pub use layout::{UniformLayout, align_and_size, uniform_block_wgsl, wgsl_type};
pub use shaders::{phong_program, prelude, program_for, vertex_color_program};
