//! Recording device for headless runs and tests.
//!
//! Produces no pixels. Every frame command is recorded so callers can
//! assert on, or print, exactly what a real device would have been asked
//! to do.

use crate::device::{
    AttributeLocation, BufferHandle, BufferKind, ClearState, DeviceError, ProgramHandle,
    RenderDevice, ShaderHandle, ShaderStage, TextureHandle, UniformData, UniformLocation,
};
use crate::program::{ProgramError, ProgramInterface, UniformType};
use meshview_assets::ImageData;
use meshview_common::DrawMode;
use std::fmt::Write;

/// One recorded frame command.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    BeginFrame(ClearState),
    UseProgram(ProgramHandle),
    SetUniform {
        location: UniformLocation,
        data: UniformData,
    },
    BindTexture {
        unit: u32,
        texture: TextureHandle,
    },
    BindAttribute {
        location: AttributeLocation,
        buffer: BufferHandle,
    },
    DisableAttribute(AttributeLocation),
    BindIndexBuffer(BufferHandle),
    DrawIndexed {
        mode: DrawMode,
        count: u32,
    },
    EndFrame,
}

#[derive(Debug, Clone)]
pub struct DebugBuffer {
    pub kind: BufferKind,
    pub len: usize,
    pub label: String,
}

#[derive(Debug)]
struct DebugProgram {
    label: String,
    interface: ProgramInterface,
}

/// [`RenderDevice`] that records instead of drawing.
///
/// Compilation fails for blank source. Linking fails unless the vertex
/// source mentions `vs_main` and the fragment source mentions `fs_main`.
#[derive(Debug)]
pub struct DebugDevice {
    viewport: (u32, u32),
    buffers: Vec<DebugBuffer>,
    textures: Vec<ImageData>,
    shaders: Vec<Option<(ShaderStage, String)>>,
    programs: Vec<DebugProgram>,
    commands: Vec<DeviceCommand>,
    active_program: Option<ProgramHandle>,
    index_bound: bool,
    draw_error: Option<DeviceError>,
    rejected_uniforms: usize,
    frames_submitted: u64,
}

impl Default for DebugDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugDevice {
    pub fn new() -> Self {
        Self::with_viewport(800, 600)
    }

    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            buffers: Vec::new(),
            textures: Vec::new(),
            shaders: Vec::new(),
            programs: Vec::new(),
            commands: Vec::new(),
            active_program: None,
            index_bound: false,
            draw_error: None,
            rejected_uniforms: 0,
            frames_submitted: 0,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Commands recorded since the last `begin_frame`.
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn draw_calls(&self) -> Vec<(DrawMode, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::DrawIndexed { mode, count } => Some((*mode, *count)),
                _ => None,
            })
            .collect()
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<&DebugBuffer> {
        self.buffers.get(handle.0 as usize)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_image(&self, handle: TextureHandle) -> Option<&ImageData> {
        self.textures.get(handle.0 as usize)
    }

    pub fn live_shader_count(&self) -> usize {
        self.shaders.iter().filter(|s| s.is_some()).count()
    }

    /// `set_uniform` calls dropped because the value shape did not match
    /// the declared type.
    pub fn rejected_uniforms(&self) -> usize {
        self.rejected_uniforms
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Name of the uniform at `location` in `program`.
    pub fn uniform_name(&self, program: ProgramHandle, location: UniformLocation) -> Option<&str> {
        self.program(program)?
            .interface
            .uniforms
            .get(location.0 as usize)
            .map(|u| u.name.as_str())
    }

    /// Human-readable log of the current frame.
    pub fn frame_log(&self) -> String {
        let mut out = String::new();
        let mut program = None;
        for command in &self.commands {
            let _ = match command {
                DeviceCommand::BeginFrame(clear) => writeln!(
                    out,
                    "begin_frame viewport={}x{} clear={:?}",
                    self.viewport.0, self.viewport.1, clear.color
                ),
                DeviceCommand::UseProgram(p) => {
                    program = Some(*p);
                    let label = self.program(*p).map(|d| d.label.as_str()).unwrap_or("?");
                    writeln!(out, "  use_program {label}")
                }
                DeviceCommand::SetUniform { location, data } => {
                    let name = program
                        .and_then(|p| self.uniform_name(p, *location))
                        .unwrap_or("?");
                    writeln!(out, "    uniform {name} = {}", describe(data))
                }
                DeviceCommand::BindTexture { unit, texture } => {
                    writeln!(out, "    texture unit {unit} <- #{}", texture.0)
                }
                DeviceCommand::BindAttribute { location, buffer } => {
                    let label = self.buffer(*buffer).map(|b| b.label.as_str()).unwrap_or("?");
                    writeln!(out, "    attribute {} <- {label}", location.0)
                }
                DeviceCommand::DisableAttribute(location) => {
                    writeln!(out, "    attribute {} disabled", location.0)
                }
                DeviceCommand::BindIndexBuffer(buffer) => {
                    let label = self.buffer(*buffer).map(|b| b.label.as_str()).unwrap_or("?");
                    writeln!(out, "    indices <- {label}")
                }
                DeviceCommand::DrawIndexed { mode, count } => {
                    writeln!(out, "    draw {mode:?} count={count}")
                }
                DeviceCommand::EndFrame => writeln!(out, "end_frame"),
            };
        }
        out
    }

    fn program(&self, handle: ProgramHandle) -> Option<&DebugProgram> {
        self.programs.get(handle.0 as usize)
    }

    fn shader_source(&self, handle: ShaderHandle) -> Option<&(ShaderStage, String)> {
        self.shaders.get(handle.0 as usize).and_then(Option::as_ref)
    }
}

fn describe(data: &UniformData) -> String {
    match data {
        UniformData::Float(v) => format!("{v:.3}"),
        UniformData::Int(v) => v.to_string(),
        UniformData::Vec2(v) => format!("({:.3}, {:.3})", v.x, v.y),
        UniformData::Vec3(v) => format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
        UniformData::Vec4(v) => format!("({:.3}, {:.3}, {:.3}, {:.3})", v.x, v.y, v.z, v.w),
        UniformData::Mat4(m) => {
            let t = m.w_axis;
            format!("mat4 [translation ({:.3}, {:.3}, {:.3})]", t.x, t.y, t.z)
        }
    }
}

impl RenderDevice for DebugDevice {
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8], label: &str) -> BufferHandle {
        self.buffers.push(DebugBuffer {
            kind,
            len: contents.len(),
            label: label.to_string(),
        });
        BufferHandle(self.buffers.len() as u32 - 1)
    }

    fn create_texture(&mut self, image: &ImageData, _label: &str) -> TextureHandle {
        self.textures.push(image.clone());
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn update_texture(
        &mut self,
        texture: TextureHandle,
        image: &ImageData,
    ) -> Result<(), DeviceError> {
        let slot = self
            .textures
            .get_mut(texture.0 as usize)
            .ok_or(DeviceError::UnknownTexture(texture))?;
        *slot = image.clone();
        Ok(())
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, ProgramError> {
        if source.trim().is_empty() {
            return Err(ProgramError::Compile {
                stage,
                log: "empty shader source".into(),
            });
        }
        self.shaders.push(Some((stage, source.to_string())));
        Ok(ShaderHandle(self.shaders.len() as u32 - 1))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
        interface: &ProgramInterface,
        label: &str,
    ) -> Result<ProgramHandle, ProgramError> {
        let vs = self.shader_source(vertex).ok_or_else(|| ProgramError::Link {
            log: format!("vertex shader {vertex:?} is not live"),
        })?;
        let fs = self.shader_source(fragment).ok_or_else(|| ProgramError::Link {
            log: format!("fragment shader {fragment:?} is not live"),
        })?;
        if vs.0 != ShaderStage::Vertex || fs.0 != ShaderStage::Fragment {
            return Err(ProgramError::Link {
                log: "shader stages do not match their slots".into(),
            });
        }
        if !vs.1.contains("vs_main") {
            return Err(ProgramError::Link {
                log: "vertex entry point `vs_main` not found".into(),
            });
        }
        if !fs.1.contains("fs_main") {
            return Err(ProgramError::Link {
                log: "fragment entry point `fs_main` not found".into(),
            });
        }
        self.programs.push(DebugProgram {
            label: label.to_string(),
            interface: interface.clone(),
        });
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn release_shader(&mut self, shader: ShaderHandle) {
        if let Some(slot) = self.shaders.get_mut(shader.0 as usize) {
            *slot = None;
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let index = self.program(program)?.interface.uniform_index(name)?;
        Some(UniformLocation(index as u32))
    }

    fn uniform_type(
        &self,
        program: ProgramHandle,
        location: UniformLocation,
    ) -> Option<UniformType> {
        self.program(program)?
            .interface
            .uniforms
            .get(location.0 as usize)
            .map(|u| u.ty)
    }

    fn attribute_location(
        &self,
        program: ProgramHandle,
        name: &str,
    ) -> Option<AttributeLocation> {
        let decl = self.program(program)?.interface.find_attribute(name)?;
        Some(AttributeLocation(decl.location))
    }

    fn sampler_unit(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        Some(self.program(program)?.interface.find_sampler(name)?.unit)
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn begin_frame(&mut self, clear: ClearState) {
        self.commands.clear();
        self.active_program = None;
        self.index_bound = false;
        self.draw_error = None;
        self.commands.push(DeviceCommand::BeginFrame(clear));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.active_program = Some(program);
        self.commands.push(DeviceCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, data: UniformData) {
        let declared = self
            .active_program
            .and_then(|p| self.uniform_type(p, location));
        if declared != Some(data.uniform_type()) {
            self.rejected_uniforms += 1;
            return;
        }
        self.commands.push(DeviceCommand::SetUniform { location, data });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.commands.push(DeviceCommand::BindTexture { unit, texture });
    }

    fn bind_attribute(&mut self, location: AttributeLocation, buffer: BufferHandle) {
        self.commands
            .push(DeviceCommand::BindAttribute { location, buffer });
    }

    fn disable_attribute(&mut self, location: AttributeLocation) {
        self.commands.push(DeviceCommand::DisableAttribute(location));
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.index_bound = true;
        self.commands.push(DeviceCommand::BindIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, mode: DrawMode, count: u32) {
        if self.active_program.is_none() {
            self.draw_error.get_or_insert(DeviceError::NoActiveProgram);
        } else if !self.index_bound {
            self.draw_error.get_or_insert(DeviceError::MissingIndexBuffer);
        }
        self.commands.push(DeviceCommand::DrawIndexed { mode, count });
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        self.commands.push(DeviceCommand::EndFrame);
        self.frames_submitted += 1;
        match self.draw_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn linked(device: &mut DebugDevice) -> ProgramHandle {
        let vs = device
            .compile_shader(ShaderStage::Vertex, "fn vs_main() {}")
            .unwrap();
        let fs = device
            .compile_shader(ShaderStage::Fragment, "fn fs_main() {}")
            .unwrap();
        let interface = ProgramInterface::new().uniform("light_position", UniformType::Vec3);
        device.link_program(vs, fs, &interface, "lit").unwrap()
    }

    #[test]
    fn blank_source_fails_to_compile() {
        let mut device = DebugDevice::new();
        assert!(device.compile_shader(ShaderStage::Vertex, "\n\t").is_err());
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let mut device = DebugDevice::new();
        let vs = device
            .compile_shader(ShaderStage::Vertex, "fn vs_main() {}")
            .unwrap();
        let fs = device
            .compile_shader(ShaderStage::Fragment, "fn fs_main() {}")
            .unwrap();
        let result = device.link_program(fs, vs, &ProgramInterface::new(), "bad");
        assert!(matches!(result, Err(ProgramError::Link { .. })));
    }

    #[test]
    fn mismatched_uniform_shape_is_rejected() {
        let mut device = DebugDevice::new();
        let program = linked(&mut device);
        let location = device.uniform_location(program, "light_position").unwrap();
        device.begin_frame(ClearState::default());
        device.use_program(program);
        device.set_uniform(location, UniformData::Float(1.0));
        device.set_uniform(location, UniformData::Vec3(Vec3::Y));
        assert_eq!(device.rejected_uniforms(), 1);
        assert!(device.frame_log().contains("uniform light_position = (0.000, 1.000, 0.000)"));
    }

    #[test]
    fn draw_without_index_buffer_fails_frame() {
        let mut device = DebugDevice::new();
        let program = linked(&mut device);
        device.begin_frame(ClearState::default());
        device.use_program(program);
        device.draw_indexed(DrawMode::Filled, 3);
        assert!(matches!(
            device.end_frame(),
            Err(DeviceError::MissingIndexBuffer)
        ));
        assert_eq!(device.frames_submitted(), 1);
    }

    #[test]
    fn texture_update_replaces_contents() {
        let mut device = DebugDevice::new();
        let handle = device.create_texture(&ImageData::solid([255, 0, 0, 255]), "t");
        device
            .update_texture(handle, &ImageData::solid([0, 0, 255, 255]))
            .unwrap();
        assert_eq!(device.texture_image(handle).unwrap().rgba, vec![0, 0, 255, 255]);
        assert!(device
            .update_texture(TextureHandle(9), &ImageData::solid([0; 4]))
            .is_err());
    }
}
