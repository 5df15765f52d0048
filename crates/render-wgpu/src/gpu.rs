use crate::layout::UniformLayout;
use meshview_assets::ImageData;
use meshview_common::DrawMode;
use meshview_render::{
    AttributeLocation, BufferHandle, BufferKind, ClearState, DeviceError, ProgramError,
    ProgramHandle, ProgramInterface, RenderDevice, ShaderHandle, ShaderStage, TextureHandle,
    UniformData, UniformLocation, UniformType,
};
use std::collections::HashMap;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

/// Bytes reserved per draw in the uniform buffer. Larger blocks fail to link.
const UNIFORM_BINDING_SIZE: u64 = 1024;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct CompiledShader {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
}

struct GpuProgram {
    label: String,
    interface: ProgramInterface,
    layout: UniformLayout,
    /// Indexed by [`topology_index`].
    pipelines: [wgpu::RenderPipeline; 3],
    /// Current uniform values, kept across frames like GL program state.
    values: Vec<u8>,
}

struct DrawCall {
    program: usize,
    mode: DrawMode,
    /// One entry per program attribute, in declaration order.
    vertex_buffers: Vec<Option<usize>>,
    index_buffer: usize,
    index_count: u32,
    texture: Option<usize>,
    uniform_offset: u32,
}

#[derive(Default)]
struct FrameRecording {
    clear: ClearState,
    program: Option<usize>,
    attributes: HashMap<u32, usize>,
    index_buffer: Option<usize>,
    texture: Option<usize>,
    staging: Vec<u8>,
    draws: Vec<DrawCall>,
    error: Option<DeviceError>,
}

fn topology_index(mode: DrawMode) -> usize {
    match mode {
        DrawMode::Filled => 0,
        DrawMode::Wireframe => 1,
        DrawMode::Points => 2,
    }
}

fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// [`RenderDevice`] over wgpu.
///
/// Frame commands are recorded and replayed into a single render pass at
/// `end_frame`, against the view given to [`attach_target`](Self::attach_target).
/// Uniform values for every draw are packed into one buffer and selected
/// with a dynamic offset.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    size: (u32, u32),
    depth_view: wgpu::TextureView,
    target: Option<wgpu::TextureView>,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_stride: u64,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    default_texture: GpuTexture,
    zero_buffer: wgpu::Buffer,

    buffers: Vec<wgpu::Buffer>,
    largest_vertex_buffer: u64,
    textures: Vec<GpuTexture>,
    shaders: Vec<Option<CompiledShader>>,
    programs: Vec<GpuProgram>,
    frame: FrameRecording,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_stride = UNIFORM_BINDING_SIZE.div_ceil(alignment) * alignment;
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniform_buffer(&device, &uniform_layout, uniform_stride);

        let default_texture = Self::upload_texture(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            &ImageData::solid([255, 255, 255, 255]),
            "default_texture",
        );
        let zero_buffer = Self::create_zero_buffer(&device, 256);
        let depth_view = Self::create_depth_texture(&device, width, height);

        Self {
            device,
            queue,
            color_format,
            size: (width.max(1), height.max(1)),
            depth_view,
            target: None,
            uniform_layout,
            texture_layout,
            sampler,
            uniform_stride,
            uniform_buffer,
            uniform_bind_group,
            default_texture,
            zero_buffer,
            buffers: Vec::new(),
            largest_vertex_buffer: 0,
            textures: Vec::new(),
            shaders: Vec::new(),
            programs: Vec::new(),
            frame: FrameRecording::default(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Colour attachment for the next `end_frame`.
    pub fn attach_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    fn create_uniform_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        size: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_BINDING_SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_zero_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("zero_vertex_buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        })
    }

    fn upload_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        image: &ImageData,
        label: &str,
    ) -> GpuTexture {
        let size = wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        Self::write_texture(queue, &texture, image);
        let view = texture.create_view(&Default::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        GpuTexture {
            texture,
            bind_group,
        }
    }

    fn write_texture(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &ImageData) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.bytes_per_row()),
                rows_per_image: Some(image.height),
            },
            texture.size(),
        );
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn validate_interface(&self, interface: &ProgramInterface) -> Result<UniformLayout, ProgramError> {
        let layout = UniformLayout::new(interface);
        if u64::from(layout.size()) > UNIFORM_BINDING_SIZE {
            return Err(ProgramError::Link {
                log: format!(
                    "uniform block is {} bytes; at most {UNIFORM_BINDING_SIZE} are supported",
                    layout.size()
                ),
            });
        }
        match interface.samplers.as_slice() {
            [] => {}
            [sampler] if sampler.unit == 0 => {}
            _ => {
                return Err(ProgramError::Link {
                    log: "only a single sampler on texture unit 0 is supported".into(),
                });
            }
        }
        if let Some(bad) = interface
            .attributes
            .iter()
            .find(|a| vertex_format(a.components).is_none())
        {
            return Err(ProgramError::Link {
                log: format!("attribute `{}` has {} components", bad.name, bad.components),
            });
        }
        Ok(layout)
    }

    fn create_pipelines(
        &self,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        interface: &ProgramInterface,
        label: &str,
    ) -> [wgpu::RenderPipeline; 3] {
        let mut bind_group_layouts = vec![&self.uniform_layout];
        if !interface.samplers.is_empty() {
            bind_group_layouts.push(&self.texture_layout);
        }
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = interface
            .attributes
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: vertex_format(a.components).unwrap_or(wgpu::VertexFormat::Float32x4),
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = interface
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(a, attribute)| wgpu::VertexBufferLayout {
                array_stride: u64::from(a.components) * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let topologies = [
            wgpu::PrimitiveTopology::TriangleList,
            wgpu::PrimitiveTopology::LineList,
            wgpu::PrimitiveTopology::PointList,
        ];
        topologies.map(|topology| {
            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: vertex,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &buffers,
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: fragment,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: self.color_format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::LessEqual,
                        stencil: Default::default(),
                        bias: Default::default(),
                    }),
                    multisample: Default::default(),
                    multiview: None,
                    cache: None,
                })
        })
    }

    fn ensure_frame_capacity(&mut self) {
        let needed = self.frame.staging.len() as u64;
        if needed > self.uniform_buffer.size() {
            let size = needed.next_power_of_two().max(self.uniform_stride);
            let (buffer, bind_group) =
                Self::create_uniform_buffer(&self.device, &self.uniform_layout, size);
            self.uniform_buffer = buffer;
            self.uniform_bind_group = bind_group;
            tracing::debug!(size, "uniform buffer grown");
        }
        // Covers the widest attribute (4 floats) for the most vertices any
        // buffer can hold (at 2 floats per vertex).
        let zero_needed = (self.largest_vertex_buffer * 2).max(256);
        if zero_needed > self.zero_buffer.size() {
            self.zero_buffer = Self::create_zero_buffer(&self.device, zero_needed);
        }
    }

    fn record_error(&mut self, error: DeviceError) {
        tracing::warn!("draw dropped: {error}");
        self.frame.error.get_or_insert(error);
    }
}

impl RenderDevice for WgpuDevice {
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8], label: &str) -> BufferHandle {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        if kind == BufferKind::Vertex {
            self.largest_vertex_buffer = self.largest_vertex_buffer.max(buffer.size());
        }
        self.buffers.push(buffer);
        BufferHandle(self.buffers.len() as u32 - 1)
    }

    fn create_texture(&mut self, image: &ImageData, label: &str) -> TextureHandle {
        let texture = Self::upload_texture(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            image,
            label,
        );
        self.textures.push(texture);
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
        let current = slot.texture.size();
        if current.width == image.width && current.height == image.height {
            Self::write_texture(&self.queue, &slot.texture, image);
        } else {
            *slot = Self::upload_texture(
                &self.device,
                &self.queue,
                &self.texture_layout,
                &self.sampler,
                image,
                "texture",
            );
        }
        Ok(())
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, ProgramError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{stage}_shader")),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let info = pollster::block_on(module.get_compilation_info());
        let scope = pollster::block_on(self.device.pop_error_scope());

        let mut log: Vec<String> = info
            .messages
            .iter()
            .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
            .map(|m| match &m.location {
                Some(at) => format!("{}:{}: {}", at.line_number, at.line_position, m.message),
                None => m.message.clone(),
            })
            .collect();
        if let Some(error) = scope {
            log.push(error.to_string());
        }
        if !log.is_empty() {
            return Err(ProgramError::Compile {
                stage,
                log: log.join("\n"),
            });
        }

        self.shaders.push(Some(CompiledShader { stage, module }));
        Ok(ShaderHandle(self.shaders.len() as u32 - 1))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
        interface: &ProgramInterface,
        label: &str,
    ) -> Result<ProgramHandle, ProgramError> {
        let layout = self.validate_interface(interface)?;
        let module = |handle: ShaderHandle, stage: ShaderStage| {
            self.shaders
                .get(handle.0 as usize)
                .and_then(Option::as_ref)
                .filter(|s| s.stage == stage)
                .map(|s| &s.module)
                .ok_or_else(|| ProgramError::Link {
                    log: format!("{handle:?} is not a live {stage} shader"),
                })
        };
        let vertex_module = module(vertex, ShaderStage::Vertex)?;
        let fragment_module = module(fragment, ShaderStage::Fragment)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipelines = self.create_pipelines(vertex_module, fragment_module, interface, label);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ProgramError::Link {
                log: error.to_string(),
            });
        }

        let values = vec![0u8; layout.size() as usize];
        self.programs.push(GpuProgram {
            label: label.to_string(),
            interface: interface.clone(),
            layout,
            pipelines,
            values,
        });
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn release_shader(&mut self, shader: ShaderHandle) {
        if let Some(slot) = self.shaders.get_mut(shader.0 as usize) {
            *slot = None;
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(program.0 as usize)?;
        let index = program.interface.uniform_index(name)?;
        Some(UniformLocation(index as u32))
    }

    fn uniform_type(
        &self,
        program: ProgramHandle,
        location: UniformLocation,
    ) -> Option<UniformType> {
        let program = self.programs.get(program.0 as usize)?;
        program
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
        let program = self.programs.get(program.0 as usize)?;
        let decl = program.interface.find_attribute(name)?;
        Some(AttributeLocation(decl.location))
    }

    fn sampler_unit(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let program = self.programs.get(program.0 as usize)?;
        Some(program.interface.find_sampler(name)?.unit)
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.size
    }

    fn begin_frame(&mut self, clear: ClearState) {
        self.frame = FrameRecording {
            clear,
            ..Default::default()
        };
    }

    fn use_program(&mut self, program: ProgramHandle) {
        let index = program.0 as usize;
        if index >= self.programs.len() {
            self.record_error(DeviceError::UnknownProgram(program));
            self.frame.program = None;
            return;
        }
        self.frame.program = Some(index);
        self.frame.texture = None;
    }

    fn set_uniform(&mut self, location: UniformLocation, data: UniformData) {
        let Some(program) = self.frame.program.and_then(|p| self.programs.get_mut(p)) else {
            return;
        };
        if !program.layout.write(&mut program.values, location.0, &data) {
            tracing::warn!(
                program = %program.label,
                location = location.0,
                ?data,
                "uniform write rejected"
            );
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if unit != 0 || texture.0 as usize >= self.textures.len() {
            tracing::warn!(unit, ?texture, "texture binding ignored");
            return;
        }
        self.frame.texture = Some(texture.0 as usize);
    }

    fn bind_attribute(&mut self, location: AttributeLocation, buffer: BufferHandle) {
        self.frame.attributes.insert(location.0, buffer.0 as usize);
    }

    fn disable_attribute(&mut self, location: AttributeLocation) {
        self.frame.attributes.remove(&location.0);
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.frame.index_buffer = Some(buffer.0 as usize);
    }

    fn draw_indexed(&mut self, mode: DrawMode, index_count: u32) {
        let Some(program_index) = self.frame.program else {
            self.record_error(DeviceError::NoActiveProgram);
            return;
        };
        let Some(index_buffer) = self.frame.index_buffer else {
            self.record_error(DeviceError::MissingIndexBuffer);
            return;
        };
        let program = &self.programs[program_index];

        let uniform_offset = self.frame.staging.len() as u32;
        self.frame.staging.extend_from_slice(&program.values);
        self.frame
            .staging
            .resize((uniform_offset as u64 + self.uniform_stride) as usize, 0);

        let vertex_buffers = program
            .interface
            .attributes
            .iter()
            .map(|a| self.frame.attributes.get(&a.location).copied())
            .collect();
        let texture = if program.interface.samplers.is_empty() {
            None
        } else {
            self.frame.texture
        };
        self.frame.draws.push(DrawCall {
            program: program_index,
            mode,
            vertex_buffers,
            index_buffer,
            index_count,
            texture,
            uniform_offset,
        });
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        let target = self.target.take().ok_or(DeviceError::NoTarget)?;
        self.ensure_frame_capacity();
        if !self.frame.staging.is_empty() {
            self.queue
                .write_buffer(&self.uniform_buffer, 0, &self.frame.staging);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let [r, g, b, a] = self.frame.clear.color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.frame.clear.depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &self.frame.draws {
                let Some(index_buffer) = self.buffers.get(draw.index_buffer) else {
                    tracing::warn!(buffer = draw.index_buffer, "unknown index buffer; draw skipped");
                    continue;
                };
                let program = &self.programs[draw.program];
                pass.set_pipeline(&program.pipelines[topology_index(draw.mode)]);
                pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                if !program.interface.samplers.is_empty() {
                    let texture = draw
                        .texture
                        .and_then(|t| self.textures.get(t))
                        .unwrap_or(&self.default_texture);
                    pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    let buffer = buffer
                        .and_then(|b| self.buffers.get(b))
                        .unwrap_or(&self.zero_buffer);
                    pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        match self.frame.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
