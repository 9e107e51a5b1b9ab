//! Headless wgpu implementation of [`GraphicsBackend`].

use super::backend::{
    clamp_counts, BlendMode, BufferId, DrawCall, GraphicsBackend, ProgramDescriptor, ProgramId,
    UniformValue,
};
use super::context::{GpuContext, GpuError};
use super::pipelines::{
    create_pipeline_layout, create_uniform_layout, vertex_attributes, vertex_buffer_layouts,
    BlendPipelines, PipelineSource,
};
use super::reflect::{compile, ShaderReflection};
use super::uniforms::UniformBlock;
use std::collections::HashMap;
use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, RenderPipeline, Texture, TextureView};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuProgram {
    label: String,
    reflection: ShaderReflection,
    uniforms: UniformBlock,
    pipelines: BlendPipelines,
    uniform_buffer: Option<Buffer>,
    bind_group: Option<BindGroup>,
}

struct GpuBuffer {
    buffer: Buffer,
    floats: usize,
}

/// Renders into an offscreen RGBA8 texture.
///
/// Every draw is recorded into its own render pass that loads the previous
/// contents, so draws composite in submission order under the blend mode
/// that was current when they were issued.
pub struct WgpuBackend {
    ctx: GpuContext,
    uniform_layout: BindGroupLayout,
    target: Texture,
    target_view: TextureView,
    width: u32,
    height: u32,
    blend: BlendMode,
    programs: HashMap<ProgramId, GpuProgram>,
    names: HashMap<String, ProgramId>,
    buffers: HashMap<BufferId, GpuBuffer>,
    next_id: u32,
}

impl WgpuBackend {
    /// Acquire a GPU and allocate a `width` x `height` target.
    pub async fn new(width: u32, height: u32) -> Result<Self, GpuError> {
        let ctx = GpuContext::new().await?;
        Ok(Self::with_context(ctx, width, height))
    }

    pub fn with_context(ctx: GpuContext, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let uniform_layout = create_uniform_layout(&ctx.device);
        let (target, target_view) = create_target(&ctx, width, height);

        Self {
            ctx,
            uniform_layout,
            target,
            target_view,
            width,
            height,
            blend: BlendMode::Standard,
            programs: HashMap::new(),
            names: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn next_handle(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn submit_pass(&self, label: &str, load: wgpu::LoadOp<wgpu::Color>, call: Option<PassDraw<'_>>) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(label),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(draw) = call {
                render_pass.set_pipeline(draw.pipeline);
                if let Some(bind_group) = draw.bind_group {
                    render_pass.set_bind_group(0, bind_group, &[]);
                }
                for (slot, buffer) in draw.buffers.iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                render_pass.draw(0..draw.vertices, 0..draw.instances);
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy the render target back to the CPU as tightly packed RGBA8 rows.
    ///
    /// Blocks until the GPU has finished all submitted work.
    pub fn read_pixels(&self) -> Result<Vec<u8>, GpuError> {
        let bytes_per_pixel = 4u32;
        let unpadded_row_bytes = self.width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row_bytes = unpadded_row_bytes.div_ceil(align) * align;
        let buffer_size = (padded_row_bytes * self.height) as u64;

        let readback_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = readback_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.ctx
            .device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();

        // Strip row padding
        let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in 0..self.height {
            let start = (row * padded_row_bytes) as usize;
            let end = start + unpadded_row_bytes as usize;
            pixels.extend_from_slice(&data[start..end]);
        }

        Ok(pixels)
    }
}

struct PassDraw<'a> {
    pipeline: &'a RenderPipeline,
    bind_group: Option<&'a BindGroup>,
    buffers: Vec<&'a Buffer>,
    vertices: u32,
    instances: u32,
}

fn create_target(ctx: &GpuContext, width: u32, height: u32) -> (Texture, TextureView) {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("render_target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl GraphicsBackend for WgpuBackend {
    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<ProgramId, GpuError> {
        let reflection = compile(desc)?;

        let shader = self
            .ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });

        let mut uniforms = UniformBlock::new(&reflection);
        let (layout, uniform_buffer, bind_group) = if reflection.has_uniform_block() {
            let layout =
                create_pipeline_layout(&self.ctx.device, desc.label, Some(&self.uniform_layout));
            // Initial contents are uploaded here
            let _ = uniforms.take_dirty();
            let buffer = self
                .ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(desc.label),
                    contents: uniforms.bytes(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(desc.label),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (layout, Some(buffer), Some(bind_group))
        } else {
            (create_pipeline_layout(&self.ctx.device, desc.label, None), None, None)
        };

        let attributes = vertex_attributes(&reflection.vertex_layout);
        let buffers = vertex_buffer_layouts(&reflection.vertex_layout, &attributes);

        let pipelines = BlendPipelines::new(
            &self.ctx.device,
            &PipelineSource {
                label: desc.label,
                layout: &layout,
                module: &shader,
                vertex_entry: desc.vertex_entry,
                fragment_entry: desc.fragment_entry,
                vertex_buffers: &buffers,
                topology: desc.topology,
                format: TARGET_FORMAT,
            },
        );

        let id = ProgramId(self.next_handle());
        if let Some(previous) = self.names.insert(desc.label.to_string(), id) {
            log::debug!("Program '{}' re-registered, {} shadowed", desc.label, previous);
        }
        self.programs.insert(
            id,
            GpuProgram {
                label: desc.label.to_string(),
                reflection,
                uniforms,
                pipelines,
                uniform_buffer,
                bind_group,
            },
        );
        log::debug!("Created {} '{}'", id, desc.label);
        Ok(id)
    }

    fn program_by_name(&self, label: &str) -> Option<ProgramId> {
        self.names.get(label).copied()
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(entry) = self.programs.remove(&program) {
            if self.names.get(&entry.label) == Some(&program) {
                self.names.remove(&entry.label);
            }
            log::debug!("Deleted {} '{}'", program, entry.label);
        }
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs.get(&program)?.reflection.attribute_location(name)
    }

    fn create_buffer(&mut self, data: &[f32], label: &str) -> BufferId {
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let id = BufferId(self.next_handle());
        self.buffers.insert(
            id,
            GpuBuffer {
                buffer,
                floats: data.len(),
            },
        );
        log::debug!("Created {} '{}' ({} floats)", id, label, data.len());
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            log::debug!("Deleted {}", buffer);
        }
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        if let Some(entry) = self.programs.get_mut(&program) {
            entry.uniforms.write(&entry.reflection, name, value);
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let Some(program) = self.programs.get_mut(&call.program) else {
            log::warn!("Draw with unknown {}", call.program);
            return;
        };

        if let (Some(bytes), Some(buffer)) = (program.uniforms.take_dirty(), &program.uniform_buffer) {
            self.ctx.queue.write_buffer(buffer, 0, bytes);
        }
        let program = &self.programs[&call.program];

        let buffers = &self.buffers;
        let draw = match clamp_counts(&program.reflection.vertex_layout, call, |id| {
            buffers.get(&id).map(|gpu| (gpu.floats, &gpu.buffer))
        }) {
            Ok(draw) => draw,
            Err(location) => {
                log::warn!(
                    "Draw of '{}' skipped: nothing bound at location {}",
                    program.label,
                    location
                );
                return;
            }
        };
        if draw.is_empty() {
            return;
        }

        let pipeline = program.pipelines.get(self.blend);
        self.submit_pass(
            "draw_pass",
            wgpu::LoadOp::Load,
            Some(PassDraw {
                pipeline,
                bind_group: program.bind_group.as_ref(),
                buffers: draw.bound,
                vertices: draw.vertices,
                instances: draw.instances,
            }),
        );
    }

    fn standard_blend(&mut self) {
        self.blend = BlendMode::Standard;
    }

    fn additive_blend(&mut self) {
        self.blend = BlendMode::Additive;
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.submit_pass(
            "clear_pass",
            wgpu::LoadOp::Clear(wgpu::Color {
                r: color[0] as f64,
                g: color[1] as f64,
                b: color[2] as f64,
                a: color[3] as f64,
            }),
            None,
        );
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return false;
        }
        let (target, view) = create_target(&self.ctx, width, height);
        self.target = target;
        self.target_view = view;
        self.width = width;
        self.height = height;
        log::debug!("Render target resized to {}x{}", width, height);
        true
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn dispose(&mut self) {
        if self.programs.is_empty() && self.buffers.is_empty() {
            return;
        }
        log::debug!(
            "Disposing {} programs and {} buffers",
            self.programs.len(),
            self.buffers.len()
        );
        self.programs.clear();
        self.names.clear();
        self.buffers.clear();
        self.blend = BlendMode::Standard;
    }
}
