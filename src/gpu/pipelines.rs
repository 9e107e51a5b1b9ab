//! Render pipelines backing a program.
//!
//! wgpu bakes blending into the pipeline object, so each program owns one
//! pipeline per [`BlendMode`] and the backend picks between them per draw.

use super::backend::{BlendMode, StepMode, Topology};
use super::reflect::ResolvedAttribute;
use wgpu::{BindGroupLayout, Device, PipelineLayout, RenderPipeline, ShaderModule, VertexBufferLayout};

/// `src * alpha + dst` on color, standard over-compositing on alpha.
pub const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::OVER,
};

impl BlendMode {
    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Standard => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => ADDITIVE_BLENDING,
        }
    }
}

impl Topology {
    pub fn primitive_topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::PointList => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Everything the two pipelines of a program share.
pub struct PipelineSource<'a> {
    pub label: &'a str,
    pub layout: &'a PipelineLayout,
    pub module: &'a ShaderModule,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub vertex_buffers: &'a [VertexBufferLayout<'a>],
    pub topology: Topology,
    pub format: wgpu::TextureFormat,
}

/// The standard and additive variants of one program.
pub struct BlendPipelines {
    standard: RenderPipeline,
    additive: RenderPipeline,
}

impl BlendPipelines {
    pub fn new(device: &Device, source: &PipelineSource<'_>) -> Self {
        Self {
            standard: build_pipeline(device, source, BlendMode::Standard),
            additive: build_pipeline(device, source, BlendMode::Additive),
        }
    }

    pub fn get(&self, mode: BlendMode) -> &RenderPipeline {
        match mode {
            BlendMode::Standard => &self.standard,
            BlendMode::Additive => &self.additive,
        }
    }
}

fn build_pipeline(device: &Device, source: &PipelineSource<'_>, mode: BlendMode) -> RenderPipeline {
    let label = format!("{}_{}", source.label, mode_suffix(mode));
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(source.layout),
        vertex: wgpu::VertexState {
            module: source.module,
            entry_point: Some(source.vertex_entry),
            buffers: source.vertex_buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: source.module,
            entry_point: Some(source.fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: source.format,
                blend: Some(mode.blend_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: source.topology.primitive_topology(),
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn mode_suffix(mode: BlendMode) -> &'static str {
    match mode {
        BlendMode::Standard => "standard",
        BlendMode::Additive => "additive",
    }
}

/// One single-attribute vertex buffer per resolved attribute, in slot order.
pub fn vertex_attributes(layout: &[ResolvedAttribute]) -> Vec<[wgpu::VertexAttribute; 1]> {
    layout
        .iter()
        .map(|attr| {
            let format = match attr.components {
                1 => wgpu::VertexFormat::Float32,
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                _ => wgpu::VertexFormat::Float32x4,
            };
            [wgpu::VertexAttribute {
                format,
                offset: 0,
                shader_location: attr.location,
            }]
        })
        .collect()
}

/// Buffer layouts borrowing the attribute arrays from [`vertex_attributes`].
pub fn vertex_buffer_layouts<'a>(
    layout: &[ResolvedAttribute],
    attributes: &'a [[wgpu::VertexAttribute; 1]],
) -> Vec<VertexBufferLayout<'a>> {
    layout
        .iter()
        .zip(attributes)
        .map(|(attr, attributes)| VertexBufferLayout {
            array_stride: (attr.components as usize * std::mem::size_of::<f32>()) as u64,
            step_mode: match attr.step {
                StepMode::Vertex => wgpu::VertexStepMode::Vertex,
                StepMode::Instance => wgpu::VertexStepMode::Instance,
            },
            attributes: attributes.as_slice(),
        })
        .collect()
}

/// Bind group layout for the uniform block at `@group(0) @binding(0)`.
pub fn create_uniform_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_uniform_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Pipeline layout with the uniform group when the program declares one.
pub fn create_pipeline_layout(
    device: &Device,
    label: &str,
    uniform_layout: Option<&BindGroupLayout>,
) -> PipelineLayout {
    let groups: Vec<&BindGroupLayout> = uniform_layout.into_iter().collect();
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &groups,
        immediate_size: 0,
    })
}
