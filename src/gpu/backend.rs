//! The GPU resource and draw-call abstraction shared by all scenes.
//!
//! Scenes never touch wgpu directly. They create programs and buffers
//! through a [`GraphicsBackend`], write named uniforms, toggle blend modes
//! and issue draws. The backend owns every GPU object; a scene owns only
//! the opaque handle it was given and is the one party that asks for its
//! release.

use super::context::GpuError;
use super::reflect::ResolvedAttribute;
use std::fmt;

/// Handle to a compiled and linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Blend configuration applied to subsequent draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// `src * alpha + dst * (1 - alpha)`
    #[default]
    Standard,
    /// `src * alpha + dst`, used for glow and crossfade overlays.
    Additive,
}

/// Primitive assembly for a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    LineStrip,
    PointList,
}

/// Whether an attribute advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    #[default]
    Vertex,
    Instance,
}

/// A vertex input a program expects, fed from its own `f32` buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Name of the vertex entry point argument.
    pub name: &'static str,
    /// Number of `f32` components (1..=4).
    pub components: u32,
    pub step: StepMode,
}

impl VertexAttribute {
    pub const fn per_vertex(name: &'static str, components: u32) -> Self {
        Self {
            name,
            components,
            step: StepMode::Vertex,
        }
    }

    pub const fn per_instance(name: &'static str, components: u32) -> Self {
        Self {
            name,
            components,
            step: StepMode::Instance,
        }
    }
}

/// Everything needed to build a program from WGSL source.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    /// Registry name, also used in diagnostics.
    pub label: &'a str,
    /// WGSL source holding both entry points.
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub attributes: &'a [VertexAttribute],
    pub topology: Topology,
}

impl<'a> ProgramDescriptor<'a> {
    /// Descriptor with the conventional `vs_main` / `fs_main` entry points.
    pub fn new(label: &'a str, source: &'a str, attributes: &'a [VertexAttribute]) -> Self {
        Self {
            label,
            source,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            attributes,
            topology: Topology::TriangleList,
        }
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
}

/// Shape of a uniform value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    Mat4,
}

impl UniformKind {
    /// Size in bytes of the value as laid out in a uniform block.
    pub fn byte_size(self) -> usize {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// A value written to a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    /// Column-major 4x4 matrix.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Float(_) => UniformKind::Float,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Int(_) => UniformKind::Int,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Little-endian bytes in uniform-block layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Float(v) => v.to_le_bytes().to_vec(),
            Self::Int(v) => v.to_le_bytes().to_vec(),
            Self::Vec2(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Vec3(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Vec4(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Mat4(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }
}

/// One draw of a program with its attribute buffers bound by location.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub program: ProgramId,
    /// `(shader location, buffer)` pairs.
    pub attributes: &'a [(u32, BufferId)],
    pub vertex_count: u32,
    pub instance_count: u32,
}

impl<'a> DrawCall<'a> {
    pub fn new(program: ProgramId, attributes: &'a [(u32, BufferId)], vertex_count: u32) -> Self {
        Self {
            program,
            attributes,
            vertex_count,
            instance_count: 1,
        }
    }

    pub fn instanced(mut self, instance_count: u32) -> Self {
        self.instance_count = instance_count;
        self
    }
}

/// Counts a draw can issue, with the buffers bound in attribute order.
#[derive(Debug)]
pub struct ClampedDraw<T> {
    pub vertices: u32,
    pub instances: u32,
    pub bound: Vec<T>,
}

impl<T> ClampedDraw<T> {
    pub fn is_empty(&self) -> bool {
        self.vertices == 0 || self.instances == 0
    }
}

/// Bind `call`'s buffers against `layout` and clamp its counts to what they hold.
///
/// `lookup` yields a buffer's length in floats and whatever the caller binds.
/// Returns the first attribute location with no usable buffer as the error.
pub fn clamp_counts<T>(
    layout: &[ResolvedAttribute],
    call: &DrawCall<'_>,
    mut lookup: impl FnMut(BufferId) -> Option<(usize, T)>,
) -> Result<ClampedDraw<T>, u32> {
    let mut draw = ClampedDraw {
        vertices: call.vertex_count,
        instances: call.instance_count,
        bound: Vec::with_capacity(layout.len()),
    };
    for attr in layout {
        let (floats, binding) = call
            .attributes
            .iter()
            .find(|(location, _)| *location == attr.location)
            .and_then(|&(_, id)| lookup(id))
            .ok_or(attr.location)?;
        let available = (floats / attr.components.max(1) as usize) as u32;
        match attr.step {
            StepMode::Vertex => draw.vertices = draw.vertices.min(available),
            StepMode::Instance => draw.instances = draw.instances.min(available),
        }
        draw.bound.push(binding);
    }
    Ok(draw)
}

/// Two triangles covering clip space, as `vec2` positions.
pub const FULLSCREEN_QUAD: [f32; 12] = [
    -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, //
    -1.0, 1.0, 1.0, -1.0, 1.0, 1.0,
];

/// GPU context owner: programs, buffers, uniforms, blending and the target.
pub trait GraphicsBackend {
    /// Compile, validate and link a program.
    ///
    /// Shader diagnostics surface as [`GpuError::Shader`], interface
    /// mismatches as [`GpuError::Link`].
    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<ProgramId, GpuError>;

    /// Look up a live program by the label it was created with.
    fn program_by_name(&self, label: &str) -> Option<ProgramId>;

    /// Release a program and every cached uniform location for it.
    fn delete_program(&mut self, program: ProgramId);

    /// Shader location of a vertex input, `None` if the shader has no such input.
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// Upload a flat `f32` sequence into a new vertex buffer.
    fn create_buffer(&mut self, data: &[f32], label: &str) -> BufferId;

    fn delete_buffer(&mut self, buffer: BufferId);

    /// Write a named uniform. Unknown names and kind mismatches are dropped.
    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue);

    /// Issue one draw with the current blend mode. Never blocks.
    fn draw(&mut self, call: &DrawCall<'_>);

    fn standard_blend(&mut self);

    fn additive_blend(&mut self);

    fn blend_mode(&self) -> BlendMode;

    /// Clear the whole target to an RGBA color.
    fn clear(&mut self, color: [f32; 4]);

    /// Match the backing store to the presentation size.
    ///
    /// Returns `true` only when the store was actually reallocated.
    fn resize(&mut self, width: u32, height: u32) -> bool;

    fn size(&self) -> (u32, u32);

    /// Release every program and buffer and clear all caches.
    fn dispose(&mut self);

    fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.size();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    fn create_fullscreen_quad(&mut self) -> BufferId {
        self.create_buffer(&FULLSCREEN_QUAD, "fullscreen_quad")
    }
}
