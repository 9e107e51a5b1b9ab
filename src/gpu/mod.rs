//! GPU resource management and rendering using wgpu.
//!
//! Scenes talk to a [`GraphicsBackend`]: the headless [`WgpuBackend`] renders
//! into an offscreen texture, while [`RecordingBackend`] runs the same shader
//! validation and bookkeeping without a device.

pub mod backend;
pub mod context;
pub mod pipelines;
pub mod recording;
pub mod reflect;
pub mod uniforms;
pub mod wgpu_backend;

pub use backend::{
    clamp_counts, BlendMode, BufferId, ClampedDraw, DrawCall, GraphicsBackend, ProgramDescriptor, ProgramId, StepMode,
    Topology, UniformKind, UniformValue, VertexAttribute, FULLSCREEN_QUAD,
};
pub use context::{GpuContext, GpuError};
pub use recording::{Command, RecordedDraw, RecordingBackend};
pub use reflect::{LinkError, ShaderError};
pub use wgpu_backend::WgpuBackend;
