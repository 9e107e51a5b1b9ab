//! Chroma Morph Core
//!
//! Audio-reactive generative scene engine with GPU crossfade morphing.
//!
//! # Features
//!
//! - Procedural WGSL scenes (waves, particles, fractal, parametric curve)
//! - Crossfades between scenes via blend-mode sequencing with eased timing
//! - Live audio capture via cpal (when the `live-audio` feature is enabled)
//! - FFT spectrum analysis via RustFFT, reduced to bass/mid/treble/volume
//! - GPU rendering via wgpu, plus a recording backend for headless runs

pub mod audio;
pub mod engine;
pub mod gpu;
pub mod morph;
pub mod scenes;

// Re-export commonly used types
pub use audio::{AudioFeature, AudioFeatureExtractor, AudioInput, SyntheticInput};
pub use engine::{AudioConfig, ConfigError, EngineConfig, Visualizer};
pub use gpu::{
    BlendMode, GpuContext, GpuError, GraphicsBackend, RecordingBackend, UniformValue, WgpuBackend,
};
pub use morph::{Easing, MorphEngine, MorphState};
pub use scenes::{
    create_scene, default_roster, ParameterMap, Scene, SceneError, SceneKind, SceneState,
};
