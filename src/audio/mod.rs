//! Audio capture and feature extraction.
//!
//! This module provides:
//! - Live input via cpal behind the `live-audio` feature
//! - Synthetic inputs (sine, noise, drum pattern) for running without hardware
//! - Smoothed FFT analysis via RustFFT
//! - Reduction to the normalized bass/mid/treble/volume/spectrum feature

pub mod analyser;
pub mod extractor;
pub mod features;
pub mod input;
pub mod synth;

pub use analyser::{AnalyserSettings, FrequencyAnalyser};
pub use extractor::AudioFeatureExtractor;
pub use features::{reduce, AudioFeature, FeatureBands};
#[cfg(feature = "live-audio")]
pub use input::CpalInput;
pub use input::{default_input, AudioError, AudioInput};
pub use synth::{generate_kick, generate_sine, generate_test_beat, generate_white_noise, SyntheticInput};
