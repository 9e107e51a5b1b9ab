//! Engine configuration loaded from JSON.

use crate::audio::{AnalyserSettings, FeatureBands};
use crate::morph::Easing;
use crate::scenes::SceneKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    /// RGBA cleared before every frame.
    pub clear_color: [f32; 4],
    /// Seconds taken by "advance to next scene".
    pub morph_duration: f32,
    pub easing: Easing,
    /// Scene kind names in roster order.
    pub scenes: Vec<String>,
    pub audio: AudioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            morph_duration: 2.0,
            easing: Easing::CubicInOut,
            scenes: SceneKind::all().iter().map(|k| k.name().to_string()).collect(),
            audio: AudioConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub spectrum_samples: usize,
    pub bass_end_bin: usize,
    pub mid_end_bin: usize,
    /// Capture device name fragment; the system default when absent.
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let analyser = AnalyserSettings::default();
        let bands = FeatureBands::default();
        Self {
            fft_size: analyser.fft_size,
            smoothing: analyser.smoothing,
            min_decibels: analyser.min_decibels,
            max_decibels: analyser.max_decibels,
            spectrum_samples: bands.spectrum_samples,
            bass_end_bin: bands.bass_end,
            mid_end_bin: bands.mid_end,
            device: None,
        }
    }
}

impl AudioConfig {
    pub fn analyser_settings(&self) -> AnalyserSettings {
        AnalyserSettings {
            fft_size: self.fft_size,
            smoothing: self.smoothing,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
        }
    }

    pub fn bands(&self) -> FeatureBands {
        FeatureBands {
            bass_end: self.bass_end_bin,
            mid_end: self.mid_end_bin,
            spectrum_samples: self.spectrum_samples,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(invalid(format!(
                "audio.fft_size must be a power of 2 no smaller than 32, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(invalid(format!(
                "audio.smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }
        if !(self.min_decibels < self.max_decibels) {
            return Err(invalid(format!(
                "audio.min_decibels ({}) must be below audio.max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if self.spectrum_samples == 0 {
            return Err(invalid("audio.spectrum_samples must be positive".into()));
        }
        if self.bass_end_bin > self.mid_end_bin {
            return Err(invalid(format!(
                "audio.bass_end_bin ({}) is past audio.mid_end_bin ({})",
                self.bass_end_bin, self.mid_end_bin
            )));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.morph_duration.is_finite() || self.morph_duration <= 0.0 {
            return Err(invalid(format!(
                "morph_duration must be positive, got {}",
                self.morph_duration
            )));
        }
        if self.scenes.is_empty() {
            return Err(invalid("scenes must name at least one scene".into()));
        }
        self.scene_kinds()?;
        self.audio.validate()
    }

    /// Roster kinds in configured order.
    pub fn scene_kinds(&self) -> Result<Vec<SceneKind>, ConfigError> {
        self.scenes
            .iter()
            .map(|name| {
                SceneKind::from_str(name).ok_or_else(|| {
                    let known: Vec<_> = SceneKind::all().iter().map(|k| k.name()).collect();
                    invalid(format!(
                        "unknown scene '{}', expected one of: {}",
                        name,
                        known.join(", ")
                    ))
                })
            })
            .collect()
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
