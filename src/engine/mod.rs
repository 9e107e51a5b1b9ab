//! Per-frame driver tying audio, morphing and the backend together.

pub mod config;

pub use config::{AudioConfig, ConfigError, EngineConfig};

use crate::audio::{default_input, AudioFeature, AudioFeatureExtractor, AudioInput};
use crate::gpu::GraphicsBackend;
use crate::morph::MorphEngine;
use crate::scenes::{create_scene, SceneError};

/// Runs the scene roster against a backend, one tick per displayed frame.
///
/// The two interactive operations are [`Visualizer::advance_scene`] and
/// [`Visualizer::toggle_audio`].
pub struct Visualizer<B: GraphicsBackend> {
    config: EngineConfig,
    backend: B,
    morph: MorphEngine,
    audio: AudioFeatureExtractor,
    last_feature: Option<AudioFeature>,
    shut_down: bool,
}

impl<B: GraphicsBackend> Visualizer<B> {
    /// Build with the default audio input for `config.audio.device`.
    pub fn new(config: EngineConfig, backend: B) -> Result<Self, ConfigError> {
        let input = default_input(config.audio.device.as_deref());
        Self::with_input(config, backend, input)
    }

    pub fn with_input(
        config: EngineConfig,
        mut backend: B,
        input: Box<dyn AudioInput>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let scenes = config.scene_kinds()?.into_iter().map(create_scene).collect();
        let mut morph = MorphEngine::new(scenes).with_easing(config.easing);
        morph.set_active_scene(0);

        backend.resize(config.width, config.height);
        let audio =
            AudioFeatureExtractor::new(input, config.audio.analyser_settings(), config.audio.bands());

        log::info!(
            "Visualizer ready: {} scenes at {}x{}",
            morph.scene_count(),
            config.width,
            config.height
        );

        Ok(Self {
            config,
            backend,
            morph,
            audio,
            last_feature: None,
            shut_down: false,
        })
    }

    /// Run one tick: sync size, clear, poll audio, update, render.
    ///
    /// Errors are scene activation failures. The failed frame is skipped
    /// and later frames may be attempted.
    pub fn frame(&mut self, delta_time: f32, size: (u32, u32)) -> Result<(), SceneError> {
        if self.shut_down {
            return Ok(());
        }

        self.backend.resize(size.0, size.1);
        self.backend.clear(self.config.clear_color);

        self.last_feature = self
            .audio
            .is_active()
            .then(|| self.audio.get_frequency_data());

        self.morph.update(delta_time, self.last_feature.as_ref());
        self.morph.render(&mut self.backend)
    }

    /// Morph to the next scene over the configured duration.
    pub fn advance_scene(&mut self) -> bool {
        self.morph.next_scene(self.config.morph_duration)
    }

    /// Start or stop audio capture. Returns whether audio is now active.
    pub fn toggle_audio(&mut self) -> bool {
        if self.audio.is_active() {
            self.audio.stop();
            self.last_feature = None;
            false
        } else {
            self.audio.start()
        }
    }

    pub fn audio_active(&self) -> bool {
        self.audio.is_active()
    }

    pub fn audio(&self) -> &AudioFeatureExtractor {
        &self.audio
    }

    /// Feature used by the last frame, `None` when audio was off.
    pub fn last_feature(&self) -> Option<&AudioFeature> {
        self.last_feature.as_ref()
    }

    pub fn morph(&self) -> &MorphEngine {
        &self.morph
    }

    pub fn morph_mut(&mut self) -> &mut MorphEngine {
        &mut self.morph
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Stop audio and release every scene and GPU resource. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.audio.stop();
        self.morph.dispose(&mut self.backend);
        self.backend.dispose();
        self.last_feature = None;
        self.shut_down = true;
        log::info!("Visualizer shut down");
    }
}

impl<B: GraphicsBackend> Drop for Visualizer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
