//! Procedural scenes and the contract the morph engine drives them through.
//!
//! Available scenes:
//! - Wave: layered interference waves
//! - Particle: orbiting particle swarm
//! - Fractal: Julia/Mandelbrot escape-time field
//! - Curve: evolving Lissajous figure

mod curve;
mod fractal;
pub mod params;
mod particle;
mod wave;

pub use curve::CurveScene;
pub use fractal::FractalScene;
pub use params::ParameterMap;
pub use particle::ParticleScene;
pub use wave::WaveScene;

use crate::audio::AudioFeature;
use crate::gpu::{GpuError, GraphicsBackend, ProgramId, UniformValue};
use params::{COLOR_SHIFT, INTENSITY, SPEED};

/// WGSL shared by every scene program: the uniform block and color helpers.
const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");

/// Prepend the shared declarations to a scene shader body.
pub(crate) fn shader_source(body: &str) -> String {
    format!("{COMMON_WGSL}\n{body}")
}

/// Scene lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Failed to initialize scene '{scene}': {source}")]
    Init {
        scene: &'static str,
        #[source]
        source: GpuError,
    },
    #[error("Scene '{scene}' has been disposed")]
    Disposed { scene: &'static str },
}

/// Where a scene is in its resource lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    #[default]
    Uninitialized,
    Initialized,
    Disposed,
}

/// State shared by every scene: clock, parameters and lifecycle.
#[derive(Debug, Clone)]
pub struct SceneBase {
    time: f32,
    params: ParameterMap,
    defaults: &'static [(&'static str, f32)],
    state: SceneState,
}

impl SceneBase {
    /// `defaults` seed the parameter map and are what rendering falls back to.
    pub fn new(defaults: &'static [(&'static str, f32)]) -> Self {
        Self {
            time: 0.0,
            params: ParameterMap::with_defaults(defaults),
            defaults,
            state: SceneState::Uninitialized,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn params(&self) -> &ParameterMap {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterMap {
        &mut self.params
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Current value of `name`, or its construction default.
    pub fn param_or_default(&self, name: &str) -> f32 {
        let fallback = self
            .defaults
            .iter()
            .find(|(key, _)| *key == name)
            .map_or(0.0, |&(_, value)| value);
        self.params.get_or(name, fallback)
    }

    /// Write the shared uniform block of one of this scene's programs.
    pub fn upload_uniforms(&self, backend: &mut dyn GraphicsBackend, program: ProgramId) {
        let (width, height) = backend.size();
        backend.set_uniform(program, "time", UniformValue::Float(self.time));
        backend.set_uniform(
            program,
            "resolution",
            UniformValue::Vec2([width as f32, height as f32]),
        );
        backend.set_uniform(program, "intensity", UniformValue::Float(self.param_or_default(INTENSITY)));
        backend.set_uniform(program, "speed", UniformValue::Float(self.param_or_default(SPEED)));
        backend.set_uniform(
            program,
            "color_shift",
            UniformValue::Float(self.param_or_default(COLOR_SHIFT)),
        );
    }
}

/// A procedural visual generator.
///
/// Implementors supply the three resource hooks; the lifecycle, clock and
/// parameter operations are provided on top of [`SceneBase`].
pub trait Scene: Send {
    fn kind(&self) -> SceneKind;

    fn base(&self) -> &SceneBase;

    fn base_mut(&mut self) -> &mut SceneBase;

    /// Compile programs and allocate buffers.
    ///
    /// On error, anything already created must still be reachable by
    /// [`Scene::release_resources`].
    fn create_resources(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError>;

    /// Issue this frame's draws. Only called once resources exist.
    fn draw(&mut self, backend: &mut dyn GraphicsBackend);

    /// Release every handle this scene holds. Must tolerate partial state.
    fn release_resources(&mut self, backend: &mut dyn GraphicsBackend);

    /// Map an audio snapshot onto parameters.
    fn map_audio(&mut self, feature: &AudioFeature) {
        let params = self.base_mut().params_mut();
        params.set(INTENSITY, feature.bass);
        params.set(SPEED, 0.5 + 0.5 * feature.mid);
        params.set(COLOR_SHIFT, feature.treble);
    }

    /// Fallback used for keys this scene has never stored.
    fn param_fallback(&self, _name: &str) -> f32 {
        0.5
    }

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn state(&self) -> SceneState {
        self.base().state()
    }

    fn time(&self) -> f32 {
        self.base().time()
    }

    fn params(&self) -> &ParameterMap {
        self.base().params()
    }

    /// Create GPU resources. A no-op once initialized.
    ///
    /// A failure releases whatever was created and retires the scene, so
    /// initialization is never retried.
    fn init(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), SceneError> {
        match self.state() {
            SceneState::Initialized => Ok(()),
            SceneState::Disposed => Err(SceneError::Disposed { scene: self.name() }),
            SceneState::Uninitialized => match self.create_resources(backend) {
                Ok(()) => {
                    self.base_mut().state = SceneState::Initialized;
                    log::debug!("Scene '{}' initialized", self.name());
                    Ok(())
                }
                Err(source) => {
                    self.release_resources(backend);
                    self.base_mut().state = SceneState::Disposed;
                    Err(SceneError::Init {
                        scene: self.name(),
                        source,
                    })
                }
            },
        }
    }

    /// Advance the clock and apply audio, if any.
    ///
    /// Negative or non-finite deltas count as zero.
    fn update(&mut self, delta_time: f32, audio: Option<&AudioFeature>) {
        if delta_time.is_finite() && delta_time > 0.0 {
            self.base_mut().time += delta_time;
        }
        if let Some(feature) = audio {
            self.map_audio(feature);
        }
    }

    /// Draw one frame, initializing first if needed.
    fn render(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), SceneError> {
        match self.state() {
            SceneState::Initialized => {}
            SceneState::Uninitialized => self.init(backend)?,
            SceneState::Disposed => return Err(SceneError::Disposed { scene: self.name() }),
        }
        self.draw(backend);
        Ok(())
    }

    fn get_param(&self, name: &str, default: f32) -> f32 {
        self.params().get_or(name, default)
    }

    /// Value of `name` resolved with this scene's own fallback.
    fn param(&self, name: &str) -> f32 {
        self.get_param(name, self.param_fallback(name))
    }

    /// Store `value` clamped to `[0, 1]`.
    fn set_param(&mut self, name: &str, value: f32) {
        self.base_mut().params_mut().set(name, value);
    }

    /// Move every parameter either scene knows a fraction `t` toward `other`.
    fn lerp_params(&mut self, other: &dyn Scene, t: f32) {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let mut keys: Vec<String> = self.params().keys().map(str::to_string).collect();
        for key in other.params().keys() {
            if !self.params().contains(key) {
                keys.push(key.to_string());
            }
        }

        for key in keys {
            let a = self.param(&key);
            let b = other.param(&key);
            let mixed = (a * (1.0 - t) + b * t).clamp(a.min(b), a.max(b));
            self.set_param(&key, mixed);
        }
    }

    /// Release GPU resources. Safe to call repeatedly.
    fn dispose(&mut self, backend: &mut dyn GraphicsBackend) {
        match self.state() {
            SceneState::Disposed => {}
            SceneState::Initialized => {
                self.release_resources(backend);
                self.base_mut().state = SceneState::Disposed;
                log::debug!("Scene '{}' disposed", self.name());
            }
            SceneState::Uninitialized => self.base_mut().state = SceneState::Disposed,
        }
    }
}

/// Built-in scene variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKind {
    Wave,
    Particle,
    Fractal,
    Curve,
}

impl SceneKind {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "wave" | "waves" => Some(Self::Wave),
            "particle" | "particles" => Some(Self::Particle),
            "fractal" | "julia" | "mandelbrot" => Some(Self::Fractal),
            "curve" | "lissajous" => Some(Self::Curve),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Wave => "wave",
            Self::Particle => "particle",
            Self::Fractal => "fractal",
            Self::Curve => "curve",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Wave => "Layered interference waves with radial glow",
            Self::Particle => "Orbiting particle swarm with additive glow",
            Self::Fractal => "Julia/Mandelbrot escape-time field",
            Self::Curve => "Evolving Lissajous figure with glowing points",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Wave, Self::Particle, Self::Fractal, Self::Curve]
    }
}

/// Create a scene instance from its kind.
pub fn create_scene(kind: SceneKind) -> Box<dyn Scene> {
    match kind {
        SceneKind::Wave => Box::new(WaveScene::new()),
        SceneKind::Particle => Box::new(ParticleScene::new()),
        SceneKind::Fractal => Box::new(FractalScene::new()),
        SceneKind::Curve => Box::new(CurveScene::new()),
    }
}

/// One instance of every built-in scene, in canonical order.
pub fn default_roster() -> Vec<Box<dyn Scene>> {
    SceneKind::all().iter().map(|&kind| create_scene(kind)).collect()
}
