//! Scene roster and the crossfade state machine.

use super::easing::Easing;
use crate::audio::AudioFeature;
use crate::gpu::GraphicsBackend;
use crate::scenes::{Scene, SceneError};

/// Progress within this distance of 1 completes the morph.
const COMPLETION_EPSILON: f32 = 1e-5;

/// Snapshot of the morph state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphState {
    pub current_index: usize,
    pub target_index: usize,
    /// Linear progress in `[0, 1]`.
    pub progress: f32,
    pub duration: f32,
    pub is_morphing: bool,
}

impl MorphState {
    fn idle(index: usize) -> Self {
        Self {
            current_index: index,
            target_index: index,
            progress: 0.0,
            duration: 0.0,
            is_morphing: false,
        }
    }
}

/// Owns the scene roster and crossfades between its members.
///
/// While idle only the current scene is updated and rendered. While
/// morphing the current scene renders with standard blending and the target
/// is layered on top with additive blending, so the target's emissive
/// content grows in without scenes needing an opacity input.
pub struct MorphEngine {
    scenes: Vec<Box<dyn Scene>>,
    state: MorphState,
    elapsed: f32,
    easing: Easing,
    blend_weight: f32,
}

impl MorphEngine {
    pub fn new(scenes: Vec<Box<dyn Scene>>) -> Self {
        Self {
            scenes,
            state: MorphState::idle(0),
            elapsed: 0.0,
            easing: Easing::default(),
            blend_weight: 0.0,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn state(&self) -> MorphState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn target_index(&self) -> usize {
        self.state.target_index
    }

    pub fn progress(&self) -> f32 {
        self.state.progress
    }

    pub fn is_morphing(&self) -> bool {
        self.state.is_morphing
    }

    /// Eased weight of the target as of the last render, 0 when idle.
    pub fn blend_weight(&self) -> f32 {
        self.blend_weight
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scenes(&self) -> &[Box<dyn Scene>] {
        &self.scenes
    }

    pub fn scene(&self, index: usize) -> Option<&dyn Scene> {
        self.scenes.get(index).map(|s| s.as_ref())
    }

    pub fn scene_mut(&mut self, index: usize) -> Option<&mut (dyn Scene + 'static)> {
        self.scenes.get_mut(index).map(|s| s.as_mut())
    }

    pub fn current_scene(&self) -> Option<&dyn Scene> {
        self.scene(self.state.current_index)
    }

    /// Jump straight to `index`, abandoning any morph in flight.
    pub fn set_active_scene(&mut self, index: usize) -> bool {
        if index >= self.scenes.len() {
            log::warn!(
                "Cannot activate scene {}: roster has {} scenes",
                index,
                self.scenes.len()
            );
            return false;
        }
        self.state = MorphState::idle(index);
        self.elapsed = 0.0;
        self.blend_weight = 0.0;
        log::info!("Active scene: {}", self.scenes[index].name());
        true
    }

    /// Start crossfading toward `target` over `duration` seconds.
    ///
    /// Targeting the current scene is a no-op. A call during a morph
    /// replaces the target and restarts from zero progress. Returns whether
    /// a morph was started.
    pub fn morph_to(&mut self, target: usize, duration: f32) -> bool {
        if target == self.state.current_index {
            return false;
        }
        if target >= self.scenes.len() {
            log::warn!(
                "Cannot morph to scene {}: roster has {} scenes",
                target,
                self.scenes.len()
            );
            return false;
        }
        if !duration.is_finite() || duration <= 0.0 {
            log::warn!("Rejecting morph with duration {}", duration);
            return false;
        }

        if self.state.is_morphing {
            log::debug!(
                "Morph toward '{}' replaced",
                self.scenes[self.state.target_index].name()
            );
        }
        self.state = MorphState {
            current_index: self.state.current_index,
            target_index: target,
            progress: 0.0,
            duration,
            is_morphing: true,
        };
        self.elapsed = 0.0;
        log::info!(
            "Morphing '{}' -> '{}' over {:.2}s",
            self.scenes[self.state.current_index].name(),
            self.scenes[target].name(),
            duration
        );
        true
    }

    /// Morph to the following scene in roster order, wrapping at the end.
    pub fn next_scene(&mut self, duration: f32) -> bool {
        if self.scenes.is_empty() {
            return false;
        }
        let next = (self.state.current_index + 1) % self.scenes.len();
        self.morph_to(next, duration)
    }

    /// Advance the morph clock, then the visible scenes.
    ///
    /// Negative or non-finite deltas count as zero. Scenes that are not
    /// visible keep their clocks paused.
    pub fn update(&mut self, delta_time: f32, audio: Option<&AudioFeature>) {
        let dt = if delta_time.is_finite() && delta_time > 0.0 {
            delta_time
        } else {
            0.0
        };

        if self.state.is_morphing {
            self.elapsed += dt;
            let progress = self.elapsed / self.state.duration;
            if progress >= 1.0 - COMPLETION_EPSILON {
                self.complete_morph();
            } else {
                self.state.progress = progress;
            }
        }

        let MorphState {
            current_index,
            target_index,
            is_morphing,
            ..
        } = self.state;

        if let Some(scene) = self.scenes.get_mut(current_index) {
            scene.update(dt, audio);
        }
        if is_morphing {
            if let Some(scene) = self.scenes.get_mut(target_index) {
                scene.update(dt, audio);
            }
        }
    }

    fn complete_morph(&mut self) {
        let target = self.state.target_index;
        self.state = MorphState {
            current_index: target,
            target_index: target,
            progress: 1.0,
            duration: self.state.duration,
            is_morphing: false,
        };
        self.elapsed = 0.0;
        log::info!("Morph complete: '{}'", self.scenes[target].name());
    }

    /// Render the visible scenes.
    ///
    /// Standard blending is always in effect when this returns, including
    /// when the target scene fails to initialize.
    pub fn render(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), SceneError> {
        let MorphState {
            current_index,
            target_index,
            progress,
            is_morphing,
            ..
        } = self.state;

        if !is_morphing {
            self.blend_weight = 0.0;
            return match self.scenes.get_mut(current_index) {
                Some(scene) => scene.render(backend),
                None => Ok(()),
            };
        }

        self.blend_weight = self.easing.apply(progress);

        backend.standard_blend();
        if let Some(scene) = self.scenes.get_mut(current_index) {
            scene.render(backend)?;
        }

        backend.additive_blend();
        let result = match self.scenes.get_mut(target_index) {
            Some(scene) => scene.render(backend),
            None => Ok(()),
        };
        backend.standard_blend();
        result
    }

    /// Dispose every scene in the roster.
    pub fn dispose(&mut self, backend: &mut dyn GraphicsBackend) {
        for scene in &mut self.scenes {
            scene.dispose(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{BlendMode, Command, GpuError, RecordingBackend};
    use crate::scenes::{SceneBase, SceneKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts hook calls without touching the backend.
    struct Tracer {
        base: SceneBase,
        updates: Arc<AtomicUsize>,
        renders: Arc<AtomicUsize>,
    }

    impl Tracer {
        fn boxed(updates: Arc<AtomicUsize>, renders: Arc<AtomicUsize>) -> Box<dyn Scene> {
            Box::new(Self {
                base: SceneBase::new(&[]),
                updates,
                renders,
            })
        }
    }

    impl Scene for Tracer {
        fn kind(&self) -> SceneKind {
            SceneKind::Wave
        }

        fn base(&self) -> &SceneBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut SceneBase {
            &mut self.base
        }

        fn create_resources(&mut self, _: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
            Ok(())
        }

        fn draw(&mut self, _: &mut dyn GraphicsBackend) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }

        fn release_resources(&mut self, _: &mut dyn GraphicsBackend) {}

        fn update(&mut self, _: f32, _: Option<&AudioFeature>) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracers(n: usize) -> (MorphEngine, Vec<Arc<AtomicUsize>>, Vec<Arc<AtomicUsize>>) {
        let updates: Vec<_> = (0..n).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let renders: Vec<_> = (0..n).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let scenes = updates
            .iter()
            .zip(&renders)
            .map(|(u, r)| Tracer::boxed(u.clone(), r.clone()))
            .collect();
        (MorphEngine::new(scenes), updates, renders)
    }

    fn counts(counters: &[Arc<AtomicUsize>]) -> Vec<usize> {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    #[test]
    fn test_starts_idle_on_first_scene() {
        let (engine, _, _) = tracers(3);
        let state = engine.state();
        assert_eq!(state.current_index, 0);
        assert_eq!(state.target_index, 0);
        assert_eq!(state.progress, 0.0);
        assert!(!state.is_morphing);
    }

    #[test]
    fn test_morph_to_current_is_noop() {
        let (mut engine, _, _) = tracers(3);
        engine.set_active_scene(1);
        let before = engine.state();

        assert!(!engine.morph_to(1, 2.0));
        assert_eq!(engine.state(), before);
    }

    #[test]
    fn test_rejects_bad_targets_and_durations() {
        let (mut engine, _, _) = tracers(3);
        assert!(!engine.morph_to(3, 1.0));
        assert!(!engine.morph_to(1, 0.0));
        assert!(!engine.morph_to(1, -2.0));
        assert!(!engine.morph_to(1, f32::NAN));
        assert!(!engine.morph_to(1, f32::INFINITY));
        assert!(!engine.is_morphing());
        assert!(!engine.set_active_scene(7));
    }

    #[test]
    fn test_twenty_ticks_complete_two_second_morph() {
        let (mut engine, _, _) = tracers(4);
        assert!(engine.morph_to(3, 2.0));

        for _ in 0..20 {
            engine.update(0.1, None);
        }

        let state = engine.state();
        assert_eq!(state.progress, 1.0);
        assert_eq!(state.current_index, 3);
        assert_eq!(state.target_index, 3);
        assert!(!state.is_morphing);
    }

    #[test]
    fn test_only_visible_scenes_update() {
        let (mut engine, updates, _) = tracers(5);

        engine.update(0.1, None);
        assert_eq!(counts(&updates), vec![1, 0, 0, 0, 0]);

        engine.morph_to(3, 1.0);
        engine.update(0.1, None);
        engine.update(0.1, None);
        assert_eq!(counts(&updates), vec![3, 0, 0, 2, 0]);
    }

    #[test]
    fn test_completing_tick_updates_new_current_only() {
        let (mut engine, updates, _) = tracers(3);
        engine.morph_to(2, 0.5);

        engine.update(1.0, None);

        assert_eq!(engine.current_index(), 2);
        assert_eq!(counts(&updates), vec![0, 0, 1]);
    }

    #[test]
    fn test_retarget_restarts_progress() {
        let (mut engine, _, _) = tracers(4);
        engine.morph_to(1, 1.0);
        engine.update(0.6, None);
        assert!((engine.progress() - 0.6).abs() < 1e-6);

        assert!(engine.morph_to(2, 1.0));
        let state = engine.state();
        assert_eq!(state.target_index, 2);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.progress, 0.0);
    }

    #[test]
    fn test_set_active_scene_discards_morph() {
        let (mut engine, _, _) = tracers(3);
        engine.morph_to(1, 1.0);
        engine.update(0.3, None);

        assert!(engine.set_active_scene(2));
        let state = engine.state();
        assert_eq!(state.current_index, 2);
        assert_eq!(state.target_index, 2);
        assert_eq!(state.progress, 0.0);
        assert!(!state.is_morphing);
    }

    #[test]
    fn test_bad_deltas_do_not_advance() {
        let (mut engine, _, _) = tracers(2);
        engine.morph_to(1, 1.0);
        engine.update(-5.0, None);
        engine.update(f32::NAN, None);
        engine.update(f32::INFINITY, None);
        assert_eq!(engine.progress(), 0.0);
        assert!(engine.is_morphing());
    }

    #[test]
    fn test_next_scene_wraps() {
        let (mut engine, _, _) = tracers(3);
        engine.set_active_scene(2);
        assert!(engine.next_scene(2.0));
        assert_eq!(engine.target_index(), 0);
    }

    #[test]
    fn test_single_scene_roster_cannot_advance() {
        let (mut engine, _, _) = tracers(1);
        assert!(!engine.next_scene(2.0));
        assert!(!MorphEngine::new(Vec::new()).next_scene(2.0));
    }

    #[test]
    fn test_render_sequences_blend_modes() {
        let (mut engine, _, renders) = tracers(3);
        let mut backend = RecordingBackend::default();

        engine.morph_to(2, 1.0);
        engine.update(0.5, None);
        engine.render(&mut backend).unwrap();

        assert_eq!(counts(&renders), vec![1, 0, 1]);
        let blends: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Blend(mode) => Some(*mode),
                _ => None,
            })
            .collect();
        assert_eq!(
            blends,
            vec![BlendMode::Standard, BlendMode::Additive, BlendMode::Standard]
        );
        assert_eq!(engine.blend_weight(), 0.5);
    }

    #[test]
    fn test_idle_render_draws_current_only() {
        let (mut engine, _, renders) = tracers(3);
        let mut backend = RecordingBackend::default();
        engine.set_active_scene(1);

        engine.render(&mut backend).unwrap();

        assert_eq!(counts(&renders), vec![0, 1, 0]);
        assert_eq!(engine.blend_weight(), 0.0);
        assert_eq!(backend.blend_mode(), BlendMode::Standard);
    }

    #[test]
    fn test_easing_shapes_blend_weight() {
        let (engine, _, _) = tracers(2);
        let mut engine = engine.with_easing(Easing::Linear);
        let mut backend = RecordingBackend::default();

        engine.morph_to(1, 4.0);
        engine.update(1.0, None);
        engine.render(&mut backend).unwrap();
        assert!((engine.blend_weight() - 0.25).abs() < 1e-6);

        engine.set_easing(Easing::CubicInOut);
        engine.render(&mut backend).unwrap();
        assert!((engine.blend_weight() - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_dispose_releases_builtin_scenes() {
        let mut engine = MorphEngine::new(crate::scenes::default_roster());
        let mut backend = RecordingBackend::default();
        engine.render(&mut backend).unwrap();
        assert!(backend.program_count() > 0);

        engine.dispose(&mut backend);
        engine.dispose(&mut backend);

        assert_eq!(backend.program_count(), 0);
        assert_eq!(backend.buffer_count(), 0);
    }
}
