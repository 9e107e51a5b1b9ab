//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chroma_morph::audio::AudioFeature;
use chroma_morph::gpu::{
    BlendMode, GpuError, GraphicsBackend, ProgramDescriptor, ProgramId, WgpuBackend,
};
use chroma_morph::scenes::{Scene, SceneBase, SceneKind};
use std::sync::{Arc, Mutex};

/// Event log shared by a roster of traced scenes.
pub type Journal = Arc<Mutex<Vec<Event>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Update { scene: usize, delta: f32 },
    Draw { scene: usize, blend: BlendMode },
    Release { scene: usize },
}

/// A scene that draws nothing and journals every hook call.
pub struct TracedScene {
    id: usize,
    base: SceneBase,
    journal: Journal,
}

impl TracedScene {
    pub fn new(id: usize, journal: Journal) -> Self {
        Self {
            id,
            base: SceneBase::new(&[("intensity", 0.5)]),
            journal,
        }
    }
}

impl Scene for TracedScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Wave
    }

    fn base(&self) -> &SceneBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create_resources(&mut self, _backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn GraphicsBackend) {
        let blend = backend.blend_mode();
        self.journal.lock().unwrap().push(Event::Draw {
            scene: self.id,
            blend,
        });
    }

    fn release_resources(&mut self, _backend: &mut dyn GraphicsBackend) {
        self.journal
            .lock()
            .unwrap()
            .push(Event::Release { scene: self.id });
    }

    fn update(&mut self, delta_time: f32, audio: Option<&AudioFeature>) {
        self.journal.lock().unwrap().push(Event::Update {
            scene: self.id,
            delta: delta_time,
        });
        if let Some(feature) = audio {
            self.map_audio(feature);
        }
    }
}

/// `n` traced scenes sharing one journal.
pub fn traced_roster(n: usize) -> (Vec<Box<dyn Scene>>, Journal) {
    let journal: Journal = Arc::default();
    let scenes = (0..n)
        .map(|id| Box::new(TracedScene::new(id, journal.clone())) as Box<dyn Scene>)
        .collect();
    (scenes, journal)
}

/// Drain the journal.
pub fn take_events(journal: &Journal) -> Vec<Event> {
    std::mem::take(&mut *journal.lock().unwrap())
}

/// A scene whose shader never compiles.
pub struct BrokenScene {
    base: SceneBase,
    pub program: Option<ProgramId>,
    pub releases: usize,
}

impl BrokenScene {
    pub fn new() -> Self {
        Self {
            base: SceneBase::new(&[]),
            program: None,
            releases: 0,
        }
    }
}

impl Scene for BrokenScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Fractal
    }

    fn base(&self) -> &SceneBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create_resources(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let desc = ProgramDescriptor::new("broken", "fn vs_main( -> {", &[]);
        self.program = Some(backend.create_program(&desc)?);
        Ok(())
    }

    fn draw(&mut self, _backend: &mut dyn GraphicsBackend) {}

    fn release_resources(&mut self, _backend: &mut dyn GraphicsBackend) {
        self.releases += 1;
    }
}

pub fn feature(bass: f32, mid: f32, treble: f32) -> AudioFeature {
    AudioFeature {
        bass,
        mid,
        treble,
        volume: (bass + mid + treble) / 3.0,
        spectrum: vec![0.0; 64],
    }
}

pub async fn gpu_backend(width: u32, height: u32) -> Option<WgpuBackend> {
    WgpuBackend::new(width, height).await.ok()
}
