//! Particle swarm rendered as instanced quads with additive glow.

use super::params::{COLOR_SHIFT, INTENSITY, SPEED};
use super::{shader_source, Scene, SceneBase, SceneKind};
use crate::gpu::{
    BufferId, DrawCall, GpuError, GraphicsBackend, ProgramDescriptor, ProgramId, VertexAttribute,
};

const SHADER: &str = include_str!("shaders/particle.wgsl");
const ATTRIBUTES: &[VertexAttribute] = &[
    VertexAttribute::per_vertex("corner", 2),
    VertexAttribute::per_instance("index", 1),
];
const DEFAULTS: &[(&str, f32)] = &[(INTENSITY, 0.8), (SPEED, 1.0), (COLOR_SHIFT, 0.0)];

/// Number of particles in the swarm.
pub const PARTICLE_COUNT: u32 = 2000;

#[derive(Debug, Default)]
struct Resources {
    program: Option<ProgramId>,
    corners: Option<BufferId>,
    indices: Option<BufferId>,
    bindings: Vec<(u32, BufferId)>,
}

pub struct ParticleScene {
    base: SceneBase,
    count: u32,
    resources: Resources,
}

impl ParticleScene {
    pub fn new() -> Self {
        Self::with_count(PARTICLE_COUNT)
    }

    pub fn with_count(count: u32) -> Self {
        Self {
            base: SceneBase::new(DEFAULTS),
            count,
            resources: Resources::default(),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Default for ParticleScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for ParticleScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Particle
    }

    fn base(&self) -> &SceneBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create_resources(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let source = shader_source(SHADER);
        let program =
            backend.create_program(&ProgramDescriptor::new("particle", &source, ATTRIBUTES))?;
        self.resources.program = Some(program);

        let corners = backend.create_fullscreen_quad();
        self.resources.corners = Some(corners);

        let indices: Vec<f32> = (0..self.count).map(|i| i as f32).collect();
        let indices = backend.create_buffer(&indices, "particle_indices");
        self.resources.indices = Some(indices);

        self.resources.bindings = [("corner", corners), ("index", indices)]
            .into_iter()
            .filter_map(|(name, buffer)| {
                backend
                    .attribute_location(program, name)
                    .map(|location| (location, buffer))
            })
            .collect();
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn GraphicsBackend) {
        let Some(program) = self.resources.program else {
            return;
        };

        self.base.upload_uniforms(backend, program);

        backend.additive_blend();
        backend.draw(&DrawCall::new(program, &self.resources.bindings, 6).instanced(self.count));
        backend.standard_blend();
    }

    fn release_resources(&mut self, backend: &mut dyn GraphicsBackend) {
        for buffer in [self.resources.corners.take(), self.resources.indices.take()]
            .into_iter()
            .flatten()
        {
            backend.delete_buffer(buffer);
        }
        if let Some(program) = self.resources.program.take() {
            backend.delete_program(program);
        }
        self.resources.bindings.clear();
    }
}
