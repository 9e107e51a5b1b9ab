//! Layered interference waves drawn over a fullscreen quad.

use super::params::{COLOR_SHIFT, INTENSITY, SPEED};
use super::{shader_source, Scene, SceneBase, SceneKind};
use crate::gpu::{
    BufferId, DrawCall, GpuError, GraphicsBackend, ProgramDescriptor, ProgramId, VertexAttribute,
};

const SHADER: &str = include_str!("shaders/wave.wgsl");
const ATTRIBUTES: &[VertexAttribute] = &[VertexAttribute::per_vertex("position", 2)];
const DEFAULTS: &[(&str, f32)] = &[(INTENSITY, 0.7), (SPEED, 1.0), (COLOR_SHIFT, 0.0)];

#[derive(Debug, Default)]
struct Resources {
    program: Option<ProgramId>,
    quad: Option<BufferId>,
    position: Option<u32>,
}

pub struct WaveScene {
    base: SceneBase,
    resources: Resources,
}

impl WaveScene {
    pub fn new() -> Self {
        Self {
            base: SceneBase::new(DEFAULTS),
            resources: Resources::default(),
        }
    }
}

impl Default for WaveScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for WaveScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Wave
    }

    fn base(&self) -> &SceneBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create_resources(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let source = shader_source(SHADER);
        let program = backend.create_program(&ProgramDescriptor::new("wave", &source, ATTRIBUTES))?;
        self.resources.program = Some(program);
        self.resources.quad = Some(backend.create_fullscreen_quad());
        self.resources.position = backend.attribute_location(program, "position");
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn GraphicsBackend) {
        let (Some(program), Some(quad), Some(position)) = (
            self.resources.program,
            self.resources.quad,
            self.resources.position,
        ) else {
            return;
        };

        self.base.upload_uniforms(backend, program);
        backend.draw(&DrawCall::new(program, &[(position, quad)], 6));
    }

    fn release_resources(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(quad) = self.resources.quad.take() {
            backend.delete_buffer(quad);
        }
        if let Some(program) = self.resources.program.take() {
            backend.delete_program(program);
        }
        self.resources.position = None;
    }
}
