//! Julia/Mandelbrot escape-time field drawn over a fullscreen quad.

use super::params::{COLOR_SHIFT, INTENSITY, SPEED};
use super::{shader_source, Scene, SceneBase, SceneKind};
use crate::gpu::{
    BufferId, DrawCall, GpuError, GraphicsBackend, ProgramDescriptor, ProgramId, VertexAttribute,
};

const SHADER: &str = include_str!("shaders/fractal.wgsl");
const ATTRIBUTES: &[VertexAttribute] = &[VertexAttribute::per_vertex("position", 2)];
const DEFAULTS: &[(&str, f32)] = &[(INTENSITY, 0.9), (SPEED, 1.0), (COLOR_SHIFT, 0.0)];

pub struct FractalScene {
    base: SceneBase,
    program: Option<ProgramId>,
    quad: Option<BufferId>,
}

impl FractalScene {
    pub fn new() -> Self {
        Self {
            base: SceneBase::new(DEFAULTS),
            program: None,
            quad: None,
        }
    }
}

impl Default for FractalScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for FractalScene {
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
        let source = shader_source(SHADER);
        self.program =
            Some(backend.create_program(&ProgramDescriptor::new("fractal", &source, ATTRIBUTES))?);
        self.quad = Some(backend.create_fullscreen_quad());
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn GraphicsBackend) {
        let (Some(program), Some(quad)) = (self.program, self.quad) else {
            return;
        };
        let Some(position) = backend.attribute_location(program, "position") else {
            return;
        };

        self.base.upload_uniforms(backend, program);
        backend.draw(&DrawCall::new(program, &[(position, quad)], 6));
    }

    fn release_resources(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(quad) = self.quad.take() {
            backend.delete_buffer(quad);
        }
        if let Some(program) = self.program.take() {
            backend.delete_program(program);
        }
    }
}
