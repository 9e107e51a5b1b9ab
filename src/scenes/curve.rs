//! Lissajous figure: a line strip underneath additive glowing points.

use super::params::{COLOR_SHIFT, INTENSITY, SPEED};
use super::{shader_source, Scene, SceneBase, SceneKind};
use crate::gpu::{
    BufferId, DrawCall, GpuError, GraphicsBackend, ProgramDescriptor, ProgramId, Topology,
    VertexAttribute,
};

const SHADER: &str = include_str!("shaders/curve.wgsl");
const LINE_ATTRIBUTES: &[VertexAttribute] = &[VertexAttribute::per_vertex("index", 1)];
const POINT_ATTRIBUTES: &[VertexAttribute] = &[
    VertexAttribute::per_vertex("corner", 2),
    VertexAttribute::per_instance("index", 1),
];
const DEFAULTS: &[(&str, f32)] = &[(INTENSITY, 0.8), (SPEED, 1.0), (COLOR_SHIFT, 0.0)];

/// Samples along the curve.
pub const CURVE_POINTS: u32 = 1000;

#[derive(Debug, Default)]
struct Resources {
    line: Option<ProgramId>,
    point: Option<ProgramId>,
    indices: Option<BufferId>,
    corners: Option<BufferId>,
    line_bindings: Vec<(u32, BufferId)>,
    point_bindings: Vec<(u32, BufferId)>,
}

pub struct CurveScene {
    base: SceneBase,
    resources: Resources,
}

impl CurveScene {
    pub fn new() -> Self {
        Self {
            base: SceneBase::new(DEFAULTS),
            resources: Resources::default(),
        }
    }
}

impl Default for CurveScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for CurveScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Curve
    }

    fn base(&self) -> &SceneBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create_resources(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let source = shader_source(SHADER);

        let mut line_desc = ProgramDescriptor::new("curve_line", &source, LINE_ATTRIBUTES)
            .topology(Topology::LineStrip);
        line_desc.vertex_entry = "vs_line";
        line_desc.fragment_entry = "fs_line";
        let line = backend.create_program(&line_desc)?;
        self.resources.line = Some(line);

        let mut point_desc = ProgramDescriptor::new("curve_point", &source, POINT_ATTRIBUTES);
        point_desc.vertex_entry = "vs_point";
        point_desc.fragment_entry = "fs_point";
        let point = backend.create_program(&point_desc)?;
        self.resources.point = Some(point);

        let indices: Vec<f32> = (0..CURVE_POINTS).map(|i| i as f32).collect();
        let indices = backend.create_buffer(&indices, "curve_indices");
        self.resources.indices = Some(indices);
        let corners = backend.create_fullscreen_quad();
        self.resources.corners = Some(corners);

        self.resources.line_bindings = backend
            .attribute_location(line, "index")
            .map(|location| (location, indices))
            .into_iter()
            .collect();
        self.resources.point_bindings = [("corner", corners), ("index", indices)]
            .into_iter()
            .filter_map(|(name, buffer)| {
                backend
                    .attribute_location(point, name)
                    .map(|location| (location, buffer))
            })
            .collect();
        Ok(())
    }

    fn draw(&mut self, backend: &mut dyn GraphicsBackend) {
        let (Some(line), Some(point)) = (self.resources.line, self.resources.point) else {
            return;
        };

        self.base.upload_uniforms(backend, line);
        backend.draw(&DrawCall::new(line, &self.resources.line_bindings, CURVE_POINTS));

        self.base.upload_uniforms(backend, point);
        backend.additive_blend();
        backend.draw(&DrawCall::new(point, &self.resources.point_bindings, 6).instanced(CURVE_POINTS));
        backend.standard_blend();
    }

    fn release_resources(&mut self, backend: &mut dyn GraphicsBackend) {
        for buffer in [self.resources.indices.take(), self.resources.corners.take()]
            .into_iter()
            .flatten()
        {
            backend.delete_buffer(buffer);
        }
        for program in [self.resources.line.take(), self.resources.point.take()]
            .into_iter()
            .flatten()
        {
            backend.delete_program(program);
        }
        self.resources.line_bindings.clear();
        self.resources.point_bindings.clear();
    }
}
