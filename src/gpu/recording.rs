//! A [`GraphicsBackend`] that records commands instead of rendering.
//!
//! Shader compilation, reflection, uniform resolution and resource
//! bookkeeping behave exactly as on the GPU, which makes this backend
//! suitable for tests, benches and dry runs on machines without an adapter.

use super::backend::{
    clamp_counts, BlendMode, BufferId, DrawCall, GraphicsBackend, ProgramDescriptor, ProgramId,
    UniformValue,
};
use super::context::GpuError;
use super::reflect::{compile, ShaderReflection};
use super::uniforms::UniformBlock;
use std::collections::HashMap;

/// One recorded backend operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProgram { id: ProgramId, label: String },
    DeleteProgram(ProgramId),
    CreateBuffer { id: BufferId, label: String, len: usize },
    DeleteBuffer(BufferId),
    SetUniform { program: ProgramId, name: String, value: UniformValue },
    Blend(BlendMode),
    Clear([f32; 4]),
    Resize { width: u32, height: u32 },
    Draw(RecordedDraw),
    Dispose,
}

/// A draw as it would have been issued, after count clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramId,
    pub vertices: u32,
    pub instances: u32,
    pub blend: BlendMode,
}

/// Command history, optionally bounded.
///
/// A bounded log discards its oldest half once it reaches the limit, so
/// memory stays flat over long runs.
#[derive(Debug, Default)]
struct CommandLog {
    entries: Vec<Command>,
    limit: Option<usize>,
}

impl CommandLog {
    fn push(&mut self, command: Command) {
        if let Some(limit) = self.limit {
            if self.entries.len() >= limit {
                let stale = (limit / 2).max(1).min(self.entries.len());
                self.entries.drain(..stale);
            }
        }
        self.entries.push(command);
    }
}

struct RecordedProgram {
    label: String,
    reflection: ShaderReflection,
    uniforms: UniformBlock,
}

pub struct RecordingBackend {
    width: u32,
    height: u32,
    blend: BlendMode,
    programs: HashMap<ProgramId, RecordedProgram>,
    names: HashMap<String, ProgramId>,
    buffers: HashMap<BufferId, usize>,
    next_id: u32,
    commands: CommandLog,
    total_draws: u64,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            blend: BlendMode::Standard,
            programs: HashMap::new(),
            names: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 1,
            commands: CommandLog::default(),
            total_draws: 0,
        }
    }

    /// Keep at most `limit` recent commands instead of the full history.
    pub fn with_command_limit(mut self, limit: usize) -> Self {
        let limit = limit.max(1);
        self.commands.limit = Some(limit);
        if self.commands.entries.len() > limit {
            let stale = self.commands.entries.len() - limit;
            self.commands.entries.drain(..stale);
        }
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands.entries
    }

    /// Drain the command log, leaving resources untouched.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands.entries)
    }

    /// Draws issued since creation, including any no longer in the log.
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.commands
            .entries
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Draw(draw) => Some(*draw),
                _ => None,
            })
            .collect()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn program_label(&self, program: ProgramId) -> Option<&str> {
        self.programs.get(&program).map(|p| p.label.as_str())
    }

    /// Current CPU-side contents of a program's uniform block.
    pub fn uniform_bytes(&self, program: ProgramId) -> Option<&[u8]> {
        self.programs.get(&program).map(|p| p.uniforms.bytes())
    }

    /// Read back a `Float` uniform as last written.
    pub fn uniform_f32(&self, program: ProgramId, name: &str) -> Option<f32> {
        let entry = self.programs.get(&program)?;
        let slot = entry.reflection.uniform(name)?;
        let start = slot.offset as usize;
        let bytes: [u8; 4] = entry.uniforms.bytes().get(start..start + 4)?.try_into().ok()?;
        Some(f32::from_le_bytes(bytes))
    }

    pub fn cached_uniform_locations(&self, program: ProgramId) -> usize {
        self.programs
            .get(&program)
            .map_or(0, |p| p.uniforms.cached_locations())
    }

    fn next_handle(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<ProgramId, GpuError> {
        let reflection = compile(desc)?;
        let uniforms = UniformBlock::new(&reflection);
        let id = ProgramId(self.next_handle());

        self.names.insert(desc.label.to_string(), id);
        self.programs.insert(
            id,
            RecordedProgram {
                label: desc.label.to_string(),
                reflection,
                uniforms,
            },
        );
        self.commands.push(Command::CreateProgram {
            id,
            label: desc.label.to_string(),
        });
        Ok(id)
    }

    fn program_by_name(&self, label: &str) -> Option<ProgramId> {
        self.names.get(label).copied()
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(entry) = self.programs.remove(&program) {
            if self.names.get(&entry.label) == Some(&program) {
                self.names.remove(&entry.label);
            }
            self.commands.push(Command::DeleteProgram(program));
        }
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs.get(&program)?.reflection.attribute_location(name)
    }

    fn create_buffer(&mut self, data: &[f32], label: &str) -> BufferId {
        let id = BufferId(self.next_handle());
        self.buffers.insert(id, data.len());
        self.commands.push(Command::CreateBuffer {
            id,
            label: label.to_string(),
            len: data.len(),
        });
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            self.commands.push(Command::DeleteBuffer(buffer));
        }
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        let Some(entry) = self.programs.get_mut(&program) else {
            return;
        };
        if entry.uniforms.write(&entry.reflection, name, value) {
            self.commands.push(Command::SetUniform {
                program,
                name: name.to_string(),
                value,
            });
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        let Some(entry) = self.programs.get(&call.program) else {
            log::warn!("Draw with unknown {}", call.program);
            return;
        };

        let buffers = &self.buffers;
        let draw = match clamp_counts(&entry.reflection.vertex_layout, call, |id| {
            buffers.get(&id).map(|&floats| (floats, ()))
        }) {
            Ok(draw) => draw,
            Err(location) => {
                log::warn!(
                    "Draw of '{}' skipped: nothing bound at location {}",
                    entry.label,
                    location
                );
                return;
            }
        };
        if draw.is_empty() {
            return;
        }

        self.total_draws += 1;
        self.commands.push(Command::Draw(RecordedDraw {
            program: call.program,
            vertices: draw.vertices,
            instances: draw.instances,
            blend: self.blend,
        }));
    }

    fn standard_blend(&mut self) {
        self.blend = BlendMode::Standard;
        self.commands.push(Command::Blend(BlendMode::Standard));
    }

    fn additive_blend(&mut self) {
        self.blend = BlendMode::Additive;
        self.commands.push(Command::Blend(BlendMode::Additive));
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(Command::Clear(color));
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.commands.push(Command::Resize { width, height });
        true
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn dispose(&mut self) {
        if self.programs.is_empty() && self.buffers.is_empty() {
            return;
        }
        self.programs.clear();
        self.names.clear();
        self.buffers.clear();
        self.blend = BlendMode::Standard;
        self.commands.push(Command::Dispose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::backend::VertexAttribute;

    const SOURCE: &str = r#"
struct Uniforms {
    time: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) seed: f32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position * seed, u.time, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    const ATTRS: &[VertexAttribute] = &[
        VertexAttribute::per_vertex("position", 2),
        VertexAttribute::per_instance("seed", 1),
    ];

    fn setup() -> (RecordingBackend, ProgramId) {
        let mut backend = RecordingBackend::new(640, 480);
        let program = backend
            .create_program(&ProgramDescriptor::new("sample", SOURCE, ATTRS))
            .unwrap();
        (backend, program)
    }

    #[test]
    fn test_draw_counts_are_clamped_to_buffers() {
        let (mut backend, program) = setup();
        let quad = backend.create_fullscreen_quad();
        let seeds = backend.create_buffer(&[0.1, 0.2, 0.3], "seeds");

        backend.draw(&DrawCall::new(program, &[(0, quad), (1, seeds)], 100).instanced(10));

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices, 6);
        assert_eq!(draws[0].instances, 3);
    }

    #[test]
    fn test_draw_without_required_buffer_is_skipped() {
        let (mut backend, program) = setup();
        let quad = backend.create_fullscreen_quad();

        backend.draw(&DrawCall::new(program, &[(0, quad)], 6));
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn test_draw_records_current_blend_mode() {
        let (mut backend, program) = setup();
        let quad = backend.create_fullscreen_quad();
        let seeds = backend.create_buffer(&[1.0], "seeds");
        let bindings = [(0, quad), (1, seeds)];

        backend.additive_blend();
        backend.draw(&DrawCall::new(program, &bindings, 6));
        backend.standard_blend();
        backend.draw(&DrawCall::new(program, &bindings, 6));

        let blends: Vec<_> = backend.draws().iter().map(|d| d.blend).collect();
        assert_eq!(blends, vec![BlendMode::Additive, BlendMode::Standard]);
    }

    #[test]
    fn test_uniform_writes_are_readable() {
        let (mut backend, program) = setup();

        backend.set_uniform(program, "time", UniformValue::Float(4.5));
        backend.set_uniform(program, "missing", UniformValue::Float(1.0));

        assert_eq!(backend.uniform_f32(program, "time"), Some(4.5));
        let writes = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::SetUniform { .. }))
            .count();
        assert_eq!(writes, 1);
    }

    #[test]
    fn test_delete_program_drops_name_and_cache() {
        let (mut backend, program) = setup();
        backend.set_uniform(program, "time", UniformValue::Float(1.0));
        assert_eq!(backend.cached_uniform_locations(program), 1);

        backend.delete_program(program);

        assert!(backend.program_by_name("sample").is_none());
        assert_eq!(backend.cached_uniform_locations(program), 0);
        assert_eq!(backend.program_count(), 0);
    }

    #[test]
    fn test_command_limit_bounds_history() {
        let mut backend = RecordingBackend::new(64, 64).with_command_limit(8);
        for i in 0..100 {
            backend.clear([i as f32, 0.0, 0.0, 1.0]);
        }

        let commands = backend.commands();
        assert!(commands.len() <= 8);
        assert_eq!(commands.last(), Some(&Command::Clear([99.0, 0.0, 0.0, 1.0])));
    }

    #[test]
    fn test_total_draws_survive_trimming() {
        let (backend, program) = setup();
        let mut backend = backend.with_command_limit(4);
        let quad = backend.create_fullscreen_quad();
        let seeds = backend.create_buffer(&[1.0], "seeds");
        for _ in 0..20 {
            backend.draw(&DrawCall::new(program, &[(0, quad), (1, seeds)], 6));
            backend.clear([0.0; 4]);
        }

        assert_eq!(backend.total_draws(), 20);
        assert!(backend.commands().len() <= 4);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut backend, _) = setup();
        backend.create_fullscreen_quad();

        backend.dispose();
        backend.dispose();

        let disposes = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Dispose))
            .count();
        assert_eq!(disposes, 1);
        assert_eq!(backend.buffer_count(), 0);
    }
}
