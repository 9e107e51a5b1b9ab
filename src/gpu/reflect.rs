//! WGSL compilation and interface reflection.
//!
//! Programs are parsed and validated with naga before any GPU object is
//! created, so a bad shader fails with the compiler log instead of a
//! device-level validation panic. The same pass resolves vertex input
//! locations and the layout of the uniform block, which both backends use
//! to address uniforms by name.

use super::backend::{ProgramDescriptor, StepMode, UniformKind};
use super::context::GpuError;
use naga::{AddressSpace, Binding, ScalarKind, ShaderStage, TypeInner, VectorSize};
use std::collections::HashMap;

/// A shader failed to parse or validate.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Shader compilation failed for '{program}':\n{log}")]
pub struct ShaderError {
    pub program: String,
    pub log: String,
}

/// Stages compiled but cannot be assembled into a program.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Program link failed for '{program}': {log}")]
pub struct LinkError {
    pub program: String,
    pub log: String,
}

/// Byte offset and shape of a member of the uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// A vertex attribute that matched a shader input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub location: u32,
    pub components: u32,
    pub step: StepMode,
}

/// Interface of a linked program.
#[derive(Debug, Clone, Default)]
pub struct ShaderReflection {
    /// Size of the `@group(0) @binding(0)` uniform block, 0 if there is none.
    pub uniform_block_size: u32,
    /// Resolved attributes in descriptor order; one vertex buffer slot each.
    pub vertex_layout: Vec<ResolvedAttribute>,
    uniforms: HashMap<String, UniformSlot>,
    inputs: HashMap<String, (u32, u32)>,
}

impl ShaderReflection {
    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.inputs.get(name).map(|&(location, _)| location)
    }

    pub fn has_uniform_block(&self) -> bool {
        self.uniform_block_size > 0
    }
}

/// Parse, validate and link a program description.
pub fn compile(desc: &ProgramDescriptor<'_>) -> Result<ShaderReflection, GpuError> {
    let module = naga::front::wgsl::parse_str(desc.source).map_err(|e| ShaderError {
        program: desc.label.to_string(),
        log: e.emit_to_string(desc.source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ShaderError {
        program: desc.label.to_string(),
        log: e.emit_to_string(desc.source),
    })?;

    let link_error = |log: String| LinkError {
        program: desc.label.to_string(),
        log,
    };

    let vertex = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == ShaderStage::Vertex && ep.name == desc.vertex_entry)
        .ok_or_else(|| link_error(format!("no vertex entry point `{}`", desc.vertex_entry)))?;

    if !module
        .entry_points
        .iter()
        .any(|ep| ep.stage == ShaderStage::Fragment && ep.name == desc.fragment_entry)
    {
        return Err(link_error(format!("no fragment entry point `{}`", desc.fragment_entry)).into());
    }

    let mut reflection = ShaderReflection::default();

    for arg in &vertex.function.arguments {
        let arg_type = &module.types[arg.ty].inner;
        match (&arg.name, &arg.binding) {
            (Some(name), Some(Binding::Location { location, .. })) => {
                if let Some(components) = component_count(arg_type) {
                    reflection.inputs.insert(name.clone(), (*location, components));
                }
            }
            // Inputs grouped in a struct carry their locations on the members
            (_, None) => {
                if let TypeInner::Struct { members, .. } = arg_type {
                    for member in members {
                        if let (Some(name), Some(Binding::Location { location, .. })) =
                            (&member.name, &member.binding)
                        {
                            if let Some(components) = component_count(&module.types[member.ty].inner) {
                                reflection.inputs.insert(name.clone(), (*location, components));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    for attribute in desc.attributes {
        let Some(&(location, components)) = reflection.inputs.get(attribute.name) else {
            continue;
        };
        if components != attribute.components {
            return Err(link_error(format!(
                "attribute `{}` declared with {} components but the shader reads {}",
                attribute.name, attribute.components, components
            ))
            .into());
        }
        reflection.vertex_layout.push(ResolvedAttribute {
            location,
            components,
            step: attribute.step,
        });
    }

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if binding.group != 0 || binding.binding != 0 || var.space != AddressSpace::Uniform {
            return Err(link_error(format!(
                "unsupported resource `{}` at @group({}) @binding({}); only a uniform block at @group(0) @binding(0) is bound",
                var.name.as_deref().unwrap_or("<anonymous>"),
                binding.group,
                binding.binding
            ))
            .into());
        }

        let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err(link_error("uniform block must be a struct".to_string()).into());
        };

        reflection.uniform_block_size = *span;
        for member in members {
            let Some(name) = &member.name else {
                continue;
            };
            if let Some(kind) = uniform_kind(&module.types[member.ty].inner) {
                reflection.uniforms.insert(
                    name.clone(),
                    UniformSlot {
                        offset: member.offset,
                        kind,
                    },
                );
            }
        }
    }

    Ok(reflection)
}

fn vector_len(size: VectorSize) -> u32 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

fn component_count(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(scalar) if scalar.kind == ScalarKind::Float => Some(1),
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => {
            Some(vector_len(*size))
        }
        _ => None,
    }
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Float => Some(UniformKind::Float),
            ScalarKind::Sint => Some(UniformKind::Int),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => match size {
            VectorSize::Bi => Some(UniformKind::Vec2),
            VectorSize::Tri => Some(UniformKind::Vec3),
            VectorSize::Quad => Some(UniformKind::Vec4),
        },
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar.kind == ScalarKind::Float => Some(UniformKind::Mat4),
        _ => None,
    }
}
