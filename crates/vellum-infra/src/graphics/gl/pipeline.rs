// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Native program objects and the binding tables discovered at link time.

use std::sync::Arc;

use vellum_core::renderer::api::{
    PipelineDescriptor, ResourceKind, ResourceLayoutDescriptor, ResourceLayoutId,
};

use super::consts as gl;
use super::context::{GlContext, NativeProgram, NativeUniformLocation};
use super::conversions::IntoGl;
use super::error::{ErrorChecker, GlError, GlResult};
use super::shader::GlShader;

/// Where one element of a resource layout lands in the linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSlot {
    /// A uniform block.
    UniformBuffer {
        name: String,
        block_index: u32,
        /// Global binding point: the set's uniform base plus the element's relative index.
        binding_index: u32,
        block_size: u32,
    },
    /// A sampled texture, read through a sampler uniform.
    Texture {
        name: String,
        location: NativeUniformLocation,
        unit: u32,
    },
    /// A sampler, applied to the unit of the texture declared before it in the same layout.
    Sampler { unit: u32 },
}

impl BindingSlot {
    pub fn kind(&self) -> ResourceKind {
        match self {
            BindingSlot::UniformBuffer { .. } => ResourceKind::UniformBuffer,
            BindingSlot::Texture { .. } => ResourceKind::TextureReadOnly,
            BindingSlot::Sampler { .. } => ResourceKind::Sampler,
        }
    }
}

/// The binding table of one resource set slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBindings {
    pub layout: ResourceLayoutId,
    pub slots: Vec<BindingSlot>,
}

/// A linked program together with the state it applies.
#[derive(Debug)]
pub struct GlPipeline {
    pub program: NativeProgram,
    pub description: Arc<PipelineDescriptor>,
    pub primitive_type: u32,
    pub set_bindings: Vec<SetBindings>,
    pub vertex_attribute_count: u32,
}

impl GlPipeline {
    /// Links `shaders` into a program and resolves every layout element against it.
    pub(crate) fn realize(
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        description: &Arc<PipelineDescriptor>,
        shaders: &[GlShader],
        layouts: &[(ResourceLayoutId, Arc<ResourceLayoutDescriptor>)],
    ) -> GlResult<Self> {
        let label = description
            .label
            .clone()
            .unwrap_or_else(|| "unnamed pipeline".to_string());

        let program = gl.create_program().map_err(GlError::Creation)?;
        for shader in shaders {
            gl.attach_shader(program, shader.name);
        }

        let attribute_names = description
            .vertex_layouts
            .iter()
            .flat_map(|layout| layout.attributes.iter().map(|attr| attr.name.as_str()));
        let mut vertex_attribute_count = 0;
        for (location, name) in attribute_names.enumerate() {
            gl.bind_attrib_location(program, location as u32, name);
            vertex_attribute_count += 1;
        }

        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            log::error!("GlPipeline: '{label}' failed to link: {log}");
            return Err(GlError::ProgramLink { label, log });
        }
        checker.check_native_error(gl, "link_program")?;

        let set_bindings = match resolve_bindings(gl, program, layouts) {
            Ok(bindings) => bindings,
            Err(err) => {
                gl.delete_program(program);
                return Err(err);
            }
        };

        Ok(Self {
            program,
            description: Arc::clone(description),
            primitive_type: description.primitive_topology.into_gl(),
            set_bindings,
            vertex_attribute_count,
        })
    }

    pub(crate) fn destroy(&self, gl: &mut dyn GlContext) {
        gl.delete_program(self.program);
    }
}

/// Assigns uniform binding points and texture units across every set of the pipeline.
fn resolve_bindings(
    gl: &mut dyn GlContext,
    program: NativeProgram,
    layouts: &[(ResourceLayoutId, Arc<ResourceLayoutDescriptor>)],
) -> GlResult<Vec<SetBindings>> {
    let mut next_binding_index = 0u32;
    let mut next_unit = 0u32;
    let mut sets = Vec::with_capacity(layouts.len());

    for (set, (layout_id, layout)) in layouts.iter().enumerate() {
        let set = set as u32;
        let mut last_texture_unit = None;
        let mut slots = Vec::with_capacity(layout.elements.len());

        for (slot, element) in layout.elements.iter().enumerate() {
            let slot = slot as u32;
            let missing = GlError::MissingBinding {
                kind: element.kind,
                set,
                slot,
            };
            let binding = match element.kind {
                ResourceKind::UniformBuffer => {
                    let block_index = gl
                        .get_uniform_block_index(program, &element.name)
                        .ok_or(missing)?;
                    let block_size = if element.uniform_size > 0 {
                        element.uniform_size
                    } else {
                        gl.get_active_uniform_block_size(program, block_index).max(0) as u32
                    };
                    let binding_index = next_binding_index;
                    next_binding_index += 1;
                    BindingSlot::UniformBuffer {
                        name: element.name.clone(),
                        block_index,
                        binding_index,
                        block_size,
                    }
                }
                ResourceKind::TextureReadOnly => {
                    let location = gl
                        .get_uniform_location(program, &element.name)
                        .ok_or(missing)?;
                    let unit = next_unit;
                    next_unit += 1;
                    last_texture_unit = Some(unit);
                    BindingSlot::Texture {
                        name: element.name.clone(),
                        location,
                        unit,
                    }
                }
                ResourceKind::Sampler => BindingSlot::Sampler {
                    unit: last_texture_unit.ok_or(missing)?,
                },
            };
            slots.push(binding);
        }

        sets.push(SetBindings {
            layout: *layout_id,
            slots,
        });
    }

    log::trace!(
        "GlPipeline: resolved {} uniform blocks and {} texture units",
        next_binding_index,
        next_unit
    );
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gl::headless::HeadlessGlContext;
    use crate::graphics::gl::settings::ErrorCheckMode;
    use vellum_core::renderer::api::{
        ResourceLayoutElement, ShaderDescriptor, ShaderStage, VertexAttributeDescriptor,
        VertexBufferLayoutDescriptor, VertexFormat,
    };

    const VERTEX: &str = "\
in vec3 Position;
in vec2 TexCoord;
uniform Camera { mat4 view_proj; };
void main() {}
";
    const FRAGMENT: &str = "\
uniform sampler2D Albedo;
uniform sampler2D Normal;
void main() {}
";

    fn checker() -> ErrorChecker {
        ErrorChecker::new(ErrorCheckMode::Always)
    }

    fn compile(gl: &mut HeadlessGlContext, stage: ShaderStage, source: &str) -> GlShader {
        GlShader::realize(gl, checker(), &ShaderDescriptor::new(stage, source)).unwrap()
    }

    fn layout(elements: Vec<ResourceLayoutElement>) -> Arc<ResourceLayoutDescriptor> {
        Arc::new(ResourceLayoutDescriptor {
            label: None,
            elements,
        })
    }

    fn description() -> Arc<PipelineDescriptor> {
        Arc::new(PipelineDescriptor {
            label: Some("Lit".to_string()),
            blend_state: Default::default(),
            depth_stencil_state: Default::default(),
            rasterizer_state: Default::default(),
            primitive_topology: Default::default(),
            vertex_layouts: vec![VertexBufferLayoutDescriptor::per_vertex(vec![
                VertexAttributeDescriptor::new("Position", VertexFormat::Float32x3),
                VertexAttributeDescriptor::new("TexCoord", VertexFormat::Float32x2),
            ])],
            shaders: Vec::new(),
            resource_layouts: Vec::new(),
        })
    }

    #[test]
    fn bindings_accumulate_across_sets() {
        let mut gl = HeadlessGlContext::new();
        let shaders = [
            compile(&mut gl, ShaderStage::Vertex, VERTEX),
            compile(&mut gl, ShaderStage::Fragment, FRAGMENT),
        ];
        let layouts = [
            (
                ResourceLayoutId(0),
                layout(vec![
                    ResourceLayoutElement::new("Camera", ResourceKind::UniformBuffer)
                        .with_uniform_size(64),
                    ResourceLayoutElement::new("Albedo", ResourceKind::TextureReadOnly),
                    ResourceLayoutElement::new("AlbedoSampler", ResourceKind::Sampler),
                ]),
            ),
            (
                ResourceLayoutId(1),
                layout(vec![
                    ResourceLayoutElement::new("Normal", ResourceKind::TextureReadOnly),
                    ResourceLayoutElement::new("NormalSampler", ResourceKind::Sampler),
                ]),
            ),
        ];

        let pipeline =
            GlPipeline::realize(&mut gl, checker(), &description(), &shaders, &layouts).unwrap();

        assert_eq!(pipeline.vertex_attribute_count, 2);
        assert_eq!(pipeline.primitive_type, gl::TRIANGLES);
        assert!(matches!(
            pipeline.set_bindings[0].slots[0],
            BindingSlot::UniformBuffer {
                binding_index: 0,
                block_size: 64,
                ..
            }
        ));
        assert_eq!(
            pipeline.set_bindings[0].slots[2],
            BindingSlot::Sampler { unit: 0 }
        );
        assert_eq!(
            pipeline.set_bindings[1].slots[1],
            BindingSlot::Sampler { unit: 1 }
        );
    }

    #[test]
    fn missing_uniform_names_the_slot() {
        let mut gl = HeadlessGlContext::new();
        let shaders = [compile(&mut gl, ShaderStage::Fragment, FRAGMENT)];
        let layouts = [(
            ResourceLayoutId(0),
            layout(vec![
                ResourceLayoutElement::new("Albedo", ResourceKind::TextureReadOnly),
                ResourceLayoutElement::new("Roughness", ResourceKind::TextureReadOnly),
            ]),
        )];

        let err = GlPipeline::realize(&mut gl, checker(), &description(), &shaders, &layouts)
            .unwrap_err();

        assert_eq!(err.to_string(), "there is no texture in set 0, slot 1");
        assert_eq!(gl.program_count(), 0);
    }

    #[test]
    fn sampler_without_a_texture_is_rejected() {
        let mut gl = HeadlessGlContext::new();
        let shaders = [compile(&mut gl, ShaderStage::Fragment, FRAGMENT)];
        let layouts = [(
            ResourceLayoutId(0),
            layout(vec![ResourceLayoutElement::new(
                "Lonely",
                ResourceKind::Sampler,
            )]),
        )];

        let err = GlPipeline::realize(&mut gl, checker(), &description(), &shaders, &layouts)
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::MissingBinding {
                kind: ResourceKind::Sampler,
                set: 0,
                slot: 0
            }
        ));
    }
}
