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

//! Defines the main descriptor for creating a graphics pipeline.

use super::enums::PrimitiveTopology;
use super::state::*;
use crate::renderer::api::binding::ResourceLayoutId;
use crate::renderer::api::shader::ShaderId;

/// A complete description of a graphics pipeline.
///
/// The GL backend links the listed shaders into one program when the pipeline
/// is first bound, binding each vertex attribute name to its input slot and
/// discovering the uniform blocks and sampler uniforms named by the resource
/// layouts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The blend state.
    pub blend_state: BlendStateDescriptor,
    /// The depth state.
    pub depth_stencil_state: DepthStencilStateDescriptor,
    /// The rasterizer state.
    pub rasterizer_state: RasterizerStateDescriptor,
    /// How vertices are assembled into primitives.
    pub primitive_topology: PrimitiveTopology,
    /// One layout per vertex buffer slot.
    pub vertex_layouts: Vec<VertexBufferLayoutDescriptor>,
    /// The shader stages linked into the pipeline.
    pub shaders: Vec<ShaderId>,
    /// One resource layout per resource set slot.
    pub resource_layouts: Vec<ResourceLayoutId>,
}

impl PipelineDescriptor {
    /// Total number of vertex attributes across every vertex layout.
    pub fn vertex_attribute_count(&self) -> u32 {
        self.vertex_layouts
            .iter()
            .map(|layout| layout.attributes.len() as u32)
            .sum()
    }
}

/// An opaque handle to a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub usize);
