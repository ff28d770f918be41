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

//! State descriptors for the pipeline.

use super::enums::*;
use crate::math::LinearRgba;

/// Describes a single vertex attribute within a vertex buffer layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    /// The attribute name in the vertex shader, bound to its input slot at link time.
    pub name: String,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The byte offset from the start of the element, or 0 to pack the attribute
    /// directly after the previous one.
    pub offset: u32,
}

impl VertexAttributeDescriptor {
    /// Creates a packed attribute (offset computed from its predecessors).
    pub fn new(name: impl Into<String>, format: VertexFormat) -> Self {
        Self {
            name: name.into(),
            format,
            offset: 0,
        }
    }
}

/// Describes the memory layout of a single vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayoutDescriptor {
    /// The byte distance between consecutive elements. 0 defers to the stride
    /// recorded with the vertex buffer binding.
    pub array_stride: u32,
    /// How often the vertex buffer is advanced.
    pub step_mode: VertexStepMode,
    /// For [`VertexStepMode::Instance`], the number of instances drawn per element.
    pub instance_step_rate: u32,
    /// The attributes contained within each element of the buffer.
    pub attributes: Vec<VertexAttributeDescriptor>,
}

impl VertexBufferLayoutDescriptor {
    /// A per-vertex layout whose stride is the packed size of its attributes.
    pub fn per_vertex(attributes: Vec<VertexAttributeDescriptor>) -> Self {
        let array_stride = attributes.iter().map(|a| a.format.size()).sum();
        Self {
            array_stride,
            step_mode: VertexStepMode::Vertex,
            instance_step_rate: 0,
            attributes,
        }
    }

    /// The attribute divisor implied by the step mode.
    pub fn divisor(&self) -> u32 {
        match self.step_mode {
            VertexStepMode::Vertex => 0,
            VertexStepMode::Instance => self.instance_step_rate.max(1),
        }
    }
}

/// One half (color or alpha) of a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// The factor applied to the fragment's output.
    pub src_factor: BlendFactor,
    /// The factor applied to the value already in the target.
    pub dst_factor: BlendFactor,
    /// How the two weighted values are combined.
    pub operation: BlendOperation,
}

impl BlendComponent {
    /// `src * 1 + dst * 0`: the fragment replaces the target.
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };
    /// Standard "over" compositing with straight alpha.
    pub const OVER: Self = Self {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };
}

/// The blend configuration of a single color attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendAttachmentState {
    /// Whether blending is enabled for the attachment.
    pub enabled: bool,
    /// The color blend equation.
    pub color: BlendComponent,
    /// The alpha blend equation.
    pub alpha: BlendComponent,
}

impl BlendAttachmentState {
    /// Blending disabled; the fragment overwrites the target.
    pub const OVERRIDE: Self = Self {
        enabled: false,
        color: BlendComponent::REPLACE,
        alpha: BlendComponent::REPLACE,
    };
    /// Straight-alpha blending.
    pub const ALPHA_BLEND: Self = Self {
        enabled: true,
        color: BlendComponent::OVER,
        alpha: BlendComponent::OVER,
    };
}

/// The blend state of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlendStateDescriptor {
    /// The constant used by [`BlendFactor::Constant`].
    pub blend_factor: LinearRgba,
    /// One entry per color attachment.
    pub attachments: Vec<BlendAttachmentState>,
}

impl Default for BlendStateDescriptor {
    fn default() -> Self {
        Self {
            blend_factor: LinearRgba::TRANSPARENT,
            attachments: vec![BlendAttachmentState::OVERRIDE],
        }
    }
}

/// The depth state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateDescriptor {
    /// Whether fragments are tested against the depth buffer.
    pub depth_test_enabled: bool,
    /// Whether passing fragments write their depth.
    pub depth_write_enabled: bool,
    /// The depth comparison.
    pub depth_compare: CompareFunction,
}

impl Default for DepthStencilStateDescriptor {
    fn default() -> Self {
        Self {
            depth_test_enabled: true,
            depth_write_enabled: true,
            depth_compare: CompareFunction::LessEqual,
        }
    }
}

/// The rasterizer state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerStateDescriptor {
    /// Which faces are culled.
    pub cull_mode: CullMode,
    /// How polygons are filled.
    pub fill_mode: PolygonMode,
    /// The winding of front faces.
    pub front_face: FrontFace,
    /// If `false`, fragments outside the depth range are clamped instead of clipped.
    pub depth_clip_enabled: bool,
    /// Whether the scissor rectangle is applied.
    pub scissor_test_enabled: bool,
}

impl Default for RasterizerStateDescriptor {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            fill_mode: PolygonMode::Fill,
            front_face: FrontFace::Cw,
            depth_clip_enabled: true,
            scissor_test_enabled: false,
        }
    }
}
