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

//! Resource layouts and resource sets: how shader-visible resources are grouped.

use super::buffer::BufferId;
use super::texture::{SamplerId, TextureViewId};
use super::util::ShaderStageFlags;

/// The kind of resource a layout element expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A uniform (constant) buffer block.
    UniformBuffer,
    /// A texture view sampled by shaders.
    TextureReadOnly,
    /// A sampler, applied to the texture declared just before it.
    Sampler,
}

/// One named entry of a [`ResourceLayoutDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLayoutElement {
    /// The name of the uniform block or sampler uniform in the shader source.
    pub name: String,
    /// The kind of resource bound at this element.
    pub kind: ResourceKind,
    /// The stages that read this element.
    pub stages: ShaderStageFlags,
    /// The declared size of a uniform block in bytes (0 when unknown).
    pub uniform_size: u32,
}

impl ResourceLayoutElement {
    /// Creates an element visible to the vertex and fragment stages.
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            stages: ShaderStageFlags::VERTEX_FRAGMENT,
            uniform_size: 0,
        }
    }

    /// Sets the declared size of a uniform block.
    pub fn with_uniform_size(mut self, size: u32) -> Self {
        self.uniform_size = size;
        self
    }
}

/// A descriptor used to create a [`ResourceLayoutId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLayoutDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The elements, in binding order.
    pub elements: Vec<ResourceLayoutElement>,
}

/// A single resource bound into a resource set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindableResource {
    /// A uniform buffer.
    Buffer(BufferId),
    /// A sampled texture view.
    TextureView(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
}

impl BindableResource {
    /// The layout element kind this resource satisfies.
    pub const fn kind(&self) -> ResourceKind {
        match self {
            BindableResource::Buffer(_) => ResourceKind::UniformBuffer,
            BindableResource::TextureView(_) => ResourceKind::TextureReadOnly,
            BindableResource::Sampler(_) => ResourceKind::Sampler,
        }
    }
}

/// A descriptor used to create a [`ResourceSetId`].
///
/// `resources[i]` is bound to `elements[i]` of the layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceSetDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The layout the set conforms to.
    pub layout: ResourceLayoutId,
    /// The bound resources, one per layout element.
    pub resources: Vec<BindableResource>,
}

/// An opaque handle to a resource layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceLayoutId(pub usize);

/// An opaque handle to a resource set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceSetId(pub usize);
