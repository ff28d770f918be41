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

//! Backend-agnostic resource descriptions, handles and command arguments.

pub mod binding;
pub mod buffer;
pub mod command;
pub mod framebuffer;
pub mod pipeline;
pub mod shader;
pub mod texture;
pub mod util;

pub use self::binding::*;
pub use self::buffer::*;
pub use self::command::*;
pub use self::framebuffer::*;
pub use self::pipeline::*;
pub use self::shader::*;
pub use self::texture::*;
pub use self::util::*;

/// A handle to any resource created through a
/// [`ResourceFactory`](crate::renderer::ResourceFactory).
///
/// Used where an operation (such as disposal) applies uniformly to every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceHandle {
    /// A GPU buffer.
    Buffer(BufferId),
    /// A texture.
    Texture(TextureId),
    /// A view over a texture.
    TextureView(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
    /// A single shader stage.
    Shader(ShaderId),
    /// A graphics pipeline.
    Pipeline(PipelineId),
    /// A resource layout.
    ResourceLayout(ResourceLayoutId),
    /// A resource set.
    ResourceSet(ResourceSetId),
    /// A framebuffer.
    Framebuffer(FramebufferId),
}

macro_rules! impl_into_handle {
    ($($id:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$id> for ResourceHandle {
                fn from(id: $id) -> Self {
                    ResourceHandle::$variant(id)
                }
            }
        )*
    };
}

impl_into_handle! {
    BufferId => Buffer,
    TextureId => Texture,
    TextureViewId => TextureView,
    SamplerId => Sampler,
    ShaderId => Shader,
    PipelineId => Pipeline,
    ResourceLayoutId => ResourceLayout,
    ResourceSetId => ResourceSet,
    FramebufferId => Framebuffer,
}
