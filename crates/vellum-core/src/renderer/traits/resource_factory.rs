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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;

/// The resource-creation surface of a graphics device.
///
/// Every `create_*` call returns an opaque ID immediately. Whether the backend allocates
/// the native object now or on first use is an implementation detail; callers may record
/// the returned ID into a [`CommandList`](super::CommandList) either way.
pub trait ResourceFactory: Send + Sync {
    /// Returns the native API family this factory creates resources for.
    fn backend_type(&self) -> GraphicsBackendType;

    /// Creates a GPU buffer.
    /// ## Errors
    /// * `ResourceError` - If the description is invalid or the internal tables are unusable.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Creates a view over a range of a texture's mip levels.
    fn create_texture_view(
        &self,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError>;

    /// Creates a sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Creates a shader stage from source.
    fn create_shader(&self, descriptor: &ShaderDescriptor) -> Result<ShaderId, ResourceError>;

    /// Creates a resource layout describing one resource set slot.
    fn create_resource_layout(
        &self,
        descriptor: &ResourceLayoutDescriptor,
    ) -> Result<ResourceLayoutId, ResourceError>;

    /// Creates a resource set matching a previously created layout.
    fn create_resource_set(
        &self,
        descriptor: &ResourceSetDescriptor,
    ) -> Result<ResourceSetId, ResourceError>;

    /// Creates a graphics pipeline.
    fn create_pipeline(&self, descriptor: &PipelineDescriptor)
        -> Result<PipelineId, ResourceError>;

    /// Creates an offscreen framebuffer.
    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError>;

    /// Returns the ID of the default (window) framebuffer.
    fn swapchain_framebuffer(&self) -> FramebufferId;

    /// Requests destruction of a resource. Safe to call from any thread.
    ///
    /// Native destruction is deferred to the device's next synchronization point.
    fn dispose(&self, handle: ResourceHandle) -> Result<(), ResourceError>;

    /// Returns `true` once the resource's native object has been allocated.
    fn is_created(&self, handle: ResourceHandle) -> bool;
}
