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

//! The per-device registry of deferred resources.
//!
//! Every resource kind has its own side table keyed by ID. Creation only records a
//! description; the `ensure_*` methods realize native objects on the context thread the first
//! time a command stream needs them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use vellum_core::renderer::api::{
    BufferDescriptor, BufferId, FramebufferDescriptor, FramebufferId,
    PipelineDescriptor, PipelineId, ResourceHandle, ResourceLayoutDescriptor, ResourceLayoutId,
    ResourceSetDescriptor, ResourceSetId, SamplerDescriptor, SamplerId, ShaderDescriptor,
    ShaderId, TextureDescriptor, TextureId, TextureViewDescriptor, TextureViewId,
};

use super::buffer::GlBuffer;
use super::context::GlContext;
use super::error::{ErrorChecker, GlError, GlResult};
use super::framebuffer::{FramebufferTarget, GlFramebuffer};
use super::pipeline::GlPipeline;
use super::resource::ResourceTable;
use super::sampler::GlSampler;
use super::shader::GlShader;
use super::texture::{GlTexture, GlTextureView};
use super::texture_sampler::TextureSamplerManager;

/// Records the thread that owns the native context and asserts every realization runs on it.
#[derive(Debug, Default)]
struct ContextThread(OnceLock<ThreadId>);

impl ContextThread {
    fn assert_current(&self) {
        let owner = *self.0.get_or_init(|| thread::current().id());
        debug_assert_eq!(
            owner,
            thread::current().id(),
            "native resources must be realized on the context thread"
        );
    }
}

#[derive(Debug, Default)]
struct IdCounters {
    buffers: AtomicUsize,
    textures: AtomicUsize,
    texture_views: AtomicUsize,
    samplers: AtomicUsize,
    shaders: AtomicUsize,
    layouts: AtomicUsize,
    sets: AtomicUsize,
    pipelines: AtomicUsize,
    framebuffers: AtomicUsize,
}

fn next(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::Relaxed)
}

/// The deferred-resource side tables of one device.
#[derive(Debug)]
pub struct GlResources {
    buffers: ResourceTable<BufferId, BufferDescriptor, GlBuffer>,
    textures: ResourceTable<TextureId, TextureDescriptor, GlTexture>,
    texture_views: ResourceTable<TextureViewId, TextureViewDescriptor, GlTextureView>,
    samplers: ResourceTable<SamplerId, SamplerDescriptor, GlSampler>,
    shaders: ResourceTable<ShaderId, ShaderDescriptor, GlShader>,
    layouts: ResourceTable<ResourceLayoutId, ResourceLayoutDescriptor, ()>,
    sets: ResourceTable<ResourceSetId, ResourceSetDescriptor, ()>,
    pipelines: ResourceTable<PipelineId, PipelineDescriptor, Arc<GlPipeline>>,
    framebuffers: ResourceTable<FramebufferId, FramebufferTarget, GlFramebuffer>,
    ids: IdCounters,
    swapchain: FramebufferId,
    context_thread: ContextThread,
    checker: ErrorChecker,
}

impl GlResources {
    /// Creates empty tables. The swapchain framebuffer is registered up front.
    pub fn new(checker: ErrorChecker) -> GlResult<Self> {
        let mut resources = Self {
            buffers: ResourceTable::new("buffer"),
            textures: ResourceTable::new("texture"),
            texture_views: ResourceTable::new("texture view"),
            samplers: ResourceTable::new("sampler"),
            shaders: ResourceTable::new("shader"),
            layouts: ResourceTable::new("resource layout"),
            sets: ResourceTable::new("resource set"),
            pipelines: ResourceTable::new("pipeline"),
            framebuffers: ResourceTable::new("framebuffer"),
            ids: IdCounters::default(),
            swapchain: FramebufferId(0),
            context_thread: ContextThread::default(),
            checker,
        };
        let swapchain = FramebufferId(next(&resources.ids.framebuffers));
        resources
            .framebuffers
            .insert(swapchain, FramebufferTarget::Swapchain)?;
        resources.swapchain = swapchain;
        Ok(resources)
    }

    pub fn checker(&self) -> ErrorChecker {
        self.checker
    }

    /// The ID standing for the window's default framebuffer.
    pub fn swapchain_framebuffer(&self) -> FramebufferId {
        self.swapchain
    }

    // --- Creation: descriptions only, callable from any thread ---

    pub fn create_buffer(&self, descriptor: BufferDescriptor) -> GlResult<BufferId> {
        let id = BufferId(next(&self.ids.buffers));
        self.buffers.insert(id, descriptor)?;
        log::trace!("GlResources: described buffer {}", id.0);
        Ok(id)
    }

    pub fn create_texture(&self, descriptor: TextureDescriptor) -> GlResult<TextureId> {
        let id = TextureId(next(&self.ids.textures));
        self.textures.insert(id, descriptor)?;
        log::trace!("GlResources: described texture {}", id.0);
        Ok(id)
    }

    pub fn create_texture_view(
        &self,
        descriptor: TextureViewDescriptor,
    ) -> GlResult<TextureViewId> {
        // Fails early on a view over an unknown texture.
        self.textures.description(descriptor.target)?;
        let id = TextureViewId(next(&self.ids.texture_views));
        self.texture_views.insert(id, descriptor)?;
        Ok(id)
    }

    pub fn create_sampler(&self, descriptor: SamplerDescriptor) -> GlResult<SamplerId> {
        let id = SamplerId(next(&self.ids.samplers));
        self.samplers.insert(id, descriptor)?;
        Ok(id)
    }

    pub fn create_shader(&self, descriptor: ShaderDescriptor) -> GlResult<ShaderId> {
        let id = ShaderId(next(&self.ids.shaders));
        self.shaders.insert(id, descriptor)?;
        Ok(id)
    }

    pub fn create_resource_layout(
        &self,
        descriptor: ResourceLayoutDescriptor,
    ) -> GlResult<ResourceLayoutId> {
        let id = ResourceLayoutId(next(&self.ids.layouts));
        self.layouts.insert(id, descriptor)?;
        Ok(id)
    }

    /// Describes a resource set. The resources must match the layout element for element.
    pub fn create_resource_set(
        &self,
        descriptor: ResourceSetDescriptor,
    ) -> GlResult<ResourceSetId> {
        let layout = self.layouts.description(descriptor.layout)?;
        if layout.elements.len() != descriptor.resources.len() {
            return Err(GlError::ResourceCountMismatch {
                label: descriptor
                    .label
                    .clone()
                    .unwrap_or_else(|| "unnamed".to_string()),
                expected: layout.elements.len(),
                actual: descriptor.resources.len(),
            });
        }
        for (element, resource) in layout.elements.iter().zip(&descriptor.resources) {
            if element.kind != resource.kind() {
                return Err(GlError::WrongResourceKind {
                    expected: element.kind,
                    found: resource.kind(),
                });
            }
        }

        let id = ResourceSetId(next(&self.ids.sets));
        self.sets.insert(id, descriptor)?;
        Ok(id)
    }

    pub fn create_pipeline(&self, descriptor: PipelineDescriptor) -> GlResult<PipelineId> {
        let id = PipelineId(next(&self.ids.pipelines));
        self.pipelines.insert(id, descriptor)?;
        log::trace!("GlResources: described pipeline {}", id.0);
        Ok(id)
    }

    pub fn create_framebuffer(
        &self,
        descriptor: FramebufferDescriptor,
    ) -> GlResult<FramebufferId> {
        let id = FramebufferId(next(&self.ids.framebuffers));
        self.framebuffers
            .insert(id, FramebufferTarget::Offscreen(descriptor))?;
        Ok(id)
    }

    /// Returns `true` once the resource has a native object (or, for descriptor-only kinds,
    /// once it was first used).
    pub fn is_created(&self, handle: ResourceHandle) -> bool {
        match handle {
            ResourceHandle::Buffer(id) => self.buffers.is_created(id),
            ResourceHandle::Texture(id) => self.textures.is_created(id),
            ResourceHandle::TextureView(id) => self.texture_views.is_created(id),
            ResourceHandle::Sampler(id) => self.samplers.is_created(id),
            ResourceHandle::Shader(id) => self.shaders.is_created(id),
            ResourceHandle::Pipeline(id) => self.pipelines.is_created(id),
            ResourceHandle::ResourceLayout(id) => self.layouts.is_created(id),
            ResourceHandle::ResourceSet(id) => self.sets.is_created(id),
            ResourceHandle::Framebuffer(id) => self.framebuffers.is_created(id),
        }
    }

    // --- Realization: context thread only ---

    pub fn ensure_buffer(&self, gl: &mut dyn GlContext, id: BufferId) -> GlResult<GlBuffer> {
        self.context_thread.assert_current();
        let checker = self.checker;
        self.buffers
            .ensure_created(id, |descriptor| GlBuffer::realize(gl, checker, descriptor))
    }

    pub fn ensure_texture(
        &self,
        gl: &mut dyn GlContext,
        units: &mut TextureSamplerManager,
        id: TextureId,
    ) -> GlResult<GlTexture> {
        self.context_thread.assert_current();
        let checker = self.checker;
        self.textures.ensure_created(id, |descriptor| {
            GlTexture::realize(gl, checker, units, descriptor)
        })
    }

    /// Realizes a view, and its texture if needed.
    pub fn ensure_texture_view(
        &self,
        gl: &mut dyn GlContext,
        units: &mut TextureSamplerManager,
        id: TextureViewId,
    ) -> GlResult<GlTextureView> {
        self.context_thread.assert_current();
        self.texture_views.ensure_created(id, |descriptor| {
            let texture = self.ensure_texture(gl, units, descriptor.target)?;
            Ok(GlTextureView::new(
                texture,
                descriptor.base_mip_level,
                descriptor.mip_level_count,
            ))
        })
    }

    /// The texture a view reads from.
    pub fn texture_view_target(&self, id: TextureViewId) -> GlResult<TextureId> {
        Ok(self.texture_views.description(id)?.target)
    }

    pub fn ensure_sampler(&self, gl: &mut dyn GlContext, id: SamplerId) -> GlResult<GlSampler> {
        self.context_thread.assert_current();
        let checker = self.checker;
        self.samplers
            .ensure_created(id, |descriptor| GlSampler::realize(gl, checker, descriptor))
    }

    pub fn ensure_shader(&self, gl: &mut dyn GlContext, id: ShaderId) -> GlResult<GlShader> {
        self.context_thread.assert_current();
        let checker = self.checker;
        self.shaders
            .ensure_created(id, |descriptor| GlShader::realize(gl, checker, descriptor))
    }

    /// Resource layouts have no native object. The first use marks them created.
    pub fn ensure_resource_layout(
        &self,
        id: ResourceLayoutId,
    ) -> GlResult<Arc<ResourceLayoutDescriptor>> {
        self.layouts.ensure_created(id, |_| Ok(()))?;
        self.layouts.description(id)
    }

    /// Two layouts are interchangeable when they declare the same kinds in the same order.
    pub fn layouts_compatible(&self, a: ResourceLayoutId, b: ResourceLayoutId) -> GlResult<bool> {
        let (a, b) = (self.layouts.description(a)?, self.layouts.description(b)?);
        Ok(a.elements.len() == b.elements.len()
            && a
                .elements
                .iter()
                .zip(&b.elements)
                .all(|(x, y)| x.kind == y.kind))
    }

    /// Resource sets have no native object. The first use marks them created.
    pub fn ensure_resource_set(&self, id: ResourceSetId) -> GlResult<Arc<ResourceSetDescriptor>> {
        self.sets.ensure_created(id, |_| Ok(()))?;
        self.sets.description(id)
    }

    /// Links a pipeline, compiling its shaders first.
    pub fn ensure_pipeline(
        &self,
        gl: &mut dyn GlContext,
        id: PipelineId,
    ) -> GlResult<Arc<GlPipeline>> {
        self.context_thread.assert_current();
        let checker = self.checker;
        self.pipelines.ensure_created(id, |descriptor| {
            let shaders = descriptor
                .shaders
                .iter()
                .map(|&shader| self.ensure_shader(gl, shader))
                .collect::<GlResult<Vec<_>>>()?;
            let layouts = descriptor
                .resource_layouts
                .iter()
                .map(|&layout| Ok((layout, self.ensure_resource_layout(layout)?)))
                .collect::<GlResult<Vec<_>>>()?;
            GlPipeline::realize(gl, checker, descriptor, &shaders, &layouts).map(Arc::new)
        })
    }

    /// Assembles a framebuffer, realizing its attachments first. The swapchain realizes to
    /// the default framebuffer without a native call.
    pub fn ensure_framebuffer(
        &self,
        gl: &mut dyn GlContext,
        units: &mut TextureSamplerManager,
        id: FramebufferId,
    ) -> GlResult<GlFramebuffer> {
        self.context_thread.assert_current();
        let checker = self.checker;
        self.framebuffers.ensure_created(id, |target| {
            let descriptor = match &**target {
                FramebufferTarget::Swapchain => return Ok(GlFramebuffer::SWAPCHAIN),
                FramebufferTarget::Offscreen(descriptor) => descriptor,
            };
            let colors = descriptor
                .color_targets
                .iter()
                .map(|&attachment| Ok((attachment, self.ensure_texture(gl, units, attachment.texture)?)))
                .collect::<GlResult<Vec<_>>>()?;
            let depth = descriptor
                .depth_target
                .map(|attachment| {
                    Ok::<_, GlError>((attachment, self.ensure_texture(gl, units, attachment.texture)?))
                })
                .transpose()?;
            GlFramebuffer::realize(gl, checker, &target.label(), &colors, depth)
        })
    }

    // --- Disposal ---

    /// Marks a resource disposed. Returns `false` for a repeated disposal, an unknown ID, or the
    /// swapchain framebuffer, which lives as long as the device.
    pub fn mark_disposed(&self, handle: ResourceHandle) -> GlResult<bool> {
        match handle {
            ResourceHandle::Buffer(id) => self.buffers.mark_disposed(id),
            ResourceHandle::Texture(id) => self.textures.mark_disposed(id),
            ResourceHandle::TextureView(id) => self.texture_views.mark_disposed(id),
            ResourceHandle::Sampler(id) => self.samplers.mark_disposed(id),
            ResourceHandle::Shader(id) => self.shaders.mark_disposed(id),
            ResourceHandle::Pipeline(id) => self.pipelines.mark_disposed(id),
            ResourceHandle::ResourceLayout(id) => self.layouts.mark_disposed(id),
            ResourceHandle::ResourceSet(id) => self.sets.mark_disposed(id),
            ResourceHandle::Framebuffer(id) if id == self.swapchain => Ok(false),
            ResourceHandle::Framebuffer(id) => self.framebuffers.mark_disposed(id),
        }
    }

    /// Removes a resource and destroys its native object, if it was realized. Returns `true`
    /// if an entry was removed.
    pub fn destroy(&self, gl: &mut dyn GlContext, handle: ResourceHandle) -> GlResult<bool> {
        self.context_thread.assert_current();
        let removed = match handle {
            ResourceHandle::Buffer(id) => self
                .buffers
                .remove(id)?
                .map(|entry| entry.into_native().map(|buffer| buffer.destroy(gl))),
            ResourceHandle::Texture(id) => self
                .textures
                .remove(id)?
                .map(|entry| entry.into_native().map(|texture| texture.destroy(gl))),
            // Views alias their texture's native object.
            ResourceHandle::TextureView(id) => self.texture_views.remove(id)?.map(|_| None),
            ResourceHandle::Sampler(id) => self
                .samplers
                .remove(id)?
                .map(|entry| entry.into_native().map(|sampler| sampler.destroy(gl))),
            ResourceHandle::Shader(id) => self
                .shaders
                .remove(id)?
                .map(|entry| entry.into_native().map(|shader| shader.destroy(gl))),
            ResourceHandle::Pipeline(id) => self
                .pipelines
                .remove(id)?
                .map(|entry| entry.into_native().map(|pipeline| pipeline.destroy(gl))),
            ResourceHandle::ResourceLayout(id) => self.layouts.remove(id)?.map(|_| None),
            ResourceHandle::ResourceSet(id) => self.sets.remove(id)?.map(|_| None),
            ResourceHandle::Framebuffer(id) => self
                .framebuffers
                .remove(id)?
                .map(|entry| entry.into_native().map(|framebuffer| framebuffer.destroy(gl))),
        };
        if removed.is_some() {
            log::debug!("GlResources: destroyed {handle:?}");
        }
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gl::headless::HeadlessGlContext;
    use crate::graphics::gl::settings::ErrorCheckMode;
    use vellum_core::renderer::api::{
        BindableResource, BufferUsage, ResourceKind, ResourceLayoutElement, TextureFormat, TextureUsage,
    };

    fn resources() -> GlResources {
        GlResources::new(ErrorChecker::new(ErrorCheckMode::Always)).unwrap()
    }

    #[test]
    fn creation_makes_no_native_call() {
        let gl = HeadlessGlContext::new();
        let resources = resources();

        let buffer = resources
            .create_buffer(BufferDescriptor::new(256, BufferUsage::VERTEX))
            .unwrap();

        assert!(!resources.is_created(buffer.into()));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn view_realization_realizes_its_texture() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(8);
        let resources = resources();
        let texture = resources
            .create_texture(TextureDescriptor::texture_2d(
                32,
                32,
                6,
                TextureFormat::Rgba8Unorm,
                TextureUsage::SAMPLED,
            ))
            .unwrap();
        let view = resources
            .create_texture_view(TextureViewDescriptor::whole(texture))
            .unwrap();

        let realized = resources
            .ensure_texture_view(&mut gl, &mut units, view)
            .unwrap();

        assert!(resources.is_created(texture.into()));
        assert_eq!(realized.mip_level_count, 6);
        assert_eq!(gl.call_count("create_texture"), 1);
    }

    #[test]
    fn resource_sets_are_checked_against_their_layout() {
        let resources = resources();
        let layout = resources
            .create_resource_layout(ResourceLayoutDescriptor {
                label: None,
                elements: vec![ResourceLayoutElement::new("Camera", ResourceKind::UniformBuffer)],
            })
            .unwrap();
        let sampler = resources
            .create_sampler(SamplerDescriptor::default())
            .unwrap();

        let wrong_kind = resources.create_resource_set(ResourceSetDescriptor {
            label: None,
            layout,
            resources: vec![BindableResource::Sampler(sampler)],
        });
        let wrong_count = resources.create_resource_set(ResourceSetDescriptor {
            label: Some("camera".to_string()),
            layout,
            resources: Vec::new(),
        });

        assert!(matches!(
            wrong_kind,
            Err(GlError::WrongResourceKind {
                expected: ResourceKind::UniformBuffer,
                found: ResourceKind::Sampler
            })
        ));
        assert!(matches!(
            wrong_count,
            Err(GlError::ResourceCountMismatch {
                expected: 1,
                actual: 0,
                ..
            })
        ));
    }

    #[test]
    fn swapchain_cannot_be_disposed() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(8);
        let resources = resources();
        let swapchain = resources.swapchain_framebuffer();

        assert!(!resources.mark_disposed(swapchain.into()).unwrap());
        let framebuffer = resources
            .ensure_framebuffer(&mut gl, &mut units, swapchain)
            .unwrap();
        assert!(framebuffer.is_swapchain());
        assert_eq!(gl.call_count("create_framebuffer"), 0);
    }

    #[test]
    fn destroy_releases_realized_objects_only() {
        let mut gl = HeadlessGlContext::new();
        let resources = resources();
        let realized = resources
            .create_buffer(BufferDescriptor::new(16, BufferUsage::UNIFORM))
            .unwrap();
        let described = resources
            .create_buffer(BufferDescriptor::new(16, BufferUsage::UNIFORM))
            .unwrap();
        resources.ensure_buffer(&mut gl, realized).unwrap();

        assert!(resources.destroy(&mut gl, realized.into()).unwrap());
        assert!(resources.destroy(&mut gl, described.into()).unwrap());
        assert!(!resources.destroy(&mut gl, described.into()).unwrap());
        assert_eq!(gl.call_count("delete_buffer"), 1);
        assert_eq!(gl.buffer_count(), 0);
    }
}
