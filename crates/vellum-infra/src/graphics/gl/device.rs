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

//! The device: the context-thread owner of a GL context, and the factory handle shared with
//! recording threads.

use std::fmt;
use std::sync::Arc;

use vellum_core::renderer::api::*;
use vellum_core::renderer::{RenderError, ResourceError, ResourceFactory};

use super::cache::GlResourceCache;
use super::consts as gl;
use super::context::GlContext;
use super::disposal::{DisposalQueue, DisposalSender};
use super::entry::GlCommandEntryList;
use super::error::{ErrorChecker, GlResult};
use super::executor::{ExecutionStats, GlCommandExecutor};
use super::registry::GlResources;
use super::settings::GlDeviceSettings;
use super::staging::StagingMemoryPool;

/// A cloneable, thread-safe handle for describing resources and recording command lists.
///
/// Nothing done through the factory touches the native context. Resources are realized when
/// a submitted command stream first uses them, and destroyed at the next frame boundary after
/// their disposal.
#[derive(Clone, Debug)]
pub struct GlResourceFactory {
    resources: Arc<GlResources>,
    disposals: DisposalSender,
    staging: StagingMemoryPool,
    cache: Arc<GlResourceCache>,
}

impl GlResourceFactory {
    /// Creates an empty command list staging through the device's pool.
    pub fn create_command_list(&self) -> GlCommandEntryList {
        GlCommandEntryList::new(self.staging.clone())
    }

    pub fn staging_pool(&self) -> &StagingMemoryPool {
        &self.staging
    }

    pub fn resources(&self) -> &Arc<GlResources> {
        &self.resources
    }

    /// Returns the shader created for an equal description, creating it on first request.
    pub fn get_or_create_shader(
        &self,
        descriptor: &ShaderDescriptor,
    ) -> Result<ShaderId, ResourceError> {
        Ok(self
            .cache
            .shaders
            .get_or_create(descriptor, |d| self.resources.create_shader(d))?)
    }

    pub fn get_or_create_resource_layout(
        &self,
        descriptor: &ResourceLayoutDescriptor,
    ) -> Result<ResourceLayoutId, ResourceError> {
        Ok(self
            .cache
            .layouts
            .get_or_create(descriptor, |d| self.resources.create_resource_layout(d))?)
    }

    pub fn get_or_create_pipeline(
        &self,
        descriptor: &PipelineDescriptor,
    ) -> Result<PipelineId, ResourceError> {
        Ok(self
            .cache
            .pipelines
            .get_or_create(descriptor, |d| self.resources.create_pipeline(d))?)
    }

    /// Empties the description caches and disposes every resource they held.
    pub fn clear_cache(&self) -> Result<(), ResourceError> {
        let pipelines = self.cache.pipelines.drain()?;
        let layouts = self.cache.layouts.drain()?;
        let shaders = self.cache.shaders.drain()?;
        let handles = pipelines
            .into_iter()
            .map(ResourceHandle::from)
            .chain(layouts.into_iter().map(ResourceHandle::from))
            .chain(shaders.into_iter().map(ResourceHandle::from));
        for handle in handles {
            self.dispose(handle)?;
        }
        Ok(())
    }
}

impl ResourceFactory for GlResourceFactory {
    fn backend_type(&self) -> GraphicsBackendType {
        GraphicsBackendType::OpenGL
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        Ok(self.resources.create_buffer(descriptor.clone())?)
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        Ok(self.resources.create_texture(descriptor.clone())?)
    }

    fn create_texture_view(
        &self,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        Ok(self.resources.create_texture_view(descriptor.clone())?)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(self.resources.create_sampler(descriptor.clone())?)
    }

    fn create_shader(&self, descriptor: &ShaderDescriptor) -> Result<ShaderId, ResourceError> {
        Ok(self.resources.create_shader(descriptor.clone())?)
    }

    fn create_resource_layout(
        &self,
        descriptor: &ResourceLayoutDescriptor,
    ) -> Result<ResourceLayoutId, ResourceError> {
        Ok(self.resources.create_resource_layout(descriptor.clone())?)
    }

    fn create_resource_set(
        &self,
        descriptor: &ResourceSetDescriptor,
    ) -> Result<ResourceSetId, ResourceError> {
        Ok(self.resources.create_resource_set(descriptor.clone())?)
    }

    fn create_pipeline(
        &self,
        descriptor: &PipelineDescriptor,
    ) -> Result<PipelineId, ResourceError> {
        Ok(self.resources.create_pipeline(descriptor.clone())?)
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError> {
        Ok(self.resources.create_framebuffer(descriptor.clone())?)
    }

    fn swapchain_framebuffer(&self) -> FramebufferId {
        self.resources.swapchain_framebuffer()
    }

    fn dispose(&self, handle: ResourceHandle) -> Result<(), ResourceError> {
        if self.resources.mark_disposed(handle)? {
            log::debug!("GlResourceFactory: {handle:?} queued for destruction");
            self.disposals.enqueue(handle);
        } else {
            log::trace!("GlResourceFactory: {handle:?} is already disposed");
        }
        Ok(())
    }

    fn is_created(&self, handle: ResourceHandle) -> bool {
        self.resources.is_created(handle)
    }
}

type PresentCallback<C> = Box<dyn FnMut(&mut C)>;

/// Owns a GL context and replays command lists on it. Lives on the context thread.
pub struct GlGraphicsDevice<C: GlContext> {
    context: C,
    factory: GlResourceFactory,
    disposals: DisposalQueue,
    executor: GlCommandExecutor,
    present: Option<PresentCallback<C>>,
}

impl<C: GlContext> GlGraphicsDevice<C> {
    /// Takes ownership of a current context and prepares the backend for it.
    pub fn new(mut context: C, settings: GlDeviceSettings) -> Result<Self, RenderError> {
        let checker = ErrorChecker::new(settings.error_checking);
        context.enable(gl::TEXTURE_CUBE_MAP_SEAMLESS);

        let texture_units = settings.max_texture_units.unwrap_or_else(|| {
            context
                .get_parameter_i32(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS)
                .max(0) as u32
        });
        let native_viewports = context.get_parameter_i32(gl::MAX_VIEWPORTS);
        let settings = GlDeviceSettings {
            max_viewports: if native_viewports > 0 {
                settings.max_viewports.min(native_viewports as u32)
            } else {
                settings.max_viewports
            },
            ..settings
        };
        checker.check_native_error(&mut context, "enable")?;

        let resources = Arc::new(GlResources::new(checker)?);
        let disposals = DisposalQueue::new();
        let factory = GlResourceFactory {
            resources,
            disposals: disposals.sender(),
            staging: StagingMemoryPool::new(settings.zero_freed_staging_blocks),
            cache: Arc::new(GlResourceCache::default()),
        };
        let executor = GlCommandExecutor::new(texture_units, &settings, checker);

        log::info!(
            "GlGraphicsDevice: ready with {} texture units, {} viewports, error checks {:?}",
            texture_units,
            settings.max_viewports,
            settings.error_checking
        );

        Ok(Self {
            context,
            factory,
            disposals,
            executor,
            present: None,
        })
    }

    /// Registers the callback that presents the back buffer in [`swap_buffers`](Self::swap_buffers).
    pub fn with_present_callback(mut self, present: impl FnMut(&mut C) + 'static) -> Self {
        self.present = Some(Box::new(present));
        self
    }

    /// A factory handle to share with recording threads.
    pub fn factory(&self) -> &GlResourceFactory {
        &self.factory
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Statistics of the last submission.
    pub fn stats(&self) -> ExecutionStats {
        self.executor.stats()
    }

    /// Replays a recorded list. The list can be submitted again later; its update payloads
    /// are consumed by the first replay.
    pub fn submit_commands(&mut self, list: &mut GlCommandEntryList) -> Result<(), RenderError> {
        self.executor
            .execute(&mut self.context, &self.factory.resources, list)
            .map_err(|err| {
                log::error!("GlGraphicsDevice: submission failed: {err}");
                err.into()
            })
    }

    /// Ends the frame: destroys disposed resources, flushes the context and presents.
    pub fn swap_buffers(&mut self) -> Result<(), RenderError> {
        self.flush_disposals()?;
        self.context.flush();
        if let Some(present) = self.present.as_mut() {
            present(&mut self.context);
        }
        Ok(())
    }

    /// Blocks until the context is idle, then destroys disposed resources.
    pub fn wait_for_idle(&mut self) -> Result<(), RenderError> {
        self.context.finish();
        self.flush_disposals()?;
        Ok(())
    }

    /// Reads `len` bytes of a buffer back to the host.
    pub fn read_buffer(
        &mut self,
        buffer: BufferId,
        offset: u64,
        len: usize,
    ) -> Result<Vec<u8>, RenderError> {
        let checker = self.factory.resources.checker();
        let native = self.factory.resources.ensure_buffer(&mut self.context, buffer)?;
        let mut data = vec![0; len];
        native.read(&mut self.context, checker, offset, &mut data)?;
        Ok(data)
    }

    fn flush_disposals(&mut self) -> GlResult<usize> {
        let executor = &mut self.executor;
        self.disposals.flush(
            &mut self.context,
            &self.factory.resources,
            |handle| executor.forget(handle),
        )
    }
}

impl<C: GlContext> fmt::Debug for GlGraphicsDevice<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlGraphicsDevice")
            .field("factory", &self.factory)
            .field("pending_disposals", &self.disposals.pending())
            .field("stats", &self.executor.stats())
            .finish_non_exhaustive()
    }
}

impl<C: GlContext> Drop for GlGraphicsDevice<C> {
    fn drop(&mut self) {
        if let Err(err) = self.flush_disposals() {
            log::warn!("GlGraphicsDevice: final disposal flush failed: {err}");
        }
    }
}
