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

//! Replays recorded command streams against a [`GlContext`].
//!
//! The executor mirrors the native binding state in a [`BoundStateCache`] so that redundant
//! state changes are skipped. Resources are realized lazily, the first time an entry needs
//! them.

use std::sync::Arc;

use vellum_core::math::LinearRgba;
use vellum_core::renderer::api::{
    BindableResource, BufferId, CubeFace, FramebufferId, IndexFormat, PipelineId,
    ResourceHandle, ResourceSetId, TextureId, TextureRegion, Viewport,
};

use super::consts as gl;
use super::context::GlContext;
use super::conversions::{GlVertexAttribute, IntoGl};
use super::entry::{GlCommandEntry, GlCommandEntryList, StagedPayload};
use super::error::{gl_int, ErrorChecker, GlError, GlResult};
use super::framebuffer::GlFramebuffer;
use super::pipeline::{BindingSlot, GlPipeline};
use super::registry::GlResources;
use super::settings::GlDeviceSettings;
use super::texture_sampler::TextureSamplerManager;

/// Counters collected over one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    pub draw_calls: u64,
    pub pipeline_changes: u64,
    pub pipeline_changes_elided: u64,
    pub texture_binds: u64,
    pub sampler_binds: u64,
    pub staged_bytes_uploaded: u64,
}

/// A vertex buffer recorded for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferBinding {
    pub buffer: BufferId,
    pub stride: u32,
    pub offset: u32,
}

/// The index buffer recorded for the next indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferBinding {
    pub buffer: BufferId,
    pub format: IndexFormat,
    pub offset: u32,
}

/// What the executor believes is bound natively.
#[derive(Debug, Default)]
pub struct BoundStateCache {
    pub pipeline: Option<(PipelineId, Arc<GlPipeline>)>,
    pub framebuffer: Option<(FramebufferId, GlFramebuffer)>,
    pub is_swapchain_framebuffer: bool,
    pub vertex_buffers: Vec<Option<VertexBufferBinding>>,
    pub index_buffer: Option<IndexBufferBinding>,
    pub vertex_attrib_divisors: Vec<u32>,
    /// Number of vertex attribute arrays currently enabled, starting at index 0.
    pub vertex_attributes_bound: u32,
    pub viewports: Vec<Option<Viewport>>,
    pub primitive_type: u32,
    vertex_layout_dirty: bool,
    index_buffer_dirty: bool,
}

impl BoundStateCache {
    fn pipeline(&self) -> GlResult<&Arc<GlPipeline>> {
        self.pipeline
            .as_ref()
            .map(|(_, pipeline)| pipeline)
            .ok_or(GlError::NoPipelineBound)
    }

    fn index_element_size(&self) -> u32 {
        self.index_buffer.map_or(0, |binding| binding.format.size())
    }
}

/// Walks command entries and issues native calls.
#[derive(Debug)]
pub struct GlCommandExecutor {
    cache: BoundStateCache,
    textures: TextureSamplerManager,
    stats: ExecutionStats,
    max_viewports: u32,
    independent_blend: bool,
    checker: ErrorChecker,
}

impl GlCommandExecutor {
    pub fn new(texture_units: u32, settings: &GlDeviceSettings, checker: ErrorChecker) -> Self {
        Self {
            cache: BoundStateCache::default(),
            textures: TextureSamplerManager::new(texture_units),
            stats: ExecutionStats::default(),
            max_viewports: settings.max_viewports,
            independent_blend: settings.independent_blend,
            checker,
        }
    }

    pub fn cache(&self) -> &BoundStateCache {
        &self.cache
    }

    /// The statistics of the last submission.
    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    /// Drops every cached reference to a destroyed resource.
    pub fn forget(&mut self, handle: ResourceHandle) {
        self.textures.forget(handle);
        match handle {
            ResourceHandle::Pipeline(id)
                if self.cache.pipeline.as_ref().is_some_and(|(bound, _)| *bound == id) =>
            {
                self.cache.pipeline = None;
            }
            ResourceHandle::Framebuffer(id)
                if self.cache.framebuffer.is_some_and(|(bound, _)| bound == id) =>
            {
                self.cache.framebuffer = None;
            }
            ResourceHandle::Buffer(id) => {
                for binding in &mut self.cache.vertex_buffers {
                    if binding.is_some_and(|b| b.buffer == id) {
                        *binding = None;
                    }
                }
                if self.cache.index_buffer.is_some_and(|b| b.buffer == id) {
                    self.cache.index_buffer = None;
                }
            }
            _ => {}
        }
    }

    /// Replays every entry of `list`, in order. Stops at the first error.
    pub fn execute(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        list: &mut GlCommandEntryList,
    ) -> GlResult<()> {
        self.stats = ExecutionStats::default();
        let result = (0..list.len()).try_for_each(|index| {
            let entry = list.commands()[index];
            log::trace!("GlCommandExecutor: {entry:?}");
            self.execute_entry(gl, resources, list, entry)
        });
        let (texture_binds, sampler_binds) = self.textures.take_bind_counts();
        self.stats.texture_binds = texture_binds;
        self.stats.sampler_binds = sampler_binds;
        result
    }

    fn execute_entry(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        list: &mut GlCommandEntryList,
        entry: GlCommandEntry,
    ) -> GlResult<()> {
        match entry {
            GlCommandEntry::Begin => {
                self.begin(gl);
                Ok(())
            }
            GlCommandEntry::End => Ok(()),
            GlCommandEntry::SetPipeline(id) => self.set_pipeline(gl, resources, id),
            GlCommandEntry::SetFramebuffer(id) => self.set_framebuffer(gl, resources, id),
            GlCommandEntry::SetVertexBuffer {
                slot,
                buffer,
                stride,
                offset,
            } => {
                let slot = slot as usize;
                if self.cache.vertex_buffers.len() <= slot {
                    self.cache.vertex_buffers.resize(slot + 1, None);
                }
                self.cache.vertex_buffers[slot] = Some(VertexBufferBinding {
                    buffer,
                    stride,
                    offset,
                });
                self.cache.vertex_layout_dirty = true;
                Ok(())
            }
            GlCommandEntry::SetIndexBuffer {
                buffer,
                format,
                offset,
            } => {
                self.cache.index_buffer = Some(IndexBufferBinding {
                    buffer,
                    format,
                    offset,
                });
                self.cache.index_buffer_dirty = true;
                Ok(())
            }
            GlCommandEntry::SetResourceSet { slot, set } => {
                self.set_resource_set(gl, resources, slot, set)
            }
            GlCommandEntry::SetViewport { index, viewport } => {
                self.set_viewport(gl, index, viewport)
            }
            GlCommandEntry::SetScissorRect {
                index,
                x,
                y,
                width,
                height,
            } => self.set_scissor_rect(gl, index, x, y, width, height),
            GlCommandEntry::ClearColorTarget { index, color } => {
                self.clear_color_target(gl, index, color)
            }
            GlCommandEntry::ClearDepthTarget { depth } => self.clear_depth_target(gl, depth),
            GlCommandEntry::Draw {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance: _,
            } => self.draw(
                gl,
                resources,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
            ),
            GlCommandEntry::DrawVertices {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance: _,
            } => self.draw_vertices(gl, resources, vertex_count, instance_count, first_vertex),
            GlCommandEntry::UpdateBuffer {
                buffer,
                offset,
                payload,
            } => self.update_buffer(gl, resources, list, buffer, offset, payload),
            GlCommandEntry::UpdateTexture2D {
                texture,
                payload,
                region,
            } => self.update_texture(gl, resources, list, texture, payload, None, region),
            GlCommandEntry::UpdateTextureCube {
                texture,
                payload,
                face,
                region,
            } => self.update_texture(gl, resources, list, texture, payload, Some(face), region),
            GlCommandEntry::CopyBuffer {
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            } => self.copy_buffer(
                gl,
                resources,
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            ),
            GlCommandEntry::GenerateMipmaps(texture) => {
                self.generate_mipmaps(gl, resources, texture)
            }
        }
    }

    /// Returns vertex input to a known state and forgets cached bindings.
    fn begin(&mut self, gl: &mut dyn GlContext) {
        for index in 0..self.cache.vertex_attributes_bound {
            gl.disable_vertex_attrib_array(index);
        }
        for (index, divisor) in self.cache.vertex_attrib_divisors.iter().enumerate() {
            if *divisor != 0 {
                gl.vertex_attrib_divisor(index as u32, 0);
            }
        }
        self.cache = BoundStateCache::default();
    }

    fn set_pipeline(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        id: PipelineId,
    ) -> GlResult<()> {
        if self.cache.pipeline.as_ref().is_some_and(|(bound, _)| *bound == id) {
            self.stats.pipeline_changes_elided += 1;
            return Ok(());
        }

        let pipeline = resources.ensure_pipeline(gl, id)?;
        let description = &pipeline.description;

        let blend = &description.blend_state;
        let factor = blend.blend_factor;
        gl.blend_color(factor.r, factor.g, factor.b, factor.a);
        if self.independent_blend {
            for (index, attachment) in blend.attachments.iter().enumerate() {
                let index = index as u32;
                if attachment.enabled {
                    gl.enable_i(gl::BLEND, index);
                    gl.blend_func_separate_i(
                        index,
                        attachment.color.src_factor.into_gl(),
                        attachment.color.dst_factor.into_gl(),
                        attachment.alpha.src_factor.into_gl(),
                        attachment.alpha.dst_factor.into_gl(),
                    );
                    gl.blend_equation_separate_i(
                        index,
                        attachment.color.operation.into_gl(),
                        attachment.alpha.operation.into_gl(),
                    );
                } else {
                    gl.disable_i(gl::BLEND, index);
                }
            }
        } else {
            match blend.attachments.first() {
                Some(attachment) if attachment.enabled => {
                    gl.enable(gl::BLEND);
                    gl.blend_func_separate(
                        attachment.color.src_factor.into_gl(),
                        attachment.color.dst_factor.into_gl(),
                        attachment.alpha.src_factor.into_gl(),
                        attachment.alpha.dst_factor.into_gl(),
                    );
                    gl.blend_equation_separate(
                        attachment.color.operation.into_gl(),
                        attachment.alpha.operation.into_gl(),
                    );
                }
                _ => gl.disable(gl::BLEND),
            }
        }

        let depth = &description.depth_stencil_state;
        if depth.depth_test_enabled {
            gl.enable(gl::DEPTH_TEST);
            gl.depth_func(depth.depth_compare.into_gl());
        } else {
            gl.disable(gl::DEPTH_TEST);
        }
        gl.depth_mask(depth.depth_write_enabled);

        let rasterizer = &description.rasterizer_state;
        match rasterizer.cull_mode.into_gl() {
            Some(face) => {
                gl.enable(gl::CULL_FACE);
                gl.cull_face(face);
            }
            None => gl.disable(gl::CULL_FACE),
        }
        gl.polygon_mode(gl::FRONT_AND_BACK, rasterizer.fill_mode.into_gl());
        if rasterizer.scissor_test_enabled {
            gl.enable(gl::SCISSOR_TEST);
        } else {
            gl.disable(gl::SCISSOR_TEST);
        }
        if rasterizer.depth_clip_enabled {
            gl.disable(gl::DEPTH_CLAMP);
        } else {
            gl.enable(gl::DEPTH_CLAMP);
        }
        gl.front_face(rasterizer.front_face.into_gl());

        self.cache.primitive_type = pipeline.primitive_type;
        gl.use_program(Some(pipeline.program));
        self.checker.check_native_error(gl, "use_program")?;

        self.cache.pipeline = Some((id, pipeline));
        self.cache.vertex_layout_dirty = true;
        self.stats.pipeline_changes += 1;
        Ok(())
    }

    fn set_framebuffer(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        id: FramebufferId,
    ) -> GlResult<()> {
        if self.cache.framebuffer.is_some_and(|(bound, _)| bound == id) {
            return Ok(());
        }
        let framebuffer = resources.ensure_framebuffer(gl, &mut self.textures, id)?;
        gl.bind_framebuffer(gl::FRAMEBUFFER, framebuffer.name);
        self.checker.check_native_error(gl, "bind_framebuffer")?;
        self.cache.framebuffer = Some((id, framebuffer));
        self.cache.is_swapchain_framebuffer = framebuffer.is_swapchain();
        Ok(())
    }

    fn set_resource_set(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        slot: u32,
        set: ResourceSetId,
    ) -> GlResult<()> {
        let pipeline = Arc::clone(self.cache.pipeline()?);
        let bindings = pipeline
            .set_bindings
            .get(slot as usize)
            .ok_or(GlError::UnknownResource {
                kind: "resource set slot",
                id: slot as usize,
            })?;
        let description = resources.ensure_resource_set(set)?;
        if description.layout != bindings.layout
            && !resources.layouts_compatible(description.layout, bindings.layout)?
        {
            log::error!(
                "GlCommandExecutor: set {} (layout {}) does not fit slot {slot} (layout {})",
                set.0,
                description.layout.0,
                bindings.layout.0
            );
            return Err(GlError::IncompatibleResourceSet {
                set: set.0,
                slot,
                expected: bindings.layout.0,
                found: description.layout.0,
            });
        }

        for (element, (binding, resource)) in
            bindings.slots.iter().zip(&description.resources).enumerate()
        {
            match (binding, *resource) {
                (
                    BindingSlot::UniformBuffer {
                        name,
                        block_index,
                        binding_index,
                        block_size,
                    },
                    BindableResource::Buffer(id),
                ) => {
                    let buffer = resources.ensure_buffer(gl, id)?;
                    if buffer.size < u64::from(*block_size) {
                        return Err(GlError::UniformBufferTooSmall {
                            name: name.clone(),
                            required: u64::from(*block_size),
                            actual: buffer.size,
                        });
                    }
                    gl.uniform_block_binding(pipeline.program, *block_index, *binding_index);
                    gl.bind_buffer_range(
                        gl::UNIFORM_BUFFER,
                        *binding_index,
                        Some(buffer.name),
                        0,
                        gl_int(buffer.size, "uniform buffer size")?,
                    );
                    self.checker.check_native_error(gl, "bind_buffer_range")?;
                }
                (BindingSlot::Texture { location, unit, .. }, BindableResource::TextureView(id)) => {
                    let view = resources.ensure_texture_view(gl, &mut self.textures, id)?;
                    let texture = resources.texture_view_target(id)?;
                    self.textures.set_texture(gl, *unit, id, texture, &view)?;
                    gl.uniform_1_i32(location, *unit as i32);
                }
                (BindingSlot::Sampler { unit }, BindableResource::Sampler(id)) => {
                    let sampler = resources.ensure_sampler(gl, id)?;
                    self.textures.set_sampler(gl, *unit, id, &sampler)?;
                }
                (binding, resource) => {
                    log::error!(
                        "GlCommandExecutor: set {} element {element} holds a {:?}, the pipeline expects a {:?}",
                        set.0,
                        resource.kind(),
                        binding.kind()
                    );
                    return Err(GlError::WrongResourceKind {
                        expected: binding.kind(),
                        found: resource.kind(),
                    });
                }
            }
        }
        Ok(())
    }

    fn set_viewport(&mut self, gl: &mut dyn GlContext, index: u32, viewport: Viewport) -> GlResult<()> {
        self.check_viewport_index(index)?;
        gl.viewport_indexed(index, viewport.x, viewport.y, viewport.width, viewport.height);
        gl.depth_range_indexed(
            index,
            f64::from(viewport.min_depth),
            f64::from(viewport.max_depth),
        );

        let slot = index as usize;
        if self.cache.viewports.len() <= slot {
            self.cache.viewports.resize(slot + 1, None);
        }
        self.cache.viewports[slot] = Some(viewport);
        Ok(())
    }

    /// Applies a scissor rectangle given with a top-left origin. GL counts rows from the bottom
    /// of the viewport.
    fn set_scissor_rect(
        &mut self,
        gl: &mut dyn GlContext,
        index: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> GlResult<()> {
        self.check_viewport_index(index)?;
        let viewport = self
            .cache
            .viewports
            .get(index as usize)
            .copied()
            .flatten()
            .ok_or(GlError::MissingViewport(index))?;

        let flipped = viewport.height as i64 - i64::from(height) - i64::from(y);
        let flipped = flipped.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        gl.scissor_indexed(
            index,
            gl_int(x, "scissor x")?,
            flipped,
            gl_int(width, "scissor width")?,
            gl_int(height, "scissor height")?,
        );
        Ok(())
    }

    fn check_viewport_index(&self, index: u32) -> GlResult<()> {
        if index < self.max_viewports {
            Ok(())
        } else {
            Err(GlError::TooManyViewports {
                index,
                limit: self.max_viewports,
            })
        }
    }

    fn clear_color_target(
        &mut self,
        gl: &mut dyn GlContext,
        index: u32,
        color: LinearRgba,
    ) -> GlResult<()> {
        let offscreen = self
            .cache
            .framebuffer
            .filter(|_| !self.cache.is_swapchain_framebuffer)
            .map(|(_, framebuffer)| framebuffer);

        if let Some(framebuffer) = offscreen {
            gl.draw_buffer(gl::COLOR_ATTACHMENT0 + index);
            gl.clear_color(color.r, color.g, color.b, color.a);
            gl.clear(gl::COLOR_BUFFER_BIT);
            gl.draw_buffers(&framebuffer.draw_buffers());
        } else {
            gl.clear_color(color.r, color.g, color.b, color.a);
            gl.clear(gl::COLOR_BUFFER_BIT);
        }
        self.checker.check_native_error(gl, "clear")
    }

    fn clear_depth_target(&mut self, gl: &mut dyn GlContext, depth: f32) -> GlResult<()> {
        gl.clear_depth(f64::from(depth));
        // Depth writes must be on for the clear to land.
        gl.depth_mask(true);
        gl.clear(gl::DEPTH_BUFFER_BIT);
        let write_enabled = self.cache.pipeline.as_ref().map_or(true, |(_, pipeline)| {
            pipeline.description.depth_stencil_state.depth_write_enabled
        });
        if !write_enabled {
            gl.depth_mask(false);
        }
        self.checker.check_native_error(gl, "clear")
    }

    /// Points every attribute of the bound pipeline at its vertex buffer, enabling or disabling
    /// attribute arrays so that exactly the pipeline's attributes are enabled.
    fn flush_vertex_layout(&mut self, gl: &mut dyn GlContext, resources: &GlResources) -> GlResult<()> {
        let pipeline = Arc::clone(self.cache.pipeline()?);
        if !self.cache.vertex_layout_dirty {
            return Ok(());
        }

        let mut attribute = 0u32;
        for (slot, layout) in pipeline.description.vertex_layouts.iter().enumerate() {
            let binding = self
                .cache
                .vertex_buffers
                .get(slot)
                .copied()
                .flatten()
                .ok_or(GlError::MissingVertexBuffer(slot as u32))?;
            let buffer = resources.ensure_buffer(gl, binding.buffer)?;
            gl.bind_buffer(gl::ARRAY_BUFFER, Some(buffer.name));

            let stride = if layout.array_stride != 0 {
                layout.array_stride
            } else {
                binding.stride
            };
            let stride = gl_int(stride, "vertex stride")?;
            let divisor = layout.divisor();

            let mut packed = 0u32;
            for element in &layout.attributes {
                let relative = if element.offset != 0 {
                    element.offset
                } else {
                    packed
                };
                packed = relative + element.format.size();
                let offset = gl_int(u64::from(binding.offset) + u64::from(relative), "attribute offset")?;

                if attribute >= self.cache.vertex_attributes_bound {
                    gl.enable_vertex_attrib_array(attribute);
                }
                let GlVertexAttribute {
                    size,
                    data_type,
                    normalized,
                    integer,
                } = element.format.into_gl();
                if integer {
                    gl.vertex_attrib_pointer_i32(attribute, size, data_type, stride, offset);
                } else {
                    gl.vertex_attrib_pointer_f32(attribute, size, data_type, normalized, stride, offset);
                }

                let index = attribute as usize;
                if self.cache.vertex_attrib_divisors.len() <= index {
                    self.cache.vertex_attrib_divisors.resize(index + 1, 0);
                }
                if self.cache.vertex_attrib_divisors[index] != divisor {
                    gl.vertex_attrib_divisor(attribute, divisor);
                    self.cache.vertex_attrib_divisors[index] = divisor;
                }
                attribute += 1;
            }
        }

        for excess in attribute..self.cache.vertex_attributes_bound {
            gl.disable_vertex_attrib_array(excess);
        }
        self.cache.vertex_attributes_bound = attribute;
        self.cache.vertex_layout_dirty = false;
        self.checker.check_native_error(gl, "vertex_attrib_pointer")
    }

    fn draw(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> GlResult<()> {
        self.flush_vertex_layout(gl, resources)?;
        let index = self.cache.index_buffer.ok_or(GlError::MissingIndexBuffer)?;
        if self.cache.index_buffer_dirty {
            let buffer = resources.ensure_buffer(gl, index.buffer)?;
            gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, Some(buffer.name));
            self.cache.index_buffer_dirty = false;
        }

        let mode = self.cache.primitive_type;
        let count = gl_int(index_count, "index count")?;
        let element_type = index.format.into_gl();
        let offset = u64::from(first_index) * u64::from(self.cache.index_element_size())
            + u64::from(index.offset);
        let offset = gl_int(offset, "index offset")?;

        match (instance_count == 1, vertex_offset == 0) {
            (true, true) => gl.draw_elements(mode, count, element_type, offset),
            (true, false) => {
                gl.draw_elements_base_vertex(mode, count, element_type, offset, vertex_offset)
            }
            (false, true) => {
                let instances = gl_int(instance_count, "instance count")?;
                gl.draw_elements_instanced(mode, count, element_type, offset, instances)
            }
            (false, false) => {
                let instances = gl_int(instance_count, "instance count")?;
                gl.draw_elements_instanced_base_vertex(
                    mode,
                    count,
                    element_type,
                    offset,
                    instances,
                    vertex_offset,
                )
            }
        }
        self.stats.draw_calls += 1;
        self.checker.check_native_error(gl, "draw_elements")
    }

    fn draw_vertices(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
    ) -> GlResult<()> {
        self.flush_vertex_layout(gl, resources)?;
        let mode = self.cache.primitive_type;
        let first = gl_int(first_vertex, "first vertex")?;
        let count = gl_int(vertex_count, "vertex count")?;
        if instance_count == 1 {
            gl.draw_arrays(mode, first, count);
        } else {
            let instances = gl_int(instance_count, "instance count")?;
            gl.draw_arrays_instanced(mode, first, count, instances);
        }
        self.stats.draw_calls += 1;
        self.checker.check_native_error(gl, "draw_arrays")
    }

    fn update_buffer(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        list: &mut GlCommandEntryList,
        id: BufferId,
        offset: u32,
        payload: StagedPayload,
    ) -> GlResult<()> {
        let block = list.take_payload(payload)?;
        let uploaded = resources
            .ensure_buffer(gl, id)
            .and_then(|buffer| buffer.upload(gl, self.checker, u64::from(offset), block.as_slice()));
        if uploaded.is_ok() {
            self.stats.staged_bytes_uploaded += block.size() as u64;
        }
        block.free();
        uploaded
    }

    #[allow(clippy::too_many_arguments)]
    fn update_texture(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        list: &mut GlCommandEntryList,
        id: TextureId,
        payload: StagedPayload,
        face: Option<CubeFace>,
        region: TextureRegion,
    ) -> GlResult<()> {
        let block = list.take_payload(payload)?;
        let checker = self.checker;
        let uploaded = resources
            .ensure_texture(gl, &mut self.textures, id)
            .and_then(|texture| {
                texture.check_dimension(id, face)?;
                texture.check_region(id, region, block.as_slice().len())?;
                texture.upload(gl, checker, &mut self.textures, face, region, block.as_slice())
            });
        if uploaded.is_ok() {
            self.stats.staged_bytes_uploaded += block.size() as u64;
        }
        block.free();
        uploaded
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_buffer(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        source: BufferId,
        source_offset: u32,
        destination: BufferId,
        destination_offset: u32,
        size: u32,
    ) -> GlResult<()> {
        let read = resources.ensure_buffer(gl, source)?;
        let write = resources.ensure_buffer(gl, destination)?;
        read.copy_to(
            gl,
            self.checker,
            u64::from(source_offset),
            &write,
            u64::from(destination_offset),
            u64::from(size),
        )
    }

    fn generate_mipmaps(
        &mut self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        id: TextureId,
    ) -> GlResult<()> {
        let texture = resources.ensure_texture(gl, &mut self.textures, id)?;
        texture.generate_mipmaps(gl, self.checker, &mut self.textures, id)
    }
}
