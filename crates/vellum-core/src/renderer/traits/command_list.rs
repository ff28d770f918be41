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

use crate::math::LinearRgba;
use crate::renderer::api::{
    BufferId, CubeFace, FramebufferId, IndexFormat, PipelineId, ResourceSetId, TextureId,
    TextureRegion, Viewport,
};

/// A trait for an object that records a sequence of GPU commands.
///
/// Recording never touches the native graphics context and never blocks: a `CommandList`
/// can be filled on any thread and handed to the device for execution later. Update
/// commands copy their payload at record time, so the caller's slice may be reused
/// immediately after the call returns.
///
/// The recorded order is the only ordering guarantee. A device replays every command,
/// in order, each time the list is submitted.
pub trait CommandList: Send {
    /// Marks the start of a recording. Resets the executor's bound-state cache on replay.
    fn begin(&mut self);

    /// Marks the end of a recording.
    fn end(&mut self);

    /// Sets the active pipeline for subsequent draw calls.
    fn set_pipeline(&mut self, pipeline: PipelineId);

    /// Sets the active framebuffer for subsequent clears and draws.
    fn set_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Binds a vertex buffer to a slot, starting `offset` bytes into the buffer.
    ///
    /// `stride` is used when the pipeline's vertex layout declares a stride of zero.
    fn set_vertex_buffer_with_offset(
        &mut self,
        slot: u32,
        buffer: BufferId,
        stride: u32,
        offset: u32,
    );

    /// Binds a vertex buffer to a slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, stride: u32) {
        self.set_vertex_buffer_with_offset(slot, buffer, stride, 0);
    }

    /// Binds an index buffer, starting `offset` bytes into the buffer.
    fn set_index_buffer_with_offset(&mut self, buffer: BufferId, format: IndexFormat, offset: u32);

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(&mut self, buffer: BufferId, format: IndexFormat) {
        self.set_index_buffer_with_offset(buffer, format, 0);
    }

    /// Binds a resource set at the given slot of the active pipeline's layouts.
    fn set_resource_set(&mut self, slot: u32, set: ResourceSetId);

    /// Sets the viewport at `index`.
    fn set_viewport(&mut self, index: u32, viewport: Viewport);

    /// Sets the scissor rectangle at `index`, in top-left-origin pixel coordinates.
    fn set_scissor_rect(&mut self, index: u32, x: u32, y: u32, width: u32, height: u32);

    /// Clears the color target at `index` of the active framebuffer.
    fn clear_color_target(&mut self, index: u32, color: LinearRgba);

    /// Clears the depth target of the active framebuffer.
    fn clear_depth_target(&mut self, depth: f32);

    /// Records an indexed draw call.
    fn draw(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );

    /// Records a non-indexed draw call.
    fn draw_vertices(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    /// Copies `data` into `buffer` at `offset` bytes when the list is executed.
    fn update_buffer(&mut self, buffer: BufferId, offset: u32, data: &[u8]);

    /// Copies `data` into a region of a 2D (or 2D array) texture.
    fn update_texture_2d(&mut self, texture: TextureId, data: &[u8], region: TextureRegion);

    /// Copies `data` into a region of one face of a cubemap texture.
    fn update_texture_cube(
        &mut self,
        texture: TextureId,
        data: &[u8],
        face: CubeFace,
        region: TextureRegion,
    );

    /// Copies `size` bytes from `source` into `destination` when the list is executed.
    fn copy_buffer(
        &mut self,
        source: BufferId,
        source_offset: u32,
        destination: BufferId,
        destination_offset: u32,
        size: u32,
    );

    /// Regenerates every mip level of `texture` from its base level.
    fn generate_mipmaps(&mut self, texture: TextureId);

    /// Typed convenience over [`CommandList::update_buffer`] for plain-old-data slices.
    fn update_buffer_pod<T: bytemuck::Pod>(&mut self, buffer: BufferId, offset: u32, data: &[T])
    where
        Self: Sized,
    {
        self.update_buffer(buffer, offset, bytemuck::cast_slice(data));
    }
}
