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

//! Recorded command streams.
//!
//! A [`GlCommandEntryList`] is filled on any thread through the [`CommandList`] trait and
//! replayed later on the context thread. Entries are plain `Copy` values. Update payloads are
//! copied into the staging pool at record time and referenced by index, so the list owns
//! every byte the replay will need.

use vellum_core::math::LinearRgba;
use vellum_core::renderer::api::{
    BufferId, CubeFace, FramebufferId, IndexFormat, PipelineId, ResourceSetId, TextureId,
    TextureRegion, Viewport,
};
use vellum_core::renderer::CommandList;

use super::error::{GlError, GlResult};
use super::staging::{StagingBlock, StagingMemoryPool};

/// The index of a staged payload in its list's payload arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagedPayload(pub usize);

/// One recorded command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlCommandEntry {
    Begin,
    End,
    SetPipeline(PipelineId),
    SetFramebuffer(FramebufferId),
    SetVertexBuffer {
        slot: u32,
        buffer: BufferId,
        stride: u32,
        offset: u32,
    },
    SetIndexBuffer {
        buffer: BufferId,
        format: IndexFormat,
        offset: u32,
    },
    SetResourceSet {
        slot: u32,
        set: ResourceSetId,
    },
    SetViewport {
        index: u32,
        viewport: Viewport,
    },
    SetScissorRect {
        index: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    ClearColorTarget {
        index: u32,
        color: LinearRgba,
    },
    ClearDepthTarget {
        depth: f32,
    },
    Draw {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawVertices {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    UpdateBuffer {
        buffer: BufferId,
        offset: u32,
        payload: StagedPayload,
    },
    UpdateTexture2D {
        texture: TextureId,
        payload: StagedPayload,
        region: TextureRegion,
    },
    UpdateTextureCube {
        texture: TextureId,
        payload: StagedPayload,
        face: CubeFace,
        region: TextureRegion,
    },
    CopyBuffer {
        source: BufferId,
        source_offset: u32,
        destination: BufferId,
        destination_offset: u32,
        size: u32,
    },
    GenerateMipmaps(TextureId),
}

/// A replayable list of commands plus the payloads its update entries reference.
#[derive(Debug)]
pub struct GlCommandEntryList {
    entries: Vec<GlCommandEntry>,
    payloads: Vec<Option<StagingBlock>>,
    pool: StagingMemoryPool,
}

impl GlCommandEntryList {
    /// Creates an empty list staging through `pool`.
    pub fn new(pool: StagingMemoryPool) -> Self {
        Self {
            entries: Vec::new(),
            payloads: Vec::new(),
            pool,
        }
    }

    /// The recorded entries, in submission order.
    pub fn commands(&self) -> &[GlCommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of staged payloads not yet consumed by a replay.
    pub fn pending_payloads(&self) -> usize {
        self.payloads.iter().filter(|payload| payload.is_some()).count()
    }

    /// Clears the list for re-recording. Payloads that were never replayed go back to the pool.
    pub fn reset(&mut self) {
        let unconsumed = self.release_payloads();
        if unconsumed > 0 {
            log::warn!("GlCommandEntryList: reset with {unconsumed} unconsumed payloads");
        }
        self.entries.clear();
    }

    /// Takes ownership of a staged payload. Each payload can be taken once.
    pub(crate) fn take_payload(&mut self, payload: StagedPayload) -> GlResult<StagingBlock> {
        self.payloads
            .get_mut(payload.0)
            .and_then(Option::take)
            .ok_or(GlError::PayloadConsumed(payload.0))
    }

    fn stage(&mut self, data: &[u8]) -> StagedPayload {
        let payload = StagedPayload(self.payloads.len());
        self.payloads.push(Some(self.pool.stage(data)));
        payload
    }

    fn release_payloads(&mut self) -> usize {
        let mut released = 0;
        for block in self.payloads.drain(..).flatten() {
            self.pool.free(block);
            released += 1;
        }
        released
    }

    fn push(&mut self, entry: GlCommandEntry) {
        log::trace!("GlCommandEntryList: {entry:?}");
        self.entries.push(entry);
    }
}

impl Drop for GlCommandEntryList {
    fn drop(&mut self) {
        let unconsumed = self.release_payloads();
        if unconsumed > 0 {
            log::debug!("GlCommandEntryList: dropped with {unconsumed} unconsumed payloads");
        }
    }
}

impl CommandList for GlCommandEntryList {
    fn begin(&mut self) {
        self.push(GlCommandEntry::Begin);
    }

    fn end(&mut self) {
        self.push(GlCommandEntry::End);
    }

    fn set_pipeline(&mut self, pipeline: PipelineId) {
        self.push(GlCommandEntry::SetPipeline(pipeline));
    }

    fn set_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.push(GlCommandEntry::SetFramebuffer(framebuffer));
    }

    fn set_vertex_buffer_with_offset(
        &mut self,
        slot: u32,
        buffer: BufferId,
        stride: u32,
        offset: u32,
    ) {
        self.push(GlCommandEntry::SetVertexBuffer {
            slot,
            buffer,
            stride,
            offset,
        });
    }

    fn set_index_buffer_with_offset(&mut self, buffer: BufferId, format: IndexFormat, offset: u32) {
        self.push(GlCommandEntry::SetIndexBuffer {
            buffer,
            format,
            offset,
        });
    }

    fn set_resource_set(&mut self, slot: u32, set: ResourceSetId) {
        self.push(GlCommandEntry::SetResourceSet { slot, set });
    }

    fn set_viewport(&mut self, index: u32, viewport: Viewport) {
        self.push(GlCommandEntry::SetViewport { index, viewport });
    }

    fn set_scissor_rect(&mut self, index: u32, x: u32, y: u32, width: u32, height: u32) {
        self.push(GlCommandEntry::SetScissorRect {
            index,
            x,
            y,
            width,
            height,
        });
    }

    fn clear_color_target(&mut self, index: u32, color: LinearRgba) {
        self.push(GlCommandEntry::ClearColorTarget { index, color });
    }

    fn clear_depth_target(&mut self, depth: f32) {
        self.push(GlCommandEntry::ClearDepthTarget { depth });
    }

    fn draw(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.push(GlCommandEntry::Draw {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn draw_vertices(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.push(GlCommandEntry::DrawVertices {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn update_buffer(&mut self, buffer: BufferId, offset: u32, data: &[u8]) {
        let payload = self.stage(data);
        self.push(GlCommandEntry::UpdateBuffer {
            buffer,
            offset,
            payload,
        });
    }

    fn update_texture_2d(&mut self, texture: TextureId, data: &[u8], region: TextureRegion) {
        let payload = self.stage(data);
        self.push(GlCommandEntry::UpdateTexture2D {
            texture,
            payload,
            region,
        });
    }

    fn update_texture_cube(
        &mut self,
        texture: TextureId,
        data: &[u8],
        face: CubeFace,
        region: TextureRegion,
    ) {
        let payload = self.stage(data);
        self.push(GlCommandEntry::UpdateTextureCube {
            texture,
            payload,
            face,
            region,
        });
    }

    fn copy_buffer(
        &mut self,
        source: BufferId,
        source_offset: u32,
        destination: BufferId,
        destination_offset: u32,
        size: u32,
    ) {
        self.push(GlCommandEntry::CopyBuffer {
            source,
            source_offset,
            destination,
            destination_offset,
            size,
        });
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        self.push(GlCommandEntry::GenerateMipmaps(texture));
    }
}
