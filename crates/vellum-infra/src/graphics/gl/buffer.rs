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

//! Native buffer objects.

use vellum_core::renderer::api::{BufferDescriptor, BufferUsage};

use super::consts as gl;
use super::context::{GlContext, NativeBuffer};
use super::conversions::buffer_usage_hint;
use super::error::{gl_int, ErrorChecker, GlError, GlResult};

/// A realized buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlBuffer {
    pub name: NativeBuffer,
    pub size: u64,
    pub usage: BufferUsage,
}

impl GlBuffer {
    /// Allocates storage for the buffer. Binds through `COPY_WRITE_BUFFER`, which the executor
    /// never caches.
    pub(crate) fn realize(
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        descriptor: &BufferDescriptor,
    ) -> GlResult<Self> {
        let size = gl_int(descriptor.size, "buffer size")?;
        let name = gl.create_buffer().map_err(GlError::Creation)?;
        gl.bind_buffer(gl::COPY_WRITE_BUFFER, Some(name));
        gl.buffer_data_size(gl::COPY_WRITE_BUFFER, size, buffer_usage_hint(descriptor.usage));
        checker.check_native_error(gl, "buffer_data_size")?;

        Ok(Self {
            name,
            size: descriptor.size,
            usage: descriptor.usage,
        })
    }

    fn check_range(&self, offset: u64, len: usize) -> GlResult<i32> {
        let len = len as u64;
        match offset.checked_add(len) {
            Some(end) if end <= self.size => gl_int(offset, "buffer offset"),
            _ => Err(GlError::BufferOverflow {
                offset,
                len,
                size: self.size,
            }),
        }
    }

    /// Copies `data` into the buffer at `offset`.
    pub(crate) fn upload(
        &self,
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        offset: u64,
        data: &[u8],
    ) -> GlResult<()> {
        let offset = self.check_range(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        gl.bind_buffer(gl::COPY_WRITE_BUFFER, Some(self.name));
        gl.buffer_sub_data(gl::COPY_WRITE_BUFFER, offset, data);
        checker.check_native_error(gl, "buffer_sub_data")
    }

    /// Reads `dst.len()` bytes back from the buffer at `offset`.
    pub(crate) fn read(
        &self,
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        offset: u64,
        dst: &mut [u8],
    ) -> GlResult<()> {
        let offset = self.check_range(offset, dst.len())?;
        gl.bind_buffer(gl::COPY_READ_BUFFER, Some(self.name));
        gl.get_buffer_sub_data(gl::COPY_READ_BUFFER, offset, dst);
        checker.check_native_error(gl, "get_buffer_sub_data")
    }

    /// Copies `size` bytes at `read_offset` into `destination` at `write_offset`. Ranges within
    /// one buffer must not overlap.
    pub(crate) fn copy_to(
        &self,
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        read_offset: u64,
        destination: &GlBuffer,
        write_offset: u64,
        size: u64,
    ) -> GlResult<()> {
        let len = usize::try_from(size).map_err(|_| GlError::OutOfNativeRange {
            what: "copy size",
            value: size,
        })?;
        let read = self.check_range(read_offset, len)?;
        let write = destination.check_range(write_offset, len)?;
        if self.name == destination.name
            && read_offset < write_offset + size
            && write_offset < read_offset + size
        {
            return Err(GlError::OverlappingCopy {
                read_offset,
                write_offset,
                size,
            });
        }
        if size == 0 {
            return Ok(());
        }
        let size = gl_int(size, "copy size")?;
        gl.bind_buffer(gl::COPY_READ_BUFFER, Some(self.name));
        gl.bind_buffer(gl::COPY_WRITE_BUFFER, Some(destination.name));
        gl.copy_buffer_sub_data(gl::COPY_READ_BUFFER, gl::COPY_WRITE_BUFFER, read, write, size);
        checker.check_native_error(gl, "copy_buffer_sub_data")
    }

    pub(crate) fn destroy(self, gl: &mut dyn GlContext) {
        gl.delete_buffer(self.name);
    }
}
