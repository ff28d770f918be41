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

//! Defines data structures related to GPU buffer resources.

use crate::vellum_bitflags;

vellum_bitflags! {
    /// A set of flags describing the allowed usages of a [`BufferId`].
    ///
    /// Backends use them to pick a storage hint for the driver and to validate
    /// that a buffer is bound where its usage allows.
    pub struct BufferUsage: u32 {
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 0;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 1;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// The buffer is rewritten often (for example once per frame).
        const DYNAMIC = 1 << 3;
        /// The buffer is only used to move data between the host and the GPU.
        const STAGING = 1 << 4;
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    /// An optional debug label for the buffer.
    pub label: Option<String>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be used.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Creates an unlabeled descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }
}

/// An opaque handle to a GPU buffer resource.
///
/// This ID is returned by [`ResourceFactory::create_buffer`](crate::renderer::ResourceFactory::create_buffer)
/// and is used to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);
