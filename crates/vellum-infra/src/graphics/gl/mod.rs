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

//! The immediate-mode GL backend.
//!
//! Resources are described eagerly and realized lazily on the context thread. Command lists
//! are recorded anywhere, with payloads staged into pooled memory, and replayed by the
//! [`GlCommandExecutor`] against a [`GlContext`]. Releases travel through a
//! [`DisposalQueue`] and only reach the driver at `swap_buffers` or `wait_for_idle`.

mod buffer;
mod cache;
pub mod consts;
mod context;
mod conversions;
mod device;
mod disposal;
mod entry;
mod error;
mod executor;
mod framebuffer;
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod glow_context;
mod headless;
mod pipeline;
mod registry;
mod resource;
mod sampler;
mod settings;
mod shader;
mod staging;
mod texture;
mod texture_sampler;

pub use self::cache::{DescriptionCache, GlResourceCache};
pub use self::context::{
    GlContext, NativeBuffer, NativeFramebuffer, NativeProgram, NativeSampler, NativeShader,
    NativeTexture, NativeUniformLocation,
};
pub use self::device::{GlGraphicsDevice, GlResourceFactory};
pub use self::disposal::{DisposalQueue, DisposalSender};
pub use self::entry::{GlCommandEntry, GlCommandEntryList, StagedPayload};
pub use self::error::{error_name, ErrorChecker, GlError, GlResult};
pub use self::executor::{
    BoundStateCache, ExecutionStats, GlCommandExecutor, IndexBufferBinding, VertexBufferBinding,
};
pub use self::framebuffer::FramebufferTarget;
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use self::glow_context::GlowContext;
pub use self::headless::{
    AttributePointer, ClearRecord, DrawRecord, HeadlessGlContext, TextureStorage, TextureUpload,
};
pub use self::registry::GlResources;
pub use self::resource::ResourceState;
pub use self::settings::{ErrorCheckMode, GlDeviceSettings};
pub use self::staging::{StagingBlock, StagingMemoryPool};
