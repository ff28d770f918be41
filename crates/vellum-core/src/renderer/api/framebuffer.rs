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

//! Defines framebuffer descriptions.

use super::texture::TextureId;

/// A texture sub-resource used as a framebuffer attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferAttachment {
    /// The attached texture.
    pub texture: TextureId,
    /// The array layer (or cube face for cubemaps) to render into.
    pub array_layer: u32,
    /// The mip level to render into.
    pub mip_level: u32,
}

impl FramebufferAttachment {
    /// Attaches mip 0 of layer 0 of `texture`.
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            array_layer: 0,
            mip_level: 0,
        }
    }
}

/// A descriptor used to create an offscreen [`FramebufferId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramebufferDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The depth (and stencil) attachment, if any.
    pub depth_target: Option<FramebufferAttachment>,
    /// The color attachments, in draw-buffer order.
    pub color_targets: Vec<FramebufferAttachment>,
}

/// An opaque handle to a framebuffer.
///
/// Every factory exposes one distinguished framebuffer standing for the
/// swapchain (default) target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub usize);
