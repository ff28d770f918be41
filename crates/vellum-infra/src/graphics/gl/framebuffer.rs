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

//! Native framebuffer objects.

use vellum_core::renderer::api::{FramebufferAttachment, FramebufferDescriptor};

use super::consts as gl;
use super::context::{GlContext, NativeFramebuffer};
use super::error::{gl_int, ErrorChecker, GlError, GlResult};
use super::texture::GlTexture;

/// What a framebuffer ID stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// The default framebuffer of the window.
    Swapchain,
    /// A framebuffer assembled from texture attachments.
    Offscreen(FramebufferDescriptor),
}

impl FramebufferTarget {
    pub fn label(&self) -> String {
        match self {
            FramebufferTarget::Swapchain => "swapchain".to_string(),
            FramebufferTarget::Offscreen(descriptor) => descriptor
                .label
                .clone()
                .unwrap_or_else(|| "unnamed framebuffer".to_string()),
        }
    }
}

/// A realized framebuffer. The swapchain has no native name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFramebuffer {
    pub name: Option<NativeFramebuffer>,
    pub color_attachment_count: u32,
}

impl GlFramebuffer {
    pub const SWAPCHAIN: Self = Self {
        name: None,
        color_attachment_count: 1,
    };

    pub fn is_swapchain(&self) -> bool {
        self.name.is_none()
    }

    /// The draw buffers selecting every color attachment.
    pub fn draw_buffers(&self) -> Vec<u32> {
        (0..self.color_attachment_count)
            .map(|index| gl::COLOR_ATTACHMENT0 + index)
            .collect()
    }

    /// Creates the framebuffer and attaches already realized textures. Leaves it bound to
    /// `FRAMEBUFFER`.
    pub(crate) fn realize(
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        label: &str,
        colors: &[(FramebufferAttachment, GlTexture)],
        depth: Option<(FramebufferAttachment, GlTexture)>,
    ) -> GlResult<Self> {
        let name = gl.create_framebuffer().map_err(GlError::Creation)?;
        gl.bind_framebuffer(gl::FRAMEBUFFER, Some(name));

        let attached = attach_all(gl, colors, depth);
        if let Err(err) = attached {
            gl.delete_framebuffer(name);
            return Err(err);
        }

        let framebuffer = Self {
            name: Some(name),
            color_attachment_count: colors.len() as u32,
        };
        if colors.is_empty() {
            gl.draw_buffer(gl::NONE);
        } else {
            gl.draw_buffers(&framebuffer.draw_buffers());
        }

        let status = gl.check_framebuffer_status(gl::FRAMEBUFFER);
        if status != gl::FRAMEBUFFER_COMPLETE {
            gl.delete_framebuffer(name);
            log::error!("GlFramebuffer: '{label}' is incomplete ({status:#06x})");
            return Err(GlError::FramebufferIncomplete {
                label: label.to_string(),
                status,
            });
        }
        checker.check_native_error(gl, "framebuffer_texture")?;
        Ok(framebuffer)
    }

    pub(crate) fn destroy(self, gl: &mut dyn GlContext) {
        if let Some(name) = self.name {
            gl.delete_framebuffer(name);
        }
    }
}

fn attach_all(
    gl: &mut dyn GlContext,
    colors: &[(FramebufferAttachment, GlTexture)],
    depth: Option<(FramebufferAttachment, GlTexture)>,
) -> GlResult<()> {
    for (index, (attachment, texture)) in colors.iter().enumerate() {
        attach(gl, gl::COLOR_ATTACHMENT0 + index as u32, attachment, texture)?;
    }
    if let Some((attachment, texture)) = depth {
        let point = if texture.format.has_stencil() {
            gl::DEPTH_STENCIL_ATTACHMENT
        } else {
            gl::DEPTH_ATTACHMENT
        };
        attach(gl, point, &attachment, &texture)?;
    }
    Ok(())
}

fn attach(
    gl: &mut dyn GlContext,
    point: u32,
    attachment: &FramebufferAttachment,
    texture: &GlTexture,
) -> GlResult<()> {
    let level = gl_int(attachment.mip_level, "attachment mip level")?;
    match texture.target {
        gl::TEXTURE_2D => {
            gl.framebuffer_texture_2d(gl::FRAMEBUFFER, point, gl::TEXTURE_2D, Some(texture.name), level)
        }
        // The array layer selects the face.
        gl::TEXTURE_CUBE_MAP => gl.framebuffer_texture_2d(
            gl::FRAMEBUFFER,
            point,
            gl::TEXTURE_CUBE_MAP_POSITIVE_X + attachment.array_layer.min(5),
            Some(texture.name),
            level,
        ),
        _ => {
            let layer = gl_int(attachment.array_layer, "attachment layer")?;
            gl.framebuffer_texture_layer(gl::FRAMEBUFFER, point, Some(texture.name), level, layer)
        }
    }
    Ok(())
}
