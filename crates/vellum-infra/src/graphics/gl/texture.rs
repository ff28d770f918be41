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

//! Native texture objects and texture views.

use vellum_core::renderer::api::{
    CubeFace, TextureDescriptor, TextureDimension, TextureFormat, TextureId, TextureRegion,
};

use super::consts as gl;
use super::context::{GlContext, NativeTexture};
use super::conversions::{GlPixelFormat, IntoGl};
use super::error::{gl_int, ErrorChecker, GlError, GlResult};
use super::texture_sampler::TextureSamplerManager;

/// GL's default row alignment for pixel uploads.
const DEFAULT_UNPACK_ALIGNMENT: u32 = 4;

/// Bytes the native upload reads for a `width` x `height` region: every row but the last is
/// padded to the unpack alignment in effect during [`GlTexture::upload`].
fn upload_size(texel_size: u32, width: u32, height: u32) -> u64 {
    if width == 0 || height == 0 {
        return 0;
    }
    let alignment = u64::from(texel_size.min(DEFAULT_UNPACK_ALIGNMENT).max(1));
    let row = u64::from(width) * u64::from(texel_size);
    let pitch = row.div_ceil(alignment) * alignment;
    pitch * (u64::from(height) - 1) + row
}

/// A realized texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlTexture {
    pub name: NativeTexture,
    /// The native bind target: 2D, 2D array, cube or cube array.
    pub target: u32,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub pixel: GlPixelFormat,
    pub texel_size: u32,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
}

/// Returns the native bind target for a texture description.
pub fn texture_target(dimension: TextureDimension, array_layers: u32) -> u32 {
    match (dimension, array_layers > 1) {
        (TextureDimension::D2, false) => gl::TEXTURE_2D,
        (TextureDimension::D2, true) => gl::TEXTURE_2D_ARRAY,
        (TextureDimension::Cube, false) => gl::TEXTURE_CUBE_MAP,
        (TextureDimension::Cube, true) => gl::TEXTURE_CUBE_MAP_ARRAY,
    }
}

impl GlTexture {
    /// Allocates immutable storage for every mip level and layer.
    pub(crate) fn realize(
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        units: &mut TextureSamplerManager,
        descriptor: &TextureDescriptor,
    ) -> GlResult<Self> {
        let mip_levels = descriptor.mip_levels.max(1);
        let array_layers = descriptor.array_layers.max(1);
        let target = texture_target(descriptor.dimension, array_layers);
        let pixel: GlPixelFormat = descriptor.format.into_gl();
        let levels = gl_int(mip_levels, "mip level count")?;
        let width = gl_int(descriptor.width, "texture width")?;
        let height = gl_int(descriptor.height, "texture height")?;

        let name = gl.create_texture().map_err(GlError::Creation)?;
        units.bind_transient(gl, target, Some(name));
        gl.tex_parameter_i32(target, gl::TEXTURE_MAX_LEVEL, levels - 1);

        match target {
            gl::TEXTURE_2D | gl::TEXTURE_CUBE_MAP => {
                gl.tex_storage_2d(target, levels, pixel.internal_format, width, height);
            }
            gl::TEXTURE_2D_ARRAY => {
                let depth = gl_int(array_layers, "array layer count")?;
                gl.tex_storage_3d(target, levels, pixel.internal_format, width, height, depth);
            }
            _ => {
                // Cube arrays count layer-faces.
                let depth = gl_int(u64::from(array_layers) * 6, "array layer count")?;
                gl.tex_storage_3d(target, levels, pixel.internal_format, width, height, depth);
            }
        }
        checker.check_native_error(gl, "tex_storage")?;

        Ok(Self {
            name,
            target,
            dimension: descriptor.dimension,
            format: descriptor.format,
            pixel,
            texel_size: descriptor.format.bytes_per_pixel(),
            width: descriptor.width,
            height: descriptor.height,
            mip_levels,
            array_layers,
        })
    }

    /// Verifies that an update addresses the texture with the right dimension: a cube face
    /// for cubemaps, none otherwise.
    pub(crate) fn check_dimension(&self, id: TextureId, face: Option<CubeFace>) -> GlResult<()> {
        let expected = match face {
            Some(_) => TextureDimension::Cube,
            None => TextureDimension::D2,
        };
        if expected == self.dimension {
            Ok(())
        } else {
            Err(GlError::DimensionMismatch {
                id: id.0,
                expected,
                found: self.dimension,
            })
        }
    }

    /// Verifies that `region` lies inside its mip level and layer, and that `len` bytes cover
    /// every row the native upload will read.
    pub(crate) fn check_region(
        &self,
        id: TextureId,
        region: TextureRegion,
        len: usize,
    ) -> GlResult<()> {
        let overflow = |detail: String| GlError::TextureRegionOverflow { id: id.0, detail };
        if region.mip_level >= self.mip_levels {
            return Err(overflow(format!(
                "targets mip {} of a texture with {} levels",
                region.mip_level, self.mip_levels
            )));
        }
        if region.array_layer >= self.array_layers {
            return Err(overflow(format!(
                "targets layer {} of a texture with {} layers",
                region.array_layer, self.array_layers
            )));
        }

        let level_width = (u64::from(self.width) >> region.mip_level).max(1);
        let level_height = (u64::from(self.height) >> region.mip_level).max(1);
        let right = u64::from(region.x) + u64::from(region.width);
        let bottom = u64::from(region.y) + u64::from(region.height);
        if right > level_width || bottom > level_height {
            return Err(overflow(format!(
                "region {}x{} at ({}, {}) exceeds mip {} ({level_width}x{level_height})",
                region.width, region.height, region.x, region.y, region.mip_level
            )));
        }

        let required = upload_size(self.texel_size, region.width, region.height);
        if (len as u64) < required {
            return Err(overflow(format!(
                "needs {required} bytes for a {}x{} region, the payload holds {len}",
                region.width, region.height
            )));
        }
        Ok(())
    }

    /// Copies `data` into a region of the texture. The dimension must have been checked with
    /// [`GlTexture::check_dimension`].
    pub(crate) fn upload(
        &self,
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        units: &mut TextureSamplerManager,
        face: Option<CubeFace>,
        region: TextureRegion,
        data: &[u8],
    ) -> GlResult<()> {
        let level = gl_int(region.mip_level, "mip level")?;
        let x = gl_int(region.x, "texture x offset")?;
        let y = gl_int(region.y, "texture y offset")?;
        let width = gl_int(region.width, "texture region width")?;
        let height = gl_int(region.height, "texture region height")?;
        let GlPixelFormat {
            format, data_type, ..
        } = self.pixel;

        // 2D uploads address a layer of a 2D array, cube uploads a face or a layer-face.
        let (sub_target, layer) = match face {
            None if self.target == gl::TEXTURE_2D && region.array_layer == 0 => {
                (gl::TEXTURE_2D, None)
            }
            None => (
                gl::TEXTURE_2D_ARRAY,
                Some(gl_int(region.array_layer, "array layer")?),
            ),
            Some(face) if self.target == gl::TEXTURE_CUBE_MAP => (face.into_gl(), None),
            Some(face) => {
                let layer_face = u64::from(region.array_layer) * 6 + u64::from(face.index());
                (
                    gl::TEXTURE_CUBE_MAP_ARRAY,
                    Some(gl_int(layer_face, "cube array layer")?),
                )
            }
        };

        units.bind_transient(gl, self.target, Some(self.name));

        let override_alignment = self.texel_size < DEFAULT_UNPACK_ALIGNMENT;
        if override_alignment {
            gl.pixel_store_i32(gl::UNPACK_ALIGNMENT, self.texel_size as i32);
        }

        match layer {
            None => gl.tex_sub_image_2d(
                sub_target, level, x, y, width, height, format, data_type, data,
            ),
            Some(layer) => gl.tex_sub_image_3d(
                sub_target, level, x, y, layer, width, height, 1, format, data_type, data,
            ),
        }
        let uploaded = checker.check_native_error(gl, "tex_sub_image");

        if override_alignment {
            gl.pixel_store_i32(gl::UNPACK_ALIGNMENT, DEFAULT_UNPACK_ALIGNMENT as i32);
        }
        uploaded
    }

    /// Fills every mip level below the base level from level zero.
    pub(crate) fn generate_mipmaps(
        &self,
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        units: &mut TextureSamplerManager,
        id: TextureId,
    ) -> GlResult<()> {
        units.bind_full_chain(gl, id, self);
        gl.generate_mipmap(self.target);
        checker.check_native_error(gl, "generate_mipmap")
    }

    pub(crate) fn destroy(self, gl: &mut dyn GlContext) {
        gl.delete_texture(self.name);
    }
}

/// A realized texture view. Views alias their texture's native object and restrict the
/// sampled mip range when bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlTextureView {
    pub texture: GlTexture,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
}

impl GlTextureView {
    pub(crate) fn new(texture: GlTexture, base_mip_level: u32, mip_level_count: Option<u32>) -> Self {
        let available = texture.mip_levels.saturating_sub(base_mip_level).max(1);
        Self {
            texture,
            base_mip_level,
            mip_level_count: mip_level_count.unwrap_or(available).clamp(1, available),
        }
    }

    /// More than one sampled mip level.
    pub fn is_mipmapped(&self) -> bool {
        self.mip_level_count > 1
    }
}
