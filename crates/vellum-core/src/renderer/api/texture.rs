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

//! Defines data structures related to texture, texture view and sampler resources.

use crate::renderer::{CompareFunction, TextureFormat};
use crate::vellum_bitflags;

/// The shape of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A two-dimensional texture, optionally with several array layers.
    D2,
    /// A cubemap (six square 2D faces), optionally with several array layers.
    Cube,
}

/// One face of a cubemap texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// The `+X` face.
    PositiveX,
    /// The `-X` face.
    NegativeX,
    /// The `+Y` face.
    PositiveY,
    /// The `-Y` face.
    NegativeY,
    /// The `+Z` face.
    PositiveZ,
    /// The `-Z` face.
    NegativeZ,
}

impl CubeFace {
    /// All faces, in native layer order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// The index of this face within a cubemap layer (`+X` is 0, `-Z` is 5).
    pub const fn index(self) -> u32 {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }
}

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
    /// Coordinates outside the range are given a fixed border color.
    ClampToBorder,
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling. Returns the value of the nearest texel.
    Nearest,
    /// Linear interpolation. Returns a weighted average of the nearest texels.
    Linear,
}

/// Defines the filtering mode between mipmap levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapFilterMode {
    /// Use the nearest mipmap level.
    Nearest,
    /// Linearly interpolate between the two nearest mipmap levels.
    Linear,
}

/// The border color to use when `AddressMode::ClampToBorder` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerBorderColor {
    /// A transparent black color `[0.0, 0.0, 0.0, 0.0]`.
    #[default]
    TransparentBlack,
    /// An opaque black color `[0.0, 0.0, 0.0, 1.0]`.
    OpaqueBlack,
    /// An opaque white color `[1.0, 1.0, 1.0, 1.0]`.
    OpaqueWhite,
}

vellum_bitflags! {
    /// A set of flags describing the allowed usages of a [`TextureId`].
    pub struct TextureUsage: u32 {
        /// The texture can be sampled from shaders.
        const SAMPLED = 1 << 0;
        /// The texture can be used as a color attachment of a framebuffer.
        const RENDER_TARGET = 1 << 1;
        /// The texture can be used as the depth (and stencil) attachment of a framebuffer.
        const DEPTH_STENCIL = 1 << 2;
    }
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The width of the base mip level, in texels.
    pub width: u32,
    /// The height of the base mip level, in texels.
    pub height: u32,
    /// The number of mipmap levels.
    pub mip_levels: u32,
    /// The number of array layers (cubemaps count whole cubes, not faces).
    pub array_layers: u32,
    /// The shape of the texture.
    pub dimension: TextureDimension,
    /// The format of the texels in the texture.
    pub format: TextureFormat,
    /// A bitmask of [`TextureUsage`] flags describing how the texture will be used.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Describes a single-layer 2D texture.
    pub fn texture_2d(
        width: u32,
        height: u32,
        mip_levels: u32,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            label: None,
            width,
            height,
            mip_levels,
            array_layers: 1,
            dimension: TextureDimension::D2,
            format,
            usage,
        }
    }

    /// Describes a single cubemap whose faces are `size` x `size` texels.
    pub fn cubemap(size: u32, mip_levels: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            width: size,
            height: size,
            mip_levels,
            array_layers: 1,
            dimension: TextureDimension::Cube,
            format,
            usage,
        }
    }
}

/// A descriptor used to create a [`TextureViewId`].
///
/// A view selects the range of mip levels a shader may sample from its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureViewDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The texture this view reads from.
    pub target: TextureId,
    /// The first mipmap level visible through the view.
    pub base_mip_level: u32,
    /// The number of visible mipmap levels, or `None` for all remaining levels.
    pub mip_level_count: Option<u32>,
}

impl TextureViewDescriptor {
    /// A view covering every mip level of `target`.
    pub fn whole(target: TextureId) -> Self {
        Self {
            label: None,
            target,
            base_mip_level: 0,
            mip_level_count: None,
        }
    }
}

/// A descriptor used to create a [`SamplerId`].
/// A sampler defines how a shader will sample from a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The address mode for the U (or S) texture coordinate.
    pub address_mode_u: AddressMode,
    /// The address mode for the V (or T) texture coordinate.
    pub address_mode_v: AddressMode,
    /// The address mode for the W (or R) texture coordinate.
    pub address_mode_w: AddressMode,
    /// The filter mode for magnification.
    pub mag_filter: FilterMode,
    /// The filter mode for minification.
    pub min_filter: FilterMode,
    /// The filter mode to use between mipmap levels.
    pub mipmap_filter: MipmapFilterMode,
    /// The minimum level of detail (LOD) to use for mipmapping.
    pub lod_min_clamp: f32,
    /// The maximum level of detail (LOD) to use for mipmapping.
    pub lod_max_clamp: f32,
    /// If `Some`, creates a comparison sampler for tasks like shadow mapping.
    pub compare: Option<CompareFunction>,
    /// The maximum anisotropy level to use. Values of 0 or 1 disable anisotropic filtering.
    pub anisotropy_clamp: u16,
    /// The border color to use if any address mode is `ClampToBorder`.
    pub border_color: SamplerBorderColor,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilterMode::Linear,
            lod_min_clamp: 0.0,
            lod_max_clamp: 1000.0,
            compare: None,
            anisotropy_clamp: 1,
            border_color: SamplerBorderColor::TransparentBlack,
        }
    }
}

/// An opaque handle to a texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a texture view resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);
