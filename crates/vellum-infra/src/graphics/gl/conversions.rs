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

//! Conversions from backend-agnostic descriptions to native GL enumerants.

use vellum_core::renderer::api::{
    AddressMode, BlendFactor, BlendOperation, BufferUsage, CompareFunction, CubeFace, CullMode,
    FilterMode, FrontFace, IndexFormat, MipmapFilterMode, PolygonMode, PrimitiveTopology,
    SamplerBorderColor, ShaderStage, TextureFormat, VertexFormat,
};

use super::consts as gl;

/// A local extension trait to convert our engine's types into GL-compatible values.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl<T> {
    /// Consumes self and converts it into a GL-compatible value.
    fn into_gl(self) -> T;
}

/// The three enumerants that together describe a texel layout to GL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlPixelFormat {
    /// The sized internal format used for storage allocation.
    pub internal_format: u32,
    /// The client pixel format used for uploads.
    pub format: u32,
    /// The client component type used for uploads.
    pub data_type: u32,
}

/// How a vertex attribute is described to `vertex_attrib_pointer_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVertexAttribute {
    /// Component count.
    pub size: i32,
    /// Component type.
    pub data_type: u32,
    /// Whether integer components are normalized to `[0, 1]` or `[-1, 1]`.
    pub normalized: bool,
    /// Whether the attribute must be bound with the integer entry point.
    pub integer: bool,
}

// --- Pipeline state ---

impl IntoGl<u32> for PrimitiveTopology {
    fn into_gl(self) -> u32 {
        match self {
            PrimitiveTopology::PointList => gl::POINTS,
            PrimitiveTopology::LineList => gl::LINES,
            PrimitiveTopology::LineStrip => gl::LINE_STRIP,
            PrimitiveTopology::TriangleList => gl::TRIANGLES,
            PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
        }
    }
}

impl IntoGl<u32> for BlendFactor {
    fn into_gl(self) -> u32 {
        match self {
            BlendFactor::Zero => gl::ZERO,
            BlendFactor::One => gl::ONE,
            BlendFactor::SrcColor => gl::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::SrcAlpha => gl::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstColor => gl::DST_COLOR,
            BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
            BlendFactor::DstAlpha => gl::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
            BlendFactor::Constant => gl::CONSTANT_COLOR,
            BlendFactor::OneMinusConstant => gl::ONE_MINUS_CONSTANT_COLOR,
        }
    }
}

impl IntoGl<u32> for BlendOperation {
    fn into_gl(self) -> u32 {
        match self {
            BlendOperation::Add => gl::FUNC_ADD,
            BlendOperation::Subtract => gl::FUNC_SUBTRACT,
            BlendOperation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
            BlendOperation::Min => gl::MIN,
            BlendOperation::Max => gl::MAX,
        }
    }
}

impl IntoGl<u32> for CompareFunction {
    fn into_gl(self) -> u32 {
        match self {
            CompareFunction::Never => gl::NEVER,
            CompareFunction::Less => gl::LESS,
            CompareFunction::Equal => gl::EQUAL,
            CompareFunction::LessEqual => gl::LEQUAL,
            CompareFunction::Greater => gl::GREATER,
            CompareFunction::NotEqual => gl::NOTEQUAL,
            CompareFunction::GreaterEqual => gl::GEQUAL,
            CompareFunction::Always => gl::ALWAYS,
        }
    }
}

/// `None` means face culling must be disabled.
impl IntoGl<Option<u32>> for CullMode {
    fn into_gl(self) -> Option<u32> {
        match self {
            CullMode::None => None,
            CullMode::Front => Some(gl::FRONT),
            CullMode::Back => Some(gl::BACK),
        }
    }
}

impl IntoGl<u32> for FrontFace {
    fn into_gl(self) -> u32 {
        match self {
            FrontFace::Ccw => gl::CCW,
            FrontFace::Cw => gl::CW,
        }
    }
}

impl IntoGl<u32> for PolygonMode {
    fn into_gl(self) -> u32 {
        match self {
            PolygonMode::Fill => gl::FILL,
            PolygonMode::Line => gl::LINE,
            PolygonMode::Point => gl::POINT,
        }
    }
}

impl IntoGl<u32> for ShaderStage {
    fn into_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Geometry => gl::GEOMETRY_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl IntoGl<u32> for IndexFormat {
    fn into_gl(self) -> u32 {
        match self {
            IndexFormat::Uint16 => gl::UNSIGNED_SHORT,
            IndexFormat::Uint32 => gl::UNSIGNED_INT,
        }
    }
}

impl IntoGl<GlVertexAttribute> for VertexFormat {
    fn into_gl(self) -> GlVertexAttribute {
        let (size, data_type, normalized, integer) = match self {
            VertexFormat::Uint8x4 => (4, gl::UNSIGNED_BYTE, false, true),
            VertexFormat::Sint8x4 => (4, gl::BYTE, false, true),
            VertexFormat::Unorm8x4 => (4, gl::UNSIGNED_BYTE, true, false),
            VertexFormat::Snorm8x4 => (4, gl::BYTE, true, false),
            VertexFormat::Uint16x2 => (2, gl::UNSIGNED_SHORT, false, true),
            VertexFormat::Uint16x4 => (4, gl::UNSIGNED_SHORT, false, true),
            VertexFormat::Sint16x2 => (2, gl::SHORT, false, true),
            VertexFormat::Sint16x4 => (4, gl::SHORT, false, true),
            VertexFormat::Unorm16x2 => (2, gl::UNSIGNED_SHORT, true, false),
            VertexFormat::Unorm16x4 => (4, gl::UNSIGNED_SHORT, true, false),
            VertexFormat::Float16x2 => (2, gl::HALF_FLOAT, false, false),
            VertexFormat::Float16x4 => (4, gl::HALF_FLOAT, false, false),
            VertexFormat::Float32 => (1, gl::FLOAT, false, false),
            VertexFormat::Float32x2 => (2, gl::FLOAT, false, false),
            VertexFormat::Float32x3 => (3, gl::FLOAT, false, false),
            VertexFormat::Float32x4 => (4, gl::FLOAT, false, false),
            VertexFormat::Uint32 => (1, gl::UNSIGNED_INT, false, true),
            VertexFormat::Uint32x2 => (2, gl::UNSIGNED_INT, false, true),
            VertexFormat::Uint32x4 => (4, gl::UNSIGNED_INT, false, true),
            VertexFormat::Sint32 => (1, gl::INT, false, true),
            VertexFormat::Sint32x2 => (2, gl::INT, false, true),
            VertexFormat::Sint32x4 => (4, gl::INT, false, true),
        };
        GlVertexAttribute {
            size,
            data_type,
            normalized,
            integer,
        }
    }
}

// --- Textures and samplers ---

impl IntoGl<GlPixelFormat> for TextureFormat {
    fn into_gl(self) -> GlPixelFormat {
        let (internal_format, format, data_type) = match self {
            TextureFormat::R8Unorm => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
            TextureFormat::Rg8Unorm => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
            TextureFormat::Rgba8Unorm => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
            TextureFormat::Rgba8UnormSrgb => (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
            TextureFormat::Bgra8Unorm => (gl::RGBA8, gl::BGRA, gl::UNSIGNED_BYTE),
            TextureFormat::R16Unorm => (gl::R16, gl::RED, gl::UNSIGNED_SHORT),
            TextureFormat::R16Float => (gl::R16F, gl::RED, gl::HALF_FLOAT),
            TextureFormat::Rg16Float => (gl::RG16F, gl::RG, gl::HALF_FLOAT),
            TextureFormat::Rgba16Float => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
            TextureFormat::R32Float => (gl::R32F, gl::RED, gl::FLOAT),
            TextureFormat::Rg32Float => (gl::RG32F, gl::RG, gl::FLOAT),
            TextureFormat::Rgba32Float => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
            TextureFormat::R32Uint => (gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT),
            TextureFormat::Rgba32Uint => (gl::RGBA32UI, gl::RGBA_INTEGER, gl::UNSIGNED_INT),
            TextureFormat::Depth16Unorm => {
                (gl::DEPTH_COMPONENT16, gl::DEPTH_COMPONENT, gl::UNSIGNED_SHORT)
            }
            TextureFormat::Depth32Float => {
                (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT)
            }
            TextureFormat::Depth24UnormStencil8 => {
                (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8)
            }
            TextureFormat::Depth32FloatStencil8 => (
                gl::DEPTH32F_STENCIL8,
                gl::DEPTH_STENCIL,
                gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
            ),
        };
        GlPixelFormat {
            internal_format,
            format,
            data_type,
        }
    }
}

impl IntoGl<u32> for AddressMode {
    fn into_gl(self) -> u32 {
        match self {
            AddressMode::Repeat => gl::REPEAT,
            AddressMode::ClampToEdge => gl::CLAMP_TO_EDGE,
            AddressMode::MirrorRepeat => gl::MIRRORED_REPEAT,
            AddressMode::ClampToBorder => gl::CLAMP_TO_BORDER,
        }
    }
}

/// Magnification filters never involve mip levels.
impl IntoGl<u32> for FilterMode {
    fn into_gl(self) -> u32 {
        match self {
            FilterMode::Nearest => gl::NEAREST,
            FilterMode::Linear => gl::LINEAR,
        }
    }
}

impl IntoGl<[f32; 4]> for SamplerBorderColor {
    fn into_gl(self) -> [f32; 4] {
        match self {
            SamplerBorderColor::TransparentBlack => [0.0, 0.0, 0.0, 0.0],
            SamplerBorderColor::OpaqueBlack => [0.0, 0.0, 0.0, 1.0],
            SamplerBorderColor::OpaqueWhite => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Returns the cube face's native sub-image target.
impl IntoGl<u32> for CubeFace {
    fn into_gl(self) -> u32 {
        gl::TEXTURE_CUBE_MAP_POSITIVE_X + self.index()
    }
}

/// Returns the minification filter for one of a sampler's two physical variants.
///
/// The non-mipmapped variant ignores the mip filter entirely, so it stays valid against
/// textures that only have a base level.
pub fn min_filter(min: FilterMode, mip: MipmapFilterMode, mipmapped: bool) -> u32 {
    if !mipmapped {
        return min.into_gl();
    }
    match (min, mip) {
        (FilterMode::Nearest, MipmapFilterMode::Nearest) => gl::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Linear, MipmapFilterMode::Nearest) => gl::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Nearest, MipmapFilterMode::Linear) => gl::NEAREST_MIPMAP_LINEAR,
        (FilterMode::Linear, MipmapFilterMode::Linear) => gl::LINEAR_MIPMAP_LINEAR,
    }
}

/// Picks the buffer-data usage hint that best matches a buffer's declared usage.
pub fn buffer_usage_hint(usage: BufferUsage) -> u32 {
    if usage.contains(BufferUsage::STAGING) {
        gl::STREAM_DRAW
    } else if usage.contains(BufferUsage::DYNAMIC) {
        gl::DYNAMIC_DRAW
    } else {
        gl::STATIC_DRAW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_map_to_consecutive_targets() {
        assert_eq!(CubeFace::PositiveX.into_gl(), gl::TEXTURE_CUBE_MAP_POSITIVE_X);
        assert_eq!(CubeFace::NegativeZ.into_gl(), gl::TEXTURE_CUBE_MAP_NEGATIVE_Z);
    }

    #[test]
    fn non_mipmapped_min_filter_drops_mip_mode() {
        assert_eq!(
            min_filter(FilterMode::Linear, MipmapFilterMode::Linear, false),
            gl::LINEAR
        );
        assert_eq!(
            min_filter(FilterMode::Linear, MipmapFilterMode::Linear, true),
            gl::LINEAR_MIPMAP_LINEAR
        );
        assert_eq!(
            min_filter(FilterMode::Nearest, MipmapFilterMode::Linear, true),
            gl::NEAREST_MIPMAP_LINEAR
        );
    }

    #[test]
    fn integer_vertex_formats_use_integer_binding() {
        let attr: GlVertexAttribute = VertexFormat::Uint32x2.into_gl();
        assert!(attr.integer);
        assert_eq!(attr.size, 2);

        let attr: GlVertexAttribute = VertexFormat::Unorm8x4.into_gl();
        assert!(!attr.integer);
        assert!(attr.normalized);
    }

    #[test]
    fn stencil_formats_use_packed_types() {
        let pixel: GlPixelFormat = TextureFormat::Depth24UnormStencil8.into_gl();
        assert_eq!(pixel.format, gl::DEPTH_STENCIL);
        assert_eq!(pixel.data_type, gl::UNSIGNED_INT_24_8);
    }

    #[test]
    fn culling_none_disables() {
        let none: Option<u32> = CullMode::None.into_gl();
        let back: Option<u32> = CullMode::Back.into_gl();
        assert_eq!(none, None);
        assert_eq!(back, Some(gl::BACK));
    }

    #[test]
    fn buffer_usage_hint_prefers_staging_then_dynamic() {
        assert_eq!(buffer_usage_hint(BufferUsage::VERTEX), gl::STATIC_DRAW);
        assert_eq!(
            buffer_usage_hint(BufferUsage::UNIFORM | BufferUsage::DYNAMIC),
            gl::DYNAMIC_DRAW
        );
        assert_eq!(
            buffer_usage_hint(BufferUsage::STAGING | BufferUsage::DYNAMIC),
            gl::STREAM_DRAW
        );
    }
}
