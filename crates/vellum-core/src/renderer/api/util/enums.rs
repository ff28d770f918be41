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

//! Generic rendering enums.

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// The size of one index, in bytes.
    pub const fn size(&self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// A backend-agnostic representation of a graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsBackendType {
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 11 API.
    Dx11,
    /// OpenGL API.
    OpenGL,
    /// OpenGL ES API.
    OpenGLES,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

/// Defines the programmable stage in the graphics pipeline a shader is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The geometry shader stage.
    Geometry,
    /// The fragment (or pixel) shader stage.
    Fragment,
}

/// Defines the memory format of pixels in a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    // 8-bit formats
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA).
    Bgra8Unorm,
    // 16-bit formats
    /// One 16-bit unsigned normalized component.
    R16Unorm,
    /// One 16-bit float component.
    R16Float,
    /// Two 16-bit float components.
    Rg16Float,
    /// Four 16-bit float components.
    Rgba16Float,
    // 32-bit formats
    /// One 32-bit float component.
    R32Float,
    /// Two 32-bit float components.
    Rg32Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// One 32-bit unsigned integer component.
    R32Uint,
    /// Four 32-bit unsigned integer components.
    Rgba32Uint,
    // Depth/stencil formats
    /// A 16-bit unsigned normalized depth format.
    Depth16Unorm,
    /// A 32-bit float depth format.
    Depth32Float,
    /// A 24-bit unsigned normalized depth format with an 8-bit stencil component.
    Depth24UnormStencil8,
    /// A 32-bit float depth format with an 8-bit stencil component.
    Depth32FloatStencil8,
}

impl TextureFormat {
    /// Returns the size in bytes of a single texel as uploaded from the host.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rg8Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm => 4,
            TextureFormat::R16Unorm | TextureFormat::R16Float => 2,
            TextureFormat::Rg16Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R32Float | TextureFormat::R32Uint => 4,
            TextureFormat::Rg32Float => 8,
            TextureFormat::Rgba32Float | TextureFormat::Rgba32Uint => 16,
            TextureFormat::Depth16Unorm => 2,
            TextureFormat::Depth32Float => 4,
            TextureFormat::Depth24UnormStencil8 => 4,
            TextureFormat::Depth32FloatStencil8 => 8,
        }
    }

    /// Returns `true` for depth and depth/stencil formats.
    pub const fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth32Float
                | TextureFormat::Depth24UnormStencil8
                | TextureFormat::Depth32FloatStencil8
        )
    }

    /// Returns `true` for formats carrying a stencil component.
    pub const fn has_stencil(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth24UnormStencil8 | TextureFormat::Depth32FloatStencil8
        )
    }
}
