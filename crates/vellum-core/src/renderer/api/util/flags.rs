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

//! Flags representing which shader stages can access a resource binding.

use super::enums::ShaderStage;
use crate::vellum_bitflags;

vellum_bitflags! {
    /// Flags representing which shader stages can access a resource binding.
    ///
    /// Used by resource layout elements to declare their visibility.
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Geometry shader stage.
        const GEOMETRY = 1 << 1;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 2;
        /// Vertex and fragment stages.
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

impl From<ShaderStage> for ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Geometry => Self::GEOMETRY,
            ShaderStage::Fragment => Self::FRAGMENT,
        }
    }
}

impl ShaderStageFlags {
    /// Checks if these flags contain a specific stage.
    pub fn contains_stage(&self, stage: ShaderStage) -> bool {
        self.contains(stage.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_fragment_covers_both_stages() {
        let flags = ShaderStageFlags::VERTEX_FRAGMENT;
        assert!(flags.contains_stage(ShaderStage::Vertex));
        assert!(flags.contains_stage(ShaderStage::Fragment));
        assert!(!flags.contains_stage(ShaderStage::Geometry));
    }
}
