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

//! Defines the configuration for the GL device.

/// Controls when native error flags are inspected after state-mutating calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCheckMode {
    /// Never query the native error flag.
    Disabled,
    /// Check in debug builds only.
    #[default]
    DebugOnly,
    /// Check after every state-mutating call, in every build.
    Always,
}

impl ErrorCheckMode {
    /// Returns `true` if checks run in the current build.
    pub const fn is_active(self) -> bool {
        match self {
            ErrorCheckMode::Disabled => false,
            ErrorCheckMode::DebugOnly => cfg!(debug_assertions),
            ErrorCheckMode::Always => true,
        }
    }
}

/// Settings for the GL graphics device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlDeviceSettings {
    /// When native errors are checked.
    pub error_checking: ErrorCheckMode,
    /// Number of texture units to use. `None` queries `MAX_COMBINED_TEXTURE_IMAGE_UNITS`.
    pub max_texture_units: Option<u32>,
    /// Number of viewport/scissor slots tracked by the executor.
    pub max_viewports: u32,
    /// Apply blend state per draw buffer. When `false` only the first attachment's state
    /// is applied, through the non-indexed entry points.
    pub independent_blend: bool,
    /// Zero pooled staging memory when a block is freed.
    pub zero_freed_staging_blocks: bool,
}

impl Default for GlDeviceSettings {
    fn default() -> Self {
        Self {
            error_checking: ErrorCheckMode::default(),
            max_texture_units: None,
            max_viewports: 16,
            independent_blend: true,
            zero_freed_staging_blocks: cfg!(debug_assertions),
        }
    }
}
