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

//! Provides the public, backend-agnostic rendering contracts of Vellum.
//!
//! This module defines the "common language" shared by every backend: the
//! resource descriptions and opaque handles in [`api`], the recording and
//! resource-creation [`traits`], and the [`error`] hierarchy.
//!
//! A backend (such as the immediate-mode GL backend in `vellum-infra`) decides
//! *how* the recorded commands reach the native API; callers only ever see the
//! types re-exported here.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{PipelineError, RenderError, ResourceError, ShaderError};
pub use self::traits::{CommandList, ResourceFactory};
