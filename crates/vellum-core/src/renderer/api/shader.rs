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

//! Defines data structures for shader stages.

use super::util::ShaderStage;

/// A descriptor used to create a [`ShaderId`].
///
/// The source is stored verbatim; it is only handed to the native compiler when
/// the shader is first needed by a pipeline on the context-owning thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// The programmable stage this shader is for.
    pub stage: ShaderStage,
    /// The shader source text, in the language of the backend.
    pub source: String,
}

impl ShaderDescriptor {
    /// Creates an unlabeled shader description.
    pub fn new(stage: ShaderStage, source: impl Into<String>) -> Self {
        Self {
            label: None,
            stage,
            source: source.into(),
        }
    }
}

/// An opaque handle to a shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub usize);
