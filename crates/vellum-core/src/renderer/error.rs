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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::binding::ResourceKind;
use crate::renderer::api::pipeline::PipelineId;
use crate::renderer::api::shader::ShaderId;
use std::fmt;

/// An error related to the compilation of a shader stage.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source failed to compile into a native shader object.
    CompilationError {
        /// A descriptive label for the shader, if available.
        label: String,
        /// The compiler's info log.
        details: String,
    },
    /// The requested shader could not be found.
    NotFound {
        /// The ID of the shader that was not found.
        id: ShaderId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Shader not found for ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a graphics pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The shader stages failed to link into a program.
    LinkFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// The linker's info log.
        details: String,
    },
    /// A resource declared by the pipeline's layouts is not present in the linked program,
    /// or a slot was addressed that the layouts do not declare.
    MissingBinding {
        /// The kind of resource that was looked up.
        kind: ResourceKind,
        /// The resource set slot.
        set: u32,
        /// The element index within the set.
        slot: u32,
    },
    /// The specified pipeline ID is not valid.
    InvalidPipeline {
        /// The ID of the invalid pipeline.
        id: PipelineId,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::LinkFailed { label, details } => {
                write!(
                    f,
                    "Pipeline link failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::MissingBinding { kind, set, slot } => {
                let noun = match kind {
                    ResourceKind::UniformBuffer => "uniform buffer",
                    ResourceKind::TextureReadOnly => "texture",
                    ResourceKind::Sampler => "sampler",
                };
                write!(f, "There is no {noun} in set {set}, slot {slot}")
            }
            PipelineError::InvalidPipeline { id } => {
                write!(f, "Invalid pipeline ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation or use of a GPU resource (buffers, textures, etc.).
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// A generic resource could not be found.
    NotFound,
    /// A resource of one kind was supplied where another kind was expected.
    WrongKind {
        /// The kind the operation expected.
        expected: ResourceKind,
        /// The kind that was supplied.
        found: ResourceKind,
    },
    /// A fixed number of binding slots was exceeded.
    Exhausted(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::WrongKind { expected, found } => {
                write!(f, "Expected a {expected:?} resource, found {found:?}.")
            }
            ResourceError::Exhausted(msg) => write!(f, "Binding slots exhausted: {msg}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// A high-level error that can occur while a device executes recorded commands.
#[derive(Debug)]
pub enum RenderError {
    /// A native API call reported an error code.
    NativeError {
        /// The name of the native call that failed.
        call: String,
        /// The raw error code.
        code: u32,
    },
    /// The recorded command stream could not be executed.
    ExecutionFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// The graphics device was lost or torn down.
    DeviceLost,
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NativeError { call, code } => {
                write!(f, "Native call {call} failed with error code {code:#06x}")
            }
            RenderError::ExecutionFailed(msg) => {
                write!(f, "Command stream execution failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::DeviceLost => write!(f, "The graphics device was lost."),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}
