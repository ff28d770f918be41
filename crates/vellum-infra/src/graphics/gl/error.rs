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

//! Error types of the GL backend and the native error check.

use thiserror::Error;
use vellum_core::renderer::api::{ResourceKind, TextureDimension};
use vellum_core::renderer::{PipelineError, RenderError, ResourceError, ShaderError};

use super::consts as gl;
use super::context::GlContext;
use super::settings::ErrorCheckMode;

/// Result alias used throughout the GL backend.
pub type GlResult<T> = Result<T, GlError>;

/// Everything that can go wrong while realizing resources or replaying a command stream.
#[derive(Debug, Error)]
pub enum GlError {
    #[error("GL call `{call}` raised {}", error_name(*code))]
    Native { call: &'static str, code: u32 },

    #[error("expected a {expected:?} resource, found {found:?}")]
    WrongResourceKind {
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("there is no {} in set {set}, slot {slot}", kind_noun(*kind))]
    MissingBinding {
        kind: ResourceKind,
        set: u32,
        slot: u32,
    },

    #[error("framebuffer '{label}' is incomplete (status {status:#06x})")]
    FramebufferIncomplete { label: String, status: u32 },

    #[error("unknown {kind} {id}")]
    UnknownResource { kind: &'static str, id: usize },

    #[error("resource set '{label}' holds {actual} resources, its layout declares {expected}")]
    ResourceCountMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "resource set {set} was built for layout {found}, set slot {slot} of the pipeline expects layout {expected}"
    )]
    IncompatibleResourceSet {
        set: usize,
        slot: u32,
        expected: usize,
        found: usize,
    },

    #[error("staged payload {0} was already consumed")]
    PayloadConsumed(usize),

    #[error("uniform block '{name}' needs {required} bytes, the bound buffer holds {actual}")]
    UniformBufferTooSmall {
        name: String,
        required: u64,
        actual: u64,
    },

    #[error("shader '{label}' failed to compile: {log}")]
    ShaderCompilation { label: String, log: String },

    #[error("pipeline '{label}' failed to link: {log}")]
    ProgramLink { label: String, log: String },

    #[error("native object creation failed: {0}")]
    Creation(String),

    #[error("texture unit {unit} is out of range, {limit} units are available")]
    TextureUnitsExhausted { unit: u32, limit: u32 },

    #[error("viewport index {index} is out of range, {limit} viewports are available")]
    TooManyViewports { index: u32, limit: u32 },

    #[error("scissor {0} has no viewport to flip against")]
    MissingViewport(u32),

    #[error("no pipeline is bound")]
    NoPipelineBound,

    #[error("indexed draw issued without an index buffer")]
    MissingIndexBuffer,

    #[error("the bound pipeline reads vertex buffer slot {0}, which is empty")]
    MissingVertexBuffer(u32),

    #[error("write of {len} bytes at offset {offset} overflows a {size}-byte buffer")]
    BufferOverflow { offset: u64, len: u64, size: u64 },

    #[error("copy of {size} bytes from offset {read_offset} to offset {write_offset} overlaps itself")]
    OverlappingCopy { read_offset: u64, write_offset: u64, size: u64 },

    #[error("texture {id} update {detail}")]
    TextureRegionOverflow { id: usize, detail: String },

    #[error("{what} of {value} does not fit a native integer")]
    OutOfNativeRange { what: &'static str, value: u64 },

    #[error("texture {id} is a {found:?} texture, the update expects {expected:?}")]
    DimensionMismatch {
        id: usize,
        expected: TextureDimension,
        found: TextureDimension,
    },

    #[error("the disposal queue is already being flushed")]
    ConcurrentFlush,

    #[error("Mutex poisoned ({0})")]
    Poisoned(String),
}

fn kind_noun(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::UniformBuffer => "uniform buffer",
        ResourceKind::TextureReadOnly => "texture",
        ResourceKind::Sampler => "sampler",
    }
}

/// Converts a size, offset or count to the native signed integer type.
pub(crate) fn gl_int(value: impl Into<u64>, what: &'static str) -> GlResult<i32> {
    let value = value.into();
    i32::try_from(value).map_err(|_| GlError::OutOfNativeRange { what, value })
}

/// Returns the symbolic name of a native error code.
pub fn error_name(code: u32) -> &'static str {
    match code {
        gl::NO_ERROR => "NO_ERROR",
        gl::INVALID_ENUM => "INVALID_ENUM",
        gl::INVALID_VALUE => "INVALID_VALUE",
        gl::INVALID_OPERATION => "INVALID_OPERATION",
        gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        gl::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        _ => "an unknown error",
    }
}

impl From<GlError> for ResourceError {
    fn from(err: GlError) -> Self {
        match err {
            GlError::ShaderCompilation { label, log } => ShaderError::CompilationError {
                label,
                details: log,
            }
            .into(),
            GlError::ProgramLink { label, log } => PipelineError::LinkFailed {
                label: Some(label),
                details: log,
            }
            .into(),
            GlError::MissingBinding { kind, set, slot } => {
                PipelineError::MissingBinding { kind, set, slot }.into()
            }
            GlError::WrongResourceKind { expected, found } => {
                ResourceError::WrongKind { expected, found }
            }
            GlError::UnknownResource { .. } => ResourceError::NotFound,
            GlError::BufferOverflow { .. }
            | GlError::TextureRegionOverflow { .. }
            | GlError::OutOfNativeRange { .. } => {
                ResourceError::OutOfBounds
            }
            GlError::TextureUnitsExhausted { .. } | GlError::TooManyViewports { .. } => {
                ResourceError::Exhausted(err.to_string())
            }
            other => ResourceError::BackendError(other.to_string()),
        }
    }
}

impl From<GlError> for RenderError {
    fn from(err: GlError) -> Self {
        match err {
            GlError::Native { call, code } => RenderError::NativeError {
                call: call.to_string(),
                code,
            },
            GlError::Poisoned(_) | GlError::ConcurrentFlush => RenderError::Internal(err.to_string()),
            GlError::PayloadConsumed(_)
            | GlError::NoPipelineBound
            | GlError::MissingIndexBuffer
            | GlError::MissingVertexBuffer(_)
            | GlError::MissingViewport(_) => RenderError::ExecutionFailed(err.to_string()),
            other => RenderError::ResourceError(other.into()),
        }
    }
}

/// Inspects the native error flag after state-mutating calls, according to an [`ErrorCheckMode`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorChecker {
    active: bool,
}

impl ErrorChecker {
    /// Creates a checker for the given mode, resolved against the current build.
    pub fn new(mode: ErrorCheckMode) -> Self {
        Self {
            active: mode.is_active(),
        }
    }

    /// Returns `true` if this checker queries the native error flag.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `GlError::Native` if `call` left an error flag behind.
    pub fn check_native_error(&self, gl: &mut dyn GlContext, call: &'static str) -> GlResult<()> {
        if !self.active {
            return Ok(());
        }
        match gl.get_error() {
            gl::NO_ERROR => Ok(()),
            code => {
                log::error!("GlContext: `{call}` raised {}", error_name(code));
                Err(GlError::Native { call, code })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binding_message_names_the_slot() {
        let err = GlError::MissingBinding {
            kind: ResourceKind::TextureReadOnly,
            set: 0,
            slot: 2,
        };
        assert_eq!(err.to_string(), "there is no texture in set 0, slot 2");
    }

    #[test]
    fn native_errors_become_render_native_errors() {
        let err: RenderError = GlError::Native {
            call: "draw_elements",
            code: gl::INVALID_OPERATION,
        }
        .into();
        match err {
            RenderError::NativeError { call, code } => {
                assert_eq!(call, "draw_elements");
                assert_eq!(code, gl::INVALID_OPERATION);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn compilation_failures_keep_the_info_log() {
        let err: ResourceError = GlError::ShaderCompilation {
            label: "Lit".to_string(),
            log: "0:1: syntax error".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            ResourceError::Shader(ShaderError::CompilationError { ref details, .. })
                if details == "0:1: syntax error"
        ));
    }

    #[test]
    fn disabled_mode_never_checks() {
        assert!(!ErrorChecker::new(ErrorCheckMode::Disabled).is_active());
        assert!(ErrorChecker::new(ErrorCheckMode::Always).is_active());
    }
}
