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

//! Native shader objects.

use vellum_core::renderer::api::{ShaderDescriptor, ShaderStage};

use super::context::{GlContext, NativeShader};
use super::conversions::IntoGl;
use super::error::{ErrorChecker, GlError, GlResult};

/// A compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlShader {
    pub name: NativeShader,
    pub stage: ShaderStage,
}

impl GlShader {
    pub(crate) fn realize(
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        descriptor: &ShaderDescriptor,
    ) -> GlResult<Self> {
        let name = gl
            .create_shader(descriptor.stage.into_gl())
            .map_err(GlError::Creation)?;
        gl.shader_source(name, &descriptor.source);
        gl.compile_shader(name);

        if !gl.get_shader_compile_status(name) {
            let log = gl.get_shader_info_log(name);
            gl.delete_shader(name);
            let label = descriptor
                .label
                .clone()
                .unwrap_or_else(|| format!("{:?} shader", descriptor.stage));
            log::error!("GlShader: '{label}' failed to compile: {log}");
            return Err(GlError::ShaderCompilation { label, log });
        }
        checker.check_native_error(gl, "compile_shader")?;

        Ok(Self {
            name,
            stage: descriptor.stage,
        })
    }

    pub(crate) fn destroy(self, gl: &mut dyn GlContext) {
        gl.delete_shader(self.name);
    }
}
