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

//! Native sampler objects.
//!
//! GL ties the minification filter to the sampler object, and a mipmapped filter samples
//! nothing from a texture that only has a base level. Each logical sampler therefore owns two
//! native objects, one per mip capability, and the binding manager picks the one that matches
//! the texture in the same unit.

use vellum_core::renderer::api::SamplerDescriptor;

use super::consts as gl;
use super::context::{GlContext, NativeSampler};
use super::conversions::{min_filter, IntoGl};
use super::error::{ErrorChecker, GlError, GlResult};

/// A realized sampler: one logical sampler, two physical variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlSampler {
    pub mipmapped: NativeSampler,
    pub no_mip: NativeSampler,
}

impl GlSampler {
    pub(crate) fn realize(
        gl: &mut dyn GlContext,
        checker: ErrorChecker,
        descriptor: &SamplerDescriptor,
    ) -> GlResult<Self> {
        let mipmapped = create_variant(gl, descriptor, true)?;
        let no_mip = create_variant(gl, descriptor, false)?;
        checker.check_native_error(gl, "sampler_parameter")?;
        Ok(Self { mipmapped, no_mip })
    }

    /// Returns the physical variant matching a texture's mip capability.
    pub fn variant(&self, mipmapped: bool) -> NativeSampler {
        if mipmapped {
            self.mipmapped
        } else {
            self.no_mip
        }
    }

    pub(crate) fn destroy(self, gl: &mut dyn GlContext) {
        gl.delete_sampler(self.mipmapped);
        gl.delete_sampler(self.no_mip);
    }
}

fn create_variant(
    gl: &mut dyn GlContext,
    descriptor: &SamplerDescriptor,
    mipmapped: bool,
) -> GlResult<NativeSampler> {
    let sampler = gl.create_sampler().map_err(GlError::Creation)?;

    let wrap_s: u32 = descriptor.address_mode_u.into_gl();
    let wrap_t: u32 = descriptor.address_mode_v.into_gl();
    let wrap_r: u32 = descriptor.address_mode_w.into_gl();
    gl.sampler_parameter_i32(sampler, gl::TEXTURE_WRAP_S, wrap_s as i32);
    gl.sampler_parameter_i32(sampler, gl::TEXTURE_WRAP_T, wrap_t as i32);
    gl.sampler_parameter_i32(sampler, gl::TEXTURE_WRAP_R, wrap_r as i32);

    let mag: u32 = descriptor.mag_filter.into_gl();
    let min = min_filter(descriptor.min_filter, descriptor.mipmap_filter, mipmapped);
    gl.sampler_parameter_i32(sampler, gl::TEXTURE_MAG_FILTER, mag as i32);
    gl.sampler_parameter_i32(sampler, gl::TEXTURE_MIN_FILTER, min as i32);

    gl.sampler_parameter_f32(sampler, gl::TEXTURE_MIN_LOD, descriptor.lod_min_clamp);
    gl.sampler_parameter_f32(sampler, gl::TEXTURE_MAX_LOD, descriptor.lod_max_clamp);

    let border: [f32; 4] = descriptor.border_color.into_gl();
    gl.sampler_parameter_f32_slice(sampler, gl::TEXTURE_BORDER_COLOR, &border);

    match descriptor.compare {
        Some(func) => {
            let func: u32 = func.into_gl();
            gl.sampler_parameter_i32(
                sampler,
                gl::TEXTURE_COMPARE_MODE,
                gl::COMPARE_REF_TO_TEXTURE as i32,
            );
            gl.sampler_parameter_i32(sampler, gl::TEXTURE_COMPARE_FUNC, func as i32);
        }
        None => gl.sampler_parameter_i32(sampler, gl::TEXTURE_COMPARE_MODE, gl::NONE as i32),
    }

    if descriptor.anisotropy_clamp > 1 {
        gl.sampler_parameter_f32(
            sampler,
            gl::TEXTURE_MAX_ANISOTROPY,
            f32::from(descriptor.anisotropy_clamp),
        );
    }

    Ok(sampler)
}
