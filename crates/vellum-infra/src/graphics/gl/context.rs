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

//! The seam between the backend and a live GL context.
//!
//! Window and context creation are out of scope for this crate, so the backend never talks to
//! a driver directly. Everything it needs is expressed through [`GlContext`], whose method
//! names and argument conventions follow the GL entry points one-to-one. Enumerants are the raw
//! values from [`consts`](super::consts).
//!
//! Two implementations ship with the crate:
//! - [`HeadlessGlContext`](super::headless::HeadlessGlContext), a software double that records
//!   calls and emulates the subset of GL state the backend relies on;
//! - `GlowContext` (feature `glow`), which forwards to a real driver through `glow`.

use std::num::NonZeroU32;

macro_rules! native_handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(pub NonZeroU32);
        )*
    };
}

native_handle! {
    /// A native buffer object name.
    NativeBuffer,
    /// A native texture object name.
    NativeTexture,
    /// A native sampler object name.
    NativeSampler,
    /// A native framebuffer object name.
    NativeFramebuffer,
    /// A native shader object name.
    NativeShader,
    /// A native program object name.
    NativeProgram,
}

/// The location of a uniform within a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeUniformLocation(pub u32);

/// The native GL entry points used by the backend.
///
/// Every method must be called on the thread that owns the context. Implementations are not
/// expected to validate arguments; errors surface through [`GlContext::get_error`].
pub trait GlContext {
    // --- Queries and synchronization ---

    /// Returns and clears the oldest recorded error flag (`NO_ERROR` when none is pending).
    fn get_error(&mut self) -> u32;
    /// Queries an integer parameter such as `MAX_COMBINED_TEXTURE_IMAGE_UNITS`.
    fn get_parameter_i32(&mut self, parameter: u32) -> i32;
    /// Flushes queued commands to the driver.
    fn flush(&mut self);
    /// Blocks until every queued command has completed.
    fn finish(&mut self);

    // --- Buffers ---

    fn create_buffer(&mut self) -> Result<NativeBuffer, String>;
    fn delete_buffer(&mut self, buffer: NativeBuffer);
    fn bind_buffer(&mut self, target: u32, buffer: Option<NativeBuffer>);
    fn buffer_data_size(&mut self, target: u32, size: i32, usage: u32);
    fn buffer_sub_data(&mut self, target: u32, offset: i32, data: &[u8]);
    fn get_buffer_sub_data(&mut self, target: u32, offset: i32, dst: &mut [u8]);
    /// Copies bytes between the buffers bound to two targets.
    fn copy_buffer_sub_data(
        &mut self,
        read_target: u32,
        write_target: u32,
        read_offset: i32,
        write_offset: i32,
        size: i32,
    );
    fn bind_buffer_range(
        &mut self,
        target: u32,
        index: u32,
        buffer: Option<NativeBuffer>,
        offset: i32,
        size: i32,
    );

    // --- Textures ---

    fn create_texture(&mut self) -> Result<NativeTexture, String>;
    fn delete_texture(&mut self, texture: NativeTexture);
    /// Selects the active texture unit. `unit` is `TEXTURE0 + n`.
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: u32, texture: Option<NativeTexture>);
    fn tex_storage_2d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    );
    fn tex_storage_3d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        data: &[u8],
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_3d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        z_offset: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: u32,
        ty: u32,
        data: &[u8],
    );
    fn tex_parameter_i32(&mut self, target: u32, parameter: u32, value: i32);
    /// Fills the mip chain of the texture bound to `target` from its base level.
    fn generate_mipmap(&mut self, target: u32);
    fn pixel_store_i32(&mut self, parameter: u32, value: i32);

    // --- Samplers ---

    fn create_sampler(&mut self) -> Result<NativeSampler, String>;
    fn delete_sampler(&mut self, sampler: NativeSampler);
    /// Binds a sampler to texture unit `unit` (a plain index, not `TEXTURE0 + n`).
    fn bind_sampler(&mut self, unit: u32, sampler: Option<NativeSampler>);
    fn sampler_parameter_i32(&mut self, sampler: NativeSampler, name: u32, value: i32);
    fn sampler_parameter_f32(&mut self, sampler: NativeSampler, name: u32, value: f32);
    fn sampler_parameter_f32_slice(&mut self, sampler: NativeSampler, name: u32, value: &[f32]);

    // --- Framebuffers ---

    fn create_framebuffer(&mut self) -> Result<NativeFramebuffer, String>;
    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer);
    /// Binds a framebuffer. `None` selects the default (window) framebuffer.
    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<NativeFramebuffer>);
    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: Option<NativeTexture>,
        level: i32,
    );
    fn framebuffer_texture_layer(
        &mut self,
        target: u32,
        attachment: u32,
        texture: Option<NativeTexture>,
        level: i32,
        layer: i32,
    );
    fn draw_buffers(&mut self, buffers: &[u32]);
    fn draw_buffer(&mut self, buffer: u32);
    fn check_framebuffer_status(&mut self, target: u32) -> u32;

    // --- Shaders and programs ---

    fn create_shader(&mut self, shader_type: u32) -> Result<NativeShader, String>;
    fn shader_source(&mut self, shader: NativeShader, source: &str);
    fn compile_shader(&mut self, shader: NativeShader);
    fn get_shader_compile_status(&mut self, shader: NativeShader) -> bool;
    fn get_shader_info_log(&mut self, shader: NativeShader) -> String;
    fn delete_shader(&mut self, shader: NativeShader);

    fn create_program(&mut self) -> Result<NativeProgram, String>;
    fn attach_shader(&mut self, program: NativeProgram, shader: NativeShader);
    fn bind_attrib_location(&mut self, program: NativeProgram, index: u32, name: &str);
    fn link_program(&mut self, program: NativeProgram);
    fn get_program_link_status(&mut self, program: NativeProgram) -> bool;
    fn get_program_info_log(&mut self, program: NativeProgram) -> String;
    fn get_uniform_block_index(&mut self, program: NativeProgram, name: &str) -> Option<u32>;
    /// Returns the `UNIFORM_BLOCK_DATA_SIZE` of an active uniform block.
    fn get_active_uniform_block_size(&mut self, program: NativeProgram, index: u32) -> i32;
    fn uniform_block_binding(&mut self, program: NativeProgram, index: u32, binding: u32);
    fn get_uniform_location(
        &mut self,
        program: NativeProgram,
        name: &str,
    ) -> Option<NativeUniformLocation>;
    fn uniform_1_i32(&mut self, location: &NativeUniformLocation, value: i32);
    fn use_program(&mut self, program: Option<NativeProgram>);
    fn delete_program(&mut self, program: NativeProgram);

    // --- Fixed-function state ---

    fn enable(&mut self, capability: u32);
    fn disable(&mut self, capability: u32);
    /// `glEnablei`: enables an indexed capability such as per-draw-buffer blending.
    fn enable_i(&mut self, capability: u32, index: u32);
    fn disable_i(&mut self, capability: u32, index: u32);
    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    fn blend_func_separate_i(
        &mut self,
        draw_buffer: u32,
        src_rgb: u32,
        dst_rgb: u32,
        src_alpha: u32,
        dst_alpha: u32,
    );
    fn blend_equation_separate(&mut self, mode_rgb: u32, mode_alpha: u32);
    fn blend_equation_separate_i(&mut self, draw_buffer: u32, mode_rgb: u32, mode_alpha: u32);
    fn depth_func(&mut self, func: u32);
    fn depth_mask(&mut self, enabled: bool);
    fn cull_face(&mut self, face: u32);
    fn front_face(&mut self, winding: u32);
    fn polygon_mode(&mut self, face: u32, mode: u32);
    fn viewport_indexed(&mut self, index: u32, x: f32, y: f32, width: f32, height: f32);
    fn depth_range_indexed(&mut self, index: u32, near: f64, far: f64);
    fn scissor_indexed(&mut self, index: u32, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&mut self, depth: f64);
    fn clear(&mut self, mask: u32);

    // --- Vertex input ---

    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);
    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_pointer_i32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    );
    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32);

    // --- Draws ---

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
    fn draw_arrays_instanced(&mut self, mode: u32, first: i32, count: i32, instance_count: i32);
    fn draw_elements(&mut self, mode: u32, count: i32, element_type: u32, offset: i32);
    fn draw_elements_base_vertex(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    );
    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    );
    fn draw_elements_instanced_base_vertex(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
        base_vertex: i32,
    );
}
