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

//! [`GlContext`] over a live driver, through `glow`.
//!
//! The wrapped `glow::Context` must be current on the thread that owns the device. Every
//! forwarding call is `unsafe` on the glow side; the single precondition is that thread
//! affinity, which the device upholds.

use super::context::{
    GlContext, NativeBuffer, NativeFramebuffer, NativeProgram, NativeSampler, NativeShader,
    NativeTexture, NativeUniformLocation,
};
use glow::HasContext;

macro_rules! handle_conversions {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<$name> for glow::$name {
                fn from(handle: $name) -> Self {
                    glow::$name(handle.0)
                }
            }

            impl From<glow::$name> for $name {
                fn from(handle: glow::$name) -> Self {
                    $name(handle.0)
                }
            }
        )*
    };
}

handle_conversions!(
    NativeBuffer,
    NativeTexture,
    NativeSampler,
    NativeFramebuffer,
    NativeShader,
    NativeProgram,
);

/// A [`GlContext`] that forwards every call to a `glow::Context`.
///
/// Core profiles refuse attribute setup without a vertex array object, so one is created and
/// bound for the lifetime of the wrapper.
pub struct GlowContext {
    gl: glow::Context,
    vertex_array: glow::NativeVertexArray,
}

impl GlowContext {
    /// Wraps a context that is current on the calling thread.
    pub fn new(gl: glow::Context) -> Result<Self, String> {
        // SAFETY: the context is current on this thread.
        let vertex_array = unsafe {
            let vertex_array = gl.create_vertex_array()?;
            gl.bind_vertex_array(Some(vertex_array));
            vertex_array
        };
        log::debug!("GlowContext: Bound the shared vertex array object.");
        Ok(Self { gl, vertex_array })
    }

    /// The wrapped glow context.
    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }
}

impl std::fmt::Debug for GlowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowContext")
            .field("vertex_array", &self.vertex_array)
            .finish_non_exhaustive()
    }
}

impl Drop for GlowContext {
    fn drop(&mut self) {
        // SAFETY: see `new`.
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.delete_vertex_array(self.vertex_array);
        }
    }
}

// SAFETY (whole impl): `GlowContext` is only reachable through the owning device, which never
// leaves the thread the context is current on.
impl GlContext for GlowContext {
    fn get_error(&mut self) -> u32 {
        unsafe { self.gl.get_error() }
    }

    fn get_parameter_i32(&mut self, parameter: u32) -> i32 {
        unsafe { self.gl.get_parameter_i32(parameter) }
    }

    fn flush(&mut self) {
        unsafe { self.gl.flush() }
    }

    fn finish(&mut self) {
        unsafe { self.gl.finish() }
    }

    fn create_buffer(&mut self) -> Result<NativeBuffer, String> {
        unsafe { self.gl.create_buffer() }.map(Into::into)
    }

    fn delete_buffer(&mut self, buffer: NativeBuffer) {
        unsafe { self.gl.delete_buffer(buffer.into()) }
    }

    fn bind_buffer(&mut self, target: u32, buffer: Option<NativeBuffer>) {
        unsafe { self.gl.bind_buffer(target, buffer.map(Into::into)) }
    }

    fn buffer_data_size(&mut self, target: u32, size: i32, usage: u32) {
        unsafe { self.gl.buffer_data_size(target, size, usage) }
    }

    fn buffer_sub_data(&mut self, target: u32, offset: i32, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target, offset, data) }
    }

    fn get_buffer_sub_data(&mut self, target: u32, offset: i32, dst: &mut [u8]) {
        unsafe { self.gl.get_buffer_sub_data(target, offset, dst) }
    }

    fn copy_buffer_sub_data(
        &mut self,
        read_target: u32,
        write_target: u32,
        read_offset: i32,
        write_offset: i32,
        size: i32,
    ) {
        unsafe {
            self.gl
                .copy_buffer_sub_data(read_target, write_target, read_offset, write_offset, size)
        }
    }

    fn bind_buffer_range(
        &mut self,
        target: u32,
        index: u32,
        buffer: Option<NativeBuffer>,
        offset: i32,
        size: i32,
    ) {
        unsafe {
            self.gl
                .bind_buffer_range(target, index, buffer.map(Into::into), offset, size)
        }
    }

    fn create_texture(&mut self) -> Result<NativeTexture, String> {
        unsafe { self.gl.create_texture() }.map(Into::into)
    }

    fn delete_texture(&mut self, texture: NativeTexture) {
        unsafe { self.gl.delete_texture(texture.into()) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(unit) }
    }

    fn bind_texture(&mut self, target: u32, texture: Option<NativeTexture>) {
        unsafe { self.gl.bind_texture(target, texture.map(Into::into)) }
    }

    fn tex_storage_2d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        unsafe {
            self.gl
                .tex_storage_2d(target, levels, internal_format, width, height)
        }
    }

    fn tex_storage_3d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
    ) {
        unsafe {
            self.gl
                .tex_storage_3d(target, levels, internal_format, width, height, depth)
        }
    }

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
    ) {
        unsafe {
            self.gl.tex_sub_image_2d(
                target,
                level,
                x_offset,
                y_offset,
                width,
                height,
                format,
                ty,
                glow::PixelUnpackData::Slice(Some(data)),
            )
        }
    }

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
    ) {
        unsafe {
            self.gl.tex_sub_image_3d(
                target,
                level,
                x_offset,
                y_offset,
                z_offset,
                width,
                height,
                depth,
                format,
                ty,
                glow::PixelUnpackData::Slice(Some(data)),
            )
        }
    }

    fn tex_parameter_i32(&mut self, target: u32, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(target, parameter, value) }
    }

    fn generate_mipmap(&mut self, target: u32) {
        unsafe { self.gl.generate_mipmap(target) }
    }

    fn pixel_store_i32(&mut self, parameter: u32, value: i32) {
        unsafe { self.gl.pixel_store_i32(parameter, value) }
    }

    fn create_sampler(&mut self) -> Result<NativeSampler, String> {
        unsafe { self.gl.create_sampler() }.map(Into::into)
    }

    fn delete_sampler(&mut self, sampler: NativeSampler) {
        unsafe { self.gl.delete_sampler(sampler.into()) }
    }

    fn bind_sampler(&mut self, unit: u32, sampler: Option<NativeSampler>) {
        unsafe { self.gl.bind_sampler(unit, sampler.map(Into::into)) }
    }

    fn sampler_parameter_i32(&mut self, sampler: NativeSampler, name: u32, value: i32) {
        unsafe { self.gl.sampler_parameter_i32(sampler.into(), name, value) }
    }

    fn sampler_parameter_f32(&mut self, sampler: NativeSampler, name: u32, value: f32) {
        unsafe { self.gl.sampler_parameter_f32(sampler.into(), name, value) }
    }

    fn sampler_parameter_f32_slice(&mut self, sampler: NativeSampler, name: u32, value: &[f32]) {
        unsafe {
            self.gl
                .sampler_parameter_f32_slice(sampler.into(), name, value)
        }
    }

    fn create_framebuffer(&mut self) -> Result<NativeFramebuffer, String> {
        unsafe { self.gl.create_framebuffer() }.map(Into::into)
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer) {
        unsafe { self.gl.delete_framebuffer(framebuffer.into()) }
    }

    fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<NativeFramebuffer>) {
        unsafe { self.gl.bind_framebuffer(target, framebuffer.map(Into::into)) }
    }

    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: Option<NativeTexture>,
        level: i32,
    ) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                target,
                attachment,
                texture_target,
                texture.map(Into::into),
                level,
            )
        }
    }

    fn framebuffer_texture_layer(
        &mut self,
        target: u32,
        attachment: u32,
        texture: Option<NativeTexture>,
        level: i32,
        layer: i32,
    ) {
        unsafe {
            self.gl.framebuffer_texture_layer(
                target,
                attachment,
                texture.map(Into::into),
                level,
                layer,
            )
        }
    }

    fn draw_buffers(&mut self, buffers: &[u32]) {
        unsafe { self.gl.draw_buffers(buffers) }
    }

    fn draw_buffer(&mut self, buffer: u32) {
        unsafe { self.gl.draw_buffer(buffer) }
    }

    fn check_framebuffer_status(&mut self, target: u32) -> u32 {
        unsafe { self.gl.check_framebuffer_status(target) }
    }

    fn create_shader(&mut self, shader_type: u32) -> Result<NativeShader, String> {
        unsafe { self.gl.create_shader(shader_type) }.map(Into::into)
    }

    fn shader_source(&mut self, shader: NativeShader, source: &str) {
        unsafe { self.gl.shader_source(shader.into(), source) }
    }

    fn compile_shader(&mut self, shader: NativeShader) {
        unsafe { self.gl.compile_shader(shader.into()) }
    }

    fn get_shader_compile_status(&mut self, shader: NativeShader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader.into()) }
    }

    fn get_shader_info_log(&mut self, shader: NativeShader) -> String {
        unsafe { self.gl.get_shader_info_log(shader.into()) }
    }

    fn delete_shader(&mut self, shader: NativeShader) {
        unsafe { self.gl.delete_shader(shader.into()) }
    }

    fn create_program(&mut self) -> Result<NativeProgram, String> {
        unsafe { self.gl.create_program() }.map(Into::into)
    }

    fn attach_shader(&mut self, program: NativeProgram, shader: NativeShader) {
        unsafe { self.gl.attach_shader(program.into(), shader.into()) }
    }

    fn bind_attrib_location(&mut self, program: NativeProgram, index: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(program.into(), index, name) }
    }

    fn link_program(&mut self, program: NativeProgram) {
        unsafe { self.gl.link_program(program.into()) }
    }

    fn get_program_link_status(&mut self, program: NativeProgram) -> bool {
        unsafe { self.gl.get_program_link_status(program.into()) }
    }

    fn get_program_info_log(&mut self, program: NativeProgram) -> String {
        unsafe { self.gl.get_program_info_log(program.into()) }
    }

    fn get_uniform_block_index(&mut self, program: NativeProgram, name: &str) -> Option<u32> {
        unsafe { self.gl.get_uniform_block_index(program.into(), name) }
    }

    fn get_active_uniform_block_size(&mut self, program: NativeProgram, index: u32) -> i32 {
        unsafe {
            self.gl.get_active_uniform_block_parameter_i32(
                program.into(),
                index,
                glow::UNIFORM_BLOCK_DATA_SIZE,
            )
        }
    }

    fn uniform_block_binding(&mut self, program: NativeProgram, index: u32, binding: u32) {
        unsafe { self.gl.uniform_block_binding(program.into(), index, binding) }
    }

    fn get_uniform_location(
        &mut self,
        program: NativeProgram,
        name: &str,
    ) -> Option<NativeUniformLocation> {
        unsafe { self.gl.get_uniform_location(program.into(), name) }
            .map(|location| NativeUniformLocation(location.0))
    }

    fn uniform_1_i32(&mut self, location: &NativeUniformLocation, value: i32) {
        let location = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_1_i32(Some(&location), value) }
    }

    fn use_program(&mut self, program: Option<NativeProgram>) {
        unsafe { self.gl.use_program(program.map(Into::into)) }
    }

    fn delete_program(&mut self, program: NativeProgram) {
        unsafe { self.gl.delete_program(program.into()) }
    }

    fn enable(&mut self, capability: u32) {
        unsafe { self.gl.enable(capability) }
    }

    fn disable(&mut self, capability: u32) {
        unsafe { self.gl.disable(capability) }
    }

    fn enable_i(&mut self, capability: u32, index: u32) {
        unsafe { self.gl.enable_draw_buffer(capability, index) }
    }

    fn disable_i(&mut self, capability: u32, index: u32) {
        unsafe { self.gl.disable_draw_buffer(capability, index) }
    }

    fn blend_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.blend_color(r, g, b, a) }
    }

    fn blend_func_separate(&mut self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        unsafe {
            self.gl
                .blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha)
        }
    }

    fn blend_func_separate_i(
        &mut self,
        draw_buffer: u32,
        src_rgb: u32,
        dst_rgb: u32,
        src_alpha: u32,
        dst_alpha: u32,
    ) {
        unsafe {
            self.gl.blend_func_separate_draw_buffer(
                draw_buffer,
                src_rgb,
                dst_rgb,
                src_alpha,
                dst_alpha,
            )
        }
    }

    fn blend_equation_separate(&mut self, mode_rgb: u32, mode_alpha: u32) {
        unsafe { self.gl.blend_equation_separate(mode_rgb, mode_alpha) }
    }

    fn blend_equation_separate_i(&mut self, draw_buffer: u32, mode_rgb: u32, mode_alpha: u32) {
        unsafe {
            self.gl
                .blend_equation_separate_draw_buffer(draw_buffer, mode_rgb, mode_alpha)
        }
    }

    fn depth_func(&mut self, func: u32) {
        unsafe { self.gl.depth_func(func) }
    }

    fn depth_mask(&mut self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) }
    }

    fn cull_face(&mut self, face: u32) {
        unsafe { self.gl.cull_face(face) }
    }

    fn front_face(&mut self, winding: u32) {
        unsafe { self.gl.front_face(winding) }
    }

    fn polygon_mode(&mut self, face: u32, mode: u32) {
        unsafe { self.gl.polygon_mode(face, mode) }
    }

    fn viewport_indexed(&mut self, index: u32, x: f32, y: f32, width: f32, height: f32) {
        unsafe { self.gl.viewport_f32_slice(index, 1, &[[x, y, width, height]]) }
    }

    fn depth_range_indexed(&mut self, index: u32, near: f64, far: f64) {
        unsafe { self.gl.depth_range_f64_slice(index, 1, &[[near, far]]) }
    }

    fn scissor_indexed(&mut self, index: u32, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor_slice(index, 1, &[[x, y, width, height]]) }
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear_depth(&mut self, depth: f64) {
        unsafe { self.gl.clear_depth_f64(depth) }
    }

    fn clear(&mut self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset)
        }
    }

    fn vertex_attrib_pointer_i32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_i32(index, size, data_type, stride, offset)
        }
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(index, divisor) }
    }

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }

    fn draw_arrays_instanced(&mut self, mode: u32, first: i32, count: i32, instance_count: i32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(mode, first, count, instance_count)
        }
    }

    fn draw_elements(&mut self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { self.gl.draw_elements(mode, count, element_type, offset) }
    }

    fn draw_elements_base_vertex(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    ) {
        unsafe {
            self.gl
                .draw_elements_base_vertex(mode, count, element_type, offset, base_vertex)
        }
    }

    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    ) {
        unsafe {
            self.gl
                .draw_elements_instanced(mode, count, element_type, offset, instance_count)
        }
    }

    fn draw_elements_instanced_base_vertex(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
        base_vertex: i32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced_base_vertex(
                mode,
                count,
                element_type,
                offset,
                instance_count,
                base_vertex,
            )
        }
    }
}
