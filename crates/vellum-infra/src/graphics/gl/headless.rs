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

//! A software [`GlContext`] for tests and headless runs.
//!
//! The context records every call by name and emulates the subset of GL object and binding
//! state the backend relies on: buffer contents, texture storage and uploads, unit bindings,
//! framebuffer attachments, program linking with uniform discovery, vertex attribute arrays,
//! and the color each draw lands on. Uniforms are discovered from `uniform` declarations in
//! the shader source: a declaration containing `{` is a uniform block, anything else a plain
//! uniform.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::num::NonZeroU32;

use super::consts as gl;
use super::context::{
    GlContext, NativeBuffer, NativeFramebuffer, NativeProgram, NativeSampler, NativeShader,
    NativeTexture, NativeUniformLocation,
};

const DEFAULT_TEXTURE_UNITS: i32 = 16;
const DEFAULT_VIEWPORTS: i32 = 16;
const DEFAULT_UNIFORM_BLOCK_SIZE: i32 = 16;

/// Immutable storage allocated for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureStorage {
    pub target: u32,
    pub levels: i32,
    pub internal_format: u32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

/// One `tex_sub_image_*` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureUpload {
    pub target: u32,
    pub level: i32,
    pub x: i32,
    pub y: i32,
    /// The layer (or layer-face) of 3D uploads.
    pub z: Option<i32>,
    pub width: i32,
    pub height: i32,
    pub unpack_alignment: i32,
    pub data: Vec<u8>,
}

/// The arguments of one `vertex_attrib_pointer_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributePointer {
    pub buffer: Option<NativeBuffer>,
    pub size: i32,
    pub data_type: u32,
    pub normalized: bool,
    pub integer: bool,
    pub stride: i32,
    pub offset: i32,
}

/// One `clear` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearRecord {
    pub mask: u32,
    pub color: [f32; 4],
    pub depth: f64,
    pub framebuffer: Option<NativeFramebuffer>,
    /// The draw buffers selected at the time of the clear (empty for the default framebuffer).
    pub draw_buffers: Vec<u32>,
}

/// One draw call, with the state it observed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub call: &'static str,
    pub mode: u32,
    pub count: i32,
    /// The first vertex of array draws, the index byte offset of element draws.
    pub first_or_offset: i32,
    pub element_type: Option<u32>,
    pub instances: i32,
    pub base_vertex: i32,
    pub program: Option<NativeProgram>,
    pub framebuffer: Option<NativeFramebuffer>,
    /// The color the target held when the draw was issued.
    pub target_color: [f32; 4],
    pub enabled_attributes: usize,
}

#[derive(Debug, Default)]
struct TextureObject {
    storage: Option<TextureStorage>,
    uploads: Vec<TextureUpload>,
    parameters: HashMap<u32, i32>,
    mipmap_generations: u32,
}

#[derive(Debug, Default)]
struct SamplerObject {
    integers: HashMap<u32, i32>,
    floats: HashMap<u32, Vec<f32>>,
}

#[derive(Debug, Default)]
struct FramebufferObject {
    attachments: HashMap<u32, NativeTexture>,
    draw_buffers: Vec<u32>,
    color: [f32; 4],
}

#[derive(Debug)]
struct ShaderObject {
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    shaders: Vec<NativeShader>,
    attribute_locations: HashMap<String, u32>,
    linked: bool,
    info_log: String,
    blocks: Vec<String>,
    block_bindings: HashMap<u32, u32>,
    uniforms: Vec<String>,
    uniform_values: HashMap<u32, i32>,
}

/// A recording, state-emulating stand-in for a GL context.
#[derive(Debug)]
pub struct HeadlessGlContext {
    calls: Vec<&'static str>,
    pending_errors: VecDeque<u32>,
    issued_names: u32,
    texture_units: i32,
    uniform_block_sizes: HashMap<String, i32>,

    buffers: HashMap<NativeBuffer, Vec<u8>>,
    buffer_bindings: HashMap<u32, NativeBuffer>,
    uniform_ranges: HashMap<u32, (NativeBuffer, i32, i32)>,

    textures: HashMap<NativeTexture, TextureObject>,
    active_unit: u32,
    unit_textures: HashMap<(u32, u32), NativeTexture>,
    unpack_alignment: i32,

    samplers: HashMap<NativeSampler, SamplerObject>,
    unit_samplers: HashMap<u32, NativeSampler>,

    framebuffers: HashMap<NativeFramebuffer, FramebufferObject>,
    bound_framebuffer: Option<NativeFramebuffer>,
    default_color: [f32; 4],

    shaders: HashMap<NativeShader, ShaderObject>,
    programs: HashMap<NativeProgram, ProgramObject>,
    current_program: Option<NativeProgram>,

    capabilities: HashSet<u32>,
    indexed_capabilities: HashSet<(u32, u32)>,
    depth_mask: bool,
    clear_color: [f32; 4],
    clear_depth: f64,
    viewports: HashMap<u32, [f32; 4]>,
    depth_ranges: HashMap<u32, (f64, f64)>,
    scissors: HashMap<u32, [i32; 4]>,

    enabled_attributes: BTreeSet<u32>,
    attribute_divisors: HashMap<u32, u32>,
    attribute_pointers: HashMap<u32, AttributePointer>,

    clears: Vec<ClearRecord>,
    draws: Vec<DrawRecord>,
}

impl Default for HeadlessGlContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessGlContext {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            pending_errors: VecDeque::new(),
            issued_names: 0,
            texture_units: DEFAULT_TEXTURE_UNITS,
            uniform_block_sizes: HashMap::new(),
            buffers: HashMap::new(),
            buffer_bindings: HashMap::new(),
            uniform_ranges: HashMap::new(),
            textures: HashMap::new(),
            active_unit: 0,
            unit_textures: HashMap::new(),
            unpack_alignment: 4,
            samplers: HashMap::new(),
            unit_samplers: HashMap::new(),
            framebuffers: HashMap::new(),
            bound_framebuffer: None,
            default_color: [0.0; 4],
            shaders: HashMap::new(),
            programs: HashMap::new(),
            current_program: None,
            capabilities: HashSet::new(),
            indexed_capabilities: HashSet::new(),
            depth_mask: true,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            viewports: HashMap::new(),
            depth_ranges: HashMap::new(),
            scissors: HashMap::new(),
            enabled_attributes: BTreeSet::new(),
            attribute_divisors: HashMap::new(),
            attribute_pointers: HashMap::new(),
            clears: Vec::new(),
            draws: Vec::new(),
        }
    }

    /// Reports `units` from `MAX_COMBINED_TEXTURE_IMAGE_UNITS`.
    pub fn with_texture_units(mut self, units: i32) -> Self {
        self.texture_units = units;
        self
    }

    /// Sets the size reported for uniform block `name` (16 bytes by default).
    pub fn set_uniform_block_size(&mut self, name: &str, size: i32) {
        self.uniform_block_sizes.insert(name.to_string(), size);
    }

    /// Queues an error code for the next `get_error`.
    pub fn inject_error(&mut self, code: u32) {
        self.pending_errors.push_back(code);
    }

    // --- Call log ---

    /// Every call made so far, by entry-point name. `get_error` is not recorded.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|call| **call == name).count()
    }

    /// Position of the first call named `name`.
    pub fn first_call(&self, name: &str) -> Option<usize> {
        self.calls.iter().position(|call| *call == name)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    // --- Object inspection ---

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn buffer_contents(&self, buffer: NativeBuffer) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// The buffer, offset and size bound to uniform binding point `index`.
    pub fn uniform_buffer_binding(&self, index: u32) -> Option<(NativeBuffer, i32, i32)> {
        self.uniform_ranges.get(&index).copied()
    }

    pub fn texture_storage(&self, texture: NativeTexture) -> Option<TextureStorage> {
        self.textures.get(&texture).and_then(|t| t.storage)
    }

    pub fn texture_uploads(&self, texture: NativeTexture) -> &[TextureUpload] {
        self.textures
            .get(&texture)
            .map_or(&[], |t| t.uploads.as_slice())
    }

    pub fn texture_parameter(&self, texture: NativeTexture, parameter: u32) -> Option<i32> {
        self.textures
            .get(&texture)
            .and_then(|t| t.parameters.get(&parameter).copied())
    }

    /// How many times `generate_mipmap` ran on `texture`.
    pub fn mipmap_generations(&self, texture: NativeTexture) -> u32 {
        self.textures
            .get(&texture)
            .map_or(0, |t| t.mipmap_generations)
    }

    pub fn unpack_alignment(&self) -> i32 {
        self.unpack_alignment
    }

    /// The texture bound to `target` on unit `unit` (a plain index).
    pub fn bound_texture(&self, unit: u32, target: u32) -> Option<NativeTexture> {
        self.unit_textures.get(&(unit, target)).copied()
    }

    pub fn bound_sampler(&self, unit: u32) -> Option<NativeSampler> {
        self.unit_samplers.get(&unit).copied()
    }

    pub fn sampler_param(&self, sampler: NativeSampler, parameter: u32) -> Option<i32> {
        self.samplers
            .get(&sampler)
            .and_then(|s| s.integers.get(&parameter).copied())
    }

    pub fn sampler_param_f32(&self, sampler: NativeSampler, parameter: u32) -> Option<Vec<f32>> {
        self.samplers
            .get(&sampler)
            .and_then(|s| s.floats.get(&parameter).cloned())
    }

    pub fn bound_framebuffer(&self) -> Option<NativeFramebuffer> {
        self.bound_framebuffer
    }

    pub fn framebuffer_attachment(
        &self,
        framebuffer: NativeFramebuffer,
        attachment: u32,
    ) -> Option<NativeTexture> {
        self.framebuffers
            .get(&framebuffer)
            .and_then(|f| f.attachments.get(&attachment).copied())
    }

    pub fn framebuffer_draw_buffers(&self, framebuffer: NativeFramebuffer) -> Vec<u32> {
        self.framebuffers
            .get(&framebuffer)
            .map(|f| f.draw_buffers.clone())
            .unwrap_or_default()
    }

    pub fn current_program(&self) -> Option<NativeProgram> {
        self.current_program
    }

    /// The value last written to uniform `name` of `program`.
    pub fn uniform_value(&self, program: NativeProgram, name: &str) -> Option<i32> {
        let program = self.programs.get(&program)?;
        let location = program.uniforms.iter().position(|u| u == name)? as u32;
        program.uniform_values.get(&location).copied()
    }

    /// The binding point assigned to uniform block `name` of `program`.
    pub fn uniform_block_binding_of(&self, program: NativeProgram, name: &str) -> Option<u32> {
        let program = self.programs.get(&program)?;
        let index = program.blocks.iter().position(|b| b == name)? as u32;
        program.block_bindings.get(&index).copied()
    }

    pub fn attribute_location(&self, program: NativeProgram, name: &str) -> Option<u32> {
        self.programs
            .get(&program)
            .and_then(|p| p.attribute_locations.get(name).copied())
    }

    // --- Fixed-function state inspection ---

    pub fn is_enabled(&self, capability: u32) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_enabled_i(&self, capability: u32, index: u32) -> bool {
        self.indexed_capabilities.contains(&(capability, index))
    }

    pub fn depth_writes_enabled(&self) -> bool {
        self.depth_mask
    }

    pub fn viewport(&self, index: u32) -> Option<[f32; 4]> {
        self.viewports.get(&index).copied()
    }

    pub fn depth_range(&self, index: u32) -> Option<(f64, f64)> {
        self.depth_ranges.get(&index).copied()
    }

    pub fn scissor(&self, index: u32) -> Option<[i32; 4]> {
        self.scissors.get(&index).copied()
    }

    /// Number of vertex attribute arrays currently enabled.
    pub fn enabled_attribute_count(&self) -> usize {
        self.enabled_attributes.len()
    }

    pub fn enabled_attributes(&self) -> Vec<u32> {
        self.enabled_attributes.iter().copied().collect()
    }

    pub fn attribute_divisor(&self, index: u32) -> u32 {
        self.attribute_divisors.get(&index).copied().unwrap_or(0)
    }

    pub fn attribute_pointer(&self, index: u32) -> Option<AttributePointer> {
        self.attribute_pointers.get(&index).copied()
    }

    pub fn clears(&self) -> &[ClearRecord] {
        &self.clears
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    // --- Internals ---

    fn record(&mut self, call: &'static str) {
        self.calls.push(call);
    }

    fn raise(&mut self, code: u32) {
        self.pending_errors.push_back(code);
    }

    fn next_name(&mut self) -> NonZeroU32 {
        let name = NonZeroU32::MIN.saturating_add(self.issued_names);
        self.issued_names += 1;
        name
    }

    /// The binding target a texture image target belongs to.
    fn binding_target(target: u32) -> u32 {
        if (gl::TEXTURE_CUBE_MAP_POSITIVE_X..=gl::TEXTURE_CUBE_MAP_NEGATIVE_Z).contains(&target) {
            gl::TEXTURE_CUBE_MAP
        } else {
            target
        }
    }

    fn bound_texture_object(&mut self, target: u32) -> Option<&mut TextureObject> {
        let key = (self.active_unit, Self::binding_target(target));
        let texture = self.unit_textures.get(&key).copied()?;
        self.textures.get_mut(&texture)
    }

    fn bound_buffer_data(&mut self, target: u32) -> Option<&mut Vec<u8>> {
        let buffer = self.buffer_bindings.get(&target).copied()?;
        self.buffers.get_mut(&buffer)
    }

    fn target_color(&self) -> [f32; 4] {
        match self.bound_framebuffer {
            Some(framebuffer) => self
                .framebuffers
                .get(&framebuffer)
                .map_or([0.0; 4], |f| f.color),
            None => self.default_color,
        }
    }

    fn push_draw(
        &mut self,
        call: &'static str,
        mode: u32,
        count: i32,
        first_or_offset: i32,
        element_type: Option<u32>,
        instances: i32,
        base_vertex: i32,
    ) {
        self.record(call);
        if self.current_program.is_none() {
            self.raise(gl::INVALID_OPERATION);
        }
        let record = DrawRecord {
            call,
            mode,
            count,
            first_or_offset,
            element_type,
            instances,
            base_vertex,
            program: self.current_program,
            framebuffer: self.bound_framebuffer,
            target_color: self.target_color(),
            enabled_attributes: self.enabled_attributes.len(),
        };
        self.draws.push(record);
    }

    fn discover_uniforms(source: &str, blocks: &mut Vec<String>, uniforms: &mut Vec<String>) {
        for line in source.lines().map(str::trim) {
            let Some(declaration) = line.strip_prefix("uniform ") else {
                continue;
            };
            let mut tokens = declaration.split_whitespace();
            if declaration.contains('{') {
                if let Some(name) = tokens.next() {
                    blocks.push(name.trim_end_matches('{').to_string());
                }
            } else if let Some(name) = tokens.last() {
                uniforms.push(name.trim_end_matches(';').to_string());
            }
        }
    }
}

impl GlContext for HeadlessGlContext {
    fn get_error(&mut self) -> u32 {
        self.pending_errors.pop_front().unwrap_or(gl::NO_ERROR)
    }

    fn get_parameter_i32(&mut self, parameter: u32) -> i32 {
        self.record("get_parameter_i32");
        match parameter {
            gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS => self.texture_units,
            gl::MAX_VIEWPORTS => DEFAULT_VIEWPORTS,
            _ => 0,
        }
    }

    fn flush(&mut self) {
        self.record("flush");
    }

    fn finish(&mut self) {
        self.record("finish");
    }

    // --- Buffers ---

    fn create_buffer(&mut self) -> Result<NativeBuffer, String> {
        self.record("create_buffer");
        let buffer = NativeBuffer(self.next_name());
        self.buffers.insert(buffer, Vec::new());
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: NativeBuffer) {
        self.record("delete_buffer");
        self.buffers.remove(&buffer);
        self.buffer_bindings.retain(|_, bound| *bound != buffer);
        self.uniform_ranges.retain(|_, (bound, _, _)| *bound != buffer);
    }

    fn bind_buffer(&mut self, target: u32, buffer: Option<NativeBuffer>) {
        self.record("bind_buffer");
        match buffer {
            Some(buffer) => {
                self.buffer_bindings.insert(target, buffer);
            }
            None => {
                self.buffer_bindings.remove(&target);
            }
        }
    }

    fn buffer_data_size(&mut self, target: u32, size: i32, _usage: u32) {
        self.record("buffer_data_size");
        let size = size.max(0) as usize;
        match self.bound_buffer_data(target) {
            Some(data) => *data = vec![0; size],
            None => self.raise(gl::INVALID_OPERATION),
        }
    }

    fn buffer_sub_data(&mut self, target: u32, offset: i32, src: &[u8]) {
        self.record("buffer_sub_data");
        let start = offset.max(0) as usize;
        let code = match self.bound_buffer_data(target) {
            Some(data) if start + src.len() <= data.len() => {
                data[start..start + src.len()].copy_from_slice(src);
                None
            }
            Some(_) => Some(gl::INVALID_VALUE),
            None => Some(gl::INVALID_OPERATION),
        };
        if let Some(code) = code {
            self.raise(code);
        }
    }

    fn get_buffer_sub_data(&mut self, target: u32, offset: i32, dst: &mut [u8]) {
        self.record("get_buffer_sub_data");
        let start = offset.max(0) as usize;
        let code = match self.bound_buffer_data(target) {
            Some(data) if start + dst.len() <= data.len() => {
                dst.copy_from_slice(&data[start..start + dst.len()]);
                None
            }
            Some(_) => Some(gl::INVALID_VALUE),
            None => Some(gl::INVALID_OPERATION),
        };
        if let Some(code) = code {
            self.raise(code);
        }
    }

    fn copy_buffer_sub_data(
        &mut self,
        read_target: u32,
        write_target: u32,
        read_offset: i32,
        write_offset: i32,
        size: i32,
    ) {
        self.record("copy_buffer_sub_data");
        let (source, destination) = match (
            self.buffer_bindings.get(&read_target).copied(),
            self.buffer_bindings.get(&write_target).copied(),
        ) {
            (Some(source), Some(destination)) => (source, destination),
            _ => return self.raise(gl::INVALID_OPERATION),
        };
        if read_offset < 0 || write_offset < 0 || size < 0 {
            return self.raise(gl::INVALID_VALUE);
        }
        let (read, write, len) = (read_offset as usize, write_offset as usize, size as usize);
        let bytes = match self.buffers.get(&source) {
            Some(data) if read + len <= data.len() => Ok(data[read..read + len].to_vec()),
            Some(_) => Err(gl::INVALID_VALUE),
            None => Err(gl::INVALID_OPERATION),
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(code) => return self.raise(code),
        };
        if source == destination && read < write + len && write < read + len {
            return self.raise(gl::INVALID_VALUE);
        }
        let code = match self.buffers.get_mut(&destination) {
            Some(data) if write + len <= data.len() => {
                data[write..write + len].copy_from_slice(&bytes);
                None
            }
            Some(_) => Some(gl::INVALID_VALUE),
            None => Some(gl::INVALID_OPERATION),
        };
        if let Some(code) = code {
            self.raise(code);
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
        self.record("bind_buffer_range");
        if target != gl::UNIFORM_BUFFER {
            return;
        }
        match buffer {
            Some(buffer) => {
                self.uniform_ranges.insert(index, (buffer, offset, size));
                self.buffer_bindings.insert(target, buffer);
            }
            None => {
                self.uniform_ranges.remove(&index);
            }
        }
    }

    // --- Textures ---

    fn create_texture(&mut self) -> Result<NativeTexture, String> {
        self.record("create_texture");
        let texture = NativeTexture(self.next_name());
        self.textures.insert(texture, TextureObject::default());
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: NativeTexture) {
        self.record("delete_texture");
        self.textures.remove(&texture);
        self.unit_textures.retain(|_, bound| *bound != texture);
        for framebuffer in self.framebuffers.values_mut() {
            framebuffer.attachments.retain(|_, attached| *attached != texture);
        }
    }

    fn active_texture(&mut self, unit: u32) {
        self.record("active_texture");
        self.active_unit = unit.saturating_sub(gl::TEXTURE0);
    }

    fn bind_texture(&mut self, target: u32, texture: Option<NativeTexture>) {
        self.record("bind_texture");
        let key = (self.active_unit, target);
        match texture {
            Some(texture) => {
                self.unit_textures.insert(key, texture);
            }
            None => {
                self.unit_textures.remove(&key);
            }
        }
    }

    fn tex_storage_2d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        self.record("tex_storage_2d");
        self.tex_storage(target, levels, internal_format, width, height, 1);
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
        self.record("tex_storage_3d");
        self.tex_storage(target, levels, internal_format, width, height, depth);
    }

    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        _format: u32,
        _ty: u32,
        data: &[u8],
    ) {
        self.record("tex_sub_image_2d");
        self.tex_sub_image(target, level, x_offset, y_offset, None, width, height, data);
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
        _depth: i32,
        _format: u32,
        _ty: u32,
        data: &[u8],
    ) {
        self.record("tex_sub_image_3d");
        self.tex_sub_image(
            target,
            level,
            x_offset,
            y_offset,
            Some(z_offset),
            width,
            height,
            data,
        );
    }

    fn tex_parameter_i32(&mut self, target: u32, parameter: u32, value: i32) {
        self.record("tex_parameter_i32");
        match self.bound_texture_object(target) {
            Some(texture) => {
                texture.parameters.insert(parameter, value);
            }
            None => self.raise(gl::INVALID_OPERATION),
        }
    }

    fn generate_mipmap(&mut self, target: u32) {
        self.record("generate_mipmap");
        let generated = match self.bound_texture_object(target) {
            Some(texture) if texture.storage.is_some() => {
                texture.mipmap_generations += 1;
                true
            }
            _ => false,
        };
        if !generated {
            self.raise(gl::INVALID_OPERATION);
        }
    }

    fn pixel_store_i32(&mut self, parameter: u32, value: i32) {
        self.record("pixel_store_i32");
        if parameter == gl::UNPACK_ALIGNMENT {
            self.unpack_alignment = value;
        }
    }

    // --- Samplers ---

    fn create_sampler(&mut self) -> Result<NativeSampler, String> {
        self.record("create_sampler");
        let sampler = NativeSampler(self.next_name());
        self.samplers.insert(sampler, SamplerObject::default());
        Ok(sampler)
    }

    fn delete_sampler(&mut self, sampler: NativeSampler) {
        self.record("delete_sampler");
        self.samplers.remove(&sampler);
        self.unit_samplers.retain(|_, bound| *bound != sampler);
    }

    fn bind_sampler(&mut self, unit: u32, sampler: Option<NativeSampler>) {
        self.record("bind_sampler");
        match sampler {
            Some(sampler) => {
                self.unit_samplers.insert(unit, sampler);
            }
            None => {
                self.unit_samplers.remove(&unit);
            }
        }
    }

    fn sampler_parameter_i32(&mut self, sampler: NativeSampler, name: u32, value: i32) {
        self.record("sampler_parameter_i32");
        if let Some(object) = self.samplers.get_mut(&sampler) {
            object.integers.insert(name, value);
        }
    }

    fn sampler_parameter_f32(&mut self, sampler: NativeSampler, name: u32, value: f32) {
        self.record("sampler_parameter_f32");
        if let Some(object) = self.samplers.get_mut(&sampler) {
            object.floats.insert(name, vec![value]);
        }
    }

    fn sampler_parameter_f32_slice(&mut self, sampler: NativeSampler, name: u32, value: &[f32]) {
        self.record("sampler_parameter_f32_slice");
        if let Some(object) = self.samplers.get_mut(&sampler) {
            object.floats.insert(name, value.to_vec());
        }
    }

    // --- Framebuffers ---

    fn create_framebuffer(&mut self) -> Result<NativeFramebuffer, String> {
        self.record("create_framebuffer");
        let framebuffer = NativeFramebuffer(self.next_name());
        self.framebuffers.insert(
            framebuffer,
            FramebufferObject {
                draw_buffers: vec![gl::COLOR_ATTACHMENT0],
                ..FramebufferObject::default()
            },
        );
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer) {
        self.record("delete_framebuffer");
        self.framebuffers.remove(&framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
    }

    fn bind_framebuffer(&mut self, _target: u32, framebuffer: Option<NativeFramebuffer>) {
        self.record("bind_framebuffer");
        self.bound_framebuffer = framebuffer;
    }

    fn framebuffer_texture_2d(
        &mut self,
        _target: u32,
        attachment: u32,
        _texture_target: u32,
        texture: Option<NativeTexture>,
        _level: i32,
    ) {
        self.record("framebuffer_texture_2d");
        self.attach(attachment, texture);
    }

    fn framebuffer_texture_layer(
        &mut self,
        _target: u32,
        attachment: u32,
        texture: Option<NativeTexture>,
        _level: i32,
        _layer: i32,
    ) {
        self.record("framebuffer_texture_layer");
        self.attach(attachment, texture);
    }

    fn draw_buffers(&mut self, buffers: &[u32]) {
        self.record("draw_buffers");
        if let Some(framebuffer) = self.bound_framebuffer_object() {
            framebuffer.draw_buffers = buffers.to_vec();
        }
    }

    fn draw_buffer(&mut self, buffer: u32) {
        self.record("draw_buffer");
        if let Some(framebuffer) = self.bound_framebuffer_object() {
            framebuffer.draw_buffers = vec![buffer];
        }
    }

    fn check_framebuffer_status(&mut self, _target: u32) -> u32 {
        self.record("check_framebuffer_status");
        match self.bound_framebuffer.and_then(|f| self.framebuffers.get(&f)) {
            Some(framebuffer) if framebuffer.attachments.is_empty() => {
                gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
            }
            _ => gl::FRAMEBUFFER_COMPLETE,
        }
    }

    // --- Shaders and programs ---

    fn create_shader(&mut self, _shader_type: u32) -> Result<NativeShader, String> {
        self.record("create_shader");
        let shader = NativeShader(self.next_name());
        self.shaders.insert(
            shader,
            ShaderObject {
                source: String::new(),
                compiled: false,
                info_log: String::new(),
            },
        );
        Ok(shader)
    }

    fn shader_source(&mut self, shader: NativeShader, source: &str) {
        self.record("shader_source");
        if let Some(object) = self.shaders.get_mut(&shader) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: NativeShader) {
        self.record("compile_shader");
        if let Some(object) = self.shaders.get_mut(&shader) {
            let failure = if object.source.trim().is_empty() {
                Some("0:0: error: empty shader source")
            } else if object.source.contains("#error") {
                Some("0:1: error: #error directive")
            } else {
                None
            };
            object.compiled = failure.is_none();
            object.info_log = failure.unwrap_or_default().to_string();
        }
    }

    fn get_shader_compile_status(&mut self, shader: NativeShader) -> bool {
        self.record("get_shader_compile_status");
        self.shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn get_shader_info_log(&mut self, shader: NativeShader) -> String {
        self.record("get_shader_info_log");
        self.shaders
            .get(&shader)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: NativeShader) {
        self.record("delete_shader");
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Result<NativeProgram, String> {
        self.record("create_program");
        let program = NativeProgram(self.next_name());
        self.programs.insert(program, ProgramObject::default());
        Ok(program)
    }

    fn attach_shader(&mut self, program: NativeProgram, shader: NativeShader) {
        self.record("attach_shader");
        if let Some(object) = self.programs.get_mut(&program) {
            object.shaders.push(shader);
        }
    }

    fn bind_attrib_location(&mut self, program: NativeProgram, index: u32, name: &str) {
        self.record("bind_attrib_location");
        if let Some(object) = self.programs.get_mut(&program) {
            object.attribute_locations.insert(name.to_string(), index);
        }
    }

    fn link_program(&mut self, program: NativeProgram) {
        self.record("link_program");
        let Some(object) = self.programs.get(&program) else {
            self.raise(gl::INVALID_VALUE);
            return;
        };

        let mut blocks = Vec::new();
        let mut uniforms = Vec::new();
        let mut failure = None;
        if object.shaders.is_empty() {
            failure = Some("error: no shaders attached".to_string());
        }
        for shader in &object.shaders {
            match self.shaders.get(shader) {
                Some(source) if source.compiled => {
                    Self::discover_uniforms(&source.source, &mut blocks, &mut uniforms)
                }
                _ => failure = Some(format!("error: shader {} is not compiled", shader.0)),
            }
        }

        if let Some(object) = self.programs.get_mut(&program) {
            object.linked = failure.is_none();
            object.info_log = failure.unwrap_or_default();
            object.blocks = blocks;
            object.uniforms = uniforms;
        }
    }

    fn get_program_link_status(&mut self, program: NativeProgram) -> bool {
        self.record("get_program_link_status");
        self.programs.get(&program).is_some_and(|p| p.linked)
    }

    fn get_program_info_log(&mut self, program: NativeProgram) -> String {
        self.record("get_program_info_log");
        self.programs
            .get(&program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn get_uniform_block_index(&mut self, program: NativeProgram, name: &str) -> Option<u32> {
        self.record("get_uniform_block_index");
        self.programs
            .get(&program)
            .and_then(|p| p.blocks.iter().position(|b| b == name))
            .map(|index| index as u32)
    }

    fn get_active_uniform_block_size(&mut self, program: NativeProgram, index: u32) -> i32 {
        self.record("get_active_uniform_block_size");
        self.programs
            .get(&program)
            .and_then(|p| p.blocks.get(index as usize))
            .and_then(|name| self.uniform_block_sizes.get(name).copied())
            .unwrap_or(DEFAULT_UNIFORM_BLOCK_SIZE)
    }

    fn uniform_block_binding(&mut self, program: NativeProgram, index: u32, binding: u32) {
        self.record("uniform_block_binding");
        if let Some(object) = self.programs.get_mut(&program) {
            object.block_bindings.insert(index, binding);
        }
    }

    fn get_uniform_location(
        &mut self,
        program: NativeProgram,
        name: &str,
    ) -> Option<NativeUniformLocation> {
        self.record("get_uniform_location");
        self.programs
            .get(&program)
            .and_then(|p| p.uniforms.iter().position(|u| u == name))
            .map(|location| NativeUniformLocation(location as u32))
    }

    fn uniform_1_i32(&mut self, location: &NativeUniformLocation, value: i32) {
        self.record("uniform_1_i32");
        match self
            .current_program
            .and_then(|program| self.programs.get_mut(&program))
        {
            Some(object) => {
                object.uniform_values.insert(location.0, value);
            }
            None => self.raise(gl::INVALID_OPERATION),
        }
    }

    fn use_program(&mut self, program: Option<NativeProgram>) {
        self.record("use_program");
        self.current_program = program;
    }

    fn delete_program(&mut self, program: NativeProgram) {
        self.record("delete_program");
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    // --- Fixed-function state ---

    fn enable(&mut self, capability: u32) {
        self.record("enable");
        self.capabilities.insert(capability);
    }

    fn disable(&mut self, capability: u32) {
        self.record("disable");
        self.capabilities.remove(&capability);
    }

    fn enable_i(&mut self, capability: u32, index: u32) {
        self.record("enable_i");
        self.indexed_capabilities.insert((capability, index));
    }

    fn disable_i(&mut self, capability: u32, index: u32) {
        self.record("disable_i");
        self.indexed_capabilities.remove(&(capability, index));
    }

    fn blend_color(&mut self, _r: f32, _g: f32, _b: f32, _a: f32) {
        self.record("blend_color");
    }

    fn blend_func_separate(&mut self, _src_rgb: u32, _dst_rgb: u32, _src_a: u32, _dst_a: u32) {
        self.record("blend_func_separate");
    }

    fn blend_func_separate_i(
        &mut self,
        _draw_buffer: u32,
        _src_rgb: u32,
        _dst_rgb: u32,
        _src_alpha: u32,
        _dst_alpha: u32,
    ) {
        self.record("blend_func_separate_i");
    }

    fn blend_equation_separate(&mut self, _mode_rgb: u32, _mode_alpha: u32) {
        self.record("blend_equation_separate");
    }

    fn blend_equation_separate_i(&mut self, _draw_buffer: u32, _mode_rgb: u32, _mode_alpha: u32) {
        self.record("blend_equation_separate_i");
    }

    fn depth_func(&mut self, _func: u32) {
        self.record("depth_func");
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.record("depth_mask");
        self.depth_mask = enabled;
    }

    fn cull_face(&mut self, _face: u32) {
        self.record("cull_face");
    }

    fn front_face(&mut self, _winding: u32) {
        self.record("front_face");
    }

    fn polygon_mode(&mut self, _face: u32, _mode: u32) {
        self.record("polygon_mode");
    }

    fn viewport_indexed(&mut self, index: u32, x: f32, y: f32, width: f32, height: f32) {
        self.record("viewport_indexed");
        self.viewports.insert(index, [x, y, width, height]);
    }

    fn depth_range_indexed(&mut self, index: u32, near: f64, far: f64) {
        self.record("depth_range_indexed");
        self.depth_ranges.insert(index, (near, far));
    }

    fn scissor_indexed(&mut self, index: u32, x: i32, y: i32, width: i32, height: i32) {
        self.record("scissor_indexed");
        self.scissors.insert(index, [x, y, width, height]);
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.record("clear_color");
        self.clear_color = [r, g, b, a];
    }

    fn clear_depth(&mut self, depth: f64) {
        self.record("clear_depth");
        self.clear_depth = depth;
    }

    fn clear(&mut self, mask: u32) {
        self.record("clear");
        let color = self.clear_color;
        let draw_buffers = match self.bound_framebuffer_object() {
            Some(framebuffer) => {
                if mask & gl::COLOR_BUFFER_BIT != 0 {
                    framebuffer.color = color;
                }
                framebuffer.draw_buffers.clone()
            }
            None => {
                if mask & gl::COLOR_BUFFER_BIT != 0 {
                    self.default_color = color;
                }
                Vec::new()
            }
        };
        self.clears.push(ClearRecord {
            mask,
            color,
            depth: self.clear_depth,
            framebuffer: self.bound_framebuffer,
            draw_buffers,
        });
    }

    // --- Vertex input ---

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record("enable_vertex_attrib_array");
        self.enabled_attributes.insert(index);
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record("disable_vertex_attrib_array");
        self.enabled_attributes.remove(&index);
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
        self.record("vertex_attrib_pointer_f32");
        let pointer = AttributePointer {
            buffer: self.buffer_bindings.get(&gl::ARRAY_BUFFER).copied(),
            size,
            data_type,
            normalized,
            integer: false,
            stride,
            offset,
        };
        self.attribute_pointers.insert(index, pointer);
    }

    fn vertex_attrib_pointer_i32(
        &mut self,
        index: u32,
        size: i32,
        data_type: u32,
        stride: i32,
        offset: i32,
    ) {
        self.record("vertex_attrib_pointer_i32");
        let pointer = AttributePointer {
            buffer: self.buffer_bindings.get(&gl::ARRAY_BUFFER).copied(),
            size,
            data_type,
            normalized: false,
            integer: true,
            stride,
            offset,
        };
        self.attribute_pointers.insert(index, pointer);
    }

    fn vertex_attrib_divisor(&mut self, index: u32, divisor: u32) {
        self.record("vertex_attrib_divisor");
        self.attribute_divisors.insert(index, divisor);
    }

    // --- Draws ---

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        self.push_draw("draw_arrays", mode, count, first, None, 1, 0);
    }

    fn draw_arrays_instanced(&mut self, mode: u32, first: i32, count: i32, instance_count: i32) {
        self.push_draw(
            "draw_arrays_instanced",
            mode,
            count,
            first,
            None,
            instance_count,
            0,
        );
    }

    fn draw_elements(&mut self, mode: u32, count: i32, element_type: u32, offset: i32) {
        self.push_draw("draw_elements", mode, count, offset, Some(element_type), 1, 0);
    }

    fn draw_elements_base_vertex(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    ) {
        self.push_draw(
            "draw_elements_base_vertex",
            mode,
            count,
            offset,
            Some(element_type),
            1,
            base_vertex,
        );
    }

    fn draw_elements_instanced(
        &mut self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
    ) {
        self.push_draw(
            "draw_elements_instanced",
            mode,
            count,
            offset,
            Some(element_type),
            instance_count,
            0,
        );
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
        self.push_draw(
            "draw_elements_instanced_base_vertex",
            mode,
            count,
            offset,
            Some(element_type),
            instance_count,
            base_vertex,
        );
    }
}

impl HeadlessGlContext {
    fn tex_storage(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
    ) {
        let storage = TextureStorage {
            target,
            levels,
            internal_format,
            width,
            height,
            depth,
        };
        match self.bound_texture_object(target) {
            Some(texture) if texture.storage.is_none() => texture.storage = Some(storage),
            // Immutable storage cannot be reallocated.
            _ => self.raise(gl::INVALID_OPERATION),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image(
        &mut self,
        target: u32,
        level: i32,
        x: i32,
        y: i32,
        z: Option<i32>,
        width: i32,
        height: i32,
        data: &[u8],
    ) {
        let upload = TextureUpload {
            target,
            level,
            x,
            y,
            z,
            width,
            height,
            unpack_alignment: self.unpack_alignment,
            data: data.to_vec(),
        };
        match self.bound_texture_object(target) {
            Some(texture) if texture.storage.is_some() => texture.uploads.push(upload),
            _ => self.raise(gl::INVALID_OPERATION),
        }
    }

    fn bound_framebuffer_object(&mut self) -> Option<&mut FramebufferObject> {
        let framebuffer = self.bound_framebuffer?;
        self.framebuffers.get_mut(&framebuffer)
    }

    fn attach(&mut self, attachment: u32, texture: Option<NativeTexture>) {
        let known = texture.map_or(true, |t| self.textures.contains_key(&t));
        match (self.bound_framebuffer_object(), known) {
            (Some(framebuffer), true) => match texture {
                Some(texture) => {
                    framebuffer.attachments.insert(attachment, texture);
                }
                None => {
                    framebuffer.attachments.remove(&attachment);
                }
            },
            _ => self.raise(gl::INVALID_OPERATION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_contents_follow_sub_data_writes() {
        let mut gl = HeadlessGlContext::new();
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(gl::COPY_WRITE_BUFFER, Some(buffer));
        gl.buffer_data_size(gl::COPY_WRITE_BUFFER, 8, gl::STATIC_DRAW);
        gl.buffer_sub_data(gl::COPY_WRITE_BUFFER, 4, &[1, 2, 3, 4]);

        assert_eq!(gl.buffer_contents(buffer), Some(&[0, 0, 0, 0, 1, 2, 3, 4][..]));
        assert_eq!(gl.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn out_of_range_writes_raise_invalid_value() {
        let mut gl = HeadlessGlContext::new();
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(gl::COPY_WRITE_BUFFER, Some(buffer));
        gl.buffer_data_size(gl::COPY_WRITE_BUFFER, 4, gl::STATIC_DRAW);
        gl.buffer_sub_data(gl::COPY_WRITE_BUFFER, 2, &[0; 4]);

        assert_eq!(gl.get_error(), gl::INVALID_VALUE);
        assert_eq!(gl.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn buffer_copies_move_bytes_between_bound_targets() {
        let mut gl = HeadlessGlContext::new();
        let (source, destination) = (gl.create_buffer().unwrap(), gl.create_buffer().unwrap());
        gl.bind_buffer(gl::COPY_READ_BUFFER, Some(source));
        gl.buffer_data_size(gl::COPY_READ_BUFFER, 4, gl::STATIC_DRAW);
        gl.buffer_sub_data(gl::COPY_READ_BUFFER, 0, &[9, 8, 7, 6]);
        gl.bind_buffer(gl::COPY_WRITE_BUFFER, Some(destination));
        gl.buffer_data_size(gl::COPY_WRITE_BUFFER, 6, gl::STATIC_DRAW);

        gl.copy_buffer_sub_data(gl::COPY_READ_BUFFER, gl::COPY_WRITE_BUFFER, 1, 2, 3);
        assert_eq!(gl.get_error(), gl::NO_ERROR);
        assert_eq!(gl.buffer_contents(destination), Some(&[0, 0, 8, 7, 6, 0][..]));

        gl.copy_buffer_sub_data(gl::COPY_READ_BUFFER, gl::COPY_WRITE_BUFFER, 2, 0, 4);
        assert_eq!(gl.get_error(), gl::INVALID_VALUE);
    }

    #[test]
    fn mip_generation_needs_allocated_storage() {
        let mut gl = HeadlessGlContext::new();
        let texture = gl.create_texture().unwrap();
        gl.bind_texture(gl::TEXTURE_2D, Some(texture));

        gl.generate_mipmap(gl::TEXTURE_2D);
        assert_eq!(gl.get_error(), gl::INVALID_OPERATION);

        gl.tex_storage_2d(gl::TEXTURE_2D, 3, gl::RGBA8, 8, 8);
        gl.generate_mipmap(gl::TEXTURE_2D);
        assert_eq!(gl.get_error(), gl::NO_ERROR);
        assert_eq!(gl.mipmap_generations(texture), 1);
    }

    #[test]
    fn uniforms_are_discovered_at_link_time() {
        let mut gl = HeadlessGlContext::new();
        let shader = gl.create_shader(gl::FRAGMENT_SHADER).unwrap();
        gl.shader_source(
            shader,
            "uniform Lights {\n vec4 color;\n};\nuniform sampler2D Shadow;\nvoid main() {}",
        );
        gl.compile_shader(shader);
        let program = gl.create_program().unwrap();
        gl.attach_shader(program, shader);
        gl.link_program(program);

        assert!(gl.get_program_link_status(program));
        assert_eq!(gl.get_uniform_block_index(program, "Lights"), Some(0));
        assert_eq!(
            gl.get_uniform_location(program, "Shadow"),
            Some(NativeUniformLocation(0))
        );
        assert_eq!(gl.get_uniform_location(program, "Lights"), None);
    }

    #[test]
    fn error_directive_fails_compilation() {
        let mut gl = HeadlessGlContext::new();
        let shader = gl.create_shader(gl::VERTEX_SHADER).unwrap();
        gl.shader_source(shader, "#error unsupported\nvoid main() {}");
        gl.compile_shader(shader);

        assert!(!gl.get_shader_compile_status(shader));
        assert!(gl.get_shader_info_log(shader).contains("#error"));
    }

    #[test]
    fn draws_observe_the_last_clear() {
        let mut gl = HeadlessGlContext::new();
        let program = gl.create_program().unwrap();
        gl.use_program(Some(program));
        gl.clear_color(0.25, 0.5, 0.75, 1.0);
        gl.clear(gl::COLOR_BUFFER_BIT);
        gl.draw_arrays(gl::TRIANGLES, 0, 3);

        assert_eq!(gl.draws()[0].target_color, [0.25, 0.5, 0.75, 1.0]);
        assert!(gl.first_call("clear") < gl.first_call("draw_arrays"));
    }
}
