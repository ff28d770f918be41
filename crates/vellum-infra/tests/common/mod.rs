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

//! Shared fixtures for the GL backend integration tests.

#![allow(dead_code)]

use vellum_core::renderer::api::*;
use vellum_core::renderer::ResourceFactory;
use vellum_infra::graphics::gl::{
    ErrorCheckMode, GlDeviceSettings, GlGraphicsDevice, GlResourceFactory, HeadlessGlContext,
};

pub const VERTEX_SOURCE: &str = "#version 330 core
in vec3 position;
in vec2 uv;
uniform Camera { mat4 view_proj; };
void main() {}
";

pub const FRAGMENT_SOURCE: &str = "#version 330 core
uniform sampler2D Albedo;
out vec4 color;
void main() {}
";

pub type HeadlessDevice = GlGraphicsDevice<HeadlessGlContext>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A device over a fresh headless context, checking native errors after every call.
pub fn headless_device() -> anyhow::Result<HeadlessDevice> {
    init_logging();
    let settings = GlDeviceSettings {
        error_checking: ErrorCheckMode::Always,
        ..GlDeviceSettings::default()
    };
    Ok(GlGraphicsDevice::new(HeadlessGlContext::new(), settings)?)
}

pub fn position_uv_layout() -> VertexBufferLayoutDescriptor {
    VertexBufferLayoutDescriptor::per_vertex(vec![
        VertexAttributeDescriptor::new("position", VertexFormat::Float32x3),
        VertexAttributeDescriptor::new("uv", VertexFormat::Float32x2),
    ])
}

pub fn pipeline_descriptor(
    label: &str,
    vertex_layouts: Vec<VertexBufferLayoutDescriptor>,
    shaders: Vec<ShaderId>,
    resource_layouts: Vec<ResourceLayoutId>,
) -> PipelineDescriptor {
    PipelineDescriptor {
        label: Some(label.to_string()),
        blend_state: BlendStateDescriptor::default(),
        depth_stencil_state: DepthStencilStateDescriptor::default(),
        rasterizer_state: RasterizerStateDescriptor::default(),
        primitive_topology: PrimitiveTopology::TriangleList,
        vertex_layouts,
        shaders,
        resource_layouts,
    }
}

/// Everything a textured draw needs, created through the factory only.
pub struct TexturedScene {
    pub pipeline: PipelineId,
    pub layout: ResourceLayoutId,
    pub set: ResourceSetId,
    pub vertices: BufferId,
    pub indices: BufferId,
    pub uniforms: BufferId,
    pub texture: TextureId,
    pub view: TextureViewId,
    pub sampler: SamplerId,
}

impl TexturedScene {
    pub fn create(factory: &GlResourceFactory, mip_levels: u32) -> anyhow::Result<Self> {
        let vs = factory.create_shader(&ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE))?;
        let fs =
            factory.create_shader(&ShaderDescriptor::new(ShaderStage::Fragment, FRAGMENT_SOURCE))?;

        let layout = factory.create_resource_layout(&ResourceLayoutDescriptor {
            label: Some("material".to_string()),
            elements: vec![
                ResourceLayoutElement::new("Camera", ResourceKind::UniformBuffer)
                    .with_uniform_size(64),
                ResourceLayoutElement::new("Albedo", ResourceKind::TextureReadOnly),
                ResourceLayoutElement::new("AlbedoSampler", ResourceKind::Sampler),
            ],
        })?;
        let pipeline = factory.create_pipeline(&pipeline_descriptor(
            "textured",
            vec![position_uv_layout()],
            vec![vs, fs],
            vec![layout],
        ))?;

        let vertices = factory.create_buffer(&BufferDescriptor::new(
            4 * 20,
            BufferUsage::VERTEX | BufferUsage::DYNAMIC,
        ))?;
        let indices = factory.create_buffer(&BufferDescriptor::new(
            6 * 2,
            BufferUsage::INDEX | BufferUsage::DYNAMIC,
        ))?;
        let uniforms = factory.create_buffer(&BufferDescriptor::new(
            64,
            BufferUsage::UNIFORM | BufferUsage::DYNAMIC,
        ))?;

        let texture = factory.create_texture(&TextureDescriptor::texture_2d(
            16,
            16,
            mip_levels,
            TextureFormat::Rgba8Unorm,
            TextureUsage::SAMPLED,
        ))?;
        let view = factory.create_texture_view(&TextureViewDescriptor::whole(texture))?;
        let sampler = factory.create_sampler(&SamplerDescriptor::default())?;

        let set = factory.create_resource_set(&ResourceSetDescriptor {
            label: Some("material".to_string()),
            layout,
            resources: vec![
                BindableResource::Buffer(uniforms),
                BindableResource::TextureView(view),
                BindableResource::Sampler(sampler),
            ],
        })?;

        Ok(Self {
            pipeline,
            layout,
            set,
            vertices,
            indices,
            uniforms,
            texture,
            view,
            sampler,
        })
    }
}
