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

// Vellum Sandbox
// Records a frame off the context thread and replays it on a headless context.

use std::mem;
use std::thread;

use anyhow::Result;
use vellum_core::math::LinearRgba;
use vellum_core::renderer::api::*;
use vellum_core::renderer::{CommandList, ResourceFactory};
use vellum_infra::graphics::gl::{GlDeviceSettings, GlGraphicsDevice, HeadlessGlContext};

const VERTEX_SOURCE: &str = "#version 330 core
in vec2 position;
in vec2 uv;
uniform Frame { mat4 view_proj; };
out vec2 v_uv;
void main() { v_uv = uv; gl_Position = view_proj * vec4(position, 0.0, 1.0); }
";

const FRAGMENT_SOURCE: &str = "#version 330 core
uniform sampler2D Checker;
in vec2 v_uv;
out vec4 color;
void main() { color = texture(Checker, v_uv); }
";

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

impl Vertex {
    fn buffer_layout() -> VertexBufferLayoutDescriptor {
        VertexBufferLayoutDescriptor::per_vertex(vec![
            VertexAttributeDescriptor::new("position", VertexFormat::Float32x2),
            VertexAttributeDescriptor::new("uv", VertexFormat::Float32x2),
        ])
    }
}

const QUAD: [Vertex; 4] = [
    Vertex { position: [-1.0, -1.0], uv: [0.0, 0.0] },
    Vertex { position: [1.0, -1.0], uv: [1.0, 0.0] },
    Vertex { position: [1.0, 1.0], uv: [1.0, 1.0] },
    Vertex { position: [-1.0, 1.0], uv: [0.0, 1.0] },
];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];
const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];
const CHECKER_SIZE: u32 = 8;

fn checker_texels() -> Vec<u8> {
    (0..CHECKER_SIZE * CHECKER_SIZE)
        .flat_map(|i| {
            let (x, y) = (i % CHECKER_SIZE, i / CHECKER_SIZE);
            let v = if (x + y) % 2 == 0 { 255 } else { 32 };
            [v, v, v, 255]
        })
        .collect()
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("vellum_infra::graphics::gl::executor", log::LevelFilter::Info)
        .init();

    let mut device = GlGraphicsDevice::new(HeadlessGlContext::new(), GlDeviceSettings::default())?
        .with_present_callback(|gl| log::debug!("present: {} draws so far", gl.draws().len()));
    let factory = device.factory().clone();

    let vs = factory.get_or_create_shader(&ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE))?;
    let fs =
        factory.get_or_create_shader(&ShaderDescriptor::new(ShaderStage::Fragment, FRAGMENT_SOURCE))?;
    let layout = factory.get_or_create_resource_layout(&ResourceLayoutDescriptor {
        label: Some("quad".to_string()),
        elements: vec![
            ResourceLayoutElement::new("Frame", ResourceKind::UniformBuffer)
                .with_uniform_size(mem::size_of_val(&IDENTITY) as u32),
            ResourceLayoutElement::new("Checker", ResourceKind::TextureReadOnly),
            ResourceLayoutElement::new("CheckerSampler", ResourceKind::Sampler),
        ],
    })?;
    let pipeline = factory.get_or_create_pipeline(&PipelineDescriptor {
        label: Some("quad".to_string()),
        blend_state: BlendStateDescriptor::default(),
        depth_stencil_state: DepthStencilStateDescriptor::default(),
        rasterizer_state: RasterizerStateDescriptor::default(),
        primitive_topology: PrimitiveTopology::TriangleList,
        vertex_layouts: vec![Vertex::buffer_layout()],
        shaders: vec![vs, fs],
        resource_layouts: vec![layout],
    })?;

    let vertices = factory.create_buffer(&BufferDescriptor::new(
        mem::size_of_val(&QUAD) as u64,
        BufferUsage::VERTEX,
    ))?;
    let indices = factory.create_buffer(&BufferDescriptor::new(
        mem::size_of_val(&QUAD_INDICES) as u64,
        BufferUsage::INDEX,
    ))?;
    let frame = factory.create_buffer(&BufferDescriptor::new(
        mem::size_of_val(&IDENTITY) as u64,
        BufferUsage::UNIFORM | BufferUsage::DYNAMIC,
    ))?;
    let texture = factory.create_texture(&TextureDescriptor::texture_2d(
        CHECKER_SIZE,
        CHECKER_SIZE,
        1,
        TextureFormat::Rgba8Unorm,
        TextureUsage::SAMPLED,
    ))?;
    let view = factory.create_texture_view(&TextureViewDescriptor::whole(texture))?;
    let sampler = factory.create_sampler(&SamplerDescriptor::default())?;
    let set = factory.create_resource_set(&ResourceSetDescriptor {
        label: Some("quad".to_string()),
        layout,
        resources: vec![
            BindableResource::Buffer(frame),
            BindableResource::TextureView(view),
            BindableResource::Sampler(sampler),
        ],
    })?;
    let swapchain = factory.swapchain_framebuffer();

    // Record on a worker thread: only descriptions and staged copies are touched there.
    let recorder = factory.clone();
    let mut list = thread::spawn(move || {
        let mut list = recorder.create_command_list();
        list.begin();
        list.update_buffer_pod(vertices, 0, &QUAD);
        list.update_buffer_pod(indices, 0, &QUAD_INDICES);
        list.update_buffer_pod(frame, 0, &IDENTITY);
        list.update_texture_2d(
            texture,
            &checker_texels(),
            TextureRegion::full(CHECKER_SIZE, CHECKER_SIZE),
        );
        list.set_framebuffer(swapchain);
        list.set_viewport(0, Viewport::new(0.0, 0.0, 640.0, 480.0));
        list.clear_color_target(0, LinearRgba::rgb(0.1, 0.1, 0.12));
        list.set_pipeline(pipeline);
        list.set_vertex_buffer(0, vertices, 0);
        list.set_index_buffer(indices, IndexFormat::Uint16);
        list.set_resource_set(0, set);
        list.draw(QUAD_INDICES.len() as u32, 1, 0, 0, 0);
        list.end();
        list
    })
    .join()
    .map_err(|_| anyhow::anyhow!("the recording thread panicked"))?;

    log::info!("Recorded {} commands", list.len());
    device.submit_commands(&mut list)?;
    device.swap_buffers()?;
    log::info!("Frame stats: {:?}", device.stats());

    for handle in [
        ResourceHandle::from(set),
        ResourceHandle::from(sampler),
        ResourceHandle::from(view),
        ResourceHandle::from(texture),
        ResourceHandle::from(frame),
        ResourceHandle::from(indices),
        ResourceHandle::from(vertices),
    ] {
        factory.dispose(handle)?;
    }
    factory.clear_cache()?;
    device.wait_for_idle()?;

    let gl = device.context();
    log::info!(
        "Shut down with {} buffers, {} textures and {} programs alive; {} staging blocks outstanding",
        gl.buffer_count(),
        gl.texture_count(),
        gl.program_count(),
        factory.staging_pool().outstanding_blocks()
    );
    Ok(())
}
