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

//! Integration tests for command recording and replay on a headless context.
//!
//! Every test drives the public device surface only: resources are described through the
//! factory, commands are recorded into a list and submitted, and the outcome is read back
//! from the headless context.

mod common;

use approx::assert_relative_eq;
use common::{headless_device, pipeline_descriptor, TexturedScene, FRAGMENT_SOURCE, VERTEX_SOURCE};
use vellum_core::math::LinearRgba;
use vellum_core::renderer::api::*;
use vellum_core::renderer::{CommandList, RenderError, ResourceFactory};
use vellum_infra::graphics::gl::consts as gl;

// ─────────────────────────────────────────────────────────────────────────────
// Pipelines and vertex input
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_pipeline_is_linked_once_across_submissions() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    assert_eq!(gl.call_count("create_program"), 1);
    assert_eq!(gl.call_count("link_program"), 1);
    assert_eq!(gl.call_count("compile_shader"), 2);
    assert!(factory.is_created(scene.pipeline.into()));
    Ok(())
}

#[test]
fn test_redundant_set_pipeline_is_elided() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_pipeline(scene.pipeline);
    list.set_pipeline(scene.pipeline);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    assert_eq!(device.context().call_count("use_program"), 1);
    let stats = device.stats();
    assert_eq!(stats.pipeline_changes, 1);
    assert_eq!(stats.pipeline_changes_elided, 2);
    Ok(())
}

#[test]
fn test_exactly_the_pipeline_attributes_are_enabled() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let vs = factory.create_shader(&ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE))?;
    let fs = factory.create_shader(&ShaderDescriptor::new(ShaderStage::Fragment, FRAGMENT_SOURCE))?;
    let position_only = factory.create_pipeline(&pipeline_descriptor(
        "position only",
        vec![VertexBufferLayoutDescriptor::per_vertex(vec![
            VertexAttributeDescriptor::new("position", VertexFormat::Float32x3),
        ])],
        vec![vs, fs],
        Vec::new(),
    ))?;

    let mut wide = factory.create_command_list();
    wide.begin();
    wide.set_pipeline(scene.pipeline);
    wide.set_vertex_buffer(0, scene.vertices, 0);
    wide.draw_vertices(3, 1, 0, 0);
    wide.end();

    let mut narrow = factory.create_command_list();
    narrow.set_pipeline(position_only);
    narrow.set_vertex_buffer(0, scene.vertices, 0);
    narrow.draw_vertices(3, 1, 0, 0);

    // ACT
    device.submit_commands(&mut wide)?;
    let after_wide = device.context().enabled_attribute_count();
    device.submit_commands(&mut narrow)?;

    // ASSERT
    let gl = device.context();
    assert_eq!(after_wide, 2);
    assert_eq!(gl.enabled_attribute_count(), 1);
    assert_eq!(gl.draws()[1].enabled_attributes, 1);
    Ok(())
}

#[test]
fn test_packed_attributes_follow_the_layout_stride() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_vertex_buffer_with_offset(0, scene.vertices, 0, 20);
    list.draw_vertices(3, 1, 0, 0);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let position = gl.attribute_pointer(0).expect("position is described");
    let uv = gl.attribute_pointer(1).expect("uv is described");
    assert_eq!((position.size, position.stride, position.offset), (3, 20, 20));
    assert_eq!((uv.size, uv.stride, uv.offset), (2, 20, 32));
    assert_eq!(position.data_type, gl::FLOAT);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Draws
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_indexed_draw_selects_the_base_vertex_variant() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_vertex_buffer(0, scene.vertices, 0);
    list.set_index_buffer(scene.indices, IndexFormat::Uint16);
    list.draw(6, 1, 2, 5, 0);
    list.draw(6, 3, 0, 0, 0);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let draws = device.context().draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].call, "draw_elements_base_vertex");
    assert_eq!(draws[0].first_or_offset, 4);
    assert_eq!(draws[0].base_vertex, 5);
    assert_eq!(draws[0].element_type, Some(gl::UNSIGNED_SHORT));
    assert_eq!(draws[1].call, "draw_elements_instanced");
    assert_eq!(draws[1].instances, 3);
    assert_eq!(device.stats().draw_calls, 2);
    Ok(())
}

#[test]
fn test_instanced_vertex_draw() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_vertex_buffer(0, scene.vertices, 0);
    list.draw_vertices(3, 4, 1, 0);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let draw = &device.context().draws()[0];
    assert_eq!(draw.call, "draw_arrays_instanced");
    assert_eq!((draw.first_or_offset, draw.count, draw.instances), (1, 3, 4));
    assert_eq!(draw.mode, gl::TRIANGLES);
    Ok(())
}

#[test]
fn test_indexed_draw_without_index_buffer_fails() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_vertex_buffer(0, scene.vertices, 0);
    list.draw(3, 1, 0, 0, 0);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(matches!(result, Err(RenderError::ExecutionFailed(_))));
    assert!(device.context().draws().is_empty());
    Ok(())
}

#[test]
fn test_draw_without_pipeline_fails() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let mut list = factory.create_command_list();
    list.begin();
    list.draw_vertices(3, 1, 0, 0);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ExecutionFailed(message)) => assert!(message.contains("no pipeline")),
        other => panic!("expected an execution failure, got {other:?}"),
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Framebuffers, clears, viewports
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_clear_lands_before_the_following_draw() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_framebuffer(factory.swapchain_framebuffer());
    list.clear_color_target(0, LinearRgba::RED);
    list.set_pipeline(scene.pipeline);
    list.set_vertex_buffer(0, scene.vertices, 0);
    list.draw_vertices(3, 1, 0, 0);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    assert_eq!(gl.draws()[0].target_color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(gl.draws()[0].framebuffer, None);
    assert!(gl.first_call("clear") < gl.first_call("draw_arrays"));
    Ok(())
}

#[test]
fn test_offscreen_clear_restores_draw_buffers() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let color = |factory: &vellum_infra::graphics::gl::GlResourceFactory| {
        factory.create_texture(&TextureDescriptor::texture_2d(
            32,
            32,
            1,
            TextureFormat::Rgba16Float,
            TextureUsage::RENDER_TARGET,
        ))
    };
    let albedo = color(&factory)?;
    let normal = color(&factory)?;
    let target = factory.create_framebuffer(&FramebufferDescriptor {
        label: Some("gbuffer".to_string()),
        depth_target: None,
        color_targets: vec![
            FramebufferAttachment::new(albedo),
            FramebufferAttachment::new(normal),
        ],
    })?;

    let mut list = factory.create_command_list();
    list.begin();
    list.set_framebuffer(target);
    list.clear_color_target(1, LinearRgba::GREEN);
    list.set_pipeline(scene.pipeline);
    list.set_vertex_buffer(0, scene.vertices, 0);
    list.draw_vertices(3, 1, 0, 0);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let clear = &gl.clears()[0];
    assert_eq!(clear.draw_buffers, vec![gl::COLOR_ATTACHMENT0 + 1]);
    let native = gl.bound_framebuffer().expect("offscreen target is bound");
    assert_eq!(
        gl.framebuffer_draw_buffers(native),
        vec![gl::COLOR_ATTACHMENT0, gl::COLOR_ATTACHMENT0 + 1]
    );
    assert_eq!(gl.draws()[0].framebuffer, Some(native));
    assert_eq!(gl.draws()[0].target_color, [0.0, 1.0, 0.0, 1.0]);
    Ok(())
}

#[test]
fn test_scissor_is_flipped_against_its_viewport() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let mut list = factory.create_command_list();
    list.begin();
    list.set_viewport(0, Viewport::new(0.0, 0.0, 400.0, 300.0));
    list.set_scissor_rect(0, 10, 30, 50, 100);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    assert_eq!(gl.scissor(0), Some([10, 170, 50, 100]));
    let (near, far) = gl.depth_range(0).expect("depth range is applied");
    assert_relative_eq!(near, 0.0);
    assert_relative_eq!(far, 1.0);
    Ok(())
}

#[test]
fn test_scissor_without_viewport_fails() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let mut list = factory.create_command_list();
    list.begin();
    list.set_scissor_rect(0, 0, 0, 8, 8);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(matches!(result, Err(RenderError::ExecutionFailed(_))));
    assert_eq!(device.context().call_count("scissor_indexed"), 0);
    Ok(())
}

#[test]
fn test_depth_clear_respects_pipeline_write_mask() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let vs = factory.create_shader(&ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE))?;
    let fs = factory.create_shader(&ShaderDescriptor::new(ShaderStage::Fragment, FRAGMENT_SOURCE))?;
    let mut descriptor = pipeline_descriptor("read only depth", Vec::new(), vec![vs, fs], Vec::new());
    descriptor.depth_stencil_state.depth_write_enabled = false;
    let pipeline = factory.create_pipeline(&descriptor)?;

    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(pipeline);
    list.clear_depth_target(1.0);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let clear = gl.clears().last().expect("depth was cleared");
    assert_eq!(clear.mask, gl::DEPTH_BUFFER_BIT);
    assert_relative_eq!(clear.depth, 1.0);
    assert!(!gl.depth_writes_enabled());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource sets
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_single_mip_texture_gets_the_no_mip_sampler() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(0, scene.set);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let bound = gl.bound_sampler(0).expect("a sampler is bound to unit 0");
    assert_eq!(
        gl.sampler_param(bound, gl::TEXTURE_MIN_FILTER),
        Some(gl::LINEAR as i32)
    );
    let program = gl.current_program().expect("the pipeline program is current");
    assert_eq!(gl.uniform_value(program, "Albedo"), Some(0));
    assert_eq!(gl.uniform_block_binding_of(program, "Camera"), Some(0));
    assert_eq!(gl.uniform_buffer_binding(0).map(|(_, _, size)| size), Some(64));
    Ok(())
}

#[test]
fn test_mipmapped_texture_gets_the_mipmapped_sampler() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 4)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(0, scene.set);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let bound = gl.bound_sampler(0).expect("a sampler is bound to unit 0");
    assert_eq!(
        gl.sampler_param(bound, gl::TEXTURE_MIN_FILTER),
        Some(gl::LINEAR_MIPMAP_LINEAR as i32)
    );
    let stats = device.stats();
    assert_eq!((stats.texture_binds, stats.sampler_binds), (1, 1));
    Ok(())
}

#[test]
fn test_set_slot_outside_the_pipeline_layouts_fails() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(1, scene.set);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(result.is_err());
    assert_eq!(device.context().call_count("bind_buffer_range"), 0);
    Ok(())
}

#[test]
fn test_small_uniform_buffer_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let small = factory.create_buffer(&BufferDescriptor::new(32, BufferUsage::UNIFORM))?;
    let set = factory.create_resource_set(&ResourceSetDescriptor {
        label: Some("undersized".to_string()),
        layout: scene.layout,
        resources: vec![
            BindableResource::Buffer(small),
            BindableResource::TextureView(scene.view),
            BindableResource::Sampler(scene.sampler),
        ],
    })?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(0, set);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ResourceError(err)) => assert!(err.to_string().contains("Camera")),
        other => panic!("expected a resource error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_set_built_for_a_narrower_layout_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let camera_only = factory.create_resource_layout(&ResourceLayoutDescriptor {
        label: Some("camera only".to_string()),
        elements: vec![
            ResourceLayoutElement::new("Camera", ResourceKind::UniformBuffer).with_uniform_size(64),
        ],
    })?;
    let set = factory.create_resource_set(&ResourceSetDescriptor {
        label: Some("camera only".to_string()),
        layout: camera_only,
        resources: vec![BindableResource::Buffer(scene.uniforms)],
    })?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(0, set);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ResourceError(err)) => assert!(err.to_string().contains("expects layout")),
        other => panic!("expected an incompatible set, got {other:?}"),
    }
    let gl = device.context();
    assert_eq!(gl.call_count("bind_buffer_range"), 0);
    assert_eq!(gl.call_count("bind_sampler"), 0);
    Ok(())
}

#[test]
fn test_set_from_an_equivalent_layout_binds() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let twin = factory.create_resource_layout(&ResourceLayoutDescriptor {
        label: Some("twin".to_string()),
        elements: vec![
            ResourceLayoutElement::new("Frame", ResourceKind::UniformBuffer),
            ResourceLayoutElement::new("Diffuse", ResourceKind::TextureReadOnly),
            ResourceLayoutElement::new("DiffuseSampler", ResourceKind::Sampler),
        ],
    })?;
    let set = factory.create_resource_set(&ResourceSetDescriptor {
        label: Some("twin".to_string()),
        layout: twin,
        resources: vec![
            BindableResource::Buffer(scene.uniforms),
            BindableResource::TextureView(scene.view),
            BindableResource::Sampler(scene.sampler),
        ],
    })?;
    let mut list = factory.create_command_list();
    list.begin();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(0, set);

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    assert!(gl.bound_sampler(0).is_some());
    assert_eq!(gl.uniform_buffer_binding(0).map(|(_, _, size)| size), Some(64));
    Ok(())
}
