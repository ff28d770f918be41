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

//! Integration tests for resource lifetimes: lazy realization, staged uploads, deferred
//! disposal and the description caches.

mod common;

use std::thread;

use common::{headless_device, TexturedScene, VERTEX_SOURCE};
use vellum_core::renderer::api::*;
use vellum_core::renderer::{CommandList, RenderError, ResourceError, ResourceFactory};
use vellum_infra::graphics::gl::consts as gl;

// ─────────────────────────────────────────────────────────────────────────────
// Realization
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_describing_resources_touches_no_native_state() -> anyhow::Result<()> {
    // ARRANGE
    let device = headless_device()?;
    let calls_after_init = device.context().calls().len();

    // ACT
    let scene = TexturedScene::create(device.factory(), 1)?;

    // ASSERT
    assert_eq!(device.context().calls().len(), calls_after_init);
    assert!(!device.factory().is_created(scene.pipeline.into()));
    assert!(!device.factory().is_created(scene.texture.into()));
    Ok(())
}

#[test]
fn test_buffer_round_trips_through_an_update() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(
        64,
        BufferUsage::UNIFORM | BufferUsage::DYNAMIC,
    ))?;
    let mut list = factory.create_command_list();
    list.begin();
    list.update_buffer(buffer, 0, &[0xAB; 64]);
    list.end();

    // ACT
    device.submit_commands(&mut list)?;
    let contents = device.read_buffer(buffer, 0, 64)?;

    // ASSERT
    assert_eq!(contents, vec![0xAB; 64]);
    assert_eq!(device.stats().staged_bytes_uploaded, 64);
    Ok(())
}

#[test]
fn test_typed_update_lands_at_its_offset() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(16, BufferUsage::VERTEX))?;
    let mut list = factory.create_command_list();
    list.update_buffer_pod(buffer, 8, &[1.5f32, -2.0]);

    // ACT
    device.submit_commands(&mut list)?;
    let tail = device.read_buffer(buffer, 8, 8)?;

    // ASSERT
    assert_eq!(tail, bytemuck::cast_slice::<f32, u8>(&[1.5, -2.0]));
    assert_eq!(device.read_buffer(buffer, 0, 8)?, vec![0; 8]);
    Ok(())
}

#[test]
fn test_overflowing_update_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(16, BufferUsage::VERTEX))?;
    let mut list = factory.create_command_list();
    list.update_buffer(buffer, 12, &[0; 8]);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(matches!(result, Err(RenderError::ResourceError(_))));
    assert_eq!(device.context().call_count("buffer_sub_data"), 0);
    assert_eq!(factory.staging_pool().outstanding_blocks(), 0);
    Ok(())
}

#[test]
fn test_cube_face_upload_targets_its_face() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let cube = factory.create_texture(&TextureDescriptor::cubemap(
        4,
        1,
        TextureFormat::R8Unorm,
        TextureUsage::SAMPLED,
    ))?;
    let mut list = factory.create_command_list();
    list.update_texture_cube(cube, &[7; 16], CubeFace::NegativeY, TextureRegion::full(4, 4));

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let native = gl
        .bound_texture(15, gl::TEXTURE_CUBE_MAP)
        .expect("uploads go through the reserved unit");
    let uploads = gl.texture_uploads(native);
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].target, gl::TEXTURE_CUBE_MAP_NEGATIVE_Y);
    assert_eq!(uploads[0].unpack_alignment, 1);
    assert_eq!(gl.unpack_alignment(), 4);
    Ok(())
}

#[test]
fn test_2d_update_on_a_cubemap_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let cube = factory.create_texture(&TextureDescriptor::cubemap(
        4,
        1,
        TextureFormat::Rgba8Unorm,
        TextureUsage::SAMPLED,
    ))?;
    let mut list = factory.create_command_list();
    list.update_texture_2d(cube, &[0; 64], TextureRegion::full(4, 4));

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(result.is_err());
    assert_eq!(device.context().call_count("tex_sub_image_2d"), 0);
    Ok(())
}

#[test]
fn test_short_texture_payload_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.update_texture_2d(scene.texture, &[1, 2, 3, 4], TextureRegion::full(16, 16));

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ResourceError(ResourceError::OutOfBounds)) => {}
        other => panic!("expected an out-of-bounds update, got {other:?}"),
    }
    assert_eq!(device.context().call_count("tex_sub_image_2d"), 0);
    assert_eq!(factory.staging_pool().outstanding_blocks(), 0);
    Ok(())
}

#[test]
fn test_texture_region_outside_its_mip_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 2)?;
    let mut list = factory.create_command_list();
    let mip1 = TextureRegion {
        mip_level: 1,
        ..TextureRegion::full(16, 16)
    };
    list.update_texture_2d(scene.texture, &[0; 16 * 16 * 4], mip1);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(result.is_err());
    assert_eq!(device.context().call_count("tex_sub_image_2d"), 0);
    Ok(())
}

#[test]
fn test_shader_compile_failure_surfaces_on_first_use() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let broken = factory.create_shader(&ShaderDescriptor::new(
        ShaderStage::Fragment,
        "#error unsupported target\n",
    ))?;
    let vs = factory.create_shader(&ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE))?;
    let pipeline = factory.create_pipeline(&common::pipeline_descriptor(
        "broken",
        Vec::new(),
        vec![vs, broken],
        Vec::new(),
    ))?;
    let mut list = factory.create_command_list();
    list.set_pipeline(pipeline);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ResourceError(err)) => assert!(err.to_string().contains("#error")),
        other => panic!("expected a shader error, got {other:?}"),
    }
    assert!(!factory.is_created(pipeline.into()));
    assert_eq!(device.context().program_count(), 0);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Copies and mip generation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_buffer_copy_lands_at_its_offset() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let source = factory.create_buffer(&BufferDescriptor::new(16, BufferUsage::VERTEX))?;
    let destination = factory.create_buffer(&BufferDescriptor::new(16, BufferUsage::VERTEX))?;
    let bytes: Vec<u8> = (1..=16).collect();
    let mut list = factory.create_command_list();
    list.update_buffer(source, 0, &bytes);
    list.copy_buffer(source, 4, destination, 8, 8);

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let copied = device.read_buffer(destination, 0, 16)?;
    assert_eq!(copied[..8], [0; 8]);
    assert_eq!(copied[8..], bytes[4..12]);
    assert_eq!(device.context().call_count("copy_buffer_sub_data"), 1);
    Ok(())
}

#[test]
fn test_overflowing_copy_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let source = factory.create_buffer(&BufferDescriptor::new(16, BufferUsage::VERTEX))?;
    let destination = factory.create_buffer(&BufferDescriptor::new(32, BufferUsage::VERTEX))?;
    let mut list = factory.create_command_list();
    list.copy_buffer(source, 12, destination, 0, 8);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ResourceError(ResourceError::OutOfBounds)) => {}
        other => panic!("expected an out-of-bounds copy, got {other:?}"),
    }
    assert_eq!(device.context().call_count("copy_buffer_sub_data"), 0);
    Ok(())
}

#[test]
fn test_overlapping_copy_within_a_buffer_is_rejected() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(32, BufferUsage::VERTEX))?;
    let mut list = factory.create_command_list();
    list.copy_buffer(buffer, 0, buffer, 8, 16);

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    assert!(matches!(result, Err(RenderError::ResourceError(_))));
    assert_eq!(device.context().call_count("copy_buffer_sub_data"), 0);
    Ok(())
}

#[test]
fn test_mipmaps_are_generated_on_the_reserved_unit() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 4)?;
    let mut list = factory.create_command_list();
    list.update_texture_2d(scene.texture, &[0x80; 16 * 16 * 4], TextureRegion::full(16, 16));
    list.generate_mipmaps(scene.texture);

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    let gl = device.context();
    let native = gl
        .bound_texture(15, gl::TEXTURE_2D)
        .expect("mip generation goes through the reserved unit");
    assert_eq!(gl.mipmap_generations(native), 1);
    assert!(gl.first_call("tex_sub_image_2d") < gl.first_call("generate_mipmap"));
    assert_eq!(gl.texture_parameter(native, gl::TEXTURE_MAX_LEVEL), Some(3));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Staging
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_every_staged_payload_is_freed_by_replay() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.begin();
    list.update_buffer(scene.vertices, 0, &[1; 80]);
    list.update_buffer(scene.indices, 0, &[2; 12]);
    list.update_texture_2d(scene.texture, &[3; 16 * 16 * 4], TextureRegion::full(16, 16));
    list.end();
    let pool = factory.staging_pool();
    assert_eq!(pool.outstanding_blocks(), 3);

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    assert_eq!(pool.outstanding_blocks(), 0);
    assert_eq!(pool.total_staged(), pool.total_freed());
    assert_eq!(list.pending_payloads(), 0);
    assert_eq!(device.stats().staged_bytes_uploaded, 80 + 12 + 16 * 16 * 4);
    Ok(())
}

#[test]
fn test_replaying_a_consumed_update_fails() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(4, BufferUsage::UNIFORM))?;
    let mut list = factory.create_command_list();
    list.update_buffer(buffer, 0, &[9; 4]);
    device.submit_commands(&mut list)?;

    // ACT
    let result = device.submit_commands(&mut list);

    // ASSERT
    match result {
        Err(RenderError::ExecutionFailed(message)) => {
            assert!(message.contains("already consumed"))
        }
        other => panic!("expected a consumed payload, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_reset_returns_unsubmitted_payloads() -> anyhow::Result<()> {
    // ARRANGE
    let device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(32, BufferUsage::VERTEX))?;
    let mut list = factory.create_command_list();
    list.update_buffer(buffer, 0, &[1; 32]);
    list.update_buffer(buffer, 0, &[2; 16]);

    // ACT
    list.reset();

    // ASSERT
    assert!(list.is_empty());
    assert_eq!(factory.staging_pool().outstanding_blocks(), 0);
    Ok(())
}

#[test]
fn test_lists_recorded_on_another_thread_replay_in_order() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(8, BufferUsage::DYNAMIC))?;
    let recorder = factory.clone();
    let mut list = thread::spawn(move || {
        let mut list = recorder.create_command_list();
        list.begin();
        list.update_buffer(buffer, 0, &[1; 8]);
        list.update_buffer(buffer, 4, &[2; 4]);
        list.end();
        list
    })
    .join()
    .expect("the recording thread completes");

    // ACT
    device.submit_commands(&mut list)?;

    // ASSERT
    assert_eq!(device.read_buffer(buffer, 0, 8)?, vec![1, 1, 1, 1, 2, 2, 2, 2]);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Disposal
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_disposal_waits_for_the_frame_boundary() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(16, BufferUsage::VERTEX))?;
    let mut list = factory.create_command_list();
    list.update_buffer(buffer, 0, &[0; 16]);
    device.submit_commands(&mut list)?;
    assert_eq!(device.context().buffer_count(), 1);

    // ACT
    factory.dispose(buffer.into())?;
    let before_swap = device.context().buffer_count();
    device.swap_buffers()?;

    // ASSERT
    assert_eq!(before_swap, 1);
    assert_eq!(device.context().buffer_count(), 0);
    assert_eq!(device.context().call_count("delete_buffer"), 1);
    assert!(!factory.is_created(buffer.into()));
    Ok(())
}

#[test]
fn test_disposal_from_another_thread() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let scene = TexturedScene::create(&factory, 1)?;
    let mut list = factory.create_command_list();
    list.set_pipeline(scene.pipeline);
    list.set_resource_set(0, scene.set);
    device.submit_commands(&mut list)?;
    let disposer = factory.clone();

    // ACT
    thread::spawn(move || {
        for handle in [
            ResourceHandle::from(scene.sampler),
            ResourceHandle::from(scene.view),
            ResourceHandle::from(scene.texture),
        ] {
            disposer.dispose(handle).expect("disposal is accepted");
        }
    })
    .join()
    .expect("the disposing thread completes");
    let textures_before = device.context().texture_count();
    device.wait_for_idle()?;

    // ASSERT
    let gl = device.context();
    assert_eq!(textures_before, 1);
    assert_eq!(gl.texture_count(), 0);
    assert_eq!(gl.sampler_count(), 0);
    assert_eq!(gl.call_count("finish"), 1);
    Ok(())
}

#[test]
fn test_double_dispose_destroys_once() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let buffer = factory.create_buffer(&BufferDescriptor::new(4, BufferUsage::VERTEX))?;
    device.read_buffer(buffer, 0, 4)?;

    // ACT
    factory.dispose(buffer.into())?;
    factory.dispose(buffer.into())?;
    device.swap_buffers()?;

    // ASSERT
    assert_eq!(device.context().call_count("delete_buffer"), 1);
    Ok(())
}

#[test]
fn test_swapchain_survives_disposal() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let swapchain = factory.swapchain_framebuffer();

    // ACT
    factory.dispose(swapchain.into())?;
    device.swap_buffers()?;
    let mut list = factory.create_command_list();
    list.set_framebuffer(swapchain);
    device.submit_commands(&mut list)?;

    // ASSERT
    assert_eq!(device.context().bound_framebuffer(), None);
    assert_eq!(device.context().call_count("delete_framebuffer"), 0);
    Ok(())
}

#[test]
fn test_present_callback_runs_after_flush() -> anyhow::Result<()> {
    // ARRANGE
    let device = headless_device()?;
    let mut device = device.with_present_callback(|gl| gl.clear_calls());

    // ACT
    device.swap_buffers()?;

    // ASSERT
    assert!(device.context().calls().is_empty());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Description caches
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_equal_descriptions_share_one_resource() -> anyhow::Result<()> {
    // ARRANGE
    let device = headless_device()?;
    let factory = device.factory();
    let descriptor = ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE);

    // ACT
    let first = factory.get_or_create_shader(&descriptor)?;
    let second = factory.get_or_create_shader(&descriptor)?;
    let other = factory.get_or_create_shader(&ShaderDescriptor::new(
        ShaderStage::Fragment,
        common::FRAGMENT_SOURCE,
    ))?;

    // ASSERT
    assert_eq!(first, second);
    assert_ne!(first, other);
    Ok(())
}

#[test]
fn test_clearing_the_cache_disposes_its_entries() -> anyhow::Result<()> {
    // ARRANGE
    let mut device = headless_device()?;
    let factory = device.factory().clone();
    let vs =
        factory.get_or_create_shader(&ShaderDescriptor::new(ShaderStage::Vertex, VERTEX_SOURCE))?;
    let fs = factory.get_or_create_shader(&ShaderDescriptor::new(
        ShaderStage::Fragment,
        common::FRAGMENT_SOURCE,
    ))?;
    let descriptor = common::pipeline_descriptor("cached", Vec::new(), vec![vs, fs], Vec::new());
    let pipeline = factory.get_or_create_pipeline(&descriptor)?;
    let mut list = factory.create_command_list();
    list.set_pipeline(pipeline);
    device.submit_commands(&mut list)?;
    assert_eq!(device.context().shader_count(), 2);

    // ACT
    factory.clear_cache()?;
    device.swap_buffers()?;

    // ASSERT
    let gl = device.context();
    assert_eq!(gl.program_count(), 0);
    assert_eq!(gl.shader_count(), 0);
    assert_ne!(factory.get_or_create_pipeline(&descriptor)?, pipeline);
    Ok(())
}
