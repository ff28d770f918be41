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

//! Per-unit texture and sampler binding cache.
//!
//! The manager mirrors what is bound to each texture unit so that redundant binds are skipped.
//! It also implements the sampler substitution rule: a logical sampler is bound as its
//! mipmapped or non-mipmapped variant depending on the texture currently bound in the same
//! unit, and is re-bound when that texture's mip capability changes.
//!
//! A view's mip range is applied as texture parameters, so it belongs to the texture object
//! rather than to the unit. The manager remembers the range last applied to each texture and
//! treats other units holding that texture as stale when a different range is applied.
//!
//! The last unit is reserved for transient binds made while creating or updating textures.

use std::collections::HashMap;

use vellum_core::renderer::api::{ResourceHandle, SamplerId, TextureId, TextureViewId};

use super::consts as gl;
use super::context::{GlContext, NativeTexture};
use super::error::{GlError, GlResult};
use super::sampler::GlSampler;
use super::texture::{GlTexture, GlTextureView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundTexture {
    view: TextureViewId,
    texture: TextureId,
    mipmapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundSampler {
    id: SamplerId,
    sampler: GlSampler,
    mipmapped: bool,
}

/// Mirrors the texture and sampler bound to each texture unit.
#[derive(Debug)]
pub struct TextureSamplerManager {
    unit_count: u32,
    active_unit: Option<u32>,
    textures: Vec<Option<BoundTexture>>,
    samplers: Vec<Option<BoundSampler>>,
    /// `(base level, level count)` last applied to each texture object.
    applied_ranges: HashMap<TextureId, (u32, u32)>,
    texture_binds: u64,
    sampler_binds: u64,
}

impl TextureSamplerManager {
    /// Creates a manager for a context exposing `unit_count` units (at least two: one usable,
    /// one reserved).
    pub fn new(unit_count: u32) -> Self {
        let unit_count = unit_count.max(2);
        Self {
            unit_count,
            active_unit: None,
            textures: vec![None; unit_count as usize],
            samplers: vec![None; unit_count as usize],
            applied_ranges: HashMap::new(),
            texture_binds: 0,
            sampler_binds: 0,
        }
    }

    /// Number of units available to resource sets.
    pub fn usable_units(&self) -> u32 {
        self.unit_count - 1
    }

    fn reserved_unit(&self) -> u32 {
        self.unit_count - 1
    }

    fn check_unit(&self, unit: u32) -> GlResult<usize> {
        if unit < self.usable_units() {
            Ok(unit as usize)
        } else {
            Err(GlError::TextureUnitsExhausted {
                unit,
                limit: self.usable_units(),
            })
        }
    }

    fn activate(&mut self, gl: &mut dyn GlContext, unit: u32) {
        if self.active_unit != Some(unit) {
            gl.active_texture(gl::TEXTURE0 + unit);
            self.active_unit = Some(unit);
        }
    }

    /// Binds a texture view to `unit`. A no-op if the view is already bound there and its
    /// texture still carries the view's mip range.
    pub fn set_texture(
        &mut self,
        gl: &mut dyn GlContext,
        unit: u32,
        id: TextureViewId,
        texture: TextureId,
        view: &GlTextureView,
    ) -> GlResult<()> {
        let slot = self.check_unit(unit)?;
        let range = (view.base_mip_level, view.mip_level_count);
        let range_applied = self.applied_ranges.get(&texture) == Some(&range);
        if range_applied && self.textures[slot].is_some_and(|bound| bound.view == id) {
            return Ok(());
        }

        self.activate(gl, unit);
        let target = view.texture.target;
        gl.bind_texture(target, Some(view.texture.name));
        self.texture_binds += 1;

        let mipmapped = view.is_mipmapped();
        if !range_applied {
            gl.tex_parameter_i32(target, gl::TEXTURE_BASE_LEVEL, view.base_mip_level as i32);
            gl.tex_parameter_i32(
                target,
                gl::TEXTURE_MAX_LEVEL,
                (view.base_mip_level + view.mip_level_count - 1) as i32,
            );
            self.applied_ranges.insert(texture, range);
            self.invalidate_other_units(gl, slot, texture, mipmapped);
        }

        self.textures[slot] = Some(BoundTexture {
            view: id,
            texture,
            mipmapped,
        });
        log::trace!("TextureSamplerManager: unit {unit} <- view {}", id.0);

        // A texture swap can change which sampler variant the unit needs.
        if let Some(bound) = self.samplers[slot] {
            if bound.mipmapped != mipmapped {
                self.bind_sampler_variant(gl, unit, bound.id, bound.sampler, mipmapped);
            }
        }
        Ok(())
    }

    /// Other units holding `texture` now sample the range just applied: their cached view is
    /// dropped and their sampler variant follows the new range.
    fn invalidate_other_units(
        &mut self,
        gl: &mut dyn GlContext,
        slot: usize,
        texture: TextureId,
        mipmapped: bool,
    ) {
        for other in 0..self.textures.len() {
            if other == slot || !self.textures[other].is_some_and(|b| b.texture == texture) {
                continue;
            }
            self.textures[other] = None;
            if let Some(bound) = self.samplers[other] {
                if bound.mipmapped != mipmapped {
                    self.bind_sampler_variant(gl, other as u32, bound.id, bound.sampler, mipmapped);
                }
            }
        }
    }

    /// Binds the variant of `sampler` that matches the texture currently in `unit`.
    pub fn set_sampler(
        &mut self,
        gl: &mut dyn GlContext,
        unit: u32,
        id: SamplerId,
        sampler: &GlSampler,
    ) -> GlResult<()> {
        let slot = self.check_unit(unit)?;
        let mipmapped = self.textures[slot].is_some_and(|bound| bound.mipmapped);
        if self.samplers[slot].is_some_and(|bound| bound.id == id && bound.mipmapped == mipmapped)
        {
            return Ok(());
        }
        self.bind_sampler_variant(gl, unit, id, *sampler, mipmapped);
        Ok(())
    }

    fn bind_sampler_variant(
        &mut self,
        gl: &mut dyn GlContext,
        unit: u32,
        id: SamplerId,
        sampler: GlSampler,
        mipmapped: bool,
    ) {
        gl.bind_sampler(unit, Some(sampler.variant(mipmapped)));
        self.sampler_binds += 1;
        self.samplers[unit as usize] = Some(BoundSampler {
            id,
            sampler,
            mipmapped,
        });
        log::trace!(
            "TextureSamplerManager: unit {unit} <- sampler {} ({})",
            id.0,
            if mipmapped { "mipmapped" } else { "no mip" }
        );
    }

    /// Binds a texture on the reserved unit, for creation and uploads.
    pub fn bind_transient(
        &mut self,
        gl: &mut dyn GlContext,
        target: u32,
        texture: Option<NativeTexture>,
    ) {
        let unit = self.reserved_unit();
        self.activate(gl, unit);
        gl.bind_texture(target, texture);
        self.textures[unit as usize] = None;
    }

    /// Binds `texture` on the reserved unit with its whole mip chain selected, as mip
    /// generation reads the base level and writes every level up to the max level.
    pub fn bind_full_chain(
        &mut self,
        gl: &mut dyn GlContext,
        id: TextureId,
        texture: &GlTexture,
    ) {
        self.bind_transient(gl, texture.target, Some(texture.name));
        let full = (0, texture.mip_levels);
        if self.applied_ranges.get(&id).is_some_and(|range| *range != full) {
            gl.tex_parameter_i32(texture.target, gl::TEXTURE_BASE_LEVEL, 0);
            gl.tex_parameter_i32(
                texture.target,
                gl::TEXTURE_MAX_LEVEL,
                texture.mip_levels as i32 - 1,
            );
            self.applied_ranges.insert(id, full);
            let reserved = self.reserved_unit() as usize;
            self.invalidate_other_units(gl, reserved, id, texture.mip_levels > 1);
        }
    }

    /// Drops cached bindings of a destroyed resource. GL unbinds deleted objects itself.
    pub fn forget(&mut self, handle: ResourceHandle) {
        match handle {
            ResourceHandle::TextureView(view) => {
                for bound in &mut self.textures {
                    if bound.is_some_and(|b| b.view == view) {
                        *bound = None;
                    }
                }
            }
            ResourceHandle::Texture(texture) => {
                self.applied_ranges.remove(&texture);
                for bound in &mut self.textures {
                    if bound.is_some_and(|b| b.texture == texture) {
                        *bound = None;
                    }
                }
            }
            ResourceHandle::Sampler(sampler) => {
                for bound in &mut self.samplers {
                    if bound.is_some_and(|b| b.id == sampler) {
                        *bound = None;
                    }
                }
            }
            _ => {}
        }
    }

    /// Returns and resets the texture and sampler bind counters.
    pub fn take_bind_counts(&mut self) -> (u64, u64) {
        let counts = (self.texture_binds, self.sampler_binds);
        self.texture_binds = 0;
        self.sampler_binds = 0;
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gl::headless::HeadlessGlContext;
    use crate::graphics::gl::texture::{texture_target, GlTexture};
    use std::num::NonZeroU32;
    use vellum_core::renderer::api::{TextureDimension, TextureFormat};

    use crate::graphics::gl::context::NativeSampler;
    use crate::graphics::gl::conversions::IntoGl;

    fn view(name: u32, mip_levels: u32) -> GlTextureView {
        let texture = GlTexture {
            name: NativeTexture(NonZeroU32::new(name).unwrap()),
            target: texture_target(TextureDimension::D2, 1),
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            pixel: TextureFormat::Rgba8Unorm.into_gl(),
            texel_size: 4,
            width: 16,
            height: 16,
            mip_levels,
            array_layers: 1,
        };
        GlTextureView::new(texture, 0, None)
    }

    fn sampler() -> GlSampler {
        GlSampler {
            mipmapped: NativeSampler(NonZeroU32::new(100).unwrap()),
            no_mip: NativeSampler(NonZeroU32::new(101).unwrap()),
        }
    }

    #[test]
    fn rebinding_the_same_view_is_elided() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(8);
        let v = view(1, 1);

        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &v)
            .unwrap();
        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &v)
            .unwrap();

        assert_eq!(gl.call_count("bind_texture"), 1);
        assert_eq!(units.take_bind_counts(), (1, 0));
    }

    #[test]
    fn sampler_variant_follows_texture_swaps() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(8);
        let s = sampler();

        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &view(1, 1))
            .unwrap();
        units.set_sampler(&mut gl, 0, SamplerId(1), &s).unwrap();
        assert_eq!(gl.bound_sampler(0), Some(s.no_mip));

        units
            .set_texture(&mut gl, 0, TextureViewId(2), TextureId(2), &view(2, 5))
            .unwrap();
        assert_eq!(gl.bound_sampler(0), Some(s.mipmapped));

        // Same logical sampler, same capability: nothing to do.
        units.set_sampler(&mut gl, 0, SamplerId(1), &s).unwrap();
        assert_eq!(gl.call_count("bind_sampler"), 2);
    }

    #[test]
    fn reserved_unit_is_not_available_to_resource_sets() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(4);
        let err = units
            .set_texture(&mut gl, 3, TextureViewId(1), TextureId(1), &view(1, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            GlError::TextureUnitsExhausted { unit: 3, limit: 3 }
        ));
    }

    #[test]
    fn transient_binds_invalidate_the_reserved_unit_only() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(4);
        let v = view(1, 1);
        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &v)
            .unwrap();

        units.bind_transient(&mut gl, gl::TEXTURE_2D, Some(v.texture.name));
        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &v)
            .unwrap();

        // Unit 0 is still cached: only the reserved unit was touched.
        assert_eq!(gl.call_count("bind_texture"), 2);
        assert_eq!(gl.call_count("active_texture"), 2);
    }

    #[test]
    fn forgetting_a_texture_forces_a_rebind() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(4);
        let v = view(1, 1);
        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &v)
            .unwrap();

        units.forget(ResourceHandle::Texture(TextureId(1)));
        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &v)
            .unwrap();
        assert_eq!(gl.call_count("bind_texture"), 2);
    }

    #[test]
    fn views_sharing_a_texture_reapply_their_mip_range() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(8);
        let s = sampler();
        let mut full = view(1, 4);
        full.texture.name = gl.create_texture().unwrap();
        let single = GlTextureView::new(full.texture, 2, Some(1));

        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &full)
            .unwrap();
        units.set_sampler(&mut gl, 0, SamplerId(1), &s).unwrap();
        units
            .set_texture(&mut gl, 1, TextureViewId(2), TextureId(1), &single)
            .unwrap();

        // Unit 0 now samples the single-level range, so its sampler follows.
        assert_eq!(gl.bound_sampler(0), Some(s.no_mip));

        units
            .set_texture(&mut gl, 0, TextureViewId(1), TextureId(1), &full)
            .unwrap();

        assert_eq!(gl.call_count("bind_texture"), 3);
        assert_eq!(
            gl.texture_parameter(full.texture.name, gl::TEXTURE_BASE_LEVEL),
            Some(0)
        );
        assert_eq!(
            gl.texture_parameter(full.texture.name, gl::TEXTURE_MAX_LEVEL),
            Some(3)
        );
        assert_eq!(gl.bound_sampler(0), Some(s.mipmapped));
    }

    #[test]
    fn full_chain_bind_restores_a_narrowed_range() {
        let mut gl = HeadlessGlContext::new();
        let mut units = TextureSamplerManager::new(8);
        let s = sampler();
        let mut full = view(1, 4);
        full.texture.name = gl.create_texture().unwrap();
        let single = GlTextureView::new(full.texture, 2, Some(1));
        units
            .set_texture(&mut gl, 0, TextureViewId(2), TextureId(1), &single)
            .unwrap();
        units.set_sampler(&mut gl, 0, SamplerId(1), &s).unwrap();
        assert_eq!(gl.bound_sampler(0), Some(s.no_mip));

        units.bind_full_chain(&mut gl, TextureId(1), &full.texture);

        assert_eq!(gl.bound_texture(7, gl::TEXTURE_2D), Some(full.texture.name));
        assert_eq!(
            gl.texture_parameter(full.texture.name, gl::TEXTURE_BASE_LEVEL),
            Some(0)
        );
        assert_eq!(
            gl.texture_parameter(full.texture.name, gl::TEXTURE_MAX_LEVEL),
            Some(3)
        );
        assert_eq!(gl.bound_sampler(0), Some(s.mipmapped));

        // Unit 0 was invalidated, so its view is bound again with its own range.
        units
            .set_texture(&mut gl, 0, TextureViewId(2), TextureId(1), &single)
            .unwrap();
        assert_eq!(
            gl.texture_parameter(full.texture.name, gl::TEXTURE_BASE_LEVEL),
            Some(2)
        );
    }
}
