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

//! Per-device caches that dedupe resources by description.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use vellum_core::renderer::api::{
    PipelineDescriptor, PipelineId, ResourceLayoutDescriptor, ResourceLayoutId,
    ShaderDescriptor, ShaderId,
};

use super::error::{GlError, GlResult};

/// Maps descriptions to the ID created for them.
#[derive(Debug)]
pub struct DescriptionCache<D, I> {
    name: &'static str,
    entries: Mutex<HashMap<D, I>>,
}

impl<D: Eq + Hash + Clone, I: Copy> DescriptionCache<D, I> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the ID cached for `description`, creating it with `create` on a miss.
    pub fn get_or_create<F>(&self, description: &D, create: F) -> GlResult<I>
    where
        F: FnOnce(D) -> GlResult<I>,
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| GlError::Poisoned(format!("{} cache: {e}", self.name)))?;
        if let Some(&id) = entries.get(description) {
            return Ok(id);
        }
        let id = create(description.clone())?;
        entries.insert(description.clone(), id);
        Ok(id)
    }

    /// Empties the cache, returning every cached ID.
    pub fn drain(&self) -> GlResult<Vec<I>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| GlError::Poisoned(format!("{} cache: {e}", self.name)))?;
        Ok(entries.drain().map(|(_, id)| id).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The description caches owned by a resource factory.
#[derive(Debug)]
pub struct GlResourceCache {
    pub shaders: DescriptionCache<ShaderDescriptor, ShaderId>,
    pub layouts: DescriptionCache<ResourceLayoutDescriptor, ResourceLayoutId>,
    pub pipelines: DescriptionCache<PipelineDescriptor, PipelineId>,
}

impl Default for GlResourceCache {
    fn default() -> Self {
        Self {
            shaders: DescriptionCache::new("shader"),
            layouts: DescriptionCache::new("resource layout"),
            pipelines: DescriptionCache::new("pipeline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::renderer::api::ShaderStage;

    #[test]
    fn equal_descriptions_share_an_id() {
        let cache: DescriptionCache<ShaderDescriptor, ShaderId> = DescriptionCache::new("shader");
        let mut created = 0;
        let mut create = |_: ShaderDescriptor| {
            created += 1;
            Ok(ShaderId(created))
        };
        let description = ShaderDescriptor::new(ShaderStage::Vertex, "void main() {}");

        let first = cache.get_or_create(&description, &mut create).unwrap();
        let second = cache.get_or_create(&description, &mut create).unwrap();
        let other = cache
            .get_or_create(
                &ShaderDescriptor::new(ShaderStage::Fragment, "void main() {}"),
                &mut create,
            )
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_creation_is_not_cached() {
        let cache: DescriptionCache<ShaderDescriptor, ShaderId> = DescriptionCache::new("shader");
        let description = ShaderDescriptor::new(ShaderStage::Vertex, "");

        let result = cache.get_or_create(&description, |_| Err(GlError::Creation("no".into())));

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn drain_empties_the_cache() {
        let cache: DescriptionCache<ShaderDescriptor, ShaderId> = DescriptionCache::new("shader");
        cache
            .get_or_create(&ShaderDescriptor::new(ShaderStage::Vertex, "a"), |_| {
                Ok(ShaderId(7))
            })
            .unwrap();

        assert_eq!(cache.drain().unwrap(), vec![ShaderId(7)]);
        assert!(cache.is_empty());
    }
}
