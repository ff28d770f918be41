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

//! The deferred-resource lifecycle shared by every native-backed object.
//!
//! A resource is described on any thread and realized lazily on the context thread. Its
//! native handle lives in a side table keyed by the resource ID, so disposing a resource only
//! invalidates an index.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use vellum_core::renderer::api::{
    BufferId, FramebufferId, PipelineId, ResourceLayoutId, ResourceSetId, SamplerId, ShaderId,
    TextureId, TextureViewId,
};

use super::error::{GlError, GlResult};

/// A resource ID usable as a side-table key.
pub trait TableKey: Copy + Eq + Hash + Debug {
    /// The raw index behind the ID.
    fn raw(self) -> usize;
}

macro_rules! impl_table_key {
    ($($id:ty),* $(,)?) => {
        $(
            impl TableKey for $id {
                fn raw(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

impl_table_key!(
    BufferId,
    TextureId,
    TextureViewId,
    SamplerId,
    ShaderId,
    PipelineId,
    ResourceLayoutId,
    ResourceSetId,
    FramebufferId,
);

/// The lifecycle state of a deferred resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState<N> {
    /// Described, no native object yet.
    Unrealized,
    /// The native object exists.
    Created(N),
    /// Destruction was requested. The native object, if any, survives until the next flush.
    Disposed(Option<N>),
}

/// A resource description paired with its lifecycle state.
#[derive(Debug)]
pub struct DeferredResource<D, N> {
    description: Arc<D>,
    state: ResourceState<N>,
}

impl<D, N> DeferredResource<D, N> {
    /// Captures a description. No native call happens here.
    pub fn new(description: D) -> Self {
        Self {
            description: Arc::new(description),
            state: ResourceState::Unrealized,
        }
    }

    /// The immutable description.
    pub fn description(&self) -> &Arc<D> {
        &self.description
    }

    /// The current lifecycle state.
    pub fn state(&self) -> &ResourceState<N> {
        &self.state
    }

    /// The native object, if one was realized and not yet destroyed.
    pub fn native(&self) -> Option<&N> {
        match &self.state {
            ResourceState::Created(native) | ResourceState::Disposed(Some(native)) => Some(native),
            ResourceState::Unrealized | ResourceState::Disposed(None) => None,
        }
    }

    /// Returns `true` once a native object was realized.
    pub fn is_created(&self) -> bool {
        self.native().is_some()
    }

    /// Returns `true` once destruction was requested.
    pub fn is_disposed(&self) -> bool {
        matches!(self.state, ResourceState::Disposed(_))
    }

    /// Stores the native object. A resource disposed before realization stays disposed.
    fn realize(&mut self, native: N) {
        self.state = match std::mem::replace(&mut self.state, ResourceState::Unrealized) {
            ResourceState::Disposed(None) => ResourceState::Disposed(Some(native)),
            ResourceState::Unrealized => ResourceState::Created(native),
            already @ (ResourceState::Created(_) | ResourceState::Disposed(Some(_))) => already,
        };
    }

    /// Marks the resource disposed. Returns `false` if it already was.
    fn mark_disposed(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let native = match std::mem::replace(&mut self.state, ResourceState::Unrealized) {
            ResourceState::Created(native) => Some(native),
            _ => None,
        };
        self.state = ResourceState::Disposed(native);
        true
    }

    /// Consumes the entry, yielding the native object to destroy.
    pub fn into_native(self) -> Option<N> {
        match self.state {
            ResourceState::Created(native) | ResourceState::Disposed(Some(native)) => Some(native),
            ResourceState::Unrealized | ResourceState::Disposed(None) => None,
        }
    }
}

/// An ID-indexed side table of deferred resources of one kind.
#[derive(Debug)]
pub struct ResourceTable<I, D, N> {
    kind: &'static str,
    entries: Mutex<HashMap<I, DeferredResource<D, N>>>,
}

impl<I: TableKey, D, N: Clone> ResourceTable<I, D, N> {
    /// Creates an empty table. `kind` names the resource kind in logs and errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> GlResult<MutexGuard<'_, HashMap<I, DeferredResource<D, N>>>> {
        self.entries
            .lock()
            .map_err(|e| GlError::Poisoned(format!("{} table: {e}", self.kind)))
    }

    fn unknown(&self, id: I) -> GlError {
        GlError::UnknownResource {
            kind: self.kind,
            id: id.raw(),
        }
    }

    /// The resource kind this table holds.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Registers a new Unrealized resource.
    pub fn insert(&self, id: I, description: D) -> GlResult<()> {
        self.lock()?.insert(id, DeferredResource::new(description));
        Ok(())
    }

    /// Returns the description of a resource.
    pub fn description(&self, id: I) -> GlResult<Arc<D>> {
        self.lock()?
            .get(&id)
            .map(|entry| Arc::clone(entry.description()))
            .ok_or_else(|| self.unknown(id))
    }

    /// Returns `true` if the resource exists and has been realized.
    pub fn is_created(&self, id: I) -> bool {
        self.lock()
            .map(|entries| entries.get(&id).is_some_and(DeferredResource::is_created))
            .unwrap_or(false)
    }

    /// Returns the native object, realizing it with `create` on first use.
    ///
    /// The table lock is not held while `create` runs, so `create` may realize other
    /// resources (a pipeline realizing its shaders, for instance).
    pub fn ensure_created<F>(&self, id: I, create: F) -> GlResult<N>
    where
        F: FnOnce(&Arc<D>) -> GlResult<N>,
    {
        let description = {
            let entries = self.lock()?;
            let entry = entries.get(&id).ok_or_else(|| self.unknown(id))?;
            if let Some(native) = entry.native() {
                return Ok(native.clone());
            }
            Arc::clone(entry.description())
        };

        let native = create(&description)?;
        log::debug!("GlResources: realized {} {}", self.kind, id.raw());

        let mut entries = self.lock()?;
        let entry = entries.get_mut(&id).ok_or_else(|| self.unknown(id))?;
        entry.realize(native.clone());
        Ok(native)
    }

    /// Marks a resource disposed. Returns `false` if it was already disposed or is unknown.
    pub fn mark_disposed(&self, id: I) -> GlResult<bool> {
        Ok(self
            .lock()?
            .get_mut(&id)
            .is_some_and(DeferredResource::mark_disposed))
    }

    /// Removes a resource from the table.
    pub fn remove(&self, id: I) -> GlResult<Option<DeferredResource<D, N>>> {
        Ok(self.lock()?.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResourceTable<BufferId, u64, u32> {
        ResourceTable::new("buffer")
    }

    #[test]
    fn ensure_created_realizes_exactly_once() {
        let table = table();
        table.insert(BufferId(1), 64).unwrap();
        assert!(!table.is_created(BufferId(1)));

        let mut calls = 0;
        for _ in 0..3 {
            let native = table
                .ensure_created(BufferId(1), |size| {
                    calls += 1;
                    Ok(**size as u32 * 2)
                })
                .unwrap();
            assert_eq!(native, 128);
        }
        assert_eq!(calls, 1);
        assert!(table.is_created(BufferId(1)));
    }

    #[test]
    fn failed_realization_leaves_the_resource_unrealized() {
        let table = table();
        table.insert(BufferId(1), 64).unwrap();

        let result = table.ensure_created(BufferId(1), |_| Err(GlError::Creation("no".into())));
        assert!(result.is_err());
        assert!(!table.is_created(BufferId(1)));
    }

    #[test]
    fn second_dispose_is_a_no_op() {
        let table = table();
        table.insert(BufferId(7), 16).unwrap();
        assert!(table.mark_disposed(BufferId(7)).unwrap());
        assert!(!table.mark_disposed(BufferId(7)).unwrap());
        assert!(!table.mark_disposed(BufferId(8)).unwrap());
    }

    #[test]
    fn disposed_resource_can_still_be_realized_before_flush() {
        let table = table();
        table.insert(BufferId(3), 4).unwrap();
        table.mark_disposed(BufferId(3)).unwrap();

        let native = table.ensure_created(BufferId(3), |_| Ok(99)).unwrap();
        assert_eq!(native, 99);

        let entry = table.remove(BufferId(3)).unwrap().unwrap();
        assert!(entry.is_disposed());
        assert_eq!(entry.into_native(), Some(99));
    }

    #[test]
    fn unknown_ids_are_reported_with_their_kind() {
        let table = table();
        let err = table.description(BufferId(42)).unwrap_err();
        assert_eq!(err.to_string(), "unknown buffer 42");
    }
}
