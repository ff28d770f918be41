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

//! Deferred destruction of native objects.
//!
//! Recording threads dispose resources at any time, but native objects can only be deleted on
//! the context thread. Disposals travel over a channel and are drained at frame boundaries.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};
use vellum_core::renderer::api::ResourceHandle;

use super::context::GlContext;
use super::error::{GlError, GlResult};
use super::registry::GlResources;

/// The producer side of a [`DisposalQueue`]. Cheap to clone, usable from any thread.
#[derive(Debug, Clone)]
pub struct DisposalSender {
    tx: Sender<ResourceHandle>,
}

impl DisposalSender {
    /// Queues a resource for destruction at the next flush.
    pub fn enqueue(&self, handle: ResourceHandle) {
        // The receiver lives as long as the device. A send failure means the device is gone
        // and its context with it.
        if self.tx.send(handle).is_err() {
            log::warn!("DisposalQueue: device dropped, {handle:?} is abandoned");
        }
    }
}

/// A multi-producer, single-consumer queue of pending disposals.
#[derive(Debug)]
pub struct DisposalQueue {
    tx: Sender<ResourceHandle>,
    rx: Receiver<ResourceHandle>,
    flushing: AtomicBool,
}

/// Clears the flushing flag however the flush ends.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for DisposalQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DisposalQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            flushing: AtomicBool::new(false),
        }
    }

    pub fn sender(&self) -> DisposalSender {
        DisposalSender {
            tx: self.tx.clone(),
        }
    }

    /// Number of disposals waiting for a flush.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Destroys every queued resource. `on_destroyed` runs for each removed entry so that
    /// binding caches can drop it. Returns the number of destroyed entries.
    ///
    /// Must run on the context thread.
    pub fn flush(
        &self,
        gl: &mut dyn GlContext,
        resources: &GlResources,
        mut on_destroyed: impl FnMut(ResourceHandle),
    ) -> GlResult<usize> {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(GlError::ConcurrentFlush);
        }
        let _guard = FlushGuard(&self.flushing);

        let mut destroyed = 0;
        for handle in self.rx.try_iter() {
            if resources.destroy(gl, handle)? {
                on_destroyed(handle);
                destroyed += 1;
            }
        }
        if destroyed > 0 {
            log::debug!("DisposalQueue: destroyed {destroyed} resources");
        }
        Ok(destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gl::error::ErrorChecker;
    use crate::graphics::gl::headless::HeadlessGlContext;
    use crate::graphics::gl::settings::ErrorCheckMode;
    use std::thread;
    use vellum_core::renderer::api::{BufferDescriptor, BufferUsage};

    fn resources() -> GlResources {
        GlResources::new(ErrorChecker::new(ErrorCheckMode::Always)).unwrap()
    }

    #[test]
    fn disposals_from_other_threads_wait_for_the_flush() {
        let mut gl = HeadlessGlContext::new();
        let resources = resources();
        let queue = DisposalQueue::new();
        let buffer = resources
            .create_buffer(BufferDescriptor::new(64, BufferUsage::VERTEX))
            .unwrap();
        resources.ensure_buffer(&mut gl, buffer).unwrap();

        let sender = queue.sender();
        thread::spawn(move || sender.enqueue(buffer.into()))
            .join()
            .unwrap();

        assert_eq!(queue.pending(), 1);
        assert_eq!(gl.call_count("delete_buffer"), 0);

        let mut forgotten = Vec::new();
        let destroyed = queue
            .flush(&mut gl, &resources, |handle| forgotten.push(handle))
            .unwrap();

        assert_eq!(destroyed, 1);
        assert_eq!(forgotten, vec![ResourceHandle::Buffer(buffer)]);
        assert_eq!(gl.call_count("delete_buffer"), 1);
    }

    #[test]
    fn duplicate_handles_are_destroyed_once() {
        let mut gl = HeadlessGlContext::new();
        let resources = resources();
        let queue = DisposalQueue::new();
        let buffer = resources
            .create_buffer(BufferDescriptor::new(64, BufferUsage::VERTEX))
            .unwrap();

        queue.sender().enqueue(buffer.into());
        queue.sender().enqueue(buffer.into());

        assert_eq!(queue.flush(&mut gl, &resources, |_| {}).unwrap(), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn reentrant_flush_is_rejected() {
        let mut gl = HeadlessGlContext::new();
        let resources = resources();
        let queue = DisposalQueue::new();
        queue.flushing.store(true, Ordering::Release);

        let err = queue.flush(&mut gl, &resources, |_| {}).unwrap_err();
        assert!(matches!(err, GlError::ConcurrentFlush));
    }
}
