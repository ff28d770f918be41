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

//! Host-side staging memory for update payloads.
//!
//! Recording threads copy update payloads into a [`StagingBlock`] as soon as the update is
//! recorded. The executor frees the block on the context thread once the bytes have reached
//! their destination. Backing buffers are kept in power-of-two buckets and reused.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const MAX_POOLED_PER_BUCKET: usize = 64;
const BUCKET_COUNT: usize = usize::BITS as usize;

#[derive(Debug)]
struct PoolInner {
    buckets: Mutex<Vec<Vec<Box<[u8]>>>>,
    zero_on_free: bool,
    staged: AtomicUsize,
    freed: AtomicUsize,
    leaked: AtomicUsize,
}

impl PoolInner {
    fn release(&self, data: Option<Box<[u8]>>) {
        if let Some(mut buffer) = data {
            if self.zero_on_free {
                buffer.fill(0);
            }
            let bucket = bucket_index(buffer.len());
            // A poisoned bucket table only means another thread panicked mid-push.
            let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
            if buckets[bucket].len() < MAX_POOLED_PER_BUCKET {
                buckets[bucket].push(buffer);
            }
        }
        self.freed.fetch_add(1, Ordering::Relaxed);
    }
}

fn bucket_index(capacity: usize) -> usize {
    capacity.next_power_of_two().trailing_zeros() as usize
}

/// A thread-safe arena handing out transient host buffers for update payloads.
///
/// Cloning the pool yields another handle to the same arena.
#[derive(Clone, Debug)]
pub struct StagingMemoryPool {
    inner: Arc<PoolInner>,
}

impl StagingMemoryPool {
    /// Creates an empty pool. With `zero_on_free`, freed buffers are cleared before reuse.
    pub fn new(zero_on_free: bool) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                buckets: Mutex::new(vec![Vec::new(); BUCKET_COUNT]),
                zero_on_free,
                staged: AtomicUsize::new(0),
                freed: AtomicUsize::new(0),
                leaked: AtomicUsize::new(0),
            }),
        }
    }

    /// Copies `data` into pool-owned memory.
    ///
    /// An empty slice yields an empty block without allocating; it still counts as staged.
    pub fn stage(&self, data: &[u8]) -> StagingBlock {
        self.inner.staged.fetch_add(1, Ordering::Relaxed);
        if data.is_empty() {
            return StagingBlock {
                data: None,
                size: 0,
                pool: Arc::clone(&self.inner),
                released: false,
            };
        }

        let bucket = bucket_index(data.len());
        let reused = {
            let mut buckets = self
                .inner
                .buckets
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            buckets[bucket].pop()
        };
        let mut buffer = reused.unwrap_or_else(|| vec![0u8; 1 << bucket].into_boxed_slice());
        buffer[..data.len()].copy_from_slice(data);

        StagingBlock {
            data: Some(buffer),
            size: data.len(),
            pool: Arc::clone(&self.inner),
            released: false,
        }
    }

    /// Returns a block's memory to the pool.
    pub fn free(&self, block: StagingBlock) {
        debug_assert!(
            Arc::ptr_eq(&self.inner, &block.pool),
            "StagingMemoryPool: freeing a block owned by another pool"
        );
        block.free();
    }

    /// Number of blocks staged and not yet freed.
    pub fn outstanding_blocks(&self) -> usize {
        self.total_staged().saturating_sub(self.total_freed())
    }

    /// Number of `stage` calls since creation.
    pub fn total_staged(&self) -> usize {
        self.inner.staged.load(Ordering::Relaxed)
    }

    /// Number of blocks returned to the pool since creation.
    pub fn total_freed(&self) -> usize {
        self.inner.freed.load(Ordering::Relaxed)
    }

    /// Number of blocks dropped without being freed.
    pub fn leaked_blocks(&self) -> usize {
        self.inner.leaked.load(Ordering::Relaxed)
    }

    /// Number of backing buffers currently parked in the buckets.
    pub fn pooled_buffers(&self) -> usize {
        self.inner
            .buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Vec::len)
            .sum()
    }
}

impl Default for StagingMemoryPool {
    fn default() -> Self {
        Self::new(cfg!(debug_assertions))
    }
}

/// A staged copy of an update payload.
///
/// Must be consumed exactly once with [`StagingBlock::free`]. Dropping a block without freeing
/// it is reported as a leak.
pub struct StagingBlock {
    data: Option<Box<[u8]>>,
    size: usize,
    pool: Arc<PoolInner>,
    released: bool,
}

impl StagingBlock {
    /// The staged bytes.
    pub fn as_slice(&self) -> &[u8] {
        match &self.data {
            Some(buffer) => &buffer[..self.size],
            None => &[],
        }
    }

    /// Number of staged bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` for a zero-sized block.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the block's memory to the pool that staged it.
    pub fn free(mut self) {
        self.released = true;
        self.pool.release(self.data.take());
    }
}

impl fmt::Debug for StagingBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingBlock")
            .field("size", &self.size)
            .field("capacity", &self.data.as_ref().map_or(0, |b| b.len()))
            .finish()
    }
}

impl Drop for StagingBlock {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "StagingMemoryPool: block of {} bytes dropped without being freed",
                self.size
            );
            self.pool.leaked.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_copies_the_payload() {
        let pool = StagingMemoryPool::new(false);
        let block = pool.stage(&[1, 2, 3]);
        assert_eq!(block.as_slice(), &[1, 2, 3]);
        assert_eq!(block.size(), 3);
        pool.free(block);
    }

    #[test]
    fn every_stage_is_balanced_by_a_free() {
        let pool = StagingMemoryPool::new(false);
        let blocks: Vec<_> = (1..=5).map(|n| pool.stage(&vec![7u8; n * 10])).collect();
        assert_eq!(pool.outstanding_blocks(), 5);

        for block in blocks {
            pool.free(block);
        }
        assert_eq!(pool.total_staged(), 5);
        assert_eq!(pool.total_freed(), 5);
        assert_eq!(pool.outstanding_blocks(), 0);
        assert_eq!(pool.leaked_blocks(), 0);
    }

    #[test]
    fn freed_buffers_are_reused_by_the_same_bucket() {
        let pool = StagingMemoryPool::new(false);
        pool.stage(&[0u8; 100]).free();
        assert_eq!(pool.pooled_buffers(), 1);

        // 100 and 120 both round up to 128.
        let block = pool.stage(&[0u8; 120]);
        assert_eq!(pool.pooled_buffers(), 0);
        block.free();
        assert_eq!(pool.pooled_buffers(), 1);

        let other_bucket = pool.stage(&[0u8; 300]);
        assert_eq!(pool.pooled_buffers(), 1);
        other_bucket.free();
        assert_eq!(pool.pooled_buffers(), 2);
    }

    #[test]
    fn zero_sized_stage_does_not_allocate() {
        let pool = StagingMemoryPool::new(false);
        let block = pool.stage(&[]);
        assert!(block.is_empty());
        assert!(block.data.is_none());
        assert_eq!(pool.outstanding_blocks(), 1);

        block.free();
        assert_eq!(pool.outstanding_blocks(), 0);
        assert_eq!(pool.pooled_buffers(), 0);
    }

    #[test]
    fn freed_memory_is_zeroed_when_requested() {
        let pool = StagingMemoryPool::new(true);
        pool.stage(&[0xFFu8; 16]).free();

        let block = pool.stage(&[1u8]);
        let backing = block.data.as_ref().map(|b| b.to_vec()).unwrap_or_default();
        assert_eq!(backing[0], 1);
        assert!(backing[1..].iter().all(|&b| b == 0));
        block.free();
    }

    #[test]
    fn dropping_an_unfreed_block_counts_a_leak() {
        let pool = StagingMemoryPool::new(false);
        drop(pool.stage(&[1, 2, 3, 4]));
        assert_eq!(pool.leaked_blocks(), 1);
        assert_eq!(pool.outstanding_blocks(), 1);
    }

    #[test]
    fn pool_is_shared_across_recording_threads() {
        let pool = StagingMemoryPool::new(false);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| pool.stage(&[i as u8; 32]))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for block in handle.join().expect("recording thread panicked") {
                pool.free(block);
            }
        }
        assert_eq!(pool.total_staged(), 100);
        assert_eq!(pool.outstanding_blocks(), 0);
    }
}
