// Copyright 2025 John Brosnihan
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
//! Buffer pooling for the per-step reduction
//!
//! Every reduction writes into a successor buffer that must be distinct
//! from the buffer being reduced; the successor then becomes the live
//! force accumulator and the old one is retired. Cycling the retired
//! buffers through a pool keeps the step loop free of allocations after
//! the first couple of steps.
//!
//! A pool belongs to exactly one worker, so it needs no locking.

/// Configuration for buffer pool behavior
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Length of every buffer handed out
    pub buffer_len: usize,
    /// Maximum number of retired buffers to keep
    pub max_pool_size: usize,
}

impl PoolConfig {
    /// Create a pool configuration
    pub fn new(buffer_len: usize, max_pool_size: usize) -> Self {
        PoolConfig {
            buffer_len,
            max_pool_size,
        }
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of times a buffer was reused from the pool
    pub hits: usize,
    /// Number of times a new buffer had to be allocated
    pub misses: usize,
    /// Current number of buffers in the pool
    pub pool_size: usize,
    /// Peak number of buffers ever held
    pub peak_size: usize,
}

impl PoolStats {
    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Pool of equally sized `Vec<T>` buffers
///
/// Buffers are handed out reset to `T::default()` and taken back with
/// [`release`](BufferPool::release).
///
/// # Example
///
/// ```
/// use nbody_engine::pool::{BufferPool, PoolConfig};
///
/// let mut pool: BufferPool<f64> = BufferPool::new(PoolConfig::new(4, 2));
/// let buffer = pool.acquire();
/// assert_eq!(buffer, vec![0.0; 4]);
/// pool.release(buffer);
/// assert_eq!(pool.len(), 1);
/// ```
#[derive(Debug)]
pub struct BufferPool<T> {
    free: Vec<Vec<T>>,
    config: PoolConfig,
    stats: PoolStats,
}

impl<T: Clone + Default> BufferPool<T> {
    /// Create an empty pool
    pub fn new(config: PoolConfig) -> Self {
        BufferPool {
            free: Vec::with_capacity(config.max_pool_size),
            config,
            stats: PoolStats::default(),
        }
    }

    /// Take a buffer of `buffer_len` default values
    ///
    /// Reuses a retired buffer if one is available.
    pub fn acquire(&mut self) -> Vec<T> {
        let buffer = match self.free.pop() {
            Some(mut buffer) => {
                self.stats.hits += 1;
                buffer.clear();
                buffer.resize(self.config.buffer_len, T::default());
                buffer
            }
            None => {
                self.stats.misses += 1;
                log::trace!(
                    "BufferPool: allocating new buffer of {} (hit rate: {:.1}%)",
                    self.config.buffer_len,
                    self.stats.hit_rate()
                );
                vec![T::default(); self.config.buffer_len]
            }
        };
        self.stats.pool_size = self.free.len();
        buffer
    }

    /// Return a buffer for reuse
    ///
    /// Dropped instead when the pool is full.
    pub fn release(&mut self, buffer: Vec<T>) {
        if self.free.len() < self.config.max_pool_size {
            self.free.push(buffer);
            self.stats.pool_size = self.free.len();
            self.stats.peak_size = self.stats.peak_size.max(self.stats.pool_size);
        }
    }

    /// Get current pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Get the current number of buffers in the pool
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}
