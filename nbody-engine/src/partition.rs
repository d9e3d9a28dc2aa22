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
//! Assignment of contiguous body ranges to workers
//!
//! Every worker owns `body_count / worker_count` bodies; the first
//! `body_count % worker_count` workers own one extra. Ranges follow each
//! other in worker order with no gaps, so together they cover every body
//! index exactly once. The partition is computed once and never changes.

use crate::config::MIN_BODIES;
use crate::error::{Result, SimulationError};
use std::ops::Range;

/// Contiguous range of body indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkRange {
    /// First index in the range
    pub start: usize,
    /// Number of indices
    pub count: usize,
}

impl WorkRange {
    /// Create a range of `count` indices starting at `start`
    pub fn new(start: usize, count: usize) -> Self {
        WorkRange { start, count }
    }

    /// One past the last index
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    /// Whether the range holds no indices
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Index where the range splits into halves
    ///
    /// The first half gets `count / 2` indices, the second the rest.
    pub fn midpoint(&self) -> usize {
        self.start + self.count / 2
    }

    /// Lower half, `start..midpoint`
    pub fn first_half(&self) -> WorkRange {
        WorkRange::new(self.start, self.midpoint() - self.start)
    }

    /// Upper half, `midpoint..end`
    pub fn second_half(&self) -> WorkRange {
        WorkRange::new(self.midpoint(), self.end() - self.midpoint())
    }

    /// The indices as a std range
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Whether `index` falls inside the range
    pub fn contains(&self, index: usize) -> bool {
        self.indices().contains(&index)
    }
}

/// Immutable mapping from worker rank to its body range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    body_count: usize,
    ranges: Vec<WorkRange>,
}

impl Partition {
    /// Split `body_count` bodies across `worker_count` workers
    ///
    /// # Errors
    ///
    /// Returns an error if `body_count < 2` or `worker_count == 0`. Counts
    /// are never adjusted here.
    ///
    /// # Example
    ///
    /// ```
    /// use nbody_engine::partition::{Partition, WorkRange};
    ///
    /// let partition = Partition::plan(10, 3).unwrap();
    /// assert_eq!(partition.range(0), WorkRange::new(0, 4));
    /// assert_eq!(partition.range(1), WorkRange::new(4, 3));
    /// assert_eq!(partition.range(2), WorkRange::new(7, 3));
    /// ```
    pub fn plan(body_count: usize, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(SimulationError::InvalidWorkerCount);
        }
        if body_count < MIN_BODIES {
            return Err(SimulationError::TooFewBodies {
                count: body_count,
                min: MIN_BODIES,
            });
        }

        let base = body_count / worker_count;
        let remainder = body_count % worker_count;

        let mut ranges = Vec::with_capacity(worker_count);
        let mut start = 0;
        for rank in 0..worker_count {
            let count = if rank < remainder { base + 1 } else { base };
            ranges.push(WorkRange::new(start, count));
            start += count;
        }

        Ok(Partition { body_count, ranges })
    }

    /// Total number of bodies
    pub fn body_count(&self) -> usize {
        self.body_count
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.ranges.len()
    }

    /// Range owned by `rank`
    ///
    /// # Panics
    ///
    /// Panics if `rank` is not a worker of this partition.
    pub fn range(&self, rank: usize) -> WorkRange {
        self.ranges[rank]
    }

    /// All ranges in rank order
    pub fn ranges(&self) -> &[WorkRange] {
        &self.ranges
    }
}
