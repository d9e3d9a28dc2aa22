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
//! Decomposition of the pair set across workers
//!
//! For worker `W` and every worker `O`:
//!
//! - `O == W`: the strict upper triangle of `W`'s own range.
//! - `O > W`: the first half of `W`'s range against all of `O`'s range.
//! - `O < W`: the second half of `O`'s range against all of `W`'s range.
//!
//! The block of pairs between two ranks `lo < hi` is therefore cut along
//! `lo`'s range: `lo` takes the rows of its first half, `hi` takes the
//! rows of `lo`'s second half. Every unordered pair `{b, c}` is evaluated
//! by exactly one worker, and the cross-rank work is shared between both
//! ranks instead of falling entirely on one of them.
//!
//! Within every block the row index is lower than the column index.

use crate::partition::{Partition, WorkRange};

/// A set of pairs evaluated as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairBlock {
    /// All `(b, c)` with `b < c` inside one range
    Triangle(WorkRange),
    /// All `(b, c)` with `b` in `rows` and `c` in `cols`
    Rectangle {
        /// Row range, always below `cols`
        rows: WorkRange,
        /// Column range
        cols: WorkRange,
    },
}

impl PairBlock {
    /// Number of pairs in the block
    pub fn pair_count(&self) -> usize {
        match *self {
            PairBlock::Triangle(range) => range.count * range.count.saturating_sub(1) / 2,
            PairBlock::Rectangle { rows, cols } => rows.count * cols.count,
        }
    }

    /// Whether the block holds no pairs
    pub fn is_empty(&self) -> bool {
        self.pair_count() == 0
    }

    /// Iterate over the pairs as `(b, c)` with `b < c`
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> {
        let (rows, cols, triangular) = match *self {
            PairBlock::Triangle(range) => (range, range, true),
            PairBlock::Rectangle { rows, cols } => (rows, cols, false),
        };
        rows.indices().flat_map(move |b| {
            let first = if triangular { b + 1 } else { cols.start };
            (first..cols.end()).map(move |c| (b, c))
        })
    }
}

/// Pair blocks worker `rank` evaluates each step
///
/// Empty blocks are omitted. The result depends only on the partition,
/// so it is computed once per run.
///
/// # Panics
///
/// Panics if `rank` is not a worker of `partition`.
pub fn assign_pairs(partition: &Partition, rank: usize) -> Vec<PairBlock> {
    let own = partition.range(rank);
    let mut blocks = Vec::with_capacity(partition.worker_count());

    for (other_rank, other) in partition.ranges().iter().copied().enumerate() {
        let block = if other_rank == rank {
            PairBlock::Triangle(own)
        } else if other_rank > rank {
            PairBlock::Rectangle {
                rows: own.first_half(),
                cols: other,
            }
        } else {
            PairBlock::Rectangle {
                rows: other.second_half(),
                cols: own,
            }
        };

        if !block.is_empty() {
            blocks.push(block);
        }
    }

    blocks
}

/// Total pairs worker `rank` evaluates each step
pub fn assigned_pair_count(partition: &Partition, rank: usize) -> usize {
    assign_pairs(partition, rank).iter().map(PairBlock::pair_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn covered_pairs(body_count: usize, worker_count: usize) -> Vec<(usize, usize)> {
        let partition = Partition::plan(body_count, worker_count).unwrap();
        (0..worker_count)
            .flat_map(|rank| assign_pairs(&partition, rank))
            .flat_map(|block| block.pairs().collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_triangle_pairs() {
        let block = PairBlock::Triangle(WorkRange::new(2, 3));
        let pairs: Vec<_> = block.pairs().collect();
        assert_eq!(pairs, vec![(2, 3), (2, 4), (3, 4)]);
        assert_eq!(block.pair_count(), 3);
    }

    #[test]
    fn test_rectangle_pairs() {
        let block = PairBlock::Rectangle {
            rows: WorkRange::new(0, 2),
            cols: WorkRange::new(5, 2),
        };
        let pairs: Vec<_> = block.pairs().collect();
        assert_eq!(pairs, vec![(0, 5), (0, 6), (1, 5), (1, 6)]);
        assert_eq!(block.pair_count(), 4);
    }

    #[test]
    fn test_single_worker_gets_full_triangle() {
        let partition = Partition::plan(6, 1).unwrap();
        let blocks = assign_pairs(&partition, 0);
        assert_eq!(blocks, vec![PairBlock::Triangle(WorkRange::new(0, 6))]);
    }

    #[test]
    fn test_two_workers_split_cross_block() {
        // ranges 0..4 and 4..8
        let partition = Partition::plan(8, 2).unwrap();
        assert_eq!(
            assign_pairs(&partition, 0),
            vec![
                PairBlock::Triangle(WorkRange::new(0, 4)),
                PairBlock::Rectangle { rows: WorkRange::new(0, 2), cols: WorkRange::new(4, 4) },
            ]
        );
        assert_eq!(
            assign_pairs(&partition, 1),
            vec![
                PairBlock::Rectangle { rows: WorkRange::new(2, 2), cols: WorkRange::new(4, 4) },
                PairBlock::Triangle(WorkRange::new(4, 4)),
            ]
        );
    }

    #[test]
    fn test_every_pair_exactly_once() {
        for body_count in 2..40 {
            for worker_count in 1..12 {
                let pairs = covered_pairs(body_count, worker_count);
                let unique: HashSet<_> = pairs.iter().copied().collect();

                assert_eq!(
                    pairs.len(),
                    unique.len(),
                    "duplicate pairs for n={} workers={}",
                    body_count,
                    worker_count
                );
                assert_eq!(
                    unique.len(),
                    body_count * (body_count - 1) / 2,
                    "missing pairs for n={} workers={}",
                    body_count,
                    worker_count
                );
                assert!(unique.iter().all(|&(b, c)| b < c && c < body_count));
            }
        }
    }

    #[test]
    fn test_pair_counts_match_blocks() {
        let partition = Partition::plan(101, 7).unwrap();
        let total: usize = (0..7).map(|rank| assigned_pair_count(&partition, rank)).sum();
        assert_eq!(total, 101 * 100 / 2);
    }
}
