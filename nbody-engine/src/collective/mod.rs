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
//! Collective operations over a fixed group of workers
//!
//! The engine needs two collectives:
//!
//! - **Broadcast** of the initial bodies from one root worker to all.
//! - **All-reduce** of per-worker force accumulators with a caller-supplied
//!   combine function, leaving the combined array on every worker.
//!
//! Both block until every member of the group takes part, which makes the
//! reduction the only synchronization point of a step. There are no
//! timeouts: a worker that never arrives stalls the group, and a worker
//! that exits surfaces as [`CollectiveError::Disconnected`] on its peers.
//!
//! [`ChannelGroup`] implements the trait with in-process channels, one
//! worker per thread. With the `mpi` feature, `MpiGroup` runs one worker
//! per MPI process instead.

mod channel;
#[cfg(feature = "mpi")]
mod process;

pub use channel::{ChannelEndpoint, ChannelGroup};
#[cfg(feature = "mpi")]
pub use process::MpiGroup;

use crate::error::CollectiveError;
use crate::state::{Body, Force};

/// Membership in a group of cooperating workers
pub trait Collective {
    /// This worker's rank, `0..size`
    fn rank(&self) -> usize;

    /// Number of workers in the group
    fn size(&self) -> usize;

    /// Replace `bodies` on every worker with the root's copy
    ///
    /// On the root `bodies` is left unchanged.
    fn broadcast_bodies(&mut self, root: usize, bodies: &mut Vec<Body>) -> Result<(), CollectiveError>;

    /// Combine every worker's `local` array into `out` on every worker
    ///
    /// `combine(input, inout)` folds `input` into `inout` element-wise and
    /// must be associative and commutative. `out` must have the same
    /// length as `local`.
    fn all_reduce<F>(&mut self, local: &[Force], out: &mut [Force], combine: F) -> Result<(), CollectiveError>
    where
        F: Fn(&[Force], &mut [Force]) + Sync;
}

/// Element-wise sum of two force arrays, the reduction of a step
///
/// # Panics
///
/// Panics if the arrays differ in length.
pub fn sum_forces(input: &[Force], inout: &mut [Force]) {
    assert_eq!(input.len(), inout.len(), "Force arrays must have equal length");
    for (acc, force) in inout.iter_mut().zip(input) {
        acc.add(force);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_forces() {
        let input = [Force::new(1.0, 2.0), Force::new(-1.0, 0.5)];
        let mut inout = [Force::new(0.5, 0.5), Force::new(1.0, 1.0)];
        sum_forces(&input, &mut inout);
        assert_eq!(inout, [Force::new(1.5, 2.5), Force::new(0.0, 1.5)]);
    }

    #[test]
    fn test_sum_forces_is_commutative_and_associative() {
        let a = [Force::new(0.25, -1.0)];
        let b = [Force::new(2.0, 0.5)];
        let c = [Force::new(-0.75, 4.0)];

        let mut ab = a;
        sum_forces(&b, &mut ab);
        let mut ba = b;
        sum_forces(&a, &mut ba);
        assert_eq!(ab, ba);

        let mut ab_c = ab;
        sum_forces(&c, &mut ab_c);
        let mut bc = b;
        sum_forces(&c, &mut bc);
        let mut a_bc = a;
        sum_forces(&bc, &mut a_bc);
        assert_eq!(ab_c, a_bc);
    }

    #[test]
    #[should_panic(expected = "Force arrays must have equal length")]
    fn test_sum_forces_length_mismatch() {
        let mut inout = [Force::zero()];
        sum_forces(&[Force::zero(), Force::zero()], &mut inout);
    }
}
