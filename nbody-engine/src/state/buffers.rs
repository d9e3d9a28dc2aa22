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
//! Double-buffered positions and the per-body force accumulator

use super::components::{Force, Position};

/// Two position slots per body: the positions the current step reads
/// (`previous`) and the positions it writes (`next`)
///
/// [`swap`](PositionBuffers::swap) hands the freshly written slot over as
/// the new `previous` at the end of every step. No data is copied.
#[derive(Debug, Clone)]
pub struct PositionBuffers {
    previous: Vec<Position>,
    next: Vec<Position>,
    flips: u64,
}

impl PositionBuffers {
    /// Create buffers whose both slots start at `initial`
    pub fn new(initial: Vec<Position>) -> Self {
        let next = initial.clone();
        PositionBuffers {
            previous: initial,
            next,
            flips: 0,
        }
    }

    /// Positions at the start of the current step
    pub fn previous(&self) -> &[Position] {
        &self.previous
    }

    /// Positions written by the current step
    pub fn next(&self) -> &[Position] {
        &self.next
    }

    /// Read the previous slot while writing the next one
    pub fn split_mut(&mut self) -> (&[Position], &mut [Position]) {
        (&self.previous, &mut self.next)
    }

    /// Make the next slot the previous one
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.next);
        self.flips += 1;
    }

    /// Number of completed swaps; equals the number of completed steps
    pub fn flips(&self) -> u64 {
        self.flips
    }

    /// Which of the two underlying allocations is currently `previous`
    pub fn parity(&self) -> usize {
        (self.flips % 2) as usize
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    /// Whether there are no bodies
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// Force currently acting on every body
///
/// Pair interactions are added equal and opposite, so before drag is
/// applied the forces of a complete step sum to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceAccumulator {
    forces: Vec<Force>,
}

impl ForceAccumulator {
    /// Create an accumulator of `len` zero forces
    pub fn new(len: usize) -> Self {
        ForceAccumulator {
            forces: vec![Force::zero(); len],
        }
    }

    /// Reset every entry to zero
    pub fn clear(&mut self) {
        self.forces.fill(Force::zero());
    }

    /// Apply one pair interaction: `force_on_b` to `b`, its negation to `c`
    pub fn add_pair(&mut self, b: usize, c: usize, force_on_b: &Force) {
        self.forces[b].add(force_on_b);
        self.forces[c].add(&force_on_b.negated());
    }

    /// Force on body `index`
    pub fn get(&self, index: usize) -> Force {
        self.forces[index]
    }

    /// All forces in body order
    pub fn as_slice(&self) -> &[Force] {
        &self.forces
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// Whether there are no bodies
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Sum of every entry
    pub fn net_force(&self) -> Force {
        let mut total = Force::zero();
        for force in &self.forces {
            total.add(force);
        }
        total
    }

    /// Install `successor` as the live buffer and return the retired one
    ///
    /// # Panics
    ///
    /// Panics if `successor` does not hold one record per body.
    pub fn replace(&mut self, successor: Vec<Force>) -> Vec<Force> {
        assert_eq!(
            successor.len(),
            self.forces.len(),
            "Successor force buffer must match the body count"
        );
        std::mem::replace(&mut self.forces, successor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_hands_over_next() {
        let mut buffers = PositionBuffers::new(vec![Position::new(1.0, 1.0)]);
        {
            let (previous, next) = buffers.split_mut();
            assert_eq!(previous[0], Position::new(1.0, 1.0));
            next[0] = Position::new(2.0, 3.0);
        }
        assert_eq!(buffers.previous()[0], Position::new(1.0, 1.0));

        buffers.swap();
        assert_eq!(buffers.previous()[0], Position::new(2.0, 3.0));
        assert_eq!(buffers.next()[0], Position::new(1.0, 1.0));
        assert_eq!(buffers.flips(), 1);
        assert_eq!(buffers.parity(), 1);

        buffers.swap();
        assert_eq!(buffers.previous()[0], Position::new(1.0, 1.0));
        assert_eq!(buffers.parity(), 0);
    }

    #[test]
    fn test_add_pair_is_equal_and_opposite() {
        let mut acc = ForceAccumulator::new(3);
        acc.add_pair(0, 2, &Force::new(1.5, -0.5));
        acc.add_pair(1, 2, &Force::new(0.25, 0.75));

        assert_eq!(acc.get(0), Force::new(1.5, -0.5));
        assert_eq!(acc.get(1), Force::new(0.25, 0.75));
        assert_eq!(acc.get(2), Force::new(-1.75, -0.25));
        assert_eq!(acc.net_force(), Force::zero());

        acc.clear();
        assert!(acc.as_slice().iter().all(|f| *f == Force::zero()));
    }

    #[test]
    fn test_replace_returns_retired_buffer() {
        let mut acc = ForceAccumulator::new(2);
        acc.add_pair(0, 1, &Force::new(1.0, 0.0));

        let retired = acc.replace(vec![Force::new(9.0, 9.0); 2]);
        assert_eq!(retired, vec![Force::new(1.0, 0.0), Force::new(-1.0, 0.0)]);
        assert_eq!(acc.get(1), Force::new(9.0, 9.0));
    }

    #[test]
    #[should_panic(expected = "Successor force buffer must match the body count")]
    fn test_replace_rejects_wrong_length() {
        let mut acc = ForceAccumulator::new(2);
        acc.replace(vec![Force::zero(); 3]);
    }
}
