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
//! Pairwise gravitational forces
//!
//! # Physics Background
//!
//! Every pair of bodies attracts with
//!
//! **F = G * (m₁ * m₂) / r²**
//!
//! directed along the line between their centres. The force on the second
//! body is the exact negation of the force on the first, so every pair is
//! evaluated once and applied to both.
//!
//! # Soft-core Clamp
//!
//! When two bodies overlap, `r²` is raised to `(r₁ + r₂)²`, the squared
//! distance at which their discs touch. Forces therefore stay bounded
//! without any collision handling. Unlike additive softening, the clamp
//! leaves forces between separated bodies exact.
//!
//! # Work Assignment
//!
//! [`assign_pairs`] decides which worker evaluates which pairs; see the
//! [`assignment`] module for the decomposition.

pub mod assignment;

pub use assignment::{assign_pairs, PairBlock};

use crate::state::{BodyProperties, Force, ForceAccumulator, Position};

/// Evaluates the clamped Newtonian pair force
///
/// # Example
///
/// ```
/// use nbody_engine::forces::GravityKernel;
/// use nbody_engine::state::{BodyProperties, Position};
///
/// let kernel = GravityKernel::new(1.0);
/// let unit = BodyProperties::new(1.0, 0.1);
/// let (on_b, on_c) = kernel.compute_pair(
///     Position::new(0.0, 0.0), &unit,
///     Position::new(2.0, 0.0), &unit,
/// );
/// assert!((on_b.fx - 0.25).abs() < 1e-12);
/// assert_eq!(on_c.fx, -on_b.fx);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityKernel {
    g_constant: f64,
}

impl GravityKernel {
    /// Create a kernel with the given gravitational constant
    ///
    /// # Panics
    ///
    /// Panics if `g_constant` is negative or not finite.
    pub fn new(g_constant: f64) -> Self {
        assert!(
            g_constant >= 0.0 && g_constant.is_finite(),
            "Gravitational constant must be non-negative and finite"
        );
        GravityKernel { g_constant }
    }

    /// Gravitational constant
    pub fn g_constant(&self) -> f64 {
        self.g_constant
    }

    /// Squared distance used for the force magnitude
    ///
    /// Never smaller than the squared sum of the radii.
    pub fn clamped_distance_squared(
        pos_b: Position,
        props_b: &BodyProperties,
        pos_c: Position,
        props_c: &BodyProperties,
    ) -> f64 {
        let dx = pos_c.x() - pos_b.x();
        let dy = pos_c.y() - pos_b.y();
        let dsqr = dx * dx + dy * dy;
        let min_dist = props_b.radius() + props_c.radius();
        dsqr.max(min_dist * min_dist)
    }

    /// Force on `b` from `c` and force on `c` from `b`
    ///
    /// The second value is always the negation of the first.
    pub fn compute_pair(
        &self,
        pos_b: Position,
        props_b: &BodyProperties,
        pos_c: Position,
        props_c: &BodyProperties,
    ) -> (Force, Force) {
        let dx = pos_c.x() - pos_b.x();
        let dy = pos_c.y() - pos_b.y();
        let angle = dy.atan2(dx);
        let forced = Self::clamped_distance_squared(pos_b, props_b, pos_c, props_c);
        let magnitude = self.g_constant * props_b.mass() * props_c.mass() / forced;

        let on_b = Force::new(magnitude * angle.cos(), magnitude * angle.sin());
        (on_b, on_b.negated())
    }
}

/// Evaluate every pair in `blocks` and add the results to `forces`
///
/// Returns the number of pairs evaluated.
pub fn accumulate_blocks(
    kernel: &GravityKernel,
    blocks: &[PairBlock],
    positions: &[Position],
    properties: &[BodyProperties],
    forces: &mut ForceAccumulator,
) -> usize {
    let mut evaluated = 0;
    for block in blocks {
        for (b, c) in block.pairs() {
            let (on_b, _) = kernel.compute_pair(positions[b], &properties[b], positions[c], &properties[c]);
            forces.add_pair(b, c, &on_b);
            evaluated += 1;
        }
    }
    evaluated
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    #[should_panic(expected = "Gravitational constant must be non-negative and finite")]
    fn test_negative_g_panics() {
        GravityKernel::new(-1.0);
    }

    #[test]
    fn test_force_points_towards_other_body() {
        let kernel = GravityKernel::new(1.1);
        let props = BodyProperties::new(2.0, 0.5);
        let (on_b, on_c) = kernel.compute_pair(
            Position::new(0.0, 0.0),
            &props,
            Position::new(0.0, 10.0),
            &props,
        );

        assert_relative_eq!(on_b.fy, 1.1 * 4.0 / 100.0, epsilon = 1e-12);
        assert!(on_b.fx.abs() < 1e-15);
        assert_eq!(on_c, on_b.negated());
    }

    #[test]
    fn test_diagonal_components() {
        let kernel = GravityKernel::new(1.0);
        let props = BodyProperties::new(1.0, 0.1);
        let (on_b, _) = kernel.compute_pair(
            Position::new(0.0, 0.0),
            &props,
            Position::new(3.0, 4.0),
            &props,
        );

        // |F| = 1/25 along (3/5, 4/5)
        assert_relative_eq!(on_b.fx, 0.6 / 25.0, epsilon = 1e-12);
        assert_relative_eq!(on_b.fy, 0.8 / 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_overlap_is_clamped() {
        let kernel = GravityKernel::new(1.0);
        let props = BodyProperties::new(1.0, 2.0);

        // 1 apart but radii sum to 4: distance squared becomes 16
        let (near, _) = kernel.compute_pair(
            Position::new(0.0, 0.0),
            &props,
            Position::new(1.0, 0.0),
            &props,
        );
        assert_relative_eq!(near.fx, 1.0 / 16.0, epsilon = 1e-12);

        // coincident bodies produce a finite force
        let (same, _) = kernel.compute_pair(
            Position::new(5.0, 5.0),
            &props,
            Position::new(5.0, 5.0),
            &props,
        );
        assert!(same.is_valid());
        assert!(same.magnitude() <= 1.0 / 16.0 + 1e-12);
    }

    #[test]
    fn test_accumulate_blocks_counts_pairs() {
        let kernel = GravityKernel::new(1.0);
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(0.0, 10.0),
        ];
        let properties = vec![BodyProperties::new(1.0, 0.5); 3];
        let mut forces = ForceAccumulator::new(3);

        let blocks = [PairBlock::Triangle(crate::partition::WorkRange::new(0, 3))];
        let evaluated = accumulate_blocks(&kernel, &blocks, &positions, &properties, &mut forces);

        assert_eq!(evaluated, 3);
        let net = forces.net_force();
        assert!(net.fx.abs() < 1e-15 && net.fy.abs() < 1e-15);
    }
}
