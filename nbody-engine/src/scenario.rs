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
//! Seeded initial conditions
//!
//! Bodies are scattered over the integer pixels of the box. Radius grows
//! quadratically with the body index, so the last bodies of a run are the
//! heaviest; mass is the cube of the radius (uniform density).

use crate::integration::Bounds;
use crate::state::{Body, Position, Velocity};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Velocity components are `(k - VELOCITY_OFFSET) / VELOCITY_SCALE`
/// with `k` drawn from `0..2 * VELOCITY_OFFSET`
const VELOCITY_OFFSET: i32 = 10_000;
const VELOCITY_SCALE: f64 = 2000.0;

/// Radius of body `index` out of `count` in a box with the given diagonal
pub fn body_radius(index: usize, count: usize, diagonal: f64) -> f64 {
    let b = index as f64;
    let n = count as f64;
    1.0 + ((b * b + 1.0) * diagonal) / (25.0 * (n * n + 1.0))
}

/// Generate `count` bodies inside `bounds`
///
/// The same seed always yields the same bodies.
///
/// # Example
///
/// ```
/// use nbody_engine::integration::Bounds;
/// use nbody_engine::scenario::generate_bodies;
///
/// let bounds = Bounds::new(200, 100).unwrap();
/// let bodies = generate_bodies(16, bounds, 27102015);
/// assert_eq!(bodies.len(), 16);
/// assert_eq!(bodies, generate_bodies(16, bounds, 27102015));
/// ```
pub fn generate_bodies(count: usize, bounds: Bounds, seed: u64) -> Vec<Body> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let diagonal = bounds.diagonal();

    (0..count)
        .map(|index| {
            let x = rng.random_range(0..bounds.width()) as f64;
            let y = rng.random_range(0..bounds.height()) as f64;
            let dx = (rng.random_range(0..2 * VELOCITY_OFFSET) - VELOCITY_OFFSET) as f64 / VELOCITY_SCALE;
            let dy = (rng.random_range(0..2 * VELOCITY_OFFSET) - VELOCITY_OFFSET) as f64 / VELOCITY_SCALE;

            let radius = body_radius(index, count, diagonal);
            Body::new(Position::new(x, y), Velocity::new(dx, dy), radius.powi(3), radius)
        })
        .collect()
}
