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
//! Semi-implicit Euler with linear drag
//!
//! # Algorithm
//!
//! ```text
//! drag    = |v(t)| * friction, directed against v(t)
//! v(t+dt) = v(t) + (F(t) - drag) / m * dt
//! x(t+dt) = x(t) + v(t+dt) * dt        (then reflected into the box)
//! ```
//!
//! Positions use the already-updated velocity, which keeps the scheme
//! stable for the small fixed steps the engine runs with.

use super::{reflect, Bounds, Integrator};
use crate::state::{BodyProperties, Force, Position, PositionBuffers, Velocity};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Semi-implicit Euler integrator with speed-proportional drag
///
/// # Example
///
/// ```
/// use nbody_engine::integration::{DragEulerIntegrator, Integrator};
///
/// let integrator = DragEulerIntegrator::new(0.025 / 5000.0, 0.01);
/// assert!(integrator.validate_timestep().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEulerIntegrator {
    timestep: f64,
    friction: f64,
}

impl DragEulerIntegrator {
    /// Create an integrator with the given timestep and drag coefficient
    ///
    /// # Panics
    ///
    /// Panics if timestep is non-positive, NaN, or infinite, or if
    /// friction is negative or not finite.
    pub fn new(timestep: f64, friction: f64) -> Self {
        assert!(
            timestep > 0.0 && timestep.is_finite(),
            "Timestep must be positive and finite"
        );
        assert!(
            friction >= 0.0 && friction.is_finite(),
            "Friction must be non-negative and finite"
        );
        DragEulerIntegrator { timestep, friction }
    }

    /// Drag coefficient
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// New velocity of one body
    pub fn advance_velocity(&self, velocity: Velocity, force: Force, mass: f64) -> Velocity {
        let drag = velocity.magnitude() * self.friction;
        let angle = velocity.dy().atan2(velocity.dx());
        let fx = force.fx - drag * angle.cos();
        let fy = force.fy - drag * angle.sin();

        Velocity::new(
            velocity.dx() + (fx / mass) * self.timestep,
            velocity.dy() + (fy / mass) * self.timestep,
        )
    }

    /// Next position of one body, reflecting `velocity` on wall contact
    ///
    /// Returns the position and whether a wall was hit.
    pub fn advance_position(&self, previous: Position, velocity: &mut Velocity, bounds: &Bounds) -> (Position, bool) {
        let (x, dx, hit_x) = reflect(previous.x() + velocity.dx() * self.timestep, velocity.dx(), bounds.width());
        let (y, dy, hit_y) = reflect(previous.y() + velocity.dy() * self.timestep, velocity.dy(), bounds.height());

        velocity.set_dx(dx);
        velocity.set_dy(dy);
        (Position::new(x, y), hit_x || hit_y)
    }
}

impl Integrator for DragEulerIntegrator {
    fn name(&self) -> &str {
        "Semi-implicit Euler with drag"
    }

    fn timestep(&self) -> f64 {
        self.timestep
    }

    fn update_velocities(&self, velocities: &mut [Velocity], forces: &[Force], properties: &[BodyProperties]) {
        #[cfg(feature = "parallel")]
        {
            velocities
                .par_iter_mut()
                .zip(forces.par_iter())
                .zip(properties.par_iter())
                .for_each(|((velocity, force), props)| {
                    *velocity = self.advance_velocity(*velocity, *force, props.mass());
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for ((velocity, force), props) in velocities.iter_mut().zip(forces).zip(properties) {
                *velocity = self.advance_velocity(*velocity, *force, props.mass());
            }
        }
    }

    fn update_positions(&self, positions: &mut PositionBuffers, velocities: &mut [Velocity], bounds: &Bounds) -> usize {
        let (previous, next) = positions.split_mut();

        #[cfg(feature = "parallel")]
        {
            next.par_iter_mut()
                .zip(previous.par_iter())
                .zip(velocities.par_iter_mut())
                .map(|((next, previous), velocity)| {
                    let (position, hit) = self.advance_position(*previous, velocity, bounds);
                    *next = position;
                    hit
                })
                .filter(|&hit| hit)
                .count()
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut hits = 0;
            for ((next, previous), velocity) in next.iter_mut().zip(previous).zip(velocities.iter_mut()) {
                let (position, hit) = self.advance_position(*previous, velocity, bounds);
                *next = position;
                if hit {
                    hits += 1;
                }
            }
            hits
        }
    }
}
