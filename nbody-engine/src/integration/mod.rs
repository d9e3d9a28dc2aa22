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
//! Time integration of velocities and positions
//!
//! Integration runs after the force reduction, on every worker, over every
//! body. Workers hold the same global forces at that point, so they all
//! compute the same update and no positions need to be exchanged.
//!
//! A step has two phases:
//!
//! 1. **Velocities**: subtract drag from the global force, divide by mass,
//!    and advance the velocity by one timestep.
//! 2. **Positions**: project the previous position with the new velocity
//!    into the next buffer, reflecting off the walls of the box.
//!
//! Each body's update only touches that body, so both phases may run in
//! parallel across bodies.

use crate::error::SimulationError;
use crate::state::{BodyProperties, Force, PositionBuffers, SimulationState, Velocity};

mod euler;

pub use euler::DragEulerIntegrator;

/// Axis-aligned reflecting box `[0, width) x [0, height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    width: u32,
    height: u32,
}

impl Bounds {
    /// Create a box of the given size
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, SimulationError> {
        if width == 0 || height == 0 {
            return Err(SimulationError::InvalidBounds { width, height });
        }
        Ok(Bounds { width, height })
    }

    /// Box width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Box height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f64 {
        let w = self.width as f64;
        let h = self.height as f64;
        (w * w + h * h).sqrt()
    }
}

/// Keep `coord` inside `[0, dimension)`
///
/// A coordinate below zero is moved to zero; one at or beyond the far
/// wall is moved to `dimension - 1`. Either way the velocity component is
/// reversed in full. Returns the new coordinate, the new velocity
/// component, and whether a wall was hit.
pub fn reflect(coord: f64, velocity: f64, dimension: u32) -> (f64, f64, bool) {
    let limit = dimension as f64;
    if coord < 0.0 {
        (0.0, -velocity, true)
    } else if coord >= limit {
        (limit - 1.0, -velocity, true)
    } else {
        (coord, velocity, false)
    }
}

/// Trait for integration schemes
pub trait Integrator: Send + Sync {
    /// Get the name of this integrator
    fn name(&self) -> &str;

    /// Get the timestep used by this integrator
    fn timestep(&self) -> f64;

    /// Validate the timestep for stability
    ///
    /// Returns a warning message if the timestep might cause numerical issues.
    fn validate_timestep(&self) -> Result<(), String> {
        let dt = self.timestep();

        if dt <= 0.0 || !dt.is_finite() {
            return Err(format!("Invalid timestep: {}. Must be positive and finite.", dt));
        }

        if dt < 1e-9 {
            return Err(format!(
                "Warning: Timestep {} is extremely small and may cause precision loss with f64. \
                Consider using larger timestep or higher precision types.",
                dt
            ));
        }

        if dt > 1.0 {
            return Err(format!(
                "Warning: Timestep {} is large and may cause instability. \
                Consider using smaller timesteps for better accuracy.",
                dt
            ));
        }

        Ok(())
    }

    /// Advance every velocity using the global forces
    ///
    /// Reads each body's pre-update velocity before overwriting it.
    fn update_velocities(&self, velocities: &mut [Velocity], forces: &[Force], properties: &[BodyProperties]);

    /// Write next positions from previous positions and current velocities
    ///
    /// Returns the number of bodies that hit a wall.
    fn update_positions(&self, positions: &mut PositionBuffers, velocities: &mut [Velocity], bounds: &Bounds) -> usize;

    /// Run both phases on a state, leaving the buffers unflipped
    ///
    /// Returns the number of bodies that hit a wall.
    fn integrate(&self, state: &mut SimulationState, bounds: &Bounds) -> usize {
        let (positions, velocities, properties, forces) = state.split_for_update();
        self.update_velocities(velocities, forces.as_slice(), properties);
        self.update_positions(positions, velocities, bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_rejects_zero_dimension() {
        assert!(Bounds::new(0, 10).is_err());
        assert!(Bounds::new(10, 0).is_err());
        let bounds = Bounds::new(3, 4).unwrap();
        assert_eq!(bounds.diagonal(), 5.0);
    }

    #[test]
    fn test_reflect_inside_is_untouched() {
        assert_eq!(reflect(5.5, 2.0, 10), (5.5, 2.0, false));
        assert_eq!(reflect(0.0, -2.0, 10), (0.0, -2.0, false));
    }

    #[test]
    fn test_reflect_low_wall() {
        assert_eq!(reflect(-0.25, -3.0, 10), (0.0, 3.0, true));
    }

    #[test]
    fn test_reflect_high_wall() {
        assert_eq!(reflect(10.0, 3.0, 10), (9.0, -3.0, true));
        assert_eq!(reflect(12.5, 3.0, 10), (9.0, -3.0, true));
    }
}
