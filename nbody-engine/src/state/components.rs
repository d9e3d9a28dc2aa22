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
//! Per-body value types
//!
//! Two-dimensional, double-precision counterparts of position, velocity and
//! force, plus the immutable physical properties of a body.

/// 2D position in simulation (pixel) units
///
/// # Examples
///
/// ```
/// use nbody_engine::state::Position;
///
/// let pos = Position::new(3.0, 4.0);
/// assert_eq!(pos.x(), 3.0);
/// assert!(pos.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Get the x coordinate
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Get the y coordinate
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Check if both coordinates are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 2D velocity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    dx: f64,
    dy: f64,
}

impl Velocity {
    /// Create a new velocity
    pub fn new(dx: f64, dy: f64) -> Self {
        Velocity { dx, dy }
    }

    /// A body at rest
    pub fn zero() -> Self {
        Velocity::new(0.0, 0.0)
    }

    /// Get the x component
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Get the y component
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Set the x component
    pub fn set_dx(&mut self, dx: f64) {
        self.dx = dx;
    }

    /// Set the y component
    pub fn set_dy(&mut self, dy: f64) {
        self.dy = dy;
    }

    /// Speed (magnitude of the velocity vector)
    pub fn magnitude(&self) -> f64 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Check if both components are finite
    pub fn is_valid(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

/// 2D force record, the unit of the collective reduction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Force {
    /// X component
    pub fx: f64,
    /// Y component
    pub fy: f64,
}

impl Force {
    /// Create a new force vector
    pub fn new(fx: f64, fy: f64) -> Self {
        Force { fx, fy }
    }

    /// The additive identity
    pub fn zero() -> Self {
        Force::new(0.0, 0.0)
    }

    /// Add another force to this one
    pub fn add(&mut self, other: &Force) {
        self.fx += other.fx;
        self.fy += other.fy;
    }

    /// Equal and opposite force
    pub fn negated(&self) -> Force {
        Force::new(-self.fx, -self.fy)
    }

    /// Magnitude of the force
    pub fn magnitude(&self) -> f64 {
        (self.fx * self.fx + self.fy * self.fy).sqrt()
    }

    /// Check if both components are finite
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite() && self.fy.is_finite()
    }
}

/// Mass and radius of a body, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProperties {
    mass: f64,
    radius: f64,
}

impl BodyProperties {
    /// Create body properties
    ///
    /// # Panics
    ///
    /// Panics if mass or radius is not strictly positive and finite.
    pub fn new(mass: f64, radius: f64) -> Self {
        assert!(
            Self::are_valid(mass, radius),
            "Mass and radius must be positive and finite"
        );
        BodyProperties { mass, radius }
    }

    /// Whether `mass` and `radius` are usable body properties
    pub fn are_valid(mass: f64, radius: f64) -> bool {
        mass > 0.0 && mass.is_finite() && radius > 0.0 && radius.is_finite()
    }

    /// Get the mass
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Get the radius
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// Complete initial record of one body
///
/// This is what the root worker generates and broadcasts; each worker
/// unpacks it into its own [`SimulationState`](super::SimulationState).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Current position
    pub position: Position,
    /// Current velocity
    pub velocity: Velocity,
    /// Mass, strictly positive
    pub mass: f64,
    /// Radius, strictly positive
    pub radius: f64,
}

impl Body {
    /// Create a body record
    pub fn new(position: Position, velocity: Velocity, mass: f64, radius: f64) -> Self {
        Body {
            position,
            velocity,
            mass,
            radius,
        }
    }

    /// Kinetic energy `0.5 * m * v²`
    pub fn kinetic_energy(&self) -> f64 {
        let speed = self.velocity.magnitude();
        0.5 * self.mass * speed * speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_add_and_negate() {
        let mut force = Force::new(1.0, -2.0);
        force.add(&Force::new(0.5, 0.5));
        assert_eq!(force, Force::new(1.5, -1.5));
        assert_eq!(force.negated(), Force::new(-1.5, 1.5));
        assert_eq!(Force::zero().magnitude(), 0.0);
    }

    #[test]
    fn test_velocity_magnitude() {
        let vel = Velocity::new(3.0, 4.0);
        assert_eq!(vel.magnitude(), 5.0);
        assert!(vel.is_valid());
        assert!(!Velocity::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    #[should_panic(expected = "Mass and radius must be positive and finite")]
    fn test_zero_mass_panics() {
        BodyProperties::new(0.0, 1.0);
    }

    #[test]
    fn test_body_kinetic_energy() {
        let body = Body::new(Position::new(0.0, 0.0), Velocity::new(3.0, 4.0), 2.0, 1.0);
        assert_eq!(body.kinetic_energy(), 25.0);
    }
}
