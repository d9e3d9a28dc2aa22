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
//! Simulation constants and run configuration
//!
//! The engine works in pixel units: the bounding box is the size of the
//! raster the bodies are drawn on, masses are the cube of the body radius,
//! and the gravitational constant is tuned for that scale rather than SI.

/// Gravitational constant in simulation units
pub const GRAVITY: f64 = 1.1;

/// Drag coefficient applied against the current speed of every body
pub const FRICTION: f64 = 0.01;

/// Fixed integration step
pub const DELTA_T: f64 = 0.025 / 5000.0;

/// Hard upper bound on the number of bodies in a run
pub const MAX_BODIES: usize = 10_000;

/// Smallest body count the engine accepts
pub const MIN_BODIES: usize = 2;

/// Seed used for the initial body layout unless overridden
pub const SEED: u64 = 27_102_015;

/// Restitution coefficient for wall bounces.
///
/// Not read by the integrator: walls reverse the velocity component in
/// full. Kept so a damped bounce can be wired in without changing the
/// configuration surface.
pub const BOUNCE: f64 = -0.9;

/// Numerical and physical parameters shared by every worker
///
/// # Example
///
/// ```
/// use nbody_engine::config::{SimulationConfig, GRAVITY};
///
/// let config = SimulationConfig::default().with_seed(7);
/// assert_eq!(config.gravity(), GRAVITY);
/// assert_eq!(config.seed(), 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    gravity: f64,
    friction: f64,
    timestep: f64,
    max_bodies: usize,
    seed: u64,
    bounce: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            gravity: GRAVITY,
            friction: FRICTION,
            timestep: DELTA_T,
            max_bodies: MAX_BODIES,
            seed: SEED,
            bounce: BOUNCE,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with the default constants
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gravitational constant
    ///
    /// # Panics
    ///
    /// Panics if `gravity` is negative or not finite.
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        assert!(
            gravity >= 0.0 && gravity.is_finite(),
            "Gravitational constant must be non-negative and finite"
        );
        self.gravity = gravity;
        self
    }

    /// Set the drag coefficient
    ///
    /// # Panics
    ///
    /// Panics if `friction` is negative or not finite.
    pub fn with_friction(mut self, friction: f64) -> Self {
        assert!(
            friction >= 0.0 && friction.is_finite(),
            "Friction must be non-negative and finite"
        );
        self.friction = friction;
        self
    }

    /// Set the fixed integration step
    ///
    /// # Panics
    ///
    /// Panics if `timestep` is non-positive, NaN, or infinite.
    pub fn with_timestep(mut self, timestep: f64) -> Self {
        assert!(
            timestep > 0.0 && timestep.is_finite(),
            "Timestep must be positive and finite"
        );
        self.timestep = timestep;
        self
    }

    /// Set the upper bound on the body count
    ///
    /// # Panics
    ///
    /// Panics if `max_bodies` is below [`MIN_BODIES`].
    pub fn with_max_bodies(mut self, max_bodies: usize) -> Self {
        assert!(
            max_bodies >= MIN_BODIES,
            "Body limit must allow at least two bodies"
        );
        self.max_bodies = max_bodies;
        self
    }

    /// Set the seed of the initial layout generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Gravitational constant
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// Drag coefficient
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Fixed integration step
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Upper bound on the body count
    pub fn max_bodies(&self) -> usize {
        self.max_bodies
    }

    /// Seed of the initial layout generator
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restitution coefficient (see [`BOUNCE`])
    pub fn bounce(&self) -> f64 {
        self.bounce
    }
}

/// Outcome of clamping a requested body count into the supported range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyCount {
    /// The request was inside the range
    Exact(usize),
    /// The request exceeded the limit and was lowered to it
    ClampedToMax(usize),
    /// The request was below two and was raised to two
    ClampedToMin(usize),
}

impl BodyCount {
    /// The usable body count
    pub fn value(&self) -> usize {
        match *self {
            BodyCount::Exact(n) | BodyCount::ClampedToMax(n) | BodyCount::ClampedToMin(n) => n,
        }
    }

    /// Whether the request had to be adjusted
    pub fn was_clamped(&self) -> bool {
        !matches!(self, BodyCount::Exact(_))
    }
}

/// Clamp a requested body count to `[MIN_BODIES, max_bodies]`
///
/// Out-of-range counts are not an error; callers are expected to warn.
pub fn clamp_body_count(requested: i64, max_bodies: usize) -> BodyCount {
    if requested > max_bodies as i64 {
        BodyCount::ClampedToMax(max_bodies)
    } else if requested < MIN_BODIES as i64 {
        BodyCount::ClampedToMin(MIN_BODIES)
    } else {
        BodyCount::Exact(requested as usize)
    }
}

/// Read a requested body count without ever rejecting it
///
/// Leading whitespace and one sign are skipped, then the leading decimal
/// digits are read; parsing stops at the first other character. Text with
/// no leading digits reads as 0, which [`clamp_body_count`] then raises to
/// the minimum. Values too large for `i64` saturate.
pub fn parse_body_count(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(digit - b'0'));
    }
    if negative {
        -value
    } else {
        value
    }
}
