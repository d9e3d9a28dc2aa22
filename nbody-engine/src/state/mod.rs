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
//! Simulation state replicated on every worker
//!
//! Each worker holds a full copy of all body arrays. The copies agree
//! right after every force reduction because every worker then applies
//! the same deterministic update to the same global forces.
//!
//! Layout is structure-of-arrays: positions (double-buffered), velocities,
//! immutable properties and the force accumulator, all indexed by the
//! stable body index.

mod buffers;
mod components;

pub use buffers::{ForceAccumulator, PositionBuffers};
pub use components::{Body, BodyProperties, Force, Position, Velocity};

use crate::config::MIN_BODIES;
use crate::error::{Result, SimulationError};

/// All per-body arrays of one worker
#[derive(Debug, Clone)]
pub struct SimulationState {
    positions: PositionBuffers,
    velocities: Vec<Velocity>,
    properties: Vec<BodyProperties>,
    forces: ForceAccumulator,
}

impl SimulationState {
    /// Build the state from initial body records
    ///
    /// Allocates every array once. Fails if the count is outside
    /// `2..=max_bodies` or a body has a non-positive mass or radius.
    pub fn from_bodies(bodies: &[Body], max_bodies: usize) -> Result<Self> {
        if bodies.len() < MIN_BODIES {
            return Err(SimulationError::TooFewBodies {
                count: bodies.len(),
                min: MIN_BODIES,
            });
        }
        if bodies.len() > max_bodies {
            return Err(SimulationError::TooManyBodies {
                count: bodies.len(),
                max: max_bodies,
            });
        }

        let mut positions = Vec::with_capacity(bodies.len());
        let mut velocities = Vec::with_capacity(bodies.len());
        let mut properties = Vec::with_capacity(bodies.len());

        for (index, body) in bodies.iter().enumerate() {
            if !BodyProperties::are_valid(body.mass, body.radius) {
                return Err(SimulationError::InvalidBody {
                    index,
                    mass: body.mass,
                    radius: body.radius,
                });
            }
            positions.push(body.position);
            velocities.push(body.velocity);
            properties.push(BodyProperties::new(body.mass, body.radius));
        }

        Ok(SimulationState {
            positions: PositionBuffers::new(positions),
            velocities,
            properties,
            forces: ForceAccumulator::new(bodies.len()),
        })
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Always false; a state holds at least two bodies
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Current positions (the `previous` slot between steps)
    pub fn positions(&self) -> &[Position] {
        self.positions.previous()
    }

    /// Both position slots
    pub fn position_buffers(&self) -> &PositionBuffers {
        &self.positions
    }

    /// Current velocities
    pub fn velocities(&self) -> &[Velocity] {
        &self.velocities
    }

    /// Mass and radius of every body
    pub fn properties(&self) -> &[BodyProperties] {
        &self.properties
    }

    /// Forces of the most recent step
    pub fn forces(&self) -> &ForceAccumulator {
        &self.forces
    }

    /// Mutable access to the force accumulator
    pub fn forces_mut(&mut self) -> &mut ForceAccumulator {
        &mut self.forces
    }

    /// Borrows needed to accumulate pair forces
    pub fn split_for_forces(&mut self) -> (&[Position], &[BodyProperties], &mut ForceAccumulator) {
        (self.positions.previous(), &self.properties, &mut self.forces)
    }

    /// Borrows needed to integrate one step
    pub fn split_for_update(
        &mut self,
    ) -> (&mut PositionBuffers, &mut [Velocity], &[BodyProperties], &ForceAccumulator) {
        (
            &mut self.positions,
            &mut self.velocities,
            &self.properties,
            &self.forces,
        )
    }

    /// Flip the position buffers at the end of a step
    pub fn flip_buffers(&mut self) {
        self.positions.swap();
    }

    /// Number of completed steps
    pub fn steps_completed(&self) -> u64 {
        self.positions.flips()
    }

    /// Snapshot of every body in index order
    pub fn bodies(&self) -> Vec<Body> {
        self.positions()
            .iter()
            .zip(&self.velocities)
            .zip(&self.properties)
            .map(|((pos, vel), props)| Body::new(*pos, *vel, props.mass(), props.radius()))
            .collect()
    }

    /// Total kinetic energy of the system
    pub fn total_kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.properties)
            .map(|(vel, props)| {
                let speed = vel.magnitude();
                0.5 * props.mass() * speed * speed
            })
            .sum()
    }
}
