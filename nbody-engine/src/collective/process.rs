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
//! MPI process group
//!
//! One worker per MPI process, launched with `mpirun -n <workers> nbody ...`.
//! Records travel as flat `f64` arrays:
//!
//! - a body is `[x, y, dx, dy, mass, radius]`
//! - a force is `[fx, fy]`
//!
//! The all-reduce is MPI's own, with the caller's combine function wrapped
//! in a commutative user operation. MPI aborts the job on communication
//! failure, so the collectives here only report argument errors.

use super::Collective;
use crate::error::CollectiveError;
use crate::state::{Body, Force, Position, Velocity};
use mpi::collective::UserOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Rank;

const BODY_FIELDS: usize = 6;
const FORCE_FIELDS: usize = 2;

/// A worker's membership in an MPI communicator
pub struct MpiGroup {
    world: SimpleCommunicator,
}

impl MpiGroup {
    /// Wrap a communicator, usually `universe.world()`
    pub fn new(world: SimpleCommunicator) -> Self {
        MpiGroup { world }
    }
}

impl Collective for MpiGroup {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn broadcast_bodies(&mut self, root: usize, bodies: &mut Vec<Body>) -> Result<(), CollectiveError> {
        if root >= self.size() {
            return Err(CollectiveError::InvalidRoot { root, size: self.size() });
        }
        let root_process = self.world.process_at_rank(root as Rank);

        let mut count = bodies.len() as u64;
        root_process.broadcast_into(&mut count);

        let mut wire = if self.rank() == root {
            encode_bodies(bodies)
        } else {
            vec![0.0; count as usize * BODY_FIELDS]
        };
        root_process.broadcast_into(&mut wire[..]);

        if self.rank() != root {
            *bodies = decode_bodies(&wire);
        }
        Ok(())
    }

    fn all_reduce<F>(&mut self, local: &[Force], out: &mut [Force], combine: F) -> Result<(), CollectiveError>
    where
        F: Fn(&[Force], &mut [Force]) + Sync,
    {
        if out.len() != local.len() {
            return Err(CollectiveError::LengthMismatch {
                rank: self.rank(),
                peer: self.rank(),
                expected: local.len(),
                actual: out.len(),
            });
        }

        let send = encode_forces(local);
        let mut receive = vec![0.0; send.len()];
        let operation = UserOperation::commutative(|input, inout| {
            if let (Some(input), Some(inout)) = (input.downcast::<f64>(), inout.downcast::<f64>()) {
                combine_wire(&combine, input, inout);
            }
        });
        self.world.all_reduce_into(&send[..], &mut receive[..], &operation);

        for (force, fields) in out.iter_mut().zip(receive.chunks_exact(FORCE_FIELDS)) {
            *force = Force::new(fields[0], fields[1]);
        }
        Ok(())
    }
}

fn encode_bodies(bodies: &[Body]) -> Vec<f64> {
    bodies
        .iter()
        .flat_map(|b| {
            [
                b.position.x(),
                b.position.y(),
                b.velocity.dx(),
                b.velocity.dy(),
                b.mass,
                b.radius,
            ]
        })
        .collect()
}

fn decode_bodies(wire: &[f64]) -> Vec<Body> {
    wire.chunks_exact(BODY_FIELDS)
        .map(|f| Body::new(Position::new(f[0], f[1]), Velocity::new(f[2], f[3]), f[4], f[5]))
        .collect()
}

fn encode_forces(forces: &[Force]) -> Vec<f64> {
    forces.iter().flat_map(|f| [f.fx, f.fy]).collect()
}

/// Apply a force combine function to flat wire arrays
///
/// MPI may hand the operation any slice of the buffer, so the arrays are
/// converted per call.
fn combine_wire<F>(combine: &F, input: &[f64], inout: &mut [f64])
where
    F: Fn(&[Force], &mut [Force]),
{
    let input: Vec<Force> = input
        .chunks_exact(FORCE_FIELDS)
        .map(|f| Force::new(f[0], f[1]))
        .collect();
    let mut combined: Vec<Force> = inout
        .chunks_exact(FORCE_FIELDS)
        .map(|f| Force::new(f[0], f[1]))
        .collect();

    combine(&input, &mut combined);

    for (fields, force) in inout.chunks_exact_mut(FORCE_FIELDS).zip(&combined) {
        fields[0] = force.fx;
        fields[1] = force.fy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::sum_forces;

    #[test]
    fn test_body_wire_layout() {
        let bodies = vec![
            Body::new(Position::new(1.0, 2.0), Velocity::new(-0.5, 0.25), 8.0, 2.0),
            Body::new(Position::new(3.0, 4.0), Velocity::zero(), 1.0, 1.0),
        ];
        let wire = encode_bodies(&bodies);

        assert_eq!(wire.len(), 2 * BODY_FIELDS);
        assert_eq!(&wire[..BODY_FIELDS], &[1.0, 2.0, -0.5, 0.25, 8.0, 2.0]);
        assert_eq!(decode_bodies(&wire), bodies);
    }

    #[test]
    fn test_combine_wire_sums_forces() {
        let input = encode_forces(&[Force::new(1.0, -1.0), Force::new(0.5, 2.0)]);
        let mut inout = encode_forces(&[Force::new(2.0, 3.0), Force::new(-0.5, 0.0)]);

        combine_wire(&sum_forces, &input, &mut inout);
        assert_eq!(inout, vec![3.0, 2.0, 0.0, 2.0]);
    }
}
