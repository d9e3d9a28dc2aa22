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
//! Per-worker step loop
//!
//! A [`Worker`] owns a full replica of the simulation state and advances it
//! in lockstep with its peers. Each step walks the same fixed phases:
//!
//! ```text
//! ClearForces -> ComputeLocalForces -> ReduceGlobalForces
//!             -> UpdateVelocities -> UpdatePositions -> FlipBuffers
//! ```
//!
//! Only `ReduceGlobalForces` talks to other workers. It blocks until every
//! worker has contributed, which is what keeps the replicas in step.

use crate::collective::{sum_forces, Collective};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::forces::{accumulate_blocks, assign_pairs, GravityKernel, PairBlock};
use crate::integration::{Bounds, DragEulerIntegrator, Integrator};
use crate::partition::Partition;
use crate::pool::{BufferPool, PoolConfig};
use crate::state::{Body, Force, SimulationState};

/// Phases of a single step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepPhase {
    /// Zero the local force accumulator
    ClearForces,
    /// Evaluate this worker's assigned pairs
    ComputeLocalForces,
    /// Sum the accumulators of all workers
    ReduceGlobalForces,
    /// Apply global forces and drag to velocities
    UpdateVelocities,
    /// Project positions into the next buffer
    UpdatePositions,
    /// Make the next buffer current
    FlipBuffers,
}

impl StepPhase {
    /// Whether the phase exchanges data with other workers
    pub fn is_collective(self) -> bool {
        self == StepPhase::ReduceGlobalForces
    }
}

/// Read-only hook run after every completed step
///
/// Observers see the state but cannot change it. The runtime only attaches
/// an observer to rank 0, so observing never costs the other workers
/// anything beyond waiting at the next reduction.
pub trait StepObserver: Send {
    /// Called with the number of completed steps and the current state
    fn after_step(&mut self, step: u64, state: &SimulationState) -> Result<()>;
}

/// Summary of one completed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Steps completed including this one
    pub step: u64,
    /// Pairs evaluated locally
    pub pairs: usize,
    /// Bodies that hit a wall
    pub reflections: usize,
}

/// One member of a lockstep worker group
pub struct Worker<C: Collective> {
    comm: C,
    partition: Partition,
    blocks: Vec<PairBlock>,
    kernel: GravityKernel,
    integrator: DragEulerIntegrator,
    bounds: Bounds,
    state: SimulationState,
    pool: BufferPool<Force>,
    phase: Option<StepPhase>,
}

impl<C: Collective> Worker<C> {
    /// Receive the initial bodies from rank 0 and build the local replica
    ///
    /// On rank 0 `bodies` is the initial state; other ranks may pass an
    /// empty vector, which the broadcast replaces.
    pub fn bootstrap(mut comm: C, mut bodies: Vec<Body>, bounds: Bounds, config: &SimulationConfig) -> Result<Self> {
        comm.broadcast_bodies(0, &mut bodies)?;
        Self::new(comm, &bodies, bounds, config)
    }

    /// Build a worker from bodies every rank already holds
    pub fn new(comm: C, bodies: &[Body], bounds: Bounds, config: &SimulationConfig) -> Result<Self> {
        let state = SimulationState::from_bodies(bodies, config.max_bodies())?;
        let partition = Partition::plan(state.len(), comm.size())?;
        let blocks = assign_pairs(&partition, comm.rank());

        let integrator = DragEulerIntegrator::new(config.timestep(), config.friction());
        if let Err(msg) = integrator.validate_timestep() {
            log::warn!("{}", msg);
        }

        let range = partition.range(comm.rank());
        log::debug!(
            "worker {}/{}: bodies {}..{}, {} pair blocks, {} pairs per step, {}",
            comm.rank(),
            comm.size(),
            range.start,
            range.end(),
            blocks.len(),
            blocks.iter().map(PairBlock::pair_count).sum::<usize>(),
            integrator.name()
        );

        Ok(Worker {
            pool: BufferPool::new(PoolConfig::new(state.len(), 2)),
            kernel: GravityKernel::new(config.gravity()),
            comm,
            partition,
            blocks,
            integrator,
            bounds,
            state,
            phase: None,
        })
    }

    /// This worker's rank
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    /// Body ranges of the whole group
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Pair blocks this worker evaluates every step
    pub fn blocks(&self) -> &[PairBlock] {
        &self.blocks
    }

    /// The local replica
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Consume the worker, keeping its replica
    pub fn into_state(self) -> SimulationState {
        self.state
    }

    /// Last phase entered, `None` before the first step
    ///
    /// After a failed step this names the phase that failed.
    pub fn phase(&self) -> Option<StepPhase> {
        self.phase
    }

    /// Statistics of the reduction buffer pool
    pub fn pool(&self) -> &BufferPool<Force> {
        &self.pool
    }

    /// Advance the replica by one step
    ///
    /// Blocks in the reduction until every worker of the group arrives.
    pub fn step(&mut self) -> Result<StepReport> {
        self.phase = Some(StepPhase::ClearForces);
        self.state.forces_mut().clear();

        self.phase = Some(StepPhase::ComputeLocalForces);
        let (positions, properties, forces) = self.state.split_for_forces();
        let pairs = accumulate_blocks(&self.kernel, &self.blocks, positions, properties, forces);

        self.phase = Some(StepPhase::ReduceGlobalForces);
        let mut successor = self.pool.acquire();
        self.comm
            .all_reduce(self.state.forces().as_slice(), &mut successor, sum_forces)?;
        let retired = self.state.forces_mut().replace(successor);
        self.pool.release(retired);

        self.phase = Some(StepPhase::UpdateVelocities);
        let (positions, velocities, properties, forces) = self.state.split_for_update();
        self.integrator
            .update_velocities(velocities, forces.as_slice(), properties);

        self.phase = Some(StepPhase::UpdatePositions);
        let reflections = self.integrator.update_positions(positions, velocities, &self.bounds);

        self.phase = Some(StepPhase::FlipBuffers);
        self.state.flip_buffers();

        let report = StepReport {
            step: self.state.steps_completed(),
            pairs,
            reflections,
        };
        log::trace!(
            "worker {}: step {} done ({} pairs, {} reflections, buffer {} current)",
            self.rank(),
            report.step,
            report.pairs,
            report.reflections,
            self.state.position_buffers().parity()
        );
        Ok(report)
    }

    /// Run `steps` steps, calling `observer` after each one
    pub fn run(&mut self, steps: u64, mut observer: Option<&mut dyn StepObserver>) -> Result<()> {
        for _ in 0..steps {
            let report = self.step()?;
            if let Some(observer) = observer.as_mut() {
                observer.after_step(report.step, &self.state)?;
            }
        }

        let stats = self.pool.stats();
        log::debug!(
            "worker {}: finished {} steps, reduction buffer hit rate {:.1}%",
            self.rank(),
            steps,
            stats.hit_rate()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::ChannelGroup;
    use crate::state::{Position, Velocity};

    fn two_bodies() -> Vec<Body> {
        vec![
            Body::new(Position::new(20.0, 50.0), Velocity::zero(), 1.0, 1.0),
            Body::new(Position::new(80.0, 50.0), Velocity::zero(), 1.0, 1.0),
        ]
    }

    struct Counter {
        calls: Vec<u64>,
    }

    impl StepObserver for Counter {
        fn after_step(&mut self, step: u64, state: &SimulationState) -> Result<()> {
            assert_eq!(state.steps_completed(), step);
            self.calls.push(step);
            Ok(())
        }
    }

    #[test]
    fn test_only_reduction_is_collective() {
        assert!(StepPhase::ReduceGlobalForces.is_collective());
        assert!(!StepPhase::ComputeLocalForces.is_collective());
        assert!(!StepPhase::FlipBuffers.is_collective());
    }

    #[test]
    fn test_buffer_parity_follows_steps() {
        let comm = ChannelGroup::create(1).remove(0);
        let bounds = Bounds::new(100, 100).unwrap();
        let mut worker = Worker::new(comm, &two_bodies(), bounds, &SimulationConfig::default()).unwrap();

        for step in 1..=3u64 {
            worker.step().unwrap();
            assert_eq!(worker.state().position_buffers().parity(), (step % 2) as usize);
        }
    }

    #[test]
    fn test_single_worker_step_attracts_bodies() {
        let comm = ChannelGroup::create(1).remove(0);
        let bounds = Bounds::new(100, 100).unwrap();
        let mut worker = Worker::new(comm, &two_bodies(), bounds, &SimulationConfig::default()).unwrap();

        assert_eq!(worker.phase(), None);
        let report = worker.step().unwrap();

        assert_eq!(report, StepReport { step: 1, pairs: 1, reflections: 0 });
        assert_eq!(worker.phase(), Some(StepPhase::FlipBuffers));

        let velocities = worker.state().velocities();
        assert!(velocities[0].dx() > 0.0);
        assert!(velocities[1].dx() < 0.0);
        assert_eq!(velocities[0].dx(), -velocities[1].dx());
    }

    #[test]
    fn test_run_notifies_observer() {
        let comm = ChannelGroup::create(1).remove(0);
        let bounds = Bounds::new(100, 100).unwrap();
        let mut worker = Worker::new(comm, &two_bodies(), bounds, &SimulationConfig::default()).unwrap();
        let mut counter = Counter { calls: Vec::new() };

        worker.run(3, Some(&mut counter)).unwrap();

        assert_eq!(counter.calls, vec![1, 2, 3]);
        assert_eq!(worker.into_state().steps_completed(), 3);
    }

    #[test]
    fn test_pool_recycles_reduction_buffers() {
        let comm = ChannelGroup::create(1).remove(0);
        let bounds = Bounds::new(100, 100).unwrap();
        let mut worker = Worker::new(comm, &two_bodies(), bounds, &SimulationConfig::default()).unwrap();

        worker.run(10, None).unwrap();

        assert_eq!(worker.pool().stats().misses, 1);
        assert_eq!(worker.pool().stats().hits, 9);
    }

    #[test]
    fn test_rejects_single_body() {
        let comm = ChannelGroup::create(1).remove(0);
        let bounds = Bounds::new(100, 100).unwrap();
        let bodies = two_bodies();
        assert!(Worker::new(comm, &bodies[..1], bounds, &SimulationConfig::default()).is_err());
    }
}
