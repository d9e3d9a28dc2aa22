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
//! Running a worker group to completion
//!
//! [`Simulation::run`] starts one OS thread per worker, connects them with
//! a [`ChannelGroup`], hands the initial bodies to rank 0 for broadcast,
//! and waits for every worker to finish. Rank 0's replica is returned.
//!
//! When the group already exists outside this process, as with one MPI
//! process per worker, each member calls [`Simulation::run_member`] with
//! its own endpoint instead.
//!
//! A failure on any worker ends the run. Its peers then see their channels
//! close and fail too; the runtime reports the original failure rather than
//! the disconnects it caused.

use crate::collective::{ChannelGroup, Collective};
use crate::config::SimulationConfig;
use crate::error::{CollectiveError, Result, SimulationError};
use crate::integration::Bounds;
use crate::state::{Body, SimulationState};
use crate::worker::{StepObserver, StepPhase, Worker};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final state as held by rank 0
    pub state: SimulationState,
    /// Number of steps executed
    pub steps: u64,
    /// Wall-clock time of the stepping loop on rank 0
    pub elapsed: Duration,
}

/// A configured worker group
///
/// # Example
///
/// ```
/// use nbody_engine::config::SimulationConfig;
/// use nbody_engine::integration::Bounds;
/// use nbody_engine::runtime::Simulation;
/// use nbody_engine::scenario::generate_bodies;
///
/// let bounds = Bounds::new(64, 64).unwrap();
/// let bodies = generate_bodies(8, bounds, 7);
/// let simulation = Simulation::new(SimulationConfig::default(), bounds, 2).unwrap();
///
/// let outcome = simulation.run(bodies, 5, None).unwrap();
/// assert_eq!(outcome.state.steps_completed(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    bounds: Bounds,
    workers: usize,
}

impl Simulation {
    /// Configure a group of `workers` workers
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` is zero.
    pub fn new(config: SimulationConfig, bounds: Bounds, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(SimulationError::InvalidWorkerCount);
        }
        Ok(Simulation {
            config,
            bounds,
            workers,
        })
    }

    /// Number of workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Physical configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Reflecting box
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Run `steps` steps starting from `bodies`
    ///
    /// `observer` runs on rank 0 after every step.
    pub fn run(&self, bodies: Vec<Body>, steps: u64, observer: Option<&mut dyn StepObserver>) -> Result<RunOutcome> {
        if self.workers > bodies.len() {
            log::warn!(
                "{} workers for {} bodies; some workers own no bodies",
                self.workers,
                bodies.len()
            );
        }

        let endpoints = ChannelGroup::create(self.workers);
        let mut bodies = Some(bodies);
        let mut observer = observer;

        let results: Vec<Result<Option<RunOutcome>>> = thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .enumerate()
                .map(|(rank, endpoint)| {
                    let initial = if rank == 0 { bodies.take().unwrap_or_default() } else { Vec::new() };
                    let observer = if rank == 0 { observer.take() } else { None };
                    let handle = scope.spawn(move || self.run_member(endpoint, initial, steps, observer));
                    (rank, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(rank, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(SimulationError::WorkerPanicked(rank)))
                })
                .collect()
        });

        let mut outcome = None;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(Some(root)) => outcome = Some(root),
                Ok(None) => {}
                Err(err) => first_error = Some(pick_root_cause(first_error, err)),
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        outcome.ok_or(SimulationError::WorkerPanicked(0))
    }

    /// Run this process's member of an existing group
    ///
    /// Rank 0 passes the initial bodies, which are broadcast to the other
    /// members; they may pass an empty vector. Only rank 0 gets an outcome,
    /// every other member returns `Ok(None)`.
    pub fn run_member<C: Collective>(
        &self,
        comm: C,
        bodies: Vec<Body>,
        steps: u64,
        observer: Option<&mut dyn StepObserver>,
    ) -> Result<Option<RunOutcome>> {
        let mut worker = Worker::bootstrap(comm, bodies, self.bounds, &self.config)?;

        let start = Instant::now();
        if let Err(err) = worker.run(steps, observer) {
            let waiting = if worker.phase().is_some_and(StepPhase::is_collective) {
                " while exchanging forces"
            } else {
                ""
            };
            log::error!(
                "worker {} failed during {:?}{}: {}",
                worker.rank(),
                worker.phase(),
                waiting,
                err
            );
            return Err(err);
        }
        let elapsed = start.elapsed();

        if worker.rank() != 0 {
            return Ok(None);
        }
        Ok(Some(RunOutcome {
            state: worker.into_state(),
            steps,
            elapsed,
        }))
    }
}

/// Keep the more informative of two worker errors
///
/// A closed channel only says that some other worker went away, so any
/// other error wins over it.
fn pick_root_cause(current: Option<SimulationError>, candidate: SimulationError) -> SimulationError {
    match current {
        None => candidate,
        Some(SimulationError::Collective(CollectiveError::Disconnected { .. }))
            if !matches!(candidate, SimulationError::Collective(CollectiveError::Disconnected { .. })) =>
        {
            candidate
        }
        Some(current) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Position, Velocity};

    fn bodies() -> Vec<Body> {
        vec![
            Body::new(Position::new(10.0, 10.0), Velocity::new(1.0, 0.0), 1.0, 1.0),
            Body::new(Position::new(50.0, 50.0), Velocity::new(0.0, -1.0), 8.0, 2.0),
            Body::new(Position::new(90.0, 20.0), Velocity::zero(), 27.0, 3.0),
        ]
    }

    struct FailAt(u64);

    impl StepObserver for FailAt {
        fn after_step(&mut self, step: u64, _state: &SimulationState) -> Result<()> {
            if step == self.0 {
                return Err(SimulationError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            Ok(())
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let bounds = Bounds::new(10, 10).unwrap();
        assert!(matches!(
            Simulation::new(SimulationConfig::default(), bounds, 0),
            Err(SimulationError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn test_run_returns_root_state() {
        let bounds = Bounds::new(100, 100).unwrap();
        let simulation = Simulation::new(SimulationConfig::default(), bounds, 3).unwrap();
        let outcome = simulation.run(bodies(), 4, None).unwrap();

        assert_eq!(outcome.steps, 4);
        assert_eq!(outcome.state.len(), 3);
        assert_eq!(outcome.state.steps_completed(), 4);
    }

    #[test]
    fn test_run_member_on_single_endpoint() {
        let bounds = Bounds::new(100, 100).unwrap();
        let simulation = Simulation::new(SimulationConfig::default(), bounds, 1).unwrap();
        let comm = ChannelGroup::create(1).remove(0);

        let outcome = simulation.run_member(comm, bodies(), 3, None).unwrap().unwrap();
        assert_eq!(outcome.state.steps_completed(), 3);
        assert_eq!(outcome.state.bodies(), simulation.run(bodies(), 3, None).unwrap().state.bodies());
    }

    #[test]
    fn test_more_workers_than_bodies() {
        let bounds = Bounds::new(100, 100).unwrap();
        let simulation = Simulation::new(SimulationConfig::default(), bounds, 5).unwrap();
        let outcome = simulation.run(bodies(), 2, None).unwrap();
        assert_eq!(outcome.state.steps_completed(), 2);
    }

    #[test]
    fn test_observer_failure_ends_run() {
        let bounds = Bounds::new(100, 100).unwrap();
        let simulation = Simulation::new(SimulationConfig::default(), bounds, 3).unwrap();
        let mut observer = FailAt(2);

        let err = simulation.run(bodies(), 10, Some(&mut observer)).unwrap_err();
        assert!(matches!(err, SimulationError::Io(_)));
    }

    #[test]
    fn test_too_few_bodies_fails_on_every_worker() {
        let bounds = Bounds::new(100, 100).unwrap();
        let simulation = Simulation::new(SimulationConfig::default(), bounds, 2).unwrap();
        let one = bodies().into_iter().take(1).collect();

        let err = simulation.run(one, 1, None).unwrap_err();
        assert!(matches!(err, SimulationError::TooFewBodies { count: 1, min: 2 }));
    }

    #[test]
    fn test_disconnect_loses_to_root_cause() {
        let disconnect = SimulationError::Collective(CollectiveError::Disconnected { rank: 1, peer: 0 });
        let picked = pick_root_cause(Some(disconnect), SimulationError::WorkerPanicked(0));
        assert!(matches!(picked, SimulationError::WorkerPanicked(0)));

        let picked = pick_root_cause(
            Some(SimulationError::InvalidWorkerCount),
            SimulationError::Collective(CollectiveError::Disconnected { rank: 1, peer: 0 }),
        );
        assert!(matches!(picked, SimulationError::InvalidWorkerCount));
    }
}
