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
//! # N-body Engine
//!
//! Direct-summation gravitational N-body simulation in a 2D reflecting box,
//! stepped in lockstep by a group of cooperating workers.
//!
//! ## Features
//!
//! - **Exact pairwise gravity**: every pair evaluated once per step, with a
//!   soft-core clamp for overlapping bodies
//! - **Work decomposition**: bodies split into contiguous ranges, pairs
//!   assigned so each one is computed by exactly one worker
//! - **Collective reduction**: per-worker forces summed into identical
//!   global forces on every worker
//! - **Parallelization**: optional Rayon integration for per-body updates
//! - **Process groups**: optional MPI backend (`mpi` feature), one worker
//!   per process; threads connected by channels otherwise
//! - **Visualization**: periodic PPM snapshots through a step observer
//!
//! ## Example
//!
//! ```rust
//! use nbody_engine::config::SimulationConfig;
//! use nbody_engine::integration::Bounds;
//! use nbody_engine::runtime::Simulation;
//! use nbody_engine::scenario::generate_bodies;
//!
//! let config = SimulationConfig::default();
//! let bounds = Bounds::new(100, 100).unwrap();
//! let bodies = generate_bodies(16, bounds, config.seed());
//!
//! let simulation = Simulation::new(config, bounds, 4).unwrap();
//! let outcome = simulation.run(bodies, 10, None).unwrap();
//! assert_eq!(outcome.state.len(), 16);
//! ```

#![warn(missing_docs)]

/// Physical constants and run configuration
pub mod config;

/// Error types
pub mod error;

/// Per-body state arrays
pub mod state;

/// Splitting bodies across workers
pub mod partition;

/// Pairwise gravitational forces
pub mod forces;

/// Broadcast and all-reduce across workers
pub mod collective;

/// Numerical integration methods
pub mod integration;

/// Memory pooling for reducing allocation churn
pub mod pool;

/// Lockstep step loop of a single worker
pub mod worker;

/// Thread-per-worker runner
pub mod runtime;

/// Seeded initial conditions
pub mod scenario;

/// Image and report output
pub mod io;

pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use runtime::{RunOutcome, Simulation};
pub use state::{Body, SimulationState};
pub use worker::StepObserver;
