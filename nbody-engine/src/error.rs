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
//! Error types
//!
//! Nothing in the engine is retried. Body counts outside the supported
//! range are clamped by the caller before they get here; every error below
//! ends the run.

use thiserror::Error;

/// Failure of a collective operation between workers
#[derive(Debug, Error, PartialEq)]
pub enum CollectiveError {
    /// A peer dropped its end of the channel mesh
    #[error("worker {rank} lost contact with worker {peer}")]
    Disconnected {
        /// Worker that observed the failure
        rank: usize,
        /// Worker that went away
        peer: usize,
    },
    /// A peer sent a message of the wrong kind for the current collective
    #[error("worker {rank} expected {expected} from worker {peer}")]
    UnexpectedMessage {
        /// Worker that observed the failure
        rank: usize,
        /// Worker that sent the message
        peer: usize,
        /// What the collective was waiting for
        expected: &'static str,
    },
    /// Contributions to a reduction had different lengths
    #[error("worker {rank} received {actual} records from worker {peer}, expected {expected}")]
    LengthMismatch {
        /// Worker that observed the failure
        rank: usize,
        /// Worker that sent the contribution
        peer: usize,
        /// Local record count
        expected: usize,
        /// Received record count
        actual: usize,
    },
    /// The root of a broadcast is not a member of the group
    #[error("broadcast root {root} is outside a group of {size}")]
    InvalidRoot {
        /// Requested root
        root: usize,
        /// Group size
        size: usize,
    },
}

/// Errors that abort a simulation run
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Fewer bodies than a simulation needs
    #[error("body count {count} is below the minimum of {min}")]
    TooFewBodies {
        /// Requested count
        count: usize,
        /// Smallest supported count
        min: usize,
    },
    /// More bodies than the configured limit
    #[error("body count {count} exceeds the limit of {max}")]
    TooManyBodies {
        /// Requested count
        count: usize,
        /// Configured limit
        max: usize,
    },
    /// A worker group needs at least one member
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
    /// The reflecting box has a zero dimension
    #[error("bounding box {width}x{height} must have positive dimensions")]
    InvalidBounds {
        /// Box width
        width: u32,
        /// Box height
        height: u32,
    },
    /// Mass or radius is not strictly positive and finite
    #[error("body {index} has invalid mass {mass} or radius {radius}")]
    InvalidBody {
        /// Index of the offending body
        index: usize,
        /// Its mass
        mass: f64,
        /// Its radius
        radius: f64,
    },
    /// A broadcast or reduction failed
    #[error(transparent)]
    Collective(#[from] CollectiveError),
    /// The raster used for the bounding box could not be read or written
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// Writing the report failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A worker thread panicked
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, SimulationError>;
