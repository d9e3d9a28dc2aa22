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
//! Command-line driver
//!
//! Loads the PPM image that defines the box, runs the simulation, and
//! prints the final per-body report on stdout. Progress and timing go to
//! the log (stderr).
//!
//! Built with the `mpi` feature the binary is started under `mpirun`, one
//! process per worker; rank 0 does all image and report output.

use anyhow::{Context, Result};
use clap::Parser;
#[cfg(feature = "mpi")]
use mpi::traits::Communicator;
use nbody_engine::config::{clamp_body_count, parse_body_count, BodyCount, SimulationConfig, SEED};
use nbody_engine::io::{write_report, Canvas, SnapshotObserver};
use nbody_engine::scenario::generate_bodies;
use nbody_engine::state::Body;
use nbody_engine::{RunOutcome, Simulation, StepObserver};
use std::convert::Infallible;
use std::io::{BufWriter, Write};
#[cfg(not(feature = "mpi"))]
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "nbody")]
#[command(about = "Direct-summation gravitational N-body simulation")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Number of bodies (clamped to the supported range)
    #[arg(value_parser = lenient_body_count)]
    num_bodies: i64,

    /// Seconds between image updates (0 disables them)
    secs_per_update: u64,

    /// PPM image defining the box; overwritten by image updates
    ppm_output_file: PathBuf,

    /// Number of steps to run
    steps: u64,

    /// Number of worker threads (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for the initial conditions
    #[arg(long, default_value_t = SEED)]
    seed: u64,
}

// a body count never fails to parse; bad input is clamped instead
fn lenient_body_count(text: &str) -> std::result::Result<i64, Infallible> {
    Ok(parse_body_count(text))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // help and version also arrive here and are not failures
            let code = if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            let _ = err.print();
            return code;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Where the workers of a run live
enum Launcher {
    /// One thread per worker inside this process
    Threads(usize),
    /// One MPI process per worker; this process is one of them
    #[cfg(feature = "mpi")]
    Processes(mpi::environment::Universe),
}

impl Launcher {
    fn from_args(args: &Args) -> Result<Self> {
        #[cfg(feature = "mpi")]
        let launcher = {
            let universe = mpi::initialize().context("MPI was already initialized")?;
            if args.workers.is_some() {
                log::warn!("--workers is ignored; the MPI job size sets the worker count");
            }
            Launcher::Processes(universe)
        };

        #[cfg(not(feature = "mpi"))]
        let launcher = Launcher::Threads(args.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        }));

        Ok(launcher)
    }

    fn workers(&self) -> usize {
        match self {
            Launcher::Threads(workers) => *workers,
            #[cfg(feature = "mpi")]
            Launcher::Processes(universe) => universe.world().size() as usize,
        }
    }

    fn rank(&self) -> usize {
        match self {
            Launcher::Threads(_) => 0,
            #[cfg(feature = "mpi")]
            Launcher::Processes(universe) => universe.world().rank() as usize,
        }
    }

    /// Run the simulation; only rank 0 gets an outcome
    fn run(
        &self,
        simulation: &Simulation,
        bodies: Vec<Body>,
        steps: u64,
        observer: Option<&mut dyn StepObserver>,
    ) -> nbody_engine::Result<Option<RunOutcome>> {
        match self {
            Launcher::Threads(_) => simulation.run(bodies, steps, observer).map(Some),
            #[cfg(feature = "mpi")]
            Launcher::Processes(universe) => {
                let comm = nbody_engine::collective::MpiGroup::new(universe.world());
                simulation.run_member(comm, bodies, steps, observer)
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = SimulationConfig::default().with_seed(args.seed);
    let launcher = Launcher::from_args(&args)?;
    let root = launcher.rank() == 0;

    let count = clamp_body_count(args.num_bodies, config.max_bodies());
    if root {
        match count {
            BodyCount::ClampedToMax(n) => log::warn!("Using only {} bodies...", n),
            BodyCount::ClampedToMin(_) => log::warn!("Using two bodies..."),
            BodyCount::Exact(_) => {}
        }
    }

    let canvas = Canvas::load(&args.ppm_output_file)
        .with_context(|| format!("failed to load {}", args.ppm_output_file.display()))?;
    let bounds = canvas.bounds()?;

    let workers = launcher.workers();
    let simulation = Simulation::new(config, bounds, workers)?;

    if root {
        log::info!(
            "Running N-body with {} bodies and {} steps",
            count.value(),
            args.steps
        );
        log::debug!(
            "box {}x{}, {} workers, seed {}",
            bounds.width(),
            bounds.height(),
            workers,
            simulation.config().seed()
        );
    }

    // other ranks receive the bodies by broadcast
    let bodies = if root {
        generate_bodies(count.value(), bounds, simulation.config().seed())
    } else {
        Vec::new()
    };

    let mut snapshots = SnapshotObserver::new(
        canvas,
        &args.ppm_output_file,
        Duration::from_secs(args.secs_per_update),
    );
    let observer: Option<&mut dyn StepObserver> = if root && snapshots.is_enabled() {
        Some(&mut snapshots as &mut dyn StepObserver)
    } else {
        None
    };

    let Some(outcome) = launcher.run(&simulation, bodies, args.steps, observer)? else {
        return Ok(());
    };
    log::info!("N-body took {:10.3} seconds", outcome.elapsed.as_secs_f64());

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_report(&mut out, &outcome.state)?;
    out.flush()?;
    Ok(())
}
