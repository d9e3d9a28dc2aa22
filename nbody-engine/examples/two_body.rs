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
//! Two heavy bodies falling towards each other
//!
//! Runs the same scenario on one and on two workers and prints the
//! separation and kinetic energy as the bodies approach.

use nbody_engine::integration::Bounds;
use nbody_engine::state::{Body, Position, Velocity};
use nbody_engine::{Simulation, SimulationConfig};

fn main() -> nbody_engine::Result<()> {
    env_logger::init();

    let bounds = Bounds::new(200, 200)?;
    let bodies = vec![
        Body::new(Position::new(60.0, 100.0), Velocity::zero(), 1000.0, 10.0),
        Body::new(Position::new(140.0, 100.0), Velocity::zero(), 1000.0, 10.0),
    ];

    // a larger step than the default so the bodies visibly move
    let config = SimulationConfig::default().with_timestep(1e-3);

    println!("=== Two Body Infall ===");
    println!("{:>8} {:>8} {:>12} {:>14}", "workers", "steps", "separation", "kinetic");

    for workers in [1, 2] {
        let simulation = Simulation::new(config.clone(), bounds, workers)?;
        for steps in [0, 100, 500, 1000] {
            let outcome = simulation.run(bodies.clone(), steps, None)?;
            let positions = outcome.state.positions();
            let separation = positions[1].x() - positions[0].x();

            println!(
                "{:>8} {:>8} {:>12.4} {:>14.4}",
                workers,
                steps,
                separation,
                outcome.state.total_kinetic_energy()
            );
        }
    }

    Ok(())
}
