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
//! Benchmarks for the per-step hot paths
//!
//! These benchmarks measure:
//! - Local force accumulation over a worker's pair blocks
//! - Per-body integration (parallel when the `parallel` feature is on)
//! - Whole runs across worker counts, including the reduction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbody_engine::config::SimulationConfig;
use nbody_engine::forces::{accumulate_blocks, assign_pairs, GravityKernel};
use nbody_engine::integration::{Bounds, DragEulerIntegrator, Integrator};
use nbody_engine::partition::Partition;
use nbody_engine::scenario::generate_bodies;
use nbody_engine::{Simulation, SimulationState};

fn bounds() -> Bounds {
    Bounds::new(1024, 768).unwrap()
}

fn bench_force_accumulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_accumulation");
    let config = SimulationConfig::default();
    let kernel = GravityKernel::new(config.gravity());

    for n_bodies in [100, 500, 2000].iter() {
        let bodies = generate_bodies(*n_bodies, bounds(), config.seed());
        let mut state = SimulationState::from_bodies(&bodies, config.max_bodies()).unwrap();
        let partition = Partition::plan(*n_bodies, 1).unwrap();
        let blocks = assign_pairs(&partition, 0);

        group.throughput(Throughput::Elements((n_bodies * (n_bodies - 1) / 2) as u64));
        group.bench_with_input(BenchmarkId::new("all_pairs", n_bodies), n_bodies, |b, _| {
            b.iter(|| {
                let (positions, properties, forces) = state.split_for_forces();
                forces.clear();
                black_box(accumulate_blocks(&kernel, &blocks, positions, properties, forces))
            });
        });
    }

    group.finish();
}

fn bench_integration(c: &mut Criterion) {
    let mut group = c.benchmark_group("integration");
    let config = SimulationConfig::default();
    let integrator = DragEulerIntegrator::new(config.timestep(), config.friction());

    for n_bodies in [1000, 10_000].iter() {
        let bodies = generate_bodies(*n_bodies, bounds(), config.seed());
        let mut state = SimulationState::from_bodies(&bodies, config.max_bodies()).unwrap();

        group.throughput(Throughput::Elements(*n_bodies as u64));
        group.bench_with_input(BenchmarkId::new("drag_euler", n_bodies), n_bodies, |b, _| {
            b.iter(|| black_box(integrator.integrate(&mut state, &bounds())));
        });
    }

    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(10);
    let config = SimulationConfig::default();
    let bodies = generate_bodies(400, bounds(), config.seed());

    for workers in [1, 2, 4].iter() {
        let simulation = Simulation::new(config.clone(), bounds(), *workers).unwrap();
        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, _| {
            b.iter(|| black_box(simulation.run(bodies.clone(), 10, None).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_force_accumulation, bench_integration, bench_full_run);
criterion_main!(benches);
