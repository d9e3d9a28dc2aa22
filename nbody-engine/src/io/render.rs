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
//! Drawing bodies onto a canvas
//!
//! A pixel takes the colour of the lowest-indexed body whose disc, grown by
//! half a pixel, covers the pixel centre. Uncovered pixels are black. The
//! tint is a 12-bit ramp over the body index split into one nibble per
//! channel, so neighbouring indices get visibly different colours.

use super::Canvas;
use crate::error::Result;
use crate::state::SimulationState;
use crate::worker::StepObserver;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// RGB colour of body `index` out of `count`
pub fn body_tint(index: usize, count: usize) -> [u8; 3] {
    let tint = (0xfff * (index + 1)) / (count + 2);
    [
        ((tint & 0xf) << 4) as u8,
        (tint & 0xf0) as u8,
        ((tint & 0xf00) >> 4) as u8,
    ]
}

/// Redraw every pixel of `canvas` from the current positions
pub fn render_bodies(canvas: &mut Canvas, state: &SimulationState) {
    let positions = state.positions();
    let properties = state.properties();

    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let covering = positions.iter().zip(properties).position(|(pos, props)| {
                let dx = pos.x() - x as f64;
                let dy = pos.y() - y as f64;
                (dx * dx + dy * dy).sqrt() <= props.radius() + 0.5
            });

            let rgb = match covering {
                Some(index) => body_tint(index, state.len()),
                None => [0, 0, 0],
            };
            canvas.set_pixel(x, y, rgb);
        }
    }
}

/// Observer that periodically renders and saves the canvas
///
/// A snapshot is written once more than `interval` has passed since the
/// previous one. An interval of zero disables snapshots.
pub struct SnapshotObserver {
    canvas: Canvas,
    path: PathBuf,
    interval: Duration,
    last_update: Instant,
    snapshots: usize,
}

impl SnapshotObserver {
    /// Render into `canvas` and save it to `path` every `interval`
    pub fn new(canvas: Canvas, path: impl Into<PathBuf>, interval: Duration) -> Self {
        SnapshotObserver {
            canvas,
            path: path.into(),
            interval,
            last_update: Instant::now(),
            snapshots: 0,
        }
    }

    /// Whether snapshots are written at all
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Number of snapshots written so far
    pub fn snapshots(&self) -> usize {
        self.snapshots
    }

    /// The canvas as last rendered
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Render and save immediately
    pub fn snapshot(&mut self, state: &SimulationState) -> Result<()> {
        render_bodies(&mut self.canvas, state);
        self.canvas.save(&self.path)?;
        self.snapshots += 1;
        self.last_update = Instant::now();
        Ok(())
    }
}

impl StepObserver for SnapshotObserver {
    fn after_step(&mut self, step: u64, state: &SimulationState) -> Result<()> {
        if self.is_enabled() && self.last_update.elapsed() > self.interval {
            log::debug!("writing snapshot at step {} to {}", step, self.path.display());
            self.snapshot(state)?;
        }
        Ok(())
    }
}
