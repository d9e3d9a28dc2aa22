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
//! Input and output around a run
//!
//! - [`Canvas`]: the PPM raster that defines the box and receives renders
//! - [`render_bodies`] and [`SnapshotObserver`]: periodic visualization
//! - [`write_report`]: the final per-body text report

mod canvas;
mod render;
mod report;

pub use canvas::Canvas;
pub use render::{body_tint, render_bodies, SnapshotObserver};
pub use report::write_report;
