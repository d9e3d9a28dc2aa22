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

use crate::error::Result;
use crate::state::SimulationState;
use std::io::Write;

/// Write one line per body: x, y, force x, force y, velocity x, velocity y
///
/// Each field is ten characters wide with three decimals. Forces are those
/// of the last completed step.
pub fn write_report<W: Write>(out: &mut W, state: &SimulationState) -> Result<()> {
    let forces = state.forces().as_slice();
    for ((pos, vel), force) in state.positions().iter().zip(state.velocities()).zip(forces) {
        writeln!(
            out,
            "{:10.3} {:10.3} {:10.3} {:10.3} {:10.3} {:10.3}",
            pos.x(),
            pos.y(),
            force.fx,
            force.fy,
            vel.dx(),
            vel.dy()
        )?;
    }
    Ok(())
}
