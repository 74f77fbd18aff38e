//! Simulation driver: owns the core and runs the tick loop.

use crate::common::error::SimError;
use crate::config::HardwareConfig;
use crate::core::Core;
use crate::sim::program::Program;
use crate::stats::{ExuStats, SimStats};
use crate::trace::TraceSink;

/// Top-level simulation: a configured core plus its loaded program.
#[derive(Debug)]
pub struct Simulation {
    core: Core,
}

impl Simulation {
    /// Builds a core from `config`, installs `program`, and hands the trace
    /// sink to the architectural state.
    pub fn new(config: &HardwareConfig, program: Program, trace: Box<dyn TraceSink>) -> Self {
        tracing::info!(
            machine = %config.name,
            instructions = program.len(),
            units = config.execution_units.len(),
            "simulation configured"
        );
        let mut core = Core::new(config, trace);
        core.load_program(program);
        Self { core }
    }

    /// Resets the core and ticks until completion or `max_cycles`.
    ///
    /// Hitting the cycle cap is not an error: it is recorded in the returned
    /// stats and logged as a warning.
    ///
    /// # Errors
    ///
    /// Propagates fatal architectural errors from any tick.
    pub fn run(&mut self, max_cycles: u64) -> Result<SimStats, SimError> {
        self.core.reset()?;

        let mut cycles = 0;
        while !self.core.is_finished() && cycles < max_cycles {
            self.core.tick()?;
            cycles += 1;
        }

        let capped = !self.core.is_finished();
        if capped {
            tracing::warn!(max_cycles, "cycle cap reached before completion");
        }

        self.core.stop();
        self.core.state_mut().trace_mut().close();

        Ok(self.collect_stats(cycles, capped))
    }

    /// The core, for architectural inspection after a run.
    pub const fn core(&self) -> &Core {
        &self.core
    }

    /// The core, mutably.
    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn collect_stats(&self, cycles: u64, capped: bool) -> SimStats {
        let exus = self
            .core
            .lanes()
            .iter()
            .map(|lane| ExuStats {
                name: lane.unit.name().to_owned(),
                instructions: lane.unit.total_instructions(),
                busy_cycles: lane.unit.busy_cycles(),
            })
            .collect();
        SimStats {
            cycles,
            instructions_completed: self.core.total_completed(),
            cycle_cap_reached: capped,
            exus,
        }
    }
}
