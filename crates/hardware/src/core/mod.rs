//! NPU core: wiring and per-cycle orchestration.
//!
//! This module contains the architectural state, the pipeline units, the
//! execution units, and the [`Core`] that ticks them. Components tick in
//! reverse pipeline order (execution units first, then dispatch, then fetch)
//! so each downstream stage observes the upstream slot as it stood at the
//! end of the previous cycle and no uop advances two stages in one tick.

/// Architectural state (register files, memory, flags, PC/NPC).
pub mod arch;

/// Pipeline (handshake channel, fetch, decode/dispatch).
pub mod pipeline;

/// Execution units (scalar, matrix, vector, DMA).
pub mod units;

use crate::common::error::SimError;
use crate::config::HardwareConfig;
use crate::sim::program::Program;
use crate::trace::TraceSink;

use self::arch::ArchState;
use self::pipeline::{InstructionDecode, InstructionFetch};
use self::units::{ExuLane, build_execution_unit};

/// One NPU core: architectural state plus all pipeline components.
#[derive(Debug)]
pub struct Core {
    state: ArchState,
    ifu: InstructionFetch,
    idu: InstructionDecode,
    lanes: Vec<ExuLane>,
    program: Program,
    total_completed: u64,
}

impl Core {
    /// Builds a core from its configuration, taking ownership of the trace
    /// sink. Execution units get trace lanes 2, 3, … in roster order.
    pub fn new(config: &HardwareConfig, trace: Box<dyn TraceSink>) -> Self {
        let state = ArchState::new(
            config.arch_state.clone(),
            config.pipeline_latency,
            trace,
        );
        let lanes: Vec<ExuLane> = config
            .execution_units
            .iter()
            .enumerate()
            .map(|(idx, eu)| ExuLane {
                unit: build_execution_unit(
                    eu.kind,
                    &eu.name,
                    crate::common::constants::LANE_EXU_BASE + idx,
                    &config.arch_state,
                ),
                input: pipeline::StageData::new(),
            })
            .collect();
        let idu = InstructionDecode::new(config.dispatch_strategy, &lanes);
        Self {
            state,
            ifu: InstructionFetch::new(),
            idu,
            lanes,
            program: Program::empty(),
            total_completed: 0,
        }
    }

    /// Installs a program. Its memory image is applied on [`reset`](Self::reset).
    pub fn load_program(&mut self, program: Program) {
        self.program = program;
    }

    /// Resets all components and applies the program's memory image.
    ///
    /// # Errors
    ///
    /// Propagates out-of-bounds preload regions.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.state.reset();
        for region in self.program.memory_regions() {
            self.state.write_memory(region.base, &region.bytes)?;
        }
        self.ifu.reset();
        self.idu.reset();
        for lane in &mut self.lanes {
            lane.unit.reset();
            lane.input.reset();
        }
        self.total_completed = 0;
        Ok(())
    }

    /// Advances the core by one cycle.
    ///
    /// # Errors
    ///
    /// Propagates fatal architectural errors (flag protocol, shapes, bounds).
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.state.trace_mut().log_cycle(1);

        // Sequential next PC; control-flow effects overwrite it below.
        let npc = self.state.pc() + 1;
        self.state.set_npc(npc);

        for lane in &mut self.lanes {
            lane.unit.tick(&mut lane.input, &mut self.state)?;
            self.total_completed += lane.unit.complete_count();
        }

        // A taken branch resolved this cycle: the unclaimed fetch is on the
        // wrong path. Squash it and steer fetch to the target immediately.
        if self.state.take_redirect() {
            self.ifu.squash(&mut self.state);
            let target = self.state.npc();
            self.state.set_pc(target);
            self.state.set_npc(target + 1);
        }

        self.idu
            .tick(&mut self.ifu.output, &mut self.lanes, &mut self.state)?;

        self.ifu.tick(&self.program, &mut self.state);
        Ok(())
    }

    /// True when fetch is exhausted, dispatch is idle, and no unit has work
    /// in flight.
    pub fn is_finished(&self) -> bool {
        self.ifu.is_finished(&self.program, &self.state)
            && self.idu.is_finished(&self.lanes)
            && self.lanes.iter().all(|lane| !lane.unit.has_in_flight())
    }

    /// Flushes deferred completion logging; call once after the run loop.
    pub fn stop(&mut self) {
        for lane in &mut self.lanes {
            lane.unit.flush_completions(&mut self.state);
        }
    }

    /// The architectural state.
    pub const fn state(&self) -> &ArchState {
        &self.state
    }

    /// The architectural state, mutably (driver and test access).
    pub fn state_mut(&mut self) -> &mut ArchState {
        &mut self.state
    }

    /// The execution-unit lanes, in roster order.
    pub fn lanes(&self) -> &[ExuLane] {
        &self.lanes
    }

    /// Total uops completed by execution units so far (barriers excluded:
    /// they are consumed by the dispatch stage).
    pub const fn total_completed(&self) -> u64 {
        self.total_completed
    }
}
