//! Instruction Fetch Unit.
//!
//! Fetches one instruction per cycle from the loaded program, wraps it in a
//! fresh [`Uop`], and offers it on the output slot. If the downstream stage
//! has not claimed the previous uop the IFU stalls, ending the F interval so
//! the stall shows up as a gap in the trace. The IFU owns the uop id
//! allocator.

use crate::common::constants::LANE_IFU;
use crate::core::arch::state::ArchState;
use crate::sim::program::Program;
use crate::trace::{RetireKind, Stage};

use super::stage_data::StageData;
use super::uop::Uop;

/// Instruction fetch unit.
#[derive(Debug, Default)]
pub struct InstructionFetch {
    /// Output slot claimed by the decode/dispatch unit.
    pub output: StageData<Uop>,
    next_id: u64,
    cycle: u64,
    stalled: bool,
}

impl InstructionFetch {
    /// Creates an idle fetch unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the output slot and cycle state. Uop ids keep increasing
    /// across resets so they stay unique per simulation.
    pub fn reset(&mut self) {
        self.output.reset();
        self.stalled = false;
    }

    /// True when the program is exhausted and the output slot is drained.
    pub fn is_finished(&self, program: &Program, state: &ArchState) -> bool {
        program.is_finished(state.pc()) && !self.output.is_valid()
    }

    /// True while the downstream stage is holding this unit up.
    pub const fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Fetches the instruction at PC, or stalls if the output is unclaimed.
    pub fn tick(&mut self, program: &Program, state: &mut ArchState) {
        self.cycle += 1;

        if self.output.should_stall() {
            if !self.stalled {
                // First stalled cycle: end the F interval of the waiting uop.
                if let Some(uop) = self.output.peek() {
                    let id = uop.id;
                    state
                        .trace_mut()
                        .log_stage_end(id, Stage::Fetch, LANE_IFU, self.cycle);
                }
            }
            self.stalled = true;
            return;
        }
        self.stalled = false;

        let Some(insn) = program.fetch(state.pc()) else {
            return;
        };

        let uop = Uop {
            id: self.alloc_id(),
            insn: insn.clone(),
        };
        let label = uop.label();
        state.trace_mut().log_insn(uop.id, &label);
        state
            .trace_mut()
            .log_stage_start(uop.id, Stage::Fetch, LANE_IFU, self.cycle);
        self.output.prepare(uop);

        // NPC was set to pc + 1 at the top of this cycle, or to a branch
        // target by an execution unit earlier in the same cycle.
        let npc = state.npc();
        state.set_pc(npc);
    }

    /// Drops an unclaimed wrong-path fetch, logging it as flushed.
    pub fn squash(&mut self, state: &mut ArchState) {
        if let Some(uop) = self.output.claim() {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Fetch, LANE_IFU, self.cycle);
            state.trace_mut().log_retire(uop.id, RetireKind::Flush);
        }
        self.stalled = false;
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
