//! Vector execution unit: single issue, latency 1, bf16 elementwise.
//!
//! Structurally a twin of the scalar unit; only the accepted class differs.

use crate::common::constants::LANE_IDU;
use crate::common::error::SimError;
use crate::core::arch::state::ArchState;
use crate::core::pipeline::stage_data::StageData;
use crate::core::pipeline::uop::Uop;
use crate::isa::InstructionClass;
use crate::trace::{RetireKind, Stage};

use super::ExecutionUnit;

const CLASSES: &[InstructionClass] = &[InstructionClass::Vector];

/// Executes one vector instruction per cycle.
#[derive(Debug)]
pub struct VectorExecutionUnit {
    name: String,
    lane: usize,
    cycle: u64,
    pending_retire: Option<Uop>,
    complete: u64,
    total: u64,
    busy: u64,
}

impl VectorExecutionUnit {
    /// Creates an idle vector unit on `lane`.
    pub fn new(name: &str, lane: usize) -> Self {
        Self {
            name: name.to_owned(),
            lane,
            cycle: 0,
            pending_retire: None,
            complete: 0,
            total: 0,
            busy: 0,
        }
    }
}

impl ExecutionUnit for VectorExecutionUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn lane(&self) -> usize {
        self.lane
    }

    fn reset(&mut self) {
        self.pending_retire = None;
        self.complete = 0;
        self.total = 0;
        self.busy = 0;
    }

    fn tick(
        &mut self,
        input: &mut StageData<Uop>,
        state: &mut ArchState,
    ) -> Result<(), SimError> {
        self.cycle += 1;

        if let Some(uop) = self.pending_retire.take() {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Execute, self.lane, self.cycle);
            state.trace_mut().log_retire(uop.id, RetireKind::Retire);
        }

        self.complete = 0;

        if let Some(uop) = input.claim() {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Dispatch, LANE_IDU, self.cycle);
            state
                .trace_mut()
                .log_stage_start(uop.id, Stage::Execute, self.lane, self.cycle);

            if !uop.insn.op.is_nop() {
                self.busy += 1;
            }
            self.total += 1;
            self.complete = 1;

            uop.insn.op.apply(state)?;
            self.pending_retire = Some(uop);
        }
        Ok(())
    }

    fn flush_completions(&mut self, state: &mut ArchState) {
        if let Some(uop) = self.pending_retire.take() {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Execute, self.lane, self.cycle);
            state.trace_mut().log_retire(uop.id, RetireKind::Retire);
        }
    }

    fn has_in_flight(&self) -> bool {
        false
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn complete_count(&self) -> u64 {
        self.complete
    }

    fn total_instructions(&self) -> u64 {
        self.total
    }

    fn busy_cycles(&self) -> u64 {
        self.busy
    }

    fn supported_classes(&self) -> &'static [InstructionClass] {
        CLASSES
    }
}
