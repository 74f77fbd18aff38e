//! Matrix execution units: one uop in flight, `mrf_depth`-cycle latency.
//!
//! The systolic and inner-product variants share this model and differ only
//! in the classes they accept. The unit *peeks* its input slot when it
//! accepts work and claims only at completion, so the dispatch stage sees
//! the slot as full for the entire matmul and backpressure covers the whole
//! latency window.

use crate::common::constants::LANE_IDU;
use crate::common::error::SimError;
use crate::core::arch::state::ArchState;
use crate::core::pipeline::stage_data::StageData;
use crate::core::pipeline::uop::Uop;
use crate::isa::InstructionClass;
use crate::trace::{RetireKind, Stage};

use super::ExecutionUnit;

const SYSTOLIC_CLASSES: &[InstructionClass] =
    &[InstructionClass::Matrix, InstructionClass::MatrixSystolic];
const INNER_CLASSES: &[InstructionClass] =
    &[InstructionClass::Matrix, InstructionClass::MatrixInner];

/// Countdown for the uop currently held (but not yet claimed) in the slot.
#[derive(Debug)]
struct InFlight {
    id: u64,
    remaining: u64,
    nop: bool,
}

/// Long-latency matrix unit with peek-and-hold backpressure.
#[derive(Debug)]
pub struct MatrixExecutionUnit {
    name: String,
    lane: usize,
    latency: u64,
    classes: &'static [InstructionClass],
    cycle: u64,
    in_flight: Option<InFlight>,
    pending_retires: Vec<Uop>,
    complete: u64,
    total: u64,
    busy: u64,
}

impl MatrixExecutionUnit {
    /// Creates the systolic-array variant (`MATRIX`, `MATRIX_SYSTOLIC`).
    pub fn systolic(name: &str, lane: usize, latency: u64) -> Self {
        Self::build(name, lane, latency, SYSTOLIC_CLASSES)
    }

    /// Creates the inner-product variant (`MATRIX`, `MATRIX_INNER`).
    pub fn inner(name: &str, lane: usize, latency: u64) -> Self {
        Self::build(name, lane, latency, INNER_CLASSES)
    }

    fn build(name: &str, lane: usize, latency: u64, classes: &'static [InstructionClass]) -> Self {
        Self {
            name: name.to_owned(),
            lane,
            latency: latency.max(1),
            classes,
            cycle: 0,
            in_flight: None,
            pending_retires: Vec::new(),
            complete: 0,
            total: 0,
            busy: 0,
        }
    }
}

impl ExecutionUnit for MatrixExecutionUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn lane(&self) -> usize {
        self.lane
    }

    fn reset(&mut self) {
        self.in_flight = None;
        self.pending_retires.clear();
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

        for uop in self.pending_retires.drain(..) {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Execute, self.lane, self.cycle);
            state.trace_mut().log_retire(uop.id, RetireKind::Retire);
        }

        self.complete = 0;

        if self.in_flight.is_none() {
            // Peek, do not claim: the occupied slot is what backpressures
            // the dispatch stage for the whole latency window.
            if let Some(uop) = input.peek() {
                self.in_flight = Some(InFlight {
                    id: uop.id,
                    remaining: self.latency,
                    nop: uop.insn.op.is_nop(),
                });
                self.total += 1;
                let id = uop.id;
                state
                    .trace_mut()
                    .log_stage_end(id, Stage::Dispatch, LANE_IDU, self.cycle);
                state
                    .trace_mut()
                    .log_stage_start(id, Stage::Execute, self.lane, self.cycle);
            }
        }

        if self.is_busy() {
            self.busy += 1;
        }

        if let Some(fl) = self.in_flight.as_mut() {
            fl.remaining -= 1;
            if fl.remaining == 0 {
                let expected = fl.id;
                self.in_flight = None;
                if let Some(uop) = input.claim() {
                    debug_assert_eq!(uop.id, expected, "slot changed under peek-and-hold");
                    uop.insn.op.apply(state)?;
                    self.complete = 1;
                    self.pending_retires.push(uop);
                }
            }
        }
        Ok(())
    }

    fn flush_completions(&mut self, state: &mut ArchState) {
        for uop in self.pending_retires.drain(..) {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Execute, self.lane, self.cycle);
            state.trace_mut().log_retire(uop.id, RetireKind::Retire);
        }
    }

    fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    fn is_busy(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|fl| !fl.nop)
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
        self.classes
    }
}
