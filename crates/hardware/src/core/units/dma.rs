//! DMA execution unit: bounded in-flight queue, size-dependent latency.
//!
//! Up to [`DMA_QUEUE_DEPTH`] transfers queue up FIFO; only the head makes
//! progress, at `DMA_SETUP_CYCLES + size` cycles per transfer. A transfer's
//! completion flag is cleared in the deferred-retire step, the same tick its
//! retire is logged, so a barrier waiting on that flag unblocks in the
//! dispatch stage of the very same cycle.

use std::collections::VecDeque;

use crate::common::constants::{DMA_QUEUE_DEPTH, DMA_SETUP_CYCLES, LANE_IDU};
use crate::common::error::SimError;
use crate::core::arch::state::ArchState;
use crate::core::pipeline::stage_data::StageData;
use crate::core::pipeline::uop::Uop;
use crate::isa::InstructionClass;
use crate::trace::{RetireKind, Stage};

use super::ExecutionUnit;

const CLASSES: &[InstructionClass] = &[InstructionClass::Dma];

/// One queued transfer and its remaining cycles.
#[derive(Debug)]
struct DmaJob {
    uop: Uop,
    remaining: u64,
}

/// DMA engine with a bounded FIFO of in-flight transfers.
#[derive(Debug)]
pub struct DmaExecutionUnit {
    name: String,
    lane: usize,
    cycle: u64,
    queue: VecDeque<DmaJob>,
    pending_retires: Vec<Uop>,
    complete: u64,
    total: u64,
    busy: u64,
}

impl DmaExecutionUnit {
    /// Creates an idle DMA unit on `lane`.
    pub fn new(name: &str, lane: usize) -> Self {
        Self {
            name: name.to_owned(),
            lane,
            cycle: 0,
            queue: VecDeque::with_capacity(DMA_QUEUE_DEPTH),
            pending_retires: Vec::new(),
            complete: 0,
            total: 0,
            busy: 0,
        }
    }

    /// Cycles a transfer of `size` bytes occupies the head of the queue.
    pub const fn latency(size: usize) -> u64 {
        DMA_SETUP_CYCLES + size as u64
    }
}

impl ExecutionUnit for DmaExecutionUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn lane(&self) -> usize {
        self.lane
    }

    fn reset(&mut self) {
        self.queue.clear();
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
            if let Some(flag) = uop.insn.op.dma_flag() {
                state.clear_flag(flag)?;
                tracing::debug!(unit = %self.name, flag, "DMA cleared flag");
            }
            // The next transfer had been waiting its turn; its E starts now.
            if let Some(head) = self.queue.front() {
                state
                    .trace_mut()
                    .log_stage_start(head.uop.id, Stage::Execute, self.lane, self.cycle);
            }
        }

        self.complete = 0;

        if self.queue.len() < DMA_QUEUE_DEPTH {
            if let Some(uop) = input.claim() {
                let remaining = Self::latency(uop.insn.op.dma_size().unwrap_or(0));
                self.total += 1;
                state
                    .trace_mut()
                    .log_stage_end(uop.id, Stage::Dispatch, LANE_IDU, self.cycle);
                if self.queue.is_empty() {
                    state
                        .trace_mut()
                        .log_stage_start(uop.id, Stage::Execute, self.lane, self.cycle);
                }
                self.queue.push_back(DmaJob { uop, remaining });
            }
        }

        if self.is_busy() {
            self.busy += 1;
        }

        if let Some(head) = self.queue.front_mut() {
            head.remaining -= 1;
            if head.remaining == 0 {
                if let Some(job) = self.queue.pop_front() {
                    job.uop.insn.op.apply(state)?;
                    self.complete = 1;
                    self.pending_retires.push(job.uop);
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
        !self.queue.is_empty()
    }

    fn is_busy(&self) -> bool {
        self.queue.front().is_some_and(|job| !job.uop.insn.op.is_nop())
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
