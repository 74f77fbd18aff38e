//! Instruction Decode / Dispatch Unit.
//!
//! Claims one uop at a time from the fetch unit, observes its pre-dispatch
//! delay, resolves barriers against the DMA flags, and routes everything
//! else to a compatible execution unit's input slot under the configured
//! dispatch strategy. While stalled (delay, backpressure, or a set barrier
//! flag) the D interval stays open, so stalls render as long D spans in the
//! trace.

use std::collections::HashMap;

use crate::common::constants::{LANE_IDU, LANE_IFU};
use crate::common::error::SimError;
use crate::config::DispatchStrategy;
use crate::core::arch::state::ArchState;
use crate::core::units::ExuLane;
use crate::isa::InstructionClass;
use crate::trace::Stage;

use super::stage_data::StageData;
use super::uop::Uop;

/// A claimed uop waiting out its dispatch delay or backpressure.
#[derive(Debug)]
struct PendingDispatch {
    uop: Uop,
    delay_left: u64,
}

/// Instruction decode/dispatch unit.
#[derive(Debug)]
pub struct InstructionDecode {
    current: Option<PendingDispatch>,
    routes: HashMap<InstructionClass, Vec<usize>>,
    strategy: DispatchStrategy,
    cycle: u64,
    stalled: bool,
}

impl InstructionDecode {
    /// Builds the dispatch unit, deriving the class → unit routing table
    /// from each execution unit's supported classes.
    pub fn new(strategy: DispatchStrategy, lanes: &[ExuLane]) -> Self {
        let mut routes: HashMap<InstructionClass, Vec<usize>> = HashMap::new();
        for (idx, lane) in lanes.iter().enumerate() {
            for &class in lane.unit.supported_classes() {
                routes.entry(class).or_default().push(idx);
            }
        }
        Self {
            current: None,
            routes,
            strategy,
            cycle: 0,
            stalled: false,
        }
    }

    /// Drops any in-progress uop and stall state.
    pub fn reset(&mut self) {
        self.current = None;
        self.stalled = false;
    }

    /// True when nothing is in progress and every dispatch slot is drained.
    pub fn is_finished(&self, lanes: &[ExuLane]) -> bool {
        self.current.is_none() && lanes.iter().all(|lane| !lane.input.is_valid())
    }

    /// True while dispatch is blocked (delay, backpressure, or barrier).
    pub const fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Runs one cycle: progress the in-flight uop or claim a new one.
    ///
    /// # Errors
    ///
    /// Propagates flag-protocol violations and unroutable classes.
    pub fn tick(
        &mut self,
        ifu_output: &mut StageData<Uop>,
        lanes: &mut [ExuLane],
        state: &mut ArchState,
    ) -> Result<(), SimError> {
        self.cycle += 1;

        if self.current.is_some() {
            if let Some(cur) = self.current.as_mut() {
                if cur.delay_left > 0 {
                    cur.delay_left -= 1;
                    return Ok(());
                }
            }
            if self.check_backpressure(lanes, state)? {
                return Ok(());
            }
            self.dispatch(lanes, state)?;
            self.stalled = false;
        } else {
            let Some(uop) = ifu_output.claim() else {
                return Ok(());
            };
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Fetch, LANE_IFU, self.cycle);
            state
                .trace_mut()
                .log_stage_start(uop.id, Stage::Dispatch, LANE_IDU, self.cycle);

            let delay = uop.insn.delay;
            self.current = Some(PendingDispatch {
                uop,
                delay_left: delay,
            });
            if delay > 0 {
                if let Some(cur) = self.current.as_mut() {
                    cur.delay_left -= 1;
                }
                self.stalled = true;
                return Ok(());
            }
            if self.check_backpressure(lanes, state)? {
                return Ok(());
            }
            self.dispatch(lanes, state)?;
        }
        Ok(())
    }

    /// Checks whether the current uop must keep waiting.
    ///
    /// Barriers wait on their flag; everything else waits on the input slot
    /// of the *first* unit supporting its class (the strategy may later pick
    /// a different unit, which is part of the modeled policy).
    fn check_backpressure(
        &mut self,
        lanes: &[ExuLane],
        state: &ArchState,
    ) -> Result<bool, SimError> {
        let Some(cur) = self.current.as_ref() else {
            return Ok(false);
        };
        let op = &cur.uop.insn.op;

        if let Some(flag) = op.barrier_flag() {
            let blocked = state.check_flag(flag)?;
            self.stalled = blocked;
            return Ok(blocked);
        }

        let class = op.class();
        let first = *self
            .route(class)?
            .first()
            .ok_or(SimError::NoUnitForClass(class.name()))?;
        if lanes[first].input.should_stall() {
            // Keep the D interval open: the stage ends at actual dispatch.
            self.stalled = true;
            return Ok(true);
        }
        self.stalled = false;
        Ok(false)
    }

    /// Routes the current uop to an execution unit (or consumes a barrier).
    fn dispatch(&mut self, lanes: &mut [ExuLane], state: &mut ArchState) -> Result<(), SimError> {
        let Some(pending) = self.current.take() else {
            return Ok(());
        };
        debug_assert_eq!(pending.delay_left, 0, "dispatch with delay remaining");
        let uop = pending.uop;
        let class = uop.insn.op.class();

        if class == InstructionClass::Barrier {
            state
                .trace_mut()
                .log_stage_end(uop.id, Stage::Dispatch, LANE_IDU, self.cycle + 1);
            return Ok(());
        }

        // The flag must be clear before a DMA leaves dispatch; it is set
        // here and cleared by the DMA unit at retire.
        if let Some(flag) = uop.insn.op.dma_flag() {
            if state.check_flag(flag)? {
                return Err(SimError::FlagInvariant(flag));
            }
            state.set_flag(flag)?;
        }

        let target = self.choose_target(class, lanes)?;
        lanes[target].input.prepare(uop);
        Ok(())
    }

    /// Applies the dispatch strategy over the units supporting `class`.
    fn choose_target(&self, class: InstructionClass, lanes: &[ExuLane]) -> Result<usize, SimError> {
        let candidates = self.route(class)?;
        let chosen = match self.strategy {
            DispatchStrategy::RoundRobin => candidates[self.cycle as usize % candidates.len()],
            DispatchStrategy::Greedy => candidates
                .iter()
                .copied()
                .find(|&idx| !lanes[idx].unit.is_busy())
                .unwrap_or(candidates[0]),
            DispatchStrategy::Dummy => candidates[0],
        };
        Ok(chosen)
    }

    fn route(&self, class: InstructionClass) -> Result<&Vec<usize>, SimError> {
        self.routes
            .get(&class)
            .filter(|list| !list.is_empty())
            .ok_or(SimError::NoUnitForClass(class.name()))
    }
}
