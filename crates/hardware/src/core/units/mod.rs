//! Execution units.
//!
//! Each unit claims uops from its own input slot, models a latency, applies
//! the uop's architectural effect at completion, and logs the E interval and
//! retire one cycle after finishing (so the completion is visible in the
//! trace). Four models ship with the core:
//! 1. **Scalar / Vector:** single-issue, latency 1.
//! 2. **Matrix (systolic / inner):** one uop in flight for `mrf_depth`
//!    cycles, peek-and-hold backpressure.
//! 3. **DMA:** bounded FIFO of in-flight transfers, size-dependent latency.

use crate::common::error::SimError;
use crate::config::{ArchStateConfig, ExecutionUnitKind};
use crate::core::arch::state::ArchState;
use crate::core::pipeline::stage_data::StageData;
use crate::core::pipeline::uop::Uop;
use crate::isa::InstructionClass;

/// DMA execution unit.
pub mod dma;
/// Matrix execution units (systolic and inner-product variants).
pub mod matrix;
/// Scalar execution unit.
pub mod scalar;
/// Vector execution unit.
pub mod vector;

pub use self::dma::DmaExecutionUnit;
pub use self::matrix::MatrixExecutionUnit;
pub use self::scalar::ScalarExecutionUnit;
pub use self::vector::VectorExecutionUnit;

/// Common behavior of every execution unit.
pub trait ExecutionUnit {
    /// Display name from the configuration roster.
    fn name(&self) -> &str;

    /// Trace lane this unit logs on.
    fn lane(&self) -> usize;

    /// Returns the unit to its post-construction state.
    fn reset(&mut self);

    /// Runs one cycle: log deferred retires, accept work from `input`,
    /// advance in-flight work, apply effects at completion.
    ///
    /// # Errors
    ///
    /// Propagates fatal architectural errors from effect application.
    fn tick(&mut self, input: &mut StageData<Uop>, state: &mut ArchState)
    -> Result<(), SimError>;

    /// Logs any retire still deferred; called once when the run stops.
    fn flush_completions(&mut self, state: &mut ArchState);

    /// True while work is in flight (completion logging does not count).
    fn has_in_flight(&self) -> bool;

    /// True while the unit is doing useful (non-`nop`) work; consulted by
    /// the greedy dispatch strategy.
    fn is_busy(&self) -> bool;

    /// Uops completed in the most recent cycle.
    fn complete_count(&self) -> u64;

    /// Total uops accepted over the run.
    fn total_instructions(&self) -> u64;

    /// Cycles spent doing useful work.
    fn busy_cycles(&self) -> u64;

    /// Instruction classes this unit accepts; drives the routing table.
    fn supported_classes(&self) -> &'static [InstructionClass];
}

/// One execution unit together with its dispatch input slot.
///
/// The core owns the lanes; the dispatch unit prepares into `input` and the
/// unit claims (or peeks) from it on its own tick.
pub struct ExuLane {
    /// The unit model.
    pub unit: Box<dyn ExecutionUnit>,
    /// Dispatch → unit handshake slot.
    pub input: StageData<Uop>,
}

impl std::fmt::Debug for ExuLane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExuLane")
            .field("unit", &self.unit.name())
            .field("input_valid", &self.input.is_valid())
            .finish()
    }
}

/// Instantiates a unit model from its closed configuration kind.
///
/// Unknown kinds cannot occur: the enum is closed and configs naming
/// anything else fail deserialization.
pub fn build_execution_unit(
    kind: ExecutionUnitKind,
    name: &str,
    lane: usize,
    cfg: &ArchStateConfig,
) -> Box<dyn ExecutionUnit> {
    match kind {
        ExecutionUnitKind::Scalar => Box::new(ScalarExecutionUnit::new(name, lane)),
        ExecutionUnitKind::MatrixSystolic => Box::new(MatrixExecutionUnit::systolic(
            name,
            lane,
            cfg.mrf_depth as u64,
        )),
        ExecutionUnitKind::MatrixInner => {
            Box::new(MatrixExecutionUnit::inner(name, lane, cfg.mrf_depth as u64))
        }
        ExecutionUnitKind::Vector => Box::new(VectorExecutionUnit::new(name, lane)),
        ExecutionUnitKind::Dma => Box::new(DmaExecutionUnit::new(name, lane)),
    }
}
