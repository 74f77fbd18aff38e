//! System-wide constants for the NPU performance model.
//!
//! These values define fixed structural properties of the modeled machine:
//! trace lane assignments, the DMA queue geometry, and the default pipeline
//! depth between fetch and branch resolution.

/// Trace lane occupied by the instruction fetch unit.
pub const LANE_IFU: usize = 0;

/// Trace lane occupied by the decode/dispatch unit.
pub const LANE_IDU: usize = 1;

/// First trace lane occupied by an execution unit.
///
/// Execution units are assigned lanes `LANE_EXU_BASE`, `LANE_EXU_BASE + 1`, …
/// in the order they appear in [`HardwareConfig::execution_units`](crate::config::HardwareConfig).
pub const LANE_EXU_BASE: usize = 2;

/// Maximum number of DMA transfers in flight at once.
///
/// The DMA unit refuses to claim new work while its queue is full, which
/// backpressures the dispatch stage.
pub const DMA_QUEUE_DEPTH: usize = 8;

/// Fixed setup cost of a DMA transfer in cycles.
///
/// A transfer of `size` bytes completes `DMA_SETUP_CYCLES + size` cycles
/// after entering execution.
pub const DMA_SETUP_CYCLES: u64 = 10;

/// Default fetch-to-resolve pipeline depth in instructions.
///
/// Control-flow effects subtract this from their target so that branches land
/// on the intended static instruction even though the fetch stream has run
/// ahead while the branch was in flight. Configurable via
/// [`HardwareConfig::pipeline_latency`](crate::config::HardwareConfig).
pub const PIPELINE_LATENCY: i64 = 2;
