//! NPU core performance model library.
//!
//! This crate implements a cycle-accurate model of a small NPU core with the following:
//! 1. **Core:** 3-stage in-order pipeline (Fetch, Decode/Dispatch, Execution Units)
//!    coordinated by a claim-based stage handshake.
//! 2. **Architectural state:** scalar register file (XRF), matrix register file (MRF),
//!    weight buffer (WB), byte-addressable memory, DMA flags, and PC/NPC.
//! 3. **ISA:** scalar ALU/branch, bf16 vector, matmul, and DMA instruction semantics
//!    over dtype-aware register views (u8, fp8-e4m3, bf16, f32).
//! 4. **Scheduling:** single-issue scalar/vector units, long-latency matrix units with
//!    peek-and-hold backpressure, a DMA unit with a bounded in-flight queue, and
//!    barrier synchronization via flags.
//! 5. **Simulation:** `Simulation` (reset/run loop with a cycle cap), trace sinks
//!    (Perfetto JSON), configuration, and statistics.

/// Common types and constants (dtypes, tensors, errors, lane ids).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// NPU core (architectural state, pipeline, execution units, orchestration).
pub mod core;
/// Instruction set (tagged operations, decode, architectural effects).
pub mod isa;
/// Simulation: `Simulation` driver and program representation.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Trace sinks (stage intervals, retire events, architectural counters).
pub mod trace;

/// Root configuration type; use `HardwareConfig::default()` or deserialize from JSON.
pub use crate::config::HardwareConfig;
/// Main core type; owns the architectural state and all pipeline units.
pub use crate::core::Core;
/// Crate-wide fatal error taxonomy.
pub use crate::common::error::SimError;
/// Instruction-set builder and program decoder.
pub use crate::isa::decode::IsaSpec;
/// A decoded program plus its initial memory image.
pub use crate::sim::program::Program;
/// Top-level simulation driver; owns the core and the run loop.
pub use crate::sim::simulator::Simulation;
