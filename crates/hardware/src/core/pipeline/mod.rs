//! Instruction pipeline: handshake channel, fetch, and decode/dispatch.
//!
//! The pipeline is in-order and three stages deep. Stages communicate only
//! through single-slot [`StageData`](stage_data::StageData) channels with a
//! claim-based handshake: a producer that finds its slot still full stalls,
//! and the stall propagates upstream by itself.

/// Single-slot handshake channel between pipeline stages.
pub mod stage_data;

/// Dynamic instruction instances.
pub mod uop;

/// Instruction fetch unit.
pub mod ifu;

/// Instruction decode/dispatch unit.
pub mod idu;

pub use self::ifu::InstructionFetch;
pub use self::idu::InstructionDecode;
pub use self::stage_data::StageData;
pub use self::uop::Uop;
