//! Architectural state of the modeled NPU.
//!
//! This module holds everything an instruction can observe or mutate:
//! the scalar register file, the matrix register file and weight buffer with
//! their dtype-aware views, byte-addressable memory, DMA flags, and PC/NPC.

/// Scalar register file (x0 hardwired to zero).
pub mod xrf;

/// The combined architectural state machine.
pub mod state;

pub use self::state::ArchState;
pub use self::xrf::Xrf;
