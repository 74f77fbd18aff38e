//! Simulation: program representation and the run-loop driver.

/// Decoded program plus initial memory image.
pub mod program;

/// `Simulation`: reset, run loop, cycle cap, statistics.
pub mod simulator;

pub use self::program::{MemoryRegion, Program};
pub use self::simulator::Simulation;
