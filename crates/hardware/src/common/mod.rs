//! Common utilities and types used throughout the NPU performance model.
//!
//! This module provides fundamental building blocks shared across all components
//! of the simulator. It includes:
//! 1. **Constants:** Trace lane assignments, DMA queue geometry, pipeline depth.
//! 2. **Data:** Element types (`DType`) and the owned `Tensor` used by register views.
//! 3. **Error Handling:** The crate-wide fatal error taxonomy (`SimError`).

/// Common constants used throughout the simulator.
pub mod constants;

/// Element type and tensor definitions.
pub mod data;

/// Error type definitions.
pub mod error;

pub use self::data::{DType, Tensor};
pub use self::error::SimError;
