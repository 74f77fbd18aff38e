//! Fatal error taxonomy for the NPU performance model.
//!
//! Every error in this module aborts the simulation: the model is
//! deterministic, so a propagated error indicates either a malformed program
//! or a model bug, and both warrant stopping with diagnostics. Nothing is
//! retried or recovered locally. Reaching the driver's cycle cap is reported
//! through the run summary, not through this type.

use thiserror::Error;

use super::data::DType;

/// Crate-wide fatal error type.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// A hardware configuration was requested by a name the driver does not know.
    #[error("unknown hardware configuration '{0}'")]
    UnknownConfig(String),

    /// A program was requested by a name the driver does not know.
    #[error("unknown program '{0}'")]
    UnknownProgram(String),

    /// A program instruction used a mnemonic absent from the instruction set.
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),

    /// A program instruction omitted an operand its mnemonic requires.
    #[error("'{mnemonic}' is missing operand '{operand}'")]
    MissingOperand {
        /// Mnemonic of the offending instruction.
        mnemonic: String,
        /// Name of the operand that was not supplied.
        operand: &'static str,
    },

    /// A typed register view was given data of the wrong element count.
    #[error("{what}: expected {expected} {dtype} elements, got {actual}")]
    ShapeMismatch {
        /// What was being written or wrapped (register file name or "tensor …").
        what: &'static str,
        /// Element type of the view.
        dtype: DType,
        /// Element count implied by the view shape.
        expected: usize,
        /// Element count actually supplied.
        actual: usize,
    },

    /// A typed register view was given data of the wrong element type.
    #[error("{what}: expected {expected} elements, got {actual}")]
    DtypeMismatch {
        /// What was being written.
        what: &'static str,
        /// Element type of the view.
        expected: DType,
        /// Element type actually supplied.
        actual: DType,
    },

    /// A memory access crossed the end of the configured memory.
    #[error("memory access out of bounds: {base} + {len} > {size}")]
    MemoryBounds {
        /// First byte of the access.
        base: usize,
        /// Length of the access in bytes.
        len: usize,
        /// Configured memory size.
        size: usize,
    },

    /// A register index exceeded its register file.
    #[error("{regfile} index {index} out of range (file holds {size})")]
    RegisterOutOfRange {
        /// Register file name.
        regfile: &'static str,
        /// Offending index.
        index: usize,
        /// Number of registers in the file.
        size: usize,
    },

    /// A DMA uop was dispatched while its completion flag was still set.
    #[error("DMA flag {0} is already set; erroneous program")]
    FlagInvariant(usize),

    /// A flag index exceeded the flag array.
    #[error("flag index {index} out of range ({count} flags)")]
    FlagOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of flags.
        count: usize,
    },

    /// An instruction was dispatched whose class no configured unit accepts.
    #[error("no execution unit supports instruction class {0}")]
    NoUnitForClass(&'static str),
}
