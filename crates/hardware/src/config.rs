//! Configuration system for the NPU performance model.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (register file geometry,
//!    memory size, pipeline depth).
//! 2. **Structures:** Hierarchical config for the architectural state and the
//!    execution-unit roster.
//! 3. **Enums:** Closed sets of execution-unit kinds and dispatch strategies;
//!    unknown names are rejected at deserialization time.
//!
//! Configuration is supplied as JSON (CLI `--config-file`) or use
//! `HardwareConfig::default()` for the built-in machine.

use serde::Deserialize;

use crate::common::constants::PIPELINE_LATENCY;

/// Default configuration constants for the simulator.
///
/// These values define the baseline hardware configuration when not
/// explicitly overridden.
mod defaults {
    /// Rows of a matrix register; also the matmul latency in cycles
    /// (one activation row is consumed per cycle).
    pub const MRF_DEPTH: usize = 64;

    /// Width of one matrix register row in bytes.
    pub const MRF_WIDTH: usize = 64;

    /// Size of one weight buffer entry in bytes.
    pub const WB_WIDTH: usize = 1024;

    /// Number of scalar registers; index 0 is hardwired to zero.
    pub const NUM_X_REGISTERS: usize = 32;

    /// Number of matrix registers.
    pub const NUM_M_REGISTERS: usize = 64;

    /// Number of weight buffer entries.
    pub const NUM_WB_REGISTERS: usize = 2;

    /// Number of DMA completion flags.
    pub const NUM_FLAGS: usize = 3;

    /// Byte-addressable memory size (1 MiB).
    pub const MEMORY_SIZE: usize = 1024 * 1024;

    /// Instructions fetched per cycle.
    pub const FETCH_WIDTH: usize = 1;
}

/// Kinds of execution unit the core can instantiate.
///
/// This is the closed set of unit models; configs naming anything else are
/// rejected when the config is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionUnitKind {
    /// Single-issue integer unit, latency 1.
    Scalar,
    /// Matrix unit, systolic-array variant; accepts `MATRIX` and `MATRIX_SYSTOLIC`.
    MatrixSystolic,
    /// Matrix unit, inner-product variant; accepts `MATRIX` and `MATRIX_INNER`.
    MatrixInner,
    /// Single-issue bf16 elementwise unit, latency 1.
    Vector,
    /// DMA engine with a bounded in-flight queue and size-dependent latency.
    Dma,
}

/// Policy for choosing among several execution units that accept a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// Rotate through the candidates by cycle number.
    RoundRobin,
    /// First non-busy candidate, falling back to the first.
    #[default]
    Greedy,
    /// Always the first candidate.
    Dummy,
}

/// One named execution unit in the core's roster.
///
/// Order matters: trace lanes 2, 3, … are assigned in roster order.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionUnitConfig {
    /// Display name, e.g. `"MXU0"`.
    pub name: String,
    /// Which unit model to instantiate.
    pub kind: ExecutionUnitKind,
}

/// Geometry of the architectural state.
///
/// All sizes are in bytes, all counts in registers. The matrix register file
/// holds `num_m_registers` banks of `mrf_depth × mrf_width` bytes; the weight
/// buffer holds `num_wb_registers` banks of `wb_width` bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchStateConfig {
    /// Rows per matrix register (and the matmul latency in cycles).
    #[serde(default = "ArchStateConfig::default_mrf_depth")]
    pub mrf_depth: usize,

    /// Bytes per matrix register row.
    #[serde(default = "ArchStateConfig::default_mrf_width")]
    pub mrf_width: usize,

    /// Bytes per weight buffer entry.
    #[serde(default = "ArchStateConfig::default_wb_width")]
    pub wb_width: usize,

    /// Scalar register count.
    #[serde(default = "ArchStateConfig::default_num_x_registers")]
    pub num_x_registers: usize,

    /// Matrix register count.
    #[serde(default = "ArchStateConfig::default_num_m_registers")]
    pub num_m_registers: usize,

    /// Weight buffer entry count.
    #[serde(default = "ArchStateConfig::default_num_wb_registers")]
    pub num_wb_registers: usize,

    /// DMA completion flag count.
    #[serde(default = "ArchStateConfig::default_num_flags")]
    pub num_flags: usize,

    /// Byte-addressable memory size.
    #[serde(default = "ArchStateConfig::default_memory_size")]
    pub memory_size: usize,
}

impl ArchStateConfig {
    /// Returns the default matrix register depth.
    fn default_mrf_depth() -> usize {
        defaults::MRF_DEPTH
    }

    /// Returns the default matrix register row width in bytes.
    fn default_mrf_width() -> usize {
        defaults::MRF_WIDTH
    }

    /// Returns the default weight buffer entry size in bytes.
    fn default_wb_width() -> usize {
        defaults::WB_WIDTH
    }

    /// Returns the default scalar register count.
    fn default_num_x_registers() -> usize {
        defaults::NUM_X_REGISTERS
    }

    /// Returns the default matrix register count.
    fn default_num_m_registers() -> usize {
        defaults::NUM_M_REGISTERS
    }

    /// Returns the default weight buffer entry count.
    fn default_num_wb_registers() -> usize {
        defaults::NUM_WB_REGISTERS
    }

    /// Returns the default DMA flag count.
    fn default_num_flags() -> usize {
        defaults::NUM_FLAGS
    }

    /// Returns the default memory size in bytes.
    fn default_memory_size() -> usize {
        defaults::MEMORY_SIZE
    }

    /// Total capacity of one matrix register in bytes.
    pub const fn mrf_capacity(&self) -> usize {
        self.mrf_depth * self.mrf_width
    }
}

impl Default for ArchStateConfig {
    fn default() -> Self {
        Self {
            mrf_depth: defaults::MRF_DEPTH,
            mrf_width: defaults::MRF_WIDTH,
            wb_width: defaults::WB_WIDTH,
            num_x_registers: defaults::NUM_X_REGISTERS,
            num_m_registers: defaults::NUM_M_REGISTERS,
            num_wb_registers: defaults::NUM_WB_REGISTERS,
            num_flags: defaults::NUM_FLAGS,
            memory_size: defaults::MEMORY_SIZE,
        }
    }
}

/// Root configuration structure describing one modeled machine.
///
/// # Examples
///
/// Deserializing from JSON (typical `--config-file` usage):
///
/// ```
/// use npusim_core::config::{DispatchStrategy, ExecutionUnitKind, HardwareConfig};
///
/// let json = r#"{
///     "name": "tiny-npu",
///     "dispatch_strategy": "round_robin",
///     "arch_state": { "mrf_depth": 16, "memory_size": 65536 },
///     "execution_units": [
///         { "name": "Scalar0", "kind": "scalar" },
///         { "name": "MXU0", "kind": "matrix_systolic" },
///         { "name": "DMA0", "kind": "dma" }
///     ]
/// }"#;
///
/// let config: HardwareConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.dispatch_strategy, DispatchStrategy::RoundRobin);
/// assert_eq!(config.arch_state.mrf_depth, 16);
/// assert_eq!(config.execution_units[2].kind, ExecutionUnitKind::Dma);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HardwareConfig {
    /// Machine name, for reports and trace metadata.
    #[serde(default = "HardwareConfig::default_name")]
    pub name: String,

    /// Instructions fetched per cycle. The model is single-issue; values
    /// other than 1 are reported but not exploited.
    #[serde(default = "HardwareConfig::default_fetch_width")]
    pub fetch_width: usize,

    /// Fetch-to-resolve depth used by control-flow target arithmetic.
    #[serde(default = "HardwareConfig::default_pipeline_latency")]
    pub pipeline_latency: i64,

    /// Policy for choosing among eligible execution units.
    #[serde(default)]
    pub dispatch_strategy: DispatchStrategy,

    /// Architectural state geometry.
    #[serde(default)]
    pub arch_state: ArchStateConfig,

    /// Execution unit roster, in trace-lane order.
    pub execution_units: Vec<ExecutionUnitConfig>,
}

impl HardwareConfig {
    /// Returns the default machine name.
    fn default_name() -> String {
        "simple-npu".to_owned()
    }

    /// Returns the default fetch width.
    fn default_fetch_width() -> usize {
        defaults::FETCH_WIDTH
    }

    /// Returns the default fetch-to-resolve pipeline depth.
    fn default_pipeline_latency() -> i64 {
        PIPELINE_LATENCY
    }
}

impl Default for HardwareConfig {
    /// The built-in `simple-npu` machine: one scalar unit, both matrix
    /// variants, one vector unit, and one DMA engine.
    fn default() -> Self {
        let units = [
            ("Scalar0", ExecutionUnitKind::Scalar),
            ("MXU0", ExecutionUnitKind::MatrixSystolic),
            ("MXU1", ExecutionUnitKind::MatrixInner),
            ("Vector0", ExecutionUnitKind::Vector),
            ("DMA0", ExecutionUnitKind::Dma),
        ];
        Self {
            name: Self::default_name(),
            fetch_width: defaults::FETCH_WIDTH,
            pipeline_latency: PIPELINE_LATENCY,
            dispatch_strategy: DispatchStrategy::default(),
            arch_state: ArchStateConfig::default(),
            execution_units: units
                .into_iter()
                .map(|(name, kind)| ExecutionUnitConfig {
                    name: name.to_owned(),
                    kind,
                })
                .collect(),
        }
    }
}
