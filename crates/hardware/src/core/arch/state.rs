//! The architectural state machine.
//!
//! `ArchState` holds all state an instruction can observe or mutate:
//! 1. **Register files:** XRF (scalar), MRF (matrix) and WB (weight buffer)
//!    byte banks with dtype-aware views.
//! 2. **Memory:** A flat, byte-addressable array with hard bounds checks.
//! 3. **Synchronization:** DMA completion flags.
//! 4. **Control flow:** PC/NPC and the redirect latch armed by taken branches.
//!
//! The state also owns the trace sink: every accepted change to a traced
//! register emits a counter event, and all pipeline units log their stage
//! intervals through [`ArchState::trace_mut`]. Writes that do not change
//! state (x0 writes, same-value writes) are silently dropped and emit
//! nothing.
//!
//! Typed views validate shape and element width once, then copy bytes; no
//! aliased mutable view ever crosses a module boundary.

use std::fmt;

use crate::common::data::{DType, Tensor};
use crate::common::error::SimError;
use crate::config::ArchStateConfig;
use crate::trace::TraceSink;

use super::xrf::Xrf;

/// Which register bank a typed view addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bank {
    Mrf,
    Wb,
}

impl Bank {
    const fn name(self) -> &'static str {
        match self {
            Self::Mrf => "mrf",
            Self::Wb => "wb",
        }
    }
}

/// Mutable architectural state of one NPU core.
pub struct ArchState {
    cfg: ArchStateConfig,
    pipeline_latency: i64,
    mem: Vec<u8>,
    xrf: Xrf,
    mrf: Vec<Vec<u8>>,
    wb: Vec<Vec<u8>>,
    flags: Vec<bool>,
    pc: i64,
    npc: i64,
    redirect: bool,
    trace: Box<dyn TraceSink>,
}

impl fmt::Debug for ArchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchState")
            .field("pc", &self.pc)
            .field("npc", &self.npc)
            .field("flags", &self.flags)
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

impl ArchState {
    /// Creates the architectural state for one core.
    ///
    /// `pipeline_latency` is the fetch-to-resolve depth consumed by
    /// control-flow target arithmetic. The state takes ownership of the
    /// trace sink; all units log through it.
    pub fn new(cfg: ArchStateConfig, pipeline_latency: i64, trace: Box<dyn TraceSink>) -> Self {
        let mem = vec![0; cfg.memory_size];
        let xrf = Xrf::new(cfg.num_x_registers);
        let mrf = vec![vec![0; cfg.mrf_capacity()]; cfg.num_m_registers];
        let wb = vec![vec![0; cfg.wb_width]; cfg.num_wb_registers];
        let flags = vec![false; cfg.num_flags];
        Self {
            cfg,
            pipeline_latency,
            mem,
            xrf,
            mrf,
            wb,
            flags,
            pc: 0,
            npc: 0,
            redirect: false,
            trace,
        }
    }

    /// Zeroes all registers, memory, and flags; PC/NPC return to 0.
    pub fn reset(&mut self) {
        self.mem.fill(0);
        self.xrf.reset();
        for bank in &mut self.mrf {
            bank.fill(0);
        }
        for bank in &mut self.wb {
            bank.fill(0);
        }
        self.flags.fill(false);
        self.pc = 0;
        self.npc = 0;
        self.redirect = false;
    }

    /// Geometry this state was built with.
    pub const fn cfg(&self) -> &ArchStateConfig {
        &self.cfg
    }

    /// Fetch-to-resolve depth used by control-flow effects.
    pub const fn pipeline_latency(&self) -> i64 {
        self.pipeline_latency
    }

    /// The trace sink, for stage-interval logging by the pipeline units.
    pub fn trace_mut(&mut self) -> &mut dyn TraceSink {
        self.trace.as_mut()
    }

    // ── control flow ──────────────────────────────────────────────

    /// Current program counter (instruction index).
    pub const fn pc(&self) -> i64 {
        self.pc
    }

    /// Next program counter.
    pub const fn npc(&self) -> i64 {
        self.npc
    }

    /// Sets the program counter, emitting a trace counter on change.
    pub fn set_pc(&mut self, value: i64) {
        if self.pc == value {
            return;
        }
        self.pc = value;
        self.trace.log_arch_value("pc", 0, value);
    }

    /// Sets the next program counter.
    pub fn set_npc(&mut self, value: i64) {
        self.npc = value;
    }

    /// Redirects the fetch stream: sets NPC and arms the redirect latch.
    ///
    /// Used by taken branches and jumps. The core consumes the latch after
    /// the execution-unit ticks to squash the wrong-path fetch.
    pub fn branch_to(&mut self, target: i64) {
        self.npc = target;
        self.redirect = true;
    }

    /// Consumes the redirect latch, returning whether it was armed.
    pub fn take_redirect(&mut self) -> bool {
        std::mem::take(&mut self.redirect)
    }

    // ── scalar registers ──────────────────────────────────────────

    /// Reads a scalar register; `x0` always reads 0.
    ///
    /// # Errors
    ///
    /// [`SimError::RegisterOutOfRange`] for an index beyond the file.
    pub fn read_xrf(&self, rs: usize) -> Result<i64, SimError> {
        if rs >= self.xrf.len() {
            return Err(SimError::RegisterOutOfRange {
                regfile: "xrf",
                index: rs,
                size: self.xrf.len(),
            });
        }
        Ok(self.xrf.read(rs))
    }

    /// Writes a scalar register; writes to `x0` and same-value writes are
    /// dropped without a trace event.
    ///
    /// # Errors
    ///
    /// [`SimError::RegisterOutOfRange`] for an index beyond the file.
    pub fn write_xrf(&mut self, rd: usize, value: i64) -> Result<(), SimError> {
        if rd >= self.xrf.len() {
            return Err(SimError::RegisterOutOfRange {
                regfile: "xrf",
                index: rd,
                size: self.xrf.len(),
            });
        }
        if self.xrf.write(rd, value) {
            self.trace.log_arch_value("xrf", rd, value);
        }
        Ok(())
    }

    // ── memory ────────────────────────────────────────────────────

    /// Copies `data` into memory at `base`.
    ///
    /// # Errors
    ///
    /// [`SimError::MemoryBounds`] when `base + data.len()` crosses the end.
    pub fn write_memory(&mut self, base: usize, data: &[u8]) -> Result<(), SimError> {
        let end = base.checked_add(data.len()).filter(|&e| e <= self.mem.len());
        let Some(end) = end else {
            return Err(SimError::MemoryBounds {
                base,
                len: data.len(),
                size: self.mem.len(),
            });
        };
        self.mem[base..end].copy_from_slice(data);
        Ok(())
    }

    /// Copies `len` bytes out of memory at `base`.
    ///
    /// # Errors
    ///
    /// [`SimError::MemoryBounds`] when `base + len` crosses the end.
    pub fn read_memory(&self, base: usize, len: usize) -> Result<Vec<u8>, SimError> {
        let end = base.checked_add(len).filter(|&e| e <= self.mem.len());
        let Some(end) = end else {
            return Err(SimError::MemoryBounds {
                base,
                len,
                size: self.mem.len(),
            });
        };
        Ok(self.mem[base..end].to_vec())
    }

    // ── flags ─────────────────────────────────────────────────────

    /// Sets a DMA completion flag.
    ///
    /// # Errors
    ///
    /// [`SimError::FlagOutOfRange`] for an index beyond the flag array.
    pub fn set_flag(&mut self, flag: usize) -> Result<(), SimError> {
        self.flag_index(flag)?;
        self.flags[flag] = true;
        Ok(())
    }

    /// Clears a DMA completion flag.
    ///
    /// # Errors
    ///
    /// [`SimError::FlagOutOfRange`] for an index beyond the flag array.
    pub fn clear_flag(&mut self, flag: usize) -> Result<(), SimError> {
        self.flag_index(flag)?;
        self.flags[flag] = false;
        Ok(())
    }

    /// Reads a DMA completion flag.
    ///
    /// # Errors
    ///
    /// [`SimError::FlagOutOfRange`] for an index beyond the flag array.
    pub fn check_flag(&self, flag: usize) -> Result<bool, SimError> {
        self.flag_index(flag)?;
        Ok(self.flags[flag])
    }

    fn flag_index(&self, flag: usize) -> Result<(), SimError> {
        if flag >= self.flags.len() {
            return Err(SimError::FlagOutOfRange {
                index: flag,
                count: self.flags.len(),
            });
        }
        Ok(())
    }

    // ── typed register views ──────────────────────────────────────

    /// Total bytes in one matrix register.
    pub const fn mrf_capacity(&self) -> usize {
        self.cfg.mrf_capacity()
    }

    /// Total bytes in one weight buffer entry.
    pub const fn wb_capacity(&self) -> usize {
        self.cfg.wb_width
    }

    /// View shape of a bank for a given element type.
    ///
    /// MRF views are `(mrf_depth, mrf_width / w)`. WB views are
    /// `(wb_width / mrf_width, mrf_width / w)`: an NxK weight tile whose K
    /// matches the activation row, so `act @ weight^T` is shape-consistent.
    fn view_shape(&self, bank: Bank, dtype: DType) -> (usize, usize) {
        let cols = self.cfg.mrf_width / dtype.size();
        match bank {
            Bank::Mrf => (self.cfg.mrf_depth, cols),
            Bank::Wb => (self.cfg.wb_width / self.cfg.mrf_width, cols),
        }
    }

    fn bank_bytes(&self, bank: Bank, idx: usize) -> Result<&Vec<u8>, SimError> {
        let regs = match bank {
            Bank::Mrf => &self.mrf,
            Bank::Wb => &self.wb,
        };
        regs.get(idx).ok_or(SimError::RegisterOutOfRange {
            regfile: bank.name(),
            index: idx,
            size: regs.len(),
        })
    }

    fn read_bank(&self, bank: Bank, idx: usize, dtype: DType) -> Result<Tensor, SimError> {
        let bytes = self.bank_bytes(bank, idx)?.clone();
        let (rows, cols) = self.view_shape(bank, dtype);
        Tensor::from_bytes(dtype, rows, cols, bytes)
    }

    fn write_bank(
        &mut self,
        bank: Bank,
        idx: usize,
        dtype: DType,
        src: &Tensor,
    ) -> Result<(), SimError> {
        if src.dtype() != dtype {
            return Err(SimError::DtypeMismatch {
                what: bank.name(),
                expected: dtype,
                actual: src.dtype(),
            });
        }
        let (rows, cols) = self.view_shape(bank, dtype);
        if src.len() != rows * cols {
            return Err(SimError::ShapeMismatch {
                what: bank.name(),
                dtype,
                expected: rows * cols,
                actual: src.len(),
            });
        }
        // Bounds were checked by bank_bytes; re-borrow mutably.
        let _ = self.bank_bytes(bank, idx)?;
        let regs = match bank {
            Bank::Mrf => &mut self.mrf,
            Bank::Wb => &mut self.wb,
        };
        regs[idx].copy_from_slice(src.bytes());
        Ok(())
    }

    /// Wraps raw bytes as a full-register MRF u8 tensor.
    ///
    /// # Errors
    ///
    /// [`SimError::ShapeMismatch`] when `bytes` is not exactly one register.
    pub fn mrf_tensor_u8(&self, bytes: Vec<u8>) -> Result<Tensor, SimError> {
        let (rows, cols) = self.view_shape(Bank::Mrf, DType::U8);
        Tensor::from_bytes(DType::U8, rows, cols, bytes)
    }

    /// Wraps raw bytes as a full-entry WB u8 tensor.
    ///
    /// # Errors
    ///
    /// [`SimError::ShapeMismatch`] when `bytes` is not exactly one entry.
    pub fn wb_tensor_u8(&self, bytes: Vec<u8>) -> Result<Tensor, SimError> {
        let (rows, cols) = self.view_shape(Bank::Wb, DType::U8);
        Tensor::from_bytes(DType::U8, rows, cols, bytes)
    }
}

/// Expands one `read_…`/`write_…` pair per (bank, dtype).
macro_rules! typed_views {
    ($($read:ident, $write:ident, $bank:expr, $dtype:expr, $doc:literal;)*) => {
        impl ArchState {
            $(
                #[doc = concat!("Reads ", $doc, " as an owned tensor copy.")]
                ///
                /// # Errors
                ///
                /// [`SimError::RegisterOutOfRange`] for a bad register index.
                pub fn $read(&self, idx: usize) -> Result<Tensor, SimError> {
                    self.read_bank($bank, idx, $dtype)
                }

                #[doc = concat!("Writes ", $doc, ", validating dtype and element count.")]
                ///
                /// # Errors
                ///
                /// [`SimError::RegisterOutOfRange`], [`SimError::DtypeMismatch`], or
                /// [`SimError::ShapeMismatch`].
                pub fn $write(&mut self, idx: usize, src: &Tensor) -> Result<(), SimError> {
                    self.write_bank($bank, idx, $dtype, src)
                }
            )*
        }
    };
}

typed_views! {
    read_mrf_u8, write_mrf_u8, Bank::Mrf, DType::U8, "a matrix register as u8";
    read_mrf_fp8_e4m3, write_mrf_fp8_e4m3, Bank::Mrf, DType::Fp8E4m3, "a matrix register as fp8-e4m3";
    read_mrf_bf16, write_mrf_bf16, Bank::Mrf, DType::Bf16, "a matrix register as bf16";
    read_mrf_f32, write_mrf_f32, Bank::Mrf, DType::F32, "a matrix register as f32";
    read_wb_u8, write_wb_u8, Bank::Wb, DType::U8, "a weight buffer entry as u8";
    read_wb_fp8_e4m3, write_wb_fp8_e4m3, Bank::Wb, DType::Fp8E4m3, "a weight buffer entry as fp8-e4m3";
    read_wb_bf16, write_wb_bf16, Bank::Wb, DType::Bf16, "a weight buffer entry as bf16";
    read_wb_f32, write_wb_f32, Bank::Wb, DType::F32, "a weight buffer entry as f32";
}
