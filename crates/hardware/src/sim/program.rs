//! Program representation consumed by the core.
//!
//! A program is a finite ordered sequence of decoded instructions, indexed
//! by the program counter, plus the memory regions to preload before the
//! run. Programs arrive in source form (mnemonic + named operands) and are
//! decoded by [`IsaSpec`](crate::isa::decode::IsaSpec) at load time.

use crate::isa::Instruction;

/// Bytes to place in memory before execution starts.
///
/// Regions apply in order; later regions overwrite earlier ones on overlap.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    /// First byte address of the region.
    pub base: usize,
    /// Region contents.
    pub bytes: Vec<u8>,
}

/// A decoded program: instruction sequence plus initial memory image.
#[derive(Debug, Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
    memory_regions: Vec<MemoryRegion>,
}

impl Program {
    /// Builds a program from decoded parts.
    pub fn new(instructions: Vec<Instruction>, memory_regions: Vec<MemoryRegion>) -> Self {
        Self {
            instructions,
            memory_regions,
        }
    }

    /// The empty program (finishes immediately).
    pub const fn empty() -> Self {
        Self {
            instructions: Vec::new(),
            memory_regions: Vec::new(),
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction at `pc`, or `None` outside the program.
    pub fn fetch(&self, pc: i64) -> Option<&Instruction> {
        usize::try_from(pc)
            .ok()
            .and_then(|idx| self.instructions.get(idx))
    }

    /// True when `pc` is outside the program.
    pub fn is_finished(&self, pc: i64) -> bool {
        usize::try_from(pc).map_or(true, |idx| idx >= self.instructions.len())
    }

    /// The decoded instruction sequence.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The memory regions to preload.
    pub fn memory_regions(&self) -> &[MemoryRegion] {
        &self.memory_regions
    }
}
