//! Mnemonic decode: from source-form instructions to tagged operations.
//!
//! Programs arrive as ordered records of `mnemonic + named integer arguments
//! + delay` (the source form, JSON-friendly). `IsaSpec` is the explicit
//! instruction-set table assembled once at startup; decoding resolves each
//! source instruction into the tagged [`Op`] union eagerly, so nothing
//! downstream ever consults a string-keyed map. Unknown mnemonics and missing
//! operands are fatal.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::common::error::SimError;
use crate::sim::program::{MemoryRegion, Program};

use super::{AluOp, BranchCond, Instruction, MatmulUnit, Op, VecBinaryOp, VecUnaryOp};

/// One instruction in source form: mnemonic, named integer operands, delay.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceInst {
    /// Instruction mnemonic, e.g. `"addi"` or `"dma.load.m"`.
    pub mnemonic: String,
    /// Named integer operands.
    #[serde(default)]
    pub args: BTreeMap<String, i64>,
    /// Pre-dispatch stall in cycles.
    #[serde(default)]
    pub delay: u64,
}

impl SourceInst {
    /// Builds a source instruction from a mnemonic and operand pairs.
    pub fn new(mnemonic: &str, args: &[(&str, i64)], delay: u64) -> Self {
        Self {
            mnemonic: mnemonic.to_owned(),
            args: args
                .iter()
                .map(|&(name, value)| (name.to_owned(), value))
                .collect(),
            delay,
        }
    }
}

/// One preload region in source form.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegion {
    /// First byte address of the region.
    pub base: usize,
    /// Region contents.
    pub bytes: Vec<u8>,
}

/// A whole program in source form: instructions plus initial memory image.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceProgram {
    /// Ordered instruction sequence.
    pub instructions: Vec<SourceInst>,
    /// Memory regions to preload; later regions overwrite earlier on overlap.
    #[serde(default)]
    pub memory_regions: Vec<SourceRegion>,
}

/// Operand accessor for one source instruction during decode.
struct Args<'a> {
    mnemonic: &'a str,
    map: &'a BTreeMap<String, i64>,
}

impl Args<'_> {
    /// Required operand as a raw integer.
    fn int(&self, name: &'static str) -> Result<i64, SimError> {
        self.map
            .get(name)
            .copied()
            .ok_or_else(|| SimError::MissingOperand {
                mnemonic: self.mnemonic.to_owned(),
                operand: name,
            })
    }

    /// Required operand as a non-negative index (register, flag, address, size).
    fn idx(&self, name: &'static str) -> Result<usize, SimError> {
        let v = self.int(name)?;
        usize::try_from(v).map_err(|_| SimError::MissingOperand {
            mnemonic: self.mnemonic.to_owned(),
            operand: name,
        })
    }
}

type Decoder = Box<dyn Fn(&Args<'_>) -> Result<Op, SimError> + Send + Sync>;

/// The assembled instruction set: mnemonic → decode function.
///
/// Built once by the startup layer with [`IsaSpec::baseline`] and handed to
/// the program loader; there is no process-global registry and no load-time
/// side effect. The table is immutable after construction.
pub struct IsaSpec {
    ops: BTreeMap<&'static str, Decoder>,
}

impl fmt::Debug for IsaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsaSpec")
            .field("operations", &self.ops.len())
            .finish()
    }
}

impl IsaSpec {
    /// Assembles the baseline NPU instruction set.
    pub fn baseline() -> Self {
        let mut ops: BTreeMap<&'static str, Decoder> = BTreeMap::new();

        let _ = ops.insert("nop", Box::new(|_| Ok(Op::Nop)));
        let _ = ops.insert("delay", Box::new(|_| Ok(Op::Delay)));

        for (m, op) in [
            ("add", AluOp::Add),
            ("sub", AluOp::Sub),
            ("and", AluOp::And),
            ("or", AluOp::Or),
            ("xor", AluOp::Xor),
            ("sll", AluOp::Sll),
            ("srl", AluOp::Srl),
            ("sra", AluOp::Sra),
            ("slt", AluOp::Slt),
            ("sltu", AluOp::Sltu),
        ] {
            let _ = ops.insert(
                m,
                Box::new(move |a| {
                    Ok(Op::Alu {
                        op,
                        rd: a.idx("rd")?,
                        rs1: a.idx("rs1")?,
                        rs2: a.idx("rs2")?,
                    })
                }),
            );
        }

        for (m, op) in [
            ("addi", AluOp::Add),
            ("subi", AluOp::Sub),
            ("andi", AluOp::And),
            ("ori", AluOp::Or),
            ("xori", AluOp::Xor),
            ("slli", AluOp::Sll),
            ("srli", AluOp::Srl),
            ("srai", AluOp::Sra),
            ("slti", AluOp::Slt),
            ("sltiu", AluOp::Sltu),
        ] {
            let _ = ops.insert(
                m,
                Box::new(move |a| {
                    Ok(Op::AluImm {
                        op,
                        rd: a.idx("rd")?,
                        rs1: a.idx("rs1")?,
                        imm: a.int("imm")?,
                    })
                }),
            );
        }

        let _ = ops.insert("jal", Box::new(|a| Ok(Op::Jal { imm: a.int("imm")? })));

        for (m, cond) in [
            ("beq", BranchCond::Eq),
            ("bne", BranchCond::Ne),
            ("blt", BranchCond::Lt),
            ("bge", BranchCond::Ge),
            ("bltu", BranchCond::Ltu),
            ("bgeu", BranchCond::Geu),
        ] {
            let _ = ops.insert(
                m,
                Box::new(move |a| {
                    Ok(Op::Branch {
                        cond,
                        rs1: a.idx("rs1")?,
                        rs2: a.idx("rs2")?,
                        imm: a.int("imm")?,
                    })
                }),
            );
        }

        for (m, op) in [
            ("vadd", VecBinaryOp::Add),
            ("vsub", VecBinaryOp::Sub),
            ("vmul", VecBinaryOp::Mul),
        ] {
            let _ = ops.insert(
                m,
                Box::new(move |a| {
                    Ok(Op::VecBinary {
                        op,
                        vrd: a.idx("vrd")?,
                        vs1: a.idx("vs1")?,
                        vs2: a.idx("vs2")?,
                    })
                }),
            );
        }

        for (m, op) in [
            ("vsqrt", VecUnaryOp::Sqrt),
            ("vreciprocal", VecUnaryOp::Reciprocal),
            ("vexp", VecUnaryOp::Exp),
            ("vlog2", VecUnaryOp::Log2),
            ("vexp2", VecUnaryOp::Exp2),
            ("vsin", VecUnaryOp::Sin),
            ("vcos", VecUnaryOp::Cos),
            ("vtanh", VecUnaryOp::Tanh),
        ] {
            let _ = ops.insert(
                m,
                Box::new(move |a| {
                    Ok(Op::VecUnary {
                        op,
                        vrd: a.idx("vrd")?,
                        vs1: a.idx("vs1")?,
                    })
                }),
            );
        }

        let _ = ops.insert(
            "mv.mm",
            Box::new(|a| {
                Ok(Op::MoveMm {
                    vrd: a.idx("vrd")?,
                    vs1: a.idx("vs1")?,
                })
            }),
        );
        let _ = ops.insert(
            "mv.mw",
            Box::new(|a| {
                Ok(Op::MoveMw {
                    rd: a.idx("rd")?,
                    rs1: a.idx("rs1")?,
                })
            }),
        );

        for (m, unit) in [
            ("matmul", MatmulUnit::Any),
            ("matmul.mxu0", MatmulUnit::Systolic),
            ("matmul.mxu1", MatmulUnit::Inner),
        ] {
            let _ = ops.insert(
                m,
                Box::new(move |a| {
                    Ok(Op::Matmul {
                        unit,
                        rd: a.idx("rd")?,
                        rs1: a.idx("rs1")?,
                        rs2: a.idx("rs2")?,
                    })
                }),
            );
        }

        // "dma.load" / "dma.loadw" / "dma.store" are the legacy spellings.
        for m in ["dma.load.m", "dma.load"] {
            let _ = ops.insert(
                m,
                Box::new(|a: &Args<'_>| {
                    Ok(Op::DmaLoadM {
                        rd: a.idx("rd")?,
                        base: a.idx("base")?,
                        size: a.idx("size")?,
                        flag: a.idx("flag")?,
                    })
                }),
            );
        }
        for m in ["dma.load.w", "dma.loadw"] {
            let _ = ops.insert(
                m,
                Box::new(|a: &Args<'_>| {
                    Ok(Op::DmaLoadW {
                        rd: a.idx("rd")?,
                        base: a.idx("base")?,
                        size: a.idx("size")?,
                        flag: a.idx("flag")?,
                    })
                }),
            );
        }
        for m in ["dma.store.m", "dma.store"] {
            let _ = ops.insert(
                m,
                Box::new(|a: &Args<'_>| {
                    Ok(Op::DmaStoreM {
                        rs1: a.idx("rs1")?,
                        base: a.idx("base")?,
                        size: a.idx("size")?,
                        flag: a.idx("flag")?,
                    })
                }),
            );
        }

        let _ = ops.insert("dma.wait", Box::new(|a| Ok(Op::DmaWait { flag: a.idx("flag")? })));

        Self { ops }
    }

    /// Number of registered mnemonics.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when no mnemonics are registered.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True when `mnemonic` is part of this instruction set.
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.ops.contains_key(mnemonic)
    }

    /// Decodes one source instruction into its tagged form.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownMnemonic`] for an unregistered mnemonic,
    /// [`SimError::MissingOperand`] when a required operand is absent.
    pub fn decode(&self, src: &SourceInst) -> Result<Instruction, SimError> {
        let decoder = self
            .ops
            .get(src.mnemonic.as_str())
            .ok_or_else(|| SimError::UnknownMnemonic(src.mnemonic.clone()))?;
        let args = Args {
            mnemonic: &src.mnemonic,
            map: &src.args,
        };
        Ok(Instruction::with_delay(decoder(&args)?, src.delay))
    }

    /// Decodes a whole source program, carrying its memory image across.
    ///
    /// # Errors
    ///
    /// Propagates the first decode failure.
    pub fn decode_program(&self, src: &SourceProgram) -> Result<Program, SimError> {
        let instructions = src
            .instructions
            .iter()
            .map(|inst| self.decode(inst))
            .collect::<Result<Vec<_>, _>>()?;
        let memory_regions = src
            .memory_regions
            .iter()
            .map(|r| MemoryRegion {
                base: r.base,
                bytes: r.bytes.clone(),
            })
            .collect();
        Ok(Program::new(instructions, memory_regions))
    }
}
