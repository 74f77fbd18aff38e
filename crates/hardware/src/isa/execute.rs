//! Architectural effects of each operation.
//!
//! `Op::apply` mutates the architectural state exactly once, at the cycle the
//! owning execution unit completes the uop. Timing lives in the units; only
//! the state change lives here. Control-flow operations write NPC through
//! [`ArchState::branch_to`], which also arms the core's redirect latch.

use crate::common::data::{DType, Tensor};
use crate::common::error::SimError;
use crate::core::arch::state::ArchState;

use super::{AluOp, BranchCond, Op, VecBinaryOp, VecUnaryOp};

impl AluOp {
    /// Evaluates the operation over two i64 operands.
    fn eval(self, a: i64, b: i64) -> i64 {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
            Self::Sll => a.wrapping_shl((b & 0x3F) as u32),
            Self::Srl => ((a as u64).wrapping_shr((b & 0x3F) as u32)) as i64,
            Self::Sra => a.wrapping_shr((b & 0x3F) as u32),
            Self::Slt => i64::from(a < b),
            Self::Sltu => i64::from((a as u64) < (b as u64)),
        }
    }
}

impl BranchCond {
    /// Evaluates the predicate over two i64 operands.
    ///
    /// `Ltu`/`Geu` compare the two's-complement bit patterns as unsigned.
    fn taken(self, a: i64, b: i64) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => a < b,
            Self::Ge => a >= b,
            Self::Ltu => (a as u64) < (b as u64),
            Self::Geu => (a as u64) >= (b as u64),
        }
    }
}

impl VecUnaryOp {
    fn eval(self, x: f32) -> f32 {
        match self {
            Self::Sqrt => x.sqrt(),
            Self::Reciprocal => 1.0 / x,
            Self::Exp => x.exp(),
            Self::Log2 => x.log2(),
            Self::Exp2 => x.exp2(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tanh => x.tanh(),
        }
    }
}

impl VecBinaryOp {
    fn eval(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
        }
    }
}

impl Op {
    /// Applies this operation's architectural side effects.
    ///
    /// # Errors
    ///
    /// Propagates register-range, shape, and memory-bounds violations; all
    /// are fatal to the simulation.
    pub fn apply(&self, state: &mut ArchState) -> Result<(), SimError> {
        match *self {
            Self::Nop | Self::Delay | Self::DmaWait { .. } => Ok(()),

            Self::Alu { op, rd, rs1, rs2 } => {
                let result = op.eval(state.read_xrf(rs1)?, state.read_xrf(rs2)?);
                state.write_xrf(rd, result)
            }
            Self::AluImm { op, rd, rs1, imm } => {
                let result = op.eval(state.read_xrf(rs1)?, imm);
                state.write_xrf(rd, result)
            }

            // The fetch stream runs `pipeline_latency` instructions past a
            // control-flow op by the time it resolves; the offset compensates
            // so the target is the intended static instruction.
            Self::Jal { imm } => {
                state.branch_to(state.pc() + imm - state.pipeline_latency());
                Ok(())
            }
            Self::Branch {
                cond,
                rs1,
                rs2,
                imm,
            } => {
                if cond.taken(state.read_xrf(rs1)?, state.read_xrf(rs2)?) {
                    state.branch_to(state.pc() + imm - state.pipeline_latency());
                }
                Ok(())
            }

            Self::VecUnary { op, vrd, vs1 } => {
                let src = state.read_mrf_bf16(vs1)?;
                let out: Vec<f32> = src.to_f32().into_iter().map(|x| op.eval(x)).collect();
                let t = Tensor::from_f32(DType::Bf16, src.rows(), src.cols(), &out)?;
                state.write_mrf_bf16(vrd, &t)
            }
            Self::VecBinary { op, vrd, vs1, vs2 } => {
                let a = state.read_mrf_bf16(vs1)?;
                let b = state.read_mrf_bf16(vs2)?;
                let out: Vec<f32> = a
                    .to_f32()
                    .into_iter()
                    .zip(b.to_f32())
                    .map(|(x, y)| op.eval(x, y))
                    .collect();
                let t = Tensor::from_f32(DType::Bf16, a.rows(), a.cols(), &out)?;
                state.write_mrf_bf16(vrd, &t)
            }
            Self::MoveMm { vrd, vs1 } => {
                let src = state.read_mrf_u8(vs1)?;
                state.write_mrf_u8(vrd, &src)
            }
            Self::MoveMw { rd, rs1 } => {
                let src = state.read_mrf_u8(rs1)?;
                let take = state.wb_capacity().min(src.bytes().len());
                let bytes = src.bytes()[..take].to_vec();
                let t = state.wb_tensor_u8(bytes)?;
                state.write_wb_u8(rd, &t)
            }

            Self::Matmul { rd, rs1, rs2, .. } => {
                let act = state.read_mrf_bf16(rs1)?;
                let weight = state.read_wb_bf16(rs2)?;
                let (m, k) = (act.rows(), act.cols());
                let n = weight.rows();
                let a = act.to_f32();
                let w = weight.to_f32();
                // act (M×K) @ weightᵀ (K×N), accumulated in f32.
                let mut out = vec![0.0_f32; m * n];
                for mi in 0..m {
                    for ni in 0..n {
                        let mut acc = 0.0_f32;
                        for ki in 0..k {
                            acc += a[mi * k + ki] * w[ni * k + ki];
                        }
                        out[mi * n + ni] = acc;
                    }
                }
                let t = Tensor::from_f32(DType::F32, m, n, &out)?;
                state.write_mrf_f32(rd, &t)
            }

            Self::DmaLoadM {
                rd, base, size, ..
            } => {
                let mut data = state.read_memory(base, size)?;
                data.resize(state.mrf_capacity(), 0);
                let t = state.mrf_tensor_u8(data)?;
                state.write_mrf_u8(rd, &t)
            }
            Self::DmaLoadW {
                rd, base, size, ..
            } => {
                let mut data = state.read_memory(base, size)?;
                data.resize(state.wb_capacity(), 0);
                let t = state.wb_tensor_u8(data)?;
                state.write_wb_u8(rd, &t)
            }
            Self::DmaStoreM {
                rs1, base, size, ..
            } => {
                let src = state.read_mrf_u8(rs1)?;
                let take = size.min(src.bytes().len());
                let bytes = src.bytes()[..take].to_vec();
                state.write_memory(base, &bytes)
            }
        }
    }
}
