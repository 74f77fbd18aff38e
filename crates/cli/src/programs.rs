//! Built-in named programs.
//!
//! Each program is expressed in source form (mnemonic + named operands) and
//! decoded through the `IsaSpec` like any externally supplied program. The
//! set mirrors the classic smoke-test kernels: a scalar loop, a matmul
//! round-trip, a DMA stall study, and an elementwise vector chain.

use npusim_core::SimError;
use npusim_core::common::data::{DType, Tensor};
use npusim_core::isa::decode::{SourceInst, SourceProgram, SourceRegion};

/// Names of all built-in programs.
pub const PROGRAM_NAMES: &[&str] = &["addi", "matmul", "dma-stall", "vector"];

/// Looks up a built-in program by name.
///
/// # Errors
///
/// [`SimError::UnknownProgram`] for a name not in [`PROGRAM_NAMES`].
pub fn builtin(name: &str) -> Result<SourceProgram, SimError> {
    match name {
        "addi" => Ok(addi()),
        "matmul" => Ok(matmul()),
        "dma-stall" => Ok(dma_stall()),
        "vector" => Ok(vector()),
        other => Err(SimError::UnknownProgram(other.to_owned())),
    }
}

fn inst(mnemonic: &str, args: &[(&str, i64)]) -> SourceInst {
    SourceInst::new(mnemonic, args, 0)
}

fn inst_delay(mnemonic: &str, args: &[(&str, i64)], delay: u64) -> SourceInst {
    SourceInst::new(mnemonic, args, delay)
}

/// Encodes an identity-patterned `rows × cols` bf16 matrix.
fn bf16_eye(rows: usize, cols: usize) -> Vec<u8> {
    let values: Vec<f32> = (0..rows * cols)
        .map(|i| if i / cols == i % cols { 1.0 } else { 0.0 })
        .collect();
    bf16_bytes(rows, cols, &values)
}

fn bf16_bytes(rows: usize, cols: usize, values: &[f32]) -> Vec<u8> {
    // Shapes are constructed to match here; an error would be a bug in the
    // program table itself, so fall back to an empty region.
    Tensor::from_f32(DType::Bf16, rows, cols, values)
        .map(Tensor::into_bytes)
        .unwrap_or_default()
}

/// Scalar loop: count x1 up to 8, then issue one matmul on the inner unit.
fn addi() -> SourceProgram {
    SourceProgram {
        instructions: vec![
            inst("addi", &[("rd", 2), ("rs1", 0), ("imm", 0)]),
            inst("addi", &[("rd", 1), ("rs1", 1), ("imm", 0)]),
            inst("addi", &[("rd", 2), ("rs1", 2), ("imm", 8)]),
            inst("addi", &[("rd", 1), ("rs1", 1), ("imm", 1)]),
            inst("blt", &[("rs1", 1), ("rs2", 2), ("imm", -1)]),
            inst("matmul.mxu1", &[("rd", 1), ("rs1", 1), ("rs2", 1)]),
        ],
        memory_regions: Vec::new(),
    }
}

/// Load an activation tile and a weight tile, then matmul on both variants.
fn matmul() -> SourceProgram {
    let act = bf16_eye(64, 32); // one full matrix register
    let weight = bf16_eye(16, 32); // one full weight buffer entry
    let weight_base = act.len() as i64;
    SourceProgram {
        instructions: vec![
            inst(
                "dma.load.m",
                &[("rd", 2), ("base", 0), ("size", act.len() as i64), ("flag", 0)],
            ),
            inst("dma.wait", &[("flag", 0)]),
            inst(
                "dma.load.w",
                &[
                    ("rd", 1),
                    ("base", weight_base),
                    ("size", weight.len() as i64),
                    ("flag", 0),
                ],
            ),
            inst("dma.wait", &[("flag", 0)]),
            inst("matmul.mxu1", &[("rd", 0), ("rs1", 2), ("rs2", 1)]),
            inst("matmul.mxu0", &[("rd", 1), ("rs1", 2), ("rs2", 1)]),
        ],
        memory_regions: vec![
            SourceRegion {
                base: 0,
                bytes: act,
            },
            SourceRegion {
                base: weight_base as usize,
                bytes: weight,
            },
        ],
    }
}

/// Three delayed loads, a barrier, then a delayed store: renders the DMA
/// queue and the dispatch-delay stalls in the trace.
fn dma_stall() -> SourceProgram {
    let ones = bf16_bytes(4, 4, &[1.0; 16]);
    SourceProgram {
        instructions: vec![
            inst_delay(
                "dma.load.m",
                &[("rd", 0), ("base", 0), ("size", 32), ("flag", 0)],
                5,
            ),
            inst_delay(
                "dma.load.m",
                &[("rd", 1), ("base", 32), ("size", 32), ("flag", 1)],
                5,
            ),
            inst_delay(
                "dma.load.m",
                &[("rd", 2), ("base", 48), ("size", 32), ("flag", 2)],
                5,
            ),
            inst("addi", &[("rd", 5), ("rs1", 0), ("imm", 10)]),
            inst("dma.wait", &[("flag", 2)]),
            inst_delay(
                "dma.store.m",
                &[("rs1", 3), ("base", 64), ("size", 32), ("flag", 1)],
                15,
            ),
            inst("dma.wait", &[("flag", 1)]),
        ],
        memory_regions: vec![
            SourceRegion {
                base: 0,
                bytes: ones.clone(),
            },
            SourceRegion {
                base: 32,
                bytes: ones.clone(),
            },
            SourceRegion {
                base: 48,
                bytes: ones,
            },
        ],
    }
}

/// Elementwise chain over a ramp, stored back to memory at the end.
fn vector() -> SourceProgram {
    let ramp: Vec<f32> = (0..2048).map(|i| (i % 64) as f32).collect();
    let data = bf16_bytes(64, 32, &ramp);
    let size = data.len() as i64;
    SourceProgram {
        instructions: vec![
            inst(
                "dma.load.m",
                &[("rd", 0), ("base", 0), ("size", size), ("flag", 0)],
            ),
            inst("dma.wait", &[("flag", 0)]),
            inst("vadd", &[("vrd", 1), ("vs1", 0), ("vs2", 0)]),
            inst("vsub", &[("vrd", 2), ("vs1", 1), ("vs2", 0)]),
            inst("vmul", &[("vrd", 3), ("vs1", 2), ("vs2", 0)]),
            inst("vsqrt", &[("vrd", 4), ("vs1", 3)]),
            inst("mv.mm", &[("vrd", 5), ("vs1", 4)]),
            inst(
                "dma.store.m",
                &[("rs1", 5), ("base", 8192), ("size", 64), ("flag", 1)],
            ),
            inst("dma.wait", &[("flag", 1)]),
        ],
        memory_regions: vec![SourceRegion {
            base: 0,
            bytes: data,
        }],
    }
}
