//! Short constructors for decoded instructions.

use npusim_core::isa::{
    AluOp, BranchCond, Instruction, MatmulUnit, Op, VecBinaryOp, VecUnaryOp,
};

pub fn nop() -> Instruction {
    Instruction::new(Op::Nop)
}

pub fn addi(rd: usize, rs1: usize, imm: i64) -> Instruction {
    Instruction::new(Op::AluImm {
        op: AluOp::Add,
        rd,
        rs1,
        imm,
    })
}

pub fn alu(op: AluOp, rd: usize, rs1: usize, rs2: usize) -> Instruction {
    Instruction::new(Op::Alu { op, rd, rs1, rs2 })
}

pub fn jal(imm: i64) -> Instruction {
    Instruction::new(Op::Jal { imm })
}

pub fn branch(cond: BranchCond, rs1: usize, rs2: usize, imm: i64) -> Instruction {
    Instruction::new(Op::Branch {
        cond,
        rs1,
        rs2,
        imm,
    })
}

pub fn blt(rs1: usize, rs2: usize, imm: i64) -> Instruction {
    branch(BranchCond::Lt, rs1, rs2, imm)
}

pub fn matmul(unit: MatmulUnit, rd: usize, rs1: usize, rs2: usize) -> Instruction {
    Instruction::new(Op::Matmul { unit, rd, rs1, rs2 })
}

pub fn vbinary(op: VecBinaryOp, vrd: usize, vs1: usize, vs2: usize) -> Instruction {
    Instruction::new(Op::VecBinary { op, vrd, vs1, vs2 })
}

pub fn vunary(op: VecUnaryOp, vrd: usize, vs1: usize) -> Instruction {
    Instruction::new(Op::VecUnary { op, vrd, vs1 })
}

pub fn dma_load_m(rd: usize, base: usize, size: usize, flag: usize) -> Instruction {
    Instruction::new(Op::DmaLoadM {
        rd,
        base,
        size,
        flag,
    })
}

pub fn dma_load_w(rd: usize, base: usize, size: usize, flag: usize) -> Instruction {
    Instruction::new(Op::DmaLoadW {
        rd,
        base,
        size,
        flag,
    })
}

pub fn dma_store_m(rs1: usize, base: usize, size: usize, flag: usize) -> Instruction {
    Instruction::new(Op::DmaStoreM {
        rs1,
        base,
        size,
        flag,
    })
}

pub fn dma_wait(flag: usize) -> Instruction {
    Instruction::new(Op::DmaWait { flag })
}
