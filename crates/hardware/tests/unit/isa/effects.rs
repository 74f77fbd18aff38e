//! # Architectural Effect Tests
//!
//! Direct `Op::apply` tests against a bare `ArchState`: ALU semantics,
//! branch predicates (including the unsigned/≥ forms), jump target
//! arithmetic, matmul math, vector elementwise math, and DMA data movement.

use rstest::rstest;

use npusim_core::common::data::{DType, Tensor};
use npusim_core::config::ArchStateConfig;
use npusim_core::core::arch::state::ArchState;
use npusim_core::isa::{AluOp, BranchCond, MatmulUnit, Op, VecBinaryOp, VecUnaryOp};
use npusim_core::trace::NullTrace;

const LATENCY: i64 = 2;

fn state() -> ArchState {
    ArchState::new(ArchStateConfig::default(), LATENCY, Box::new(NullTrace))
}

fn apply(st: &mut ArchState, op: Op) {
    op.apply(st).expect("effect failed");
}

#[rstest]
#[case(AluOp::Add, 7, 5, 12)]
#[case(AluOp::Sub, 7, 5, 2)]
#[case(AluOp::And, 0b1100, 0b1010, 0b1000)]
#[case(AluOp::Or, 0b1100, 0b1010, 0b1110)]
#[case(AluOp::Xor, 0b1100, 0b1010, 0b0110)]
#[case(AluOp::Sll, 1, 6, 64)]
#[case(AluOp::Srl, -1, 60, 15)]
#[case(AluOp::Sra, -16, 2, -4)]
#[case(AluOp::Slt, -1, 1, 1)]
#[case(AluOp::Slt, 1, -1, 0)]
#[case(AluOp::Sltu, -1, 1, 0)] // -1 is u64::MAX unsigned
#[case(AluOp::Sltu, 1, -1, 1)]
fn test_alu_semantics(
    #[case] op: AluOp,
    #[case] a: i64,
    #[case] b: i64,
    #[case] expected: i64,
) {
    let mut st = state();
    st.write_xrf(1, a).unwrap();
    st.write_xrf(2, b).unwrap();
    apply(
        &mut st,
        Op::Alu {
            op,
            rd: 3,
            rs1: 1,
            rs2: 2,
        },
    );
    assert_eq!(st.read_xrf(3).unwrap(), expected);
}

#[test]
fn test_add_wraps_instead_of_trapping() {
    let mut st = state();
    st.write_xrf(1, i64::MAX).unwrap();
    apply(
        &mut st,
        Op::AluImm {
            op: AluOp::Add,
            rd: 2,
            rs1: 1,
            imm: 1,
        },
    );
    assert_eq!(st.read_xrf(2).unwrap(), i64::MIN);
}

#[rstest]
#[case(BranchCond::Eq, 5, 5, true)]
#[case(BranchCond::Eq, 5, 6, false)]
#[case(BranchCond::Ne, 5, 6, true)]
#[case(BranchCond::Lt, -2, 1, true)]
#[case(BranchCond::Lt, 1, -2, false)]
#[case(BranchCond::Ge, 1, -2, true)]
#[case(BranchCond::Ge, -2, 1, false)]
#[case(BranchCond::Ge, 3, 3, true)]
#[case(BranchCond::Ltu, 1, -2, true)] // -2 is huge unsigned
#[case(BranchCond::Ltu, -2, 1, false)]
#[case(BranchCond::Geu, -2, 1, true)]
#[case(BranchCond::Geu, 1, -2, false)]
#[case(BranchCond::Geu, 4, 4, true)]
fn test_branch_predicates(
    #[case] cond: BranchCond,
    #[case] a: i64,
    #[case] b: i64,
    #[case] taken: bool,
) {
    let mut st = state();
    st.set_pc(10);
    st.set_npc(11);
    st.write_xrf(1, a).unwrap();
    st.write_xrf(2, b).unwrap();
    apply(
        &mut st,
        Op::Branch {
            cond,
            rs1: 1,
            rs2: 2,
            imm: 4,
        },
    );
    if taken {
        assert_eq!(st.npc(), 10 + 4 - LATENCY);
        assert!(st.take_redirect());
    } else {
        assert_eq!(st.npc(), 11);
        assert!(!st.take_redirect());
    }
}

#[test]
fn test_jal_target_compensates_for_pipeline_depth() {
    let mut st = state();
    st.set_pc(20);
    apply(&mut st, Op::Jal { imm: -6 });
    assert_eq!(st.npc(), 20 - 6 - LATENCY);
    assert!(st.take_redirect());
}

#[test]
fn test_matmul_identity_weight_projects_columns() {
    let mut st = state();
    // Activation: 64×32 bf16 ramp. Weight: 16×32 identity-patterned tile.
    let act: Vec<f32> = (0..64 * 32).map(|i| (i % 16) as f32).collect();
    let act_t = Tensor::from_f32(DType::Bf16, 64, 32, &act).unwrap();
    st.write_mrf_bf16(1, &act_t).unwrap();

    let weight: Vec<f32> = (0..16 * 32)
        .map(|i| if i / 32 == i % 32 { 1.0 } else { 0.0 })
        .collect();
    let w_t = Tensor::from_f32(DType::Bf16, 16, 32, &weight).unwrap();
    st.write_wb_bf16(0, &w_t).unwrap();

    apply(
        &mut st,
        Op::Matmul {
            unit: MatmulUnit::Any,
            rd: 2,
            rs1: 1,
            rs2: 0,
        },
    );

    let out = st.read_mrf_f32(2).unwrap();
    assert_eq!((out.rows(), out.cols()), (64, 16));
    let values = out.to_f32();
    // With an identity N×K weight, out[m][n] == act[m][n].
    for m in 0..64 {
        for n in 0..16 {
            assert_eq!(values[m * 16 + n], act[m * 32 + n], "m={m} n={n}");
        }
    }
}

#[test]
fn test_vadd_doubles() {
    let mut st = state();
    let values: Vec<f32> = (0..64 * 32).map(|i| (i % 8) as f32).collect();
    let t = Tensor::from_f32(DType::Bf16, 64, 32, &values).unwrap();
    st.write_mrf_bf16(0, &t).unwrap();
    apply(
        &mut st,
        Op::VecBinary {
            op: VecBinaryOp::Add,
            vrd: 1,
            vs1: 0,
            vs2: 0,
        },
    );
    let out = st.read_mrf_bf16(1).unwrap().to_f32();
    for (i, &v) in out.iter().enumerate() {
        assert_eq!(v, 2.0 * (i % 8) as f32);
    }
}

#[test]
fn test_vsqrt_of_squares() {
    let mut st = state();
    let values: Vec<f32> = (0..64 * 32).map(|i| ((i % 10) * (i % 10)) as f32).collect();
    let t = Tensor::from_f32(DType::Bf16, 64, 32, &values).unwrap();
    st.write_mrf_bf16(0, &t).unwrap();
    apply(
        &mut st,
        Op::VecUnary {
            op: VecUnaryOp::Sqrt,
            vrd: 1,
            vs1: 0,
        },
    );
    let out = st.read_mrf_bf16(1).unwrap().to_f32();
    for (i, &v) in out.iter().enumerate() {
        assert_eq!(v, (i % 10) as f32);
    }
}

#[test]
fn test_mv_mm_copies_bit_exact() {
    let mut st = state();
    let bytes: Vec<u8> = (0..4096).map(|i| (i % 251) as u8).collect();
    let t = st.mrf_tensor_u8(bytes.clone()).unwrap();
    st.write_mrf_u8(4, &t).unwrap();
    apply(&mut st, Op::MoveMm { vrd: 5, vs1: 4 });
    assert_eq!(st.read_mrf_u8(5).unwrap().bytes(), &bytes[..]);
}

#[test]
fn test_mv_mw_truncates_to_the_weight_buffer() {
    let mut st = state();
    let bytes: Vec<u8> = (0..4096).map(|i| (i % 199) as u8).collect();
    let t = st.mrf_tensor_u8(bytes.clone()).unwrap();
    st.write_mrf_u8(0, &t).unwrap();
    apply(&mut st, Op::MoveMw { rd: 1, rs1: 0 });
    assert_eq!(st.read_wb_u8(1).unwrap().bytes(), &bytes[..1024]);
}

#[test]
fn test_dma_load_zero_pads_to_register_capacity() {
    let mut st = state();
    st.write_memory(0, &[7; 100]).unwrap();
    apply(
        &mut st,
        Op::DmaLoadM {
            rd: 3,
            base: 0,
            size: 100,
            flag: 0,
        },
    );
    let out = st.read_mrf_u8(3).unwrap();
    assert!(out.bytes()[..100].iter().all(|&b| b == 7));
    assert!(out.bytes()[100..].iter().all(|&b| b == 0));
}

#[test]
fn test_dma_store_writes_exactly_size_bytes() {
    let mut st = state();
    let bytes: Vec<u8> = (0..4096).map(|i| (i % 250) as u8).collect();
    let t = st.mrf_tensor_u8(bytes.clone()).unwrap();
    st.write_mrf_u8(0, &t).unwrap();
    apply(
        &mut st,
        Op::DmaStoreM {
            rs1: 0,
            base: 500,
            size: 48,
            flag: 0,
        },
    );
    assert_eq!(st.read_memory(500, 48).unwrap(), bytes[..48].to_vec());
    assert_eq!(st.read_memory(548, 8).unwrap(), vec![0; 8]);
}

#[test]
fn test_dma_load_out_of_bounds_propagates() {
    let mut st = state();
    let size = st.cfg().memory_size;
    let op = Op::DmaLoadM {
        rd: 0,
        base: size - 16,
        size: 32,
        flag: 0,
    };
    assert!(op.apply(&mut st).is_err());
}
