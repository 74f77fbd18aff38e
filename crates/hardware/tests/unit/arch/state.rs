//! # Typed Register View Tests
//!
//! Round-trip and validation tests for the MRF and WB dtype views: view
//! round-trips are bit-exact, shape and dtype mismatches are fatal.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use npusim_core::SimError;
use npusim_core::common::data::{DType, Tensor};
use npusim_core::config::ArchStateConfig;
use npusim_core::core::arch::state::ArchState;
use npusim_core::trace::NullTrace;

fn state() -> ArchState {
    ArchState::new(ArchStateConfig::default(), 2, Box::new(NullTrace))
}

/// Distinct byte pattern of length `n`.
fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 7 + 3) as u8).collect()
}

#[test]
fn test_mrf_u8_round_trip_is_bit_exact() {
    let mut st = state();
    let bytes = pattern(st.mrf_capacity());
    let t = st.mrf_tensor_u8(bytes.clone()).unwrap();
    st.write_mrf_u8(3, &t).unwrap();
    assert_eq!(st.read_mrf_u8(3).unwrap().bytes(), &bytes[..]);
}

#[test]
fn test_mrf_bf16_round_trip_is_bit_exact() {
    let mut st = state();
    let cfg = st.cfg().clone();
    let rows = cfg.mrf_depth;
    let cols = cfg.mrf_width / 2;
    let values: Vec<f32> = (0..rows * cols).map(|i| i as f32 * 0.5 - 100.0).collect();
    let t = Tensor::from_f32(DType::Bf16, rows, cols, &values).unwrap();
    st.write_mrf_bf16(1, &t).unwrap();
    let back = st.read_mrf_bf16(1).unwrap();
    assert_eq!(back.bytes(), t.bytes());
    assert_eq!((back.rows(), back.cols()), (rows, cols));
}

#[test]
fn test_mrf_f32_round_trip_is_bit_exact() {
    let mut st = state();
    let cfg = st.cfg().clone();
    let rows = cfg.mrf_depth;
    let cols = cfg.mrf_width / 4;
    let values: Vec<f32> = (0..rows * cols).map(|i| (i as f32).sqrt()).collect();
    let t = Tensor::from_f32(DType::F32, rows, cols, &values).unwrap();
    st.write_mrf_f32(0, &t).unwrap();
    let back = st.read_mrf_f32(0).unwrap();
    assert_eq!(back.bytes(), t.bytes());
    assert_eq!(back.to_f32(), values);
}

#[test]
fn test_mrf_fp8_round_trip_is_bit_exact() {
    let mut st = state();
    let cfg = st.cfg().clone();
    let rows = cfg.mrf_depth;
    let cols = cfg.mrf_width;
    let t = Tensor::from_bytes(DType::Fp8E4m3, rows, cols, pattern(rows * cols)).unwrap();
    st.write_mrf_fp8_e4m3(9, &t).unwrap();
    assert_eq!(st.read_mrf_fp8_e4m3(9).unwrap().bytes(), t.bytes());
}

#[test]
fn test_wb_round_trips_for_every_dtype() {
    let mut st = state();
    let cap = st.wb_capacity();
    for dtype in [DType::U8, DType::Fp8E4m3, DType::Bf16, DType::F32] {
        let rows = cap / st.cfg().mrf_width;
        let cols = st.cfg().mrf_width / dtype.size();
        let t = Tensor::from_bytes(dtype, rows, cols, pattern(cap)).unwrap();
        match dtype {
            DType::U8 => st.write_wb_u8(1, &t).unwrap(),
            DType::Fp8E4m3 => st.write_wb_fp8_e4m3(1, &t).unwrap(),
            DType::Bf16 => st.write_wb_bf16(1, &t).unwrap(),
            DType::F32 => st.write_wb_f32(1, &t).unwrap(),
        }
        let back = match dtype {
            DType::U8 => st.read_wb_u8(1).unwrap(),
            DType::Fp8E4m3 => st.read_wb_fp8_e4m3(1).unwrap(),
            DType::Bf16 => st.read_wb_bf16(1).unwrap(),
            DType::F32 => st.read_wb_f32(1).unwrap(),
        };
        assert_eq!(back.bytes(), t.bytes(), "dtype {dtype}");
    }
}

#[test]
fn test_wb_view_shape_matches_weight_tile() {
    let st = state();
    // Defaults: wb_width 1024, mrf_width 64 → a 16×32 bf16 weight tile whose
    // K matches the 64×32 bf16 activation view.
    let weight = st.read_wb_bf16(0).unwrap();
    assert_eq!((weight.rows(), weight.cols()), (16, 32));
    let act = st.read_mrf_bf16(0).unwrap();
    assert_eq!((act.rows(), act.cols()), (64, 32));
}

#[test]
fn test_wrong_element_count_is_fatal() {
    let mut st = state();
    let t = Tensor::from_bytes(DType::U8, 1, 16, pattern(16)).unwrap();
    assert!(matches!(
        st.write_mrf_u8(0, &t),
        Err(SimError::ShapeMismatch { what: "mrf", .. })
    ));
}

#[test]
fn test_wrong_dtype_is_fatal() {
    let mut st = state();
    let cfg = st.cfg().clone();
    let t = Tensor::from_bytes(
        DType::U8,
        cfg.mrf_depth,
        cfg.mrf_width,
        pattern(cfg.mrf_capacity()),
    )
    .unwrap();
    assert!(matches!(
        st.write_mrf_bf16(0, &t),
        Err(SimError::DtypeMismatch { .. })
    ));
}

#[test]
fn test_register_index_out_of_range_is_fatal() {
    let mut st = state();
    let n = st.cfg().num_m_registers;
    assert!(matches!(
        st.read_mrf_u8(n),
        Err(SimError::RegisterOutOfRange { regfile: "mrf", .. })
    ));
    let wb_n = st.cfg().num_wb_registers;
    let cap = st.wb_capacity();
    let t = st.wb_tensor_u8(pattern(cap)).unwrap();
    assert!(matches!(
        st.write_wb_u8(wb_n, &t),
        Err(SimError::RegisterOutOfRange { regfile: "wb", .. })
    ));
}

#[test]
fn test_reset_zeroes_banks() {
    let mut st = state();
    let cap = st.mrf_capacity();
    let t = st.mrf_tensor_u8(pattern(cap)).unwrap();
    st.write_mrf_u8(0, &t).unwrap();
    st.reset();
    assert!(st.read_mrf_u8(0).unwrap().bytes().iter().all(|&b| b == 0));
}

proptest! {
    /// Any correctly sized byte payload survives a u8 view round trip.
    #[test]
    fn prop_mrf_u8_round_trip(bytes in proptest::collection::vec(any::<u8>(), 4096)) {
        let mut st = state();
        let t = st.mrf_tensor_u8(bytes.clone()).unwrap();
        st.write_mrf_u8(2, &t).unwrap();
        let read_back = st.read_mrf_u8(2).unwrap();
        prop_assert_eq!(read_back.bytes(), &bytes[..]);
    }
}
