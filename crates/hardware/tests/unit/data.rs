//! # Element Type and Tensor Tests
//!
//! bf16/fp8 conversion behavior and tensor shape validation.

use proptest::prelude::*;

use npusim_core::common::data::{DType, Tensor, f32_to_fp8_e4m3, fp8_e4m3_to_f32};

#[test]
fn test_dtype_widths() {
    assert_eq!(DType::U8.size(), 1);
    assert_eq!(DType::Fp8E4m3.size(), 1);
    assert_eq!(DType::Bf16.size(), 2);
    assert_eq!(DType::F32.size(), 4);
}

#[test]
fn test_fp8_known_encodings() {
    assert_eq!(f32_to_fp8_e4m3(0.0), 0x00);
    assert_eq!(f32_to_fp8_e4m3(1.0), 0x38);
    assert_eq!(f32_to_fp8_e4m3(-1.5), 0xBC);
    assert_eq!(f32_to_fp8_e4m3(448.0), 0x7E);
    // Beyond the max finite value: saturate, never the NaN pattern.
    assert_eq!(f32_to_fp8_e4m3(1e9), 0x7E);
    assert_eq!(f32_to_fp8_e4m3(f32::NAN) & 0x7F, 0x7F);
}

#[test]
fn test_fp8_known_decodings() {
    assert_eq!(fp8_e4m3_to_f32(0x00), 0.0);
    assert_eq!(fp8_e4m3_to_f32(0x38), 1.0);
    assert_eq!(fp8_e4m3_to_f32(0xBC), -1.5);
    assert_eq!(fp8_e4m3_to_f32(0x7E), 448.0);
    assert!(fp8_e4m3_to_f32(0x7F).is_nan());
    // Smallest subnormal: 2^-9.
    assert_eq!(fp8_e4m3_to_f32(0x01), 2.0_f32.powi(-9));
}

#[test]
fn test_bf16_tensor_encode_decode() {
    let values = [0.5_f32, -2.0, 100.0, 0.0];
    let t = Tensor::from_f32(DType::Bf16, 2, 2, &values).unwrap();
    assert_eq!(t.bytes().len(), 8);
    assert_eq!(t.to_f32(), values);
}

#[test]
fn test_f32_tensor_is_bit_transparent() {
    let values = [1.0e-30_f32, 3.141_592_7, -0.0, f32::MAX];
    let t = Tensor::from_f32(DType::F32, 1, 4, &values).unwrap();
    assert_eq!(t.to_f32(), values);
}

#[test]
fn test_u8_tensor_decodes_to_integral_floats() {
    let t = Tensor::from_bytes(DType::U8, 1, 4, vec![0, 1, 128, 255]).unwrap();
    assert_eq!(t.to_f32(), vec![0.0, 1.0, 128.0, 255.0]);
}

#[test]
fn test_wrong_byte_length_is_rejected() {
    assert!(Tensor::from_bytes(DType::Bf16, 2, 2, vec![0; 7]).is_err());
    assert!(Tensor::from_f32(DType::F32, 2, 2, &[1.0; 3]).is_err());
}

#[test]
fn test_zeros_shape() {
    let t = Tensor::zeros(DType::F32, 3, 5);
    assert_eq!((t.rows(), t.cols(), t.len()), (3, 5, 15));
    assert_eq!(t.bytes().len(), 60);
    assert!(t.to_f32().iter().all(|&v| v == 0.0));
}

proptest! {
    /// Every value a bf16 can hold survives the encode/decode cycle.
    #[test]
    fn prop_bf16_values_round_trip(bits in any::<u16>()) {
        let v = half::bf16::from_bits(bits).to_f32();
        prop_assume!(!v.is_nan());
        let t = Tensor::from_f32(DType::Bf16, 1, 1, &[v]).unwrap();
        prop_assert_eq!(t.to_f32()[0].to_bits(), v.to_bits());
    }

    /// fp8 encode of a decoded fp8 value is the identity (non-NaN).
    #[test]
    fn prop_fp8_values_round_trip(bits in any::<u8>()) {
        let v = fp8_e4m3_to_f32(bits);
        prop_assume!(!v.is_nan());
        // -0.0 encodes back to 0x80, 0.0 to 0x00.
        let back = f32_to_fp8_e4m3(v);
        prop_assert_eq!(fp8_e4m3_to_f32(back).to_bits(), v.to_bits());
    }
}
