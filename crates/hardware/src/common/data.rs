//! Element types and tensors for the dtype-aware register views.
//!
//! This module defines the data-representation layer between the architectural
//! state and the instruction semantics. It provides:
//! 1. **`DType`:** The closed set of element types the register files can be
//!    viewed as (u8, fp8-e4m3, bf16, f32).
//! 2. **`Tensor`:** An owned (dtype, shape, bytes) triple used as the value
//!    crossing the register-view boundary; no aliased mutable views escape.
//! 3. **Conversions:** bf16 via the `half` crate, fp8-e4m3 by hand (no crate
//!    in common use covers it).

use std::fmt;

use half::bf16;

use super::error::SimError;

/// Element type of a register-file view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// Unsigned 8-bit integer (raw bytes).
    U8,
    /// 8-bit float, 4 exponent bits (bias 7), 3 mantissa bits, no infinities.
    Fp8E4m3,
    /// bfloat16: the top half of an IEEE-754 f32.
    Bf16,
    /// IEEE-754 single precision.
    F32,
}

impl DType {
    /// Width of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::Fp8E4m3 => 1,
            Self::Bf16 => 2,
            Self::F32 => 4,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::Fp8E4m3 => "fp8_e4m3",
            Self::Bf16 => "bf16",
            Self::F32 => "f32",
        };
        write!(f, "{name}")
    }
}

/// Decodes one fp8-e4m3 element to f32.
///
/// The encoding has no infinities; `S.1111.111` is NaN, exponent 0 is
/// subnormal with scale 2⁻⁶.
pub fn fp8_e4m3_to_f32(bits: u8) -> f32 {
    let sign = if bits & 0x80 == 0 { 1.0_f32 } else { -1.0_f32 };
    let exp = (bits >> 3) & 0x0F;
    let man = f32::from(bits & 0x07);
    if exp == 0x0F && (bits & 0x07) == 0x07 {
        return f32::NAN.copysign(sign);
    }
    if exp == 0 {
        sign * (man / 8.0) * 2.0_f32.powi(-6)
    } else {
        sign * (1.0 + man / 8.0) * 2.0_f32.powi(i32::from(exp) - 7)
    }
}

/// Encodes an f32 as fp8-e4m3 with round-to-nearest-even and saturation.
///
/// Values beyond the maximum finite magnitude (448) saturate rather than
/// producing the NaN pattern; NaN inputs map to the NaN pattern.
pub fn f32_to_fp8_e4m3(value: f32) -> u8 {
    let sign: u8 = if value.is_sign_negative() { 0x80 } else { 0x00 };
    if value.is_nan() {
        return sign | 0x7F;
    }
    let a = value.abs();
    // Below half the smallest subnormal (2^-9): flush to zero.
    if a < 2.0_f32.powi(-10) {
        return sign;
    }
    // Subnormal range: quantize in units of 2^-9.
    if a < 2.0_f32.powi(-6) {
        let q = (a * 2.0_f32.powi(9)).round_ties_even() as u8;
        if q >= 8 {
            return sign | 0x08;
        }
        return sign | q;
    }
    let fbits = a.to_bits();
    let mut exp = ((fbits >> 23) & 0xFF) as i32 - 127;
    let man = (fbits >> 20) & 0x7;
    let rem = fbits & 0x000F_FFFF;
    let halfway = 0x0008_0000;
    let mut quant = man;
    if rem > halfway || (rem == halfway && (man & 1) == 1) {
        quant += 1;
    }
    if quant == 8 {
        quant = 0;
        exp += 1;
    }
    if exp > 8 {
        return sign | 0x7E;
    }
    let out = sign | (((exp + 7) as u8) << 3) | (quant as u8);
    // exp == 8 with full mantissa would collide with the NaN pattern: saturate.
    if out & 0x7F == 0x7F { sign | 0x7E } else { out }
}

/// An owned, densely packed 2-D tensor of a single element type.
///
/// `Tensor` is the only value that crosses the register-view boundary: reads
/// copy register bytes out into a `Tensor`, writes validate the tensor's
/// dtype and element count against the register shape and then copy bytes in.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    dtype: DType,
    rows: usize,
    cols: usize,
    bytes: Vec<u8>,
}

impl Tensor {
    /// Creates a zero-filled tensor.
    pub fn zeros(dtype: DType, rows: usize, cols: usize) -> Self {
        Self {
            dtype,
            rows,
            cols,
            bytes: vec![0; rows * cols * dtype.size()],
        }
    }

    /// Wraps raw bytes as a tensor, validating the byte length against the shape.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShapeMismatch`] when `bytes.len()` disagrees with
    /// `rows * cols * dtype.size()`.
    pub fn from_bytes(
        dtype: DType,
        rows: usize,
        cols: usize,
        bytes: Vec<u8>,
    ) -> Result<Self, SimError> {
        let expected = rows * cols * dtype.size();
        if bytes.len() != expected {
            return Err(SimError::ShapeMismatch {
                what: "tensor bytes",
                dtype,
                expected: expected / dtype.size(),
                actual: bytes.len() / dtype.size(),
            });
        }
        Ok(Self {
            dtype,
            rows,
            cols,
            bytes,
        })
    }

    /// Encodes a slice of f32 values into a tensor of the given dtype.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShapeMismatch`] when `values.len() != rows * cols`.
    pub fn from_f32(
        dtype: DType,
        rows: usize,
        cols: usize,
        values: &[f32],
    ) -> Result<Self, SimError> {
        if values.len() != rows * cols {
            return Err(SimError::ShapeMismatch {
                what: "tensor values",
                dtype,
                expected: rows * cols,
                actual: values.len(),
            });
        }
        let mut bytes = Vec::with_capacity(values.len() * dtype.size());
        for &v in values {
            match dtype {
                DType::U8 => bytes.push(v as u8),
                DType::Fp8E4m3 => bytes.push(f32_to_fp8_e4m3(v)),
                DType::Bf16 => bytes.extend_from_slice(&bf16::from_f32(v).to_le_bytes()),
                DType::F32 => bytes.extend_from_slice(&v.to_le_bytes()),
            }
        }
        Ok(Self {
            dtype,
            rows,
            cols,
            bytes,
        })
    }

    /// Decodes every element to f32 in row-major order.
    pub fn to_f32(&self) -> Vec<f32> {
        let w = self.dtype.size();
        self.bytes
            .chunks_exact(w)
            .map(|chunk| match self.dtype {
                DType::U8 => f32::from(chunk[0]),
                DType::Fp8E4m3 => fp8_e4m3_to_f32(chunk[0]),
                DType::Bf16 => bf16::from_le_bytes([chunk[0], chunk[1]]).to_f32(),
                DType::F32 => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            })
            .collect()
    }

    /// Element type of this tensor.
    pub const fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total element count.
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// True when the tensor has no elements.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw little-endian bytes, row major.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the tensor, returning its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
