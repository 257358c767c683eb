//! 80-bit extended precision storage for the `float128` element kind
//!
//! Files written on x86 store `long double` values as the x87 extended
//! format padded to 16 bytes:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00   | 8    | Mantissa with explicit integer bit (LE) |
//! | 0x08   | 2    | Sign bit and 15-bit biased exponent (LE) |
//! | 0x0A   | 6    | Padding |
//!
//! Rust has no native type for this, so values are kept as raw bytes and
//! converted to and from `f64` on demand.

use std::fmt;

/// Size of one extended value on disk.
pub const EXTENDED_SIZE: usize = 16;

const EXPONENT_BIAS: i32 = 16383;
const EXPONENT_MASK: u16 = 0x7FFF;
const INTEGER_BIT: u64 = 1 << 63;
const F64_FRACTION_MASK: u64 = (1 << 52) - 1;

/// x87 extended precision value stored in a 16-byte slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extended([u8; EXTENDED_SIZE]);

impl Extended {
    /// Positive zero.
    pub const ZERO: Self = Self([0; EXTENDED_SIZE]);

    /// Wrap raw on-disk bytes without interpretation.
    pub const fn from_bytes(bytes: [u8; EXTENDED_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw on-disk bytes.
    pub const fn to_bytes(self) -> [u8; EXTENDED_SIZE] {
        self.0
    }

    fn from_parts(sign: bool, exponent: u16, mantissa: u64) -> Self {
        let mut bytes = [0u8; EXTENDED_SIZE];
        bytes[0x00..0x08].copy_from_slice(&mantissa.to_le_bytes());
        let sign_exponent = (u16::from(sign) << 15) | (exponent & EXPONENT_MASK);
        bytes[0x08..0x0A].copy_from_slice(&sign_exponent.to_le_bytes());
        Self(bytes)
    }

    fn mantissa(self) -> u64 {
        let mut m = [0u8; 8];
        m.copy_from_slice(&self.0[0x00..0x08]);
        u64::from_le_bytes(m)
    }

    fn sign_exponent(self) -> u16 {
        u16::from_le_bytes([self.0[0x08], self.0[0x09]])
    }

    /// Whether the sign bit is set.
    pub fn is_sign_negative(self) -> bool {
        self.sign_exponent() & 0x8000 != 0
    }

    /// Widen an `f64`. Every `f64` is exactly representable.
    pub fn from_f64(value: f64) -> Self {
        let bits = value.to_bits();
        let sign = bits >> 63 != 0;
        let exponent = ((bits >> 52) & 0x7FF) as i32;
        let fraction = bits & F64_FRACTION_MASK;

        match (exponent, fraction) {
            (0, 0) => Self::from_parts(sign, 0, 0),
            (0x7FF, _) => Self::from_parts(sign, EXPONENT_MASK, INTEGER_BIT | (fraction << 11)),
            (0, _) => {
                // Subnormal f64: normalize so the integer bit is set
                let shift = fraction.leading_zeros() as i32;
                let mantissa = fraction << shift;
                let biased = EXPONENT_BIAS + 63 - 1074 - shift;
                Self::from_parts(sign, biased as u16, mantissa)
            }
            _ => {
                let biased = exponent - 1023 + EXPONENT_BIAS;
                Self::from_parts(sign, biased as u16, INTEGER_BIT | (fraction << 11))
            }
        }
    }

    /// Narrow to `f64`, rounding to nearest with ties to even.
    pub fn to_f64(self) -> f64 {
        let sign_bit = if self.is_sign_negative() { 1u64 << 63 } else { 0 };
        let exponent = self.sign_exponent() & EXPONENT_MASK;
        let mantissa = self.mantissa();

        if exponent == EXPONENT_MASK {
            let payload = (mantissa << 1) >> 12;
            return if mantissa << 1 == 0 {
                f64::from_bits(sign_bit | (0x7FF << 52))
            } else {
                // Keep the payload but force a quiet NaN
                f64::from_bits(sign_bit | (0x7FF << 52) | (1 << 51) | payload)
            };
        }
        if mantissa == 0 {
            return f64::from_bits(sign_bit);
        }

        // Exponent 0 encodes denormals with a fixed scale of 2^-16382
        let mut unbiased = if exponent == 0 {
            1 - EXPONENT_BIAS
        } else {
            i32::from(exponent) - EXPONENT_BIAS
        };
        let lz = mantissa.leading_zeros();
        let mantissa = mantissa << lz;
        unbiased -= lz as i32;

        if unbiased > 1023 {
            return f64::from_bits(sign_bit | (0x7FF << 52));
        }

        if unbiased >= -1022 {
            let mut m53 = round_shift(u128::from(mantissa), 11) as u64;
            if m53 == 1 << 53 {
                m53 >>= 1;
                unbiased += 1;
                if unbiased > 1023 {
                    return f64::from_bits(sign_bit | (0x7FF << 52));
                }
            }
            let biased = (unbiased + 1023) as u64;
            return f64::from_bits(sign_bit | (biased << 52) | (m53 & F64_FRACTION_MASK));
        }

        // Result is subnormal in f64; a carry into bit 52 yields the
        // smallest normal, which the bit layout handles on its own
        let shift = 11 + (-1022 - unbiased) as u32;
        if shift > 64 {
            return f64::from_bits(sign_bit);
        }
        let m = round_shift(u128::from(mantissa), shift) as u64;
        f64::from_bits(sign_bit | m)
    }
}

/// Shift right by `shift` bits, rounding to nearest with ties to even.
fn round_shift(value: u128, shift: u32) -> u128 {
    if shift == 0 {
        return value;
    }
    let kept = value >> shift;
    let remainder = value & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    if remainder > half || (remainder == half && kept & 1 == 1) {
        kept + 1
    } else {
        kept
    }
}

impl From<f64> for Extended {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<f32> for Extended {
    fn from(value: f32) -> Self {
        Self::from_f64(f64::from(value))
    }
}

impl From<Extended> for f64 {
    fn from(value: Extended) -> Self {
        value.to_f64()
    }
}

impl fmt::Display for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}
