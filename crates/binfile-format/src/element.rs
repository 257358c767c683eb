//! Element types and their on-disk codecs
//!
//! Every sample in a file shares one [`ElementType`]. The type tag stored
//! in the header selects the Rust element used to decode the sample data:
//!
//! | Tag | Type | Rust element | Bytes |
//! |-----|------|--------------|-------|
//! | 1 | `bool` | `bool` | 1 |
//! | 2-5 | `int8`..`int64` | `i8`..`i64` | 1-8 |
//! | 6-9 | `uint8`..`uint64` | `u8`..`u64` | 1-8 |
//! | 10-11 | `float32`, `float64` | `f32`, `f64` | 4, 8 |
//! | 12 | `float128` | [`Extended`] | 16 |
//! | 13-14 | `complex64`, `complex128` | `Complex<f32>`, `Complex<f64>` | 8, 16 |
//! | 15 | `complex256` | `Complex<Extended>` | 32 |
//!
//! Values use native byte order.

use crate::error::FormatError;
use crate::extended::{EXTENDED_SIZE, Extended};
use crate::sample::Sample;
use ndarray::ArrayD;
use num_complex::Complex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed set of element kinds a BinFile can store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum ElementType {
    /// Boolean stored as one byte
    Bool = 1,
    /// Signed 8-bit integer
    Int8 = 2,
    /// Signed 16-bit integer
    Int16 = 3,
    /// Signed 32-bit integer
    Int32 = 4,
    /// Signed 64-bit integer
    Int64 = 5,
    /// Unsigned 8-bit integer
    UInt8 = 6,
    /// Unsigned 16-bit integer
    UInt16 = 7,
    /// Unsigned 32-bit integer
    UInt32 = 8,
    /// Unsigned 64-bit integer
    UInt64 = 9,
    /// 32-bit float
    Float32 = 10,
    /// 64-bit float
    Float64 = 11,
    /// Extended precision float in a 16-byte slot
    Float128 = 12,
    /// Complex of two 32-bit floats
    Complex64 = 13,
    /// Complex of two 64-bit floats
    Complex128 = 14,
    /// Complex of two extended precision floats
    Complex256 = 15,
}

impl ElementType {
    /// All element types in tag order
    pub const ALL: [Self; 15] = [
        Self::Bool,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
        Self::Float128,
        Self::Complex64,
        Self::Complex128,
        Self::Complex256,
    ];

    /// On-disk tag
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Size of one element in bytes
    pub const fn byte_size(self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => 8,
            Self::Float128 | Self::Complex128 => 16,
            Self::Complex256 => 32,
        }
    }

    /// Lowercase name used in messages and metadata output
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Float128 => "float128",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::Complex256 => "complex256",
        }
    }

    /// Whether this is one of the complex kinds
    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            Self::Complex64 | Self::Complex128 | Self::Complex256
        )
    }
}

impl TryFrom<u32> for ElementType {
    type Error = FormatError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.tag() == tag)
            .ok_or(FormatError::InvalidType(tag))
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown element type '{s}'"))
    }
}

/// A scalar that can be stored in a BinFile sample
///
/// Implementations provide the byte codec for one [`ElementType`] and the
/// mapping between `ArrayD<Self>` and the matching [`Sample`] variant.
pub trait Element: Copy + fmt::Debug + PartialEq + 'static {
    /// Element type written to the header
    const TYPE: ElementType;

    /// Append the native-endian encoding of `self` to `out`
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode one element from exactly `TYPE.byte_size()` bytes
    fn decode(bytes: &[u8]) -> Self;

    /// Wrap an array in its sample variant
    fn into_sample(array: ArrayD<Self>) -> Sample;

    /// Borrow the array if `sample` holds this element type
    fn as_array(sample: &Sample) -> Option<&ArrayD<Self>>;

    /// Take the array if `sample` holds this element type
    fn from_sample(sample: Sample) -> Result<ArrayD<Self>, Sample>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident, $n:expr, |$v:ident, $out:ident| $enc:expr, |$b:ident| $dec:expr) => {
        impl Element for $t {
            const TYPE: ElementType = ElementType::$variant;

            fn encode(&self, $out: &mut Vec<u8>) {
                let $v = *self;
                $enc
            }

            fn decode($b: &[u8]) -> Self {
                $dec
            }

            fn into_sample(array: ArrayD<Self>) -> Sample {
                Sample::$variant(array)
            }

            fn as_array(sample: &Sample) -> Option<&ArrayD<Self>> {
                match sample {
                    Sample::$variant(a) => Some(a),
                    _ => None,
                }
            }

            fn from_sample(sample: Sample) -> Result<ArrayD<Self>, Sample> {
                match sample {
                    Sample::$variant(a) => Ok(a),
                    other => Err(other),
                }
            }
        }

        const _: () = assert!(ElementType::$variant.byte_size() == $n);
    };
}

macro_rules! impl_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl_element!(
                $t,
                $variant,
                std::mem::size_of::<$t>(),
                |v, out| out.extend_from_slice(&v.to_ne_bytes()),
                |bytes| {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_ne_bytes(buf)
                }
            );
        )*
    };
}

impl_primitive! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

impl_element!(
    bool,
    Bool,
    1,
    |v, out| out.push(u8::from(v)),
    |bytes| bytes[0] != 0
);

impl_element!(
    Extended,
    Float128,
    EXTENDED_SIZE,
    |v, out| out.extend_from_slice(&v.to_bytes()),
    |bytes| {
        let mut buf = [0u8; EXTENDED_SIZE];
        buf.copy_from_slice(bytes);
        Extended::from_bytes(buf)
    }
);

impl_element!(
    Complex<f32>,
    Complex64,
    8,
    |v, out| {
        v.re.encode(out);
        v.im.encode(out);
    },
    |bytes| Complex::new(f32::decode(&bytes[..4]), f32::decode(&bytes[4..]))
);

impl_element!(
    Complex<f64>,
    Complex128,
    16,
    |v, out| {
        v.re.encode(out);
        v.im.encode(out);
    },
    |bytes| Complex::new(f64::decode(&bytes[..8]), f64::decode(&bytes[8..]))
);

impl_element!(
    Complex<Extended>,
    Complex256,
    2 * EXTENDED_SIZE,
    |v, out| {
        v.re.encode(out);
        v.im.encode(out);
    },
    |bytes| Complex::new(
        Extended::decode(&bytes[..EXTENDED_SIZE]),
        Extended::decode(&bytes[EXTENDED_SIZE..])
    )
);

/// Run `$body` with `$t` bound to the Rust element type for `$ty`.
///
/// This is the single dispatch point from a runtime [`ElementType`] to the
/// generic element codec.
#[macro_export]
macro_rules! with_element_type {
    ($ty:expr, $t:ident => $body:expr) => {
        match $ty {
            $crate::ElementType::Bool => {
                type $t = bool;
                $body
            }
            $crate::ElementType::Int8 => {
                type $t = i8;
                $body
            }
            $crate::ElementType::Int16 => {
                type $t = i16;
                $body
            }
            $crate::ElementType::Int32 => {
                type $t = i32;
                $body
            }
            $crate::ElementType::Int64 => {
                type $t = i64;
                $body
            }
            $crate::ElementType::UInt8 => {
                type $t = u8;
                $body
            }
            $crate::ElementType::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::ElementType::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::ElementType::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::ElementType::Float32 => {
                type $t = f32;
                $body
            }
            $crate::ElementType::Float64 => {
                type $t = f64;
                $body
            }
            $crate::ElementType::Float128 => {
                type $t = $crate::Extended;
                $body
            }
            $crate::ElementType::Complex64 => {
                type $t = $crate::num_complex::Complex<f32>;
                $body
            }
            $crate::ElementType::Complex128 => {
                type $t = $crate::num_complex::Complex<f64>;
                $body
            }
            $crate::ElementType::Complex256 => {
                type $t = $crate::num_complex::Complex<$crate::Extended>;
                $body
            }
        }
    };
}
