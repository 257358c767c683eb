//! Typed multidimensional samples
//!
//! A [`Sample`] wraps an `ndarray::ArrayD` of one of the supported element
//! types. Serialization walks the array by logical index, so standard,
//! Fortran-order and sliced or transposed arrays all end up on disk in
//! row-major order.

use crate::element::{Element, ElementType};
use crate::error::{BinFileError, Result};
use crate::extended::Extended;
use crate::with_element_type;
use ndarray::{Array, ArrayD, Dimension, IxDyn};
use num_complex::Complex;
use std::fmt;

/// Highest rank a BinFile can store
pub const MAX_RANK: usize = 4;

/// One array of a BinFile, tagged with its element type
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// `bool` elements
    Bool(ArrayD<bool>),
    /// `i8` elements
    Int8(ArrayD<i8>),
    /// `i16` elements
    Int16(ArrayD<i16>),
    /// `i32` elements
    Int32(ArrayD<i32>),
    /// `i64` elements
    Int64(ArrayD<i64>),
    /// `u8` elements
    UInt8(ArrayD<u8>),
    /// `u16` elements
    UInt16(ArrayD<u16>),
    /// `u32` elements
    UInt32(ArrayD<u32>),
    /// `u64` elements
    UInt64(ArrayD<u64>),
    /// `f32` elements
    Float32(ArrayD<f32>),
    /// `f64` elements
    Float64(ArrayD<f64>),
    /// Extended precision elements
    Float128(ArrayD<Extended>),
    /// `Complex<f32>` elements
    Complex64(ArrayD<Complex<f32>>),
    /// `Complex<f64>` elements
    Complex128(ArrayD<Complex<f64>>),
    /// `Complex<Extended>` elements
    Complex256(ArrayD<Complex<Extended>>),
}

/// Evaluate `$body` with `$a` bound to the inner array of `$sample`.
macro_rules! each_variant {
    ($sample:expr, $a:ident => $body:expr) => {
        match $sample {
            Sample::Bool($a) => $body,
            Sample::Int8($a) => $body,
            Sample::Int16($a) => $body,
            Sample::Int32($a) => $body,
            Sample::Int64($a) => $body,
            Sample::UInt8($a) => $body,
            Sample::UInt16($a) => $body,
            Sample::UInt32($a) => $body,
            Sample::UInt64($a) => $body,
            Sample::Float32($a) => $body,
            Sample::Float64($a) => $body,
            Sample::Float128($a) => $body,
            Sample::Complex64($a) => $body,
            Sample::Complex128($a) => $body,
            Sample::Complex256($a) => $body,
        }
    };
}

impl Sample {
    /// Element type of the wrapped array
    pub fn element_type(&self) -> ElementType {
        each_variant!(self, a => element_type_of(a))
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        each_variant!(self, a => a.ndim())
    }

    /// Per-dimension extents
    pub fn extents(&self) -> &[usize] {
        each_variant!(self, a => a.shape())
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        each_variant!(self, a => a.len())
    }

    /// Whether the sample holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the serialized sample in bytes
    pub fn byte_len(&self) -> usize {
        self.len() * self.element_type().byte_size()
    }

    /// Serialize the elements in row-major order
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        each_variant!(self, a => encode_array(a, &mut out));
        out
    }

    /// Decode a row-major byte run into a sample of the given type and shape
    ///
    /// `bytes` must hold exactly `product(extents) * element_type.byte_size()`
    /// bytes.
    pub fn from_bytes(element_type: ElementType, extents: &[usize], bytes: &[u8]) -> Result<Self> {
        with_element_type!(element_type, T => decode_array::<T>(extents, bytes).map(T::into_sample))
    }

    /// Borrow the array as element type `T`
    pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::as_array(self)
    }

    /// Convert into an array of element type `T`
    pub fn into_array<T: Element>(self) -> Result<ArrayD<T>> {
        T::from_sample(self).map_err(|s| BinFileError::Type {
            found: T::TYPE,
            expected: s.element_type(),
        })
    }
}

fn element_type_of<T: Element>(_: &ArrayD<T>) -> ElementType {
    T::TYPE
}

fn encode_array<T: Element>(array: &ArrayD<T>, out: &mut Vec<u8>) {
    for value in array {
        value.encode(out);
    }
}

fn decode_array<T: Element>(extents: &[usize], bytes: &[u8]) -> Result<ArrayD<T>> {
    let values = bytes
        .chunks_exact(T::TYPE.byte_size())
        .map(T::decode)
        .collect::<Vec<_>>();
    Ok(Array::from_shape_vec(IxDyn(extents), values)?)
}

impl<T: Element, D: Dimension> From<Array<T, D>> for Sample {
    fn from(array: Array<T, D>) -> Self {
        T::into_sample(array.into_dyn())
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(a) => write!(f, "{a}"),
            Self::Int8(a) => write!(f, "{a}"),
            Self::Int16(a) => write!(f, "{a}"),
            Self::Int32(a) => write!(f, "{a}"),
            Self::Int64(a) => write!(f, "{a}"),
            Self::UInt8(a) => write!(f, "{a}"),
            Self::UInt16(a) => write!(f, "{a}"),
            Self::UInt32(a) => write!(f, "{a}"),
            Self::UInt64(a) => write!(f, "{a}"),
            Self::Float32(a) => write!(f, "{a}"),
            Self::Float64(a) => write!(f, "{a}"),
            Self::Float128(a) => write!(f, "{a}"),
            Self::Complex64(a) => write!(f, "{a}"),
            Self::Complex128(a) => write!(f, "{a}"),
            // Complex<Extended> has no arithmetic, so print through f64
            Self::Complex256(a) => {
                let wide = a.mapv(|c| Complex::new(c.re.to_f64(), c.im.to_f64()));
                write!(f, "{wide}")
            }
        }
    }
}
