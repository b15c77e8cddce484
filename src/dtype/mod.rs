//! Data type registry for nope tensors
//!
//! This module provides the `DType` enum, the fixed catalogue of scalar
//! element kinds a tensor can hold, along with the static mapping from Rust
//! scalar types ([`Element`]) and the buffer format-tag bijection.

mod element;
mod format;

pub use element::Element;

use crate::error::{Error, Result};
use std::fmt;

/// Data types supported by nope tensors
///
/// Equality is by kind only; a `DType` carries no other state.
///
/// # Discriminant Values (Serialization Stability)
///
/// The discriminant values are **stable** and double as the kind id exposed
/// to binding layers: `Int8=0, UInt8=1, Int16=2, UInt16=3, Int32=4, UInt32=5,
/// Int64=6, UInt64=7, Float32=8, Float64=9`. Any other id is rejected with
/// [`Error::UnknownKind`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DType {
    /// 8-bit signed integer
    Int8 = 0,
    /// 8-bit unsigned integer
    UInt8 = 1,
    /// 16-bit signed integer
    Int16 = 2,
    /// 16-bit unsigned integer
    UInt16 = 3,
    /// 32-bit signed integer
    Int32 = 4,
    /// 32-bit unsigned integer
    UInt32 = 5,
    /// 64-bit signed integer
    Int64 = 6,
    /// 64-bit unsigned integer
    UInt64 = 7,
    /// 32-bit floating point (default)
    #[default]
    Float32 = 8,
    /// 64-bit floating point
    Float64 = 9,
}

impl DType {
    /// All registered kinds in declaration order
    pub const ALL: [DType; 10] = [
        Self::Int8,
        Self::UInt8,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
    ];

    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Stable numeric kind id
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// DType registered for the Rust scalar `T`
    ///
    /// Unregistered types do not implement [`Element`] and fail to compile.
    #[inline]
    pub const fn of<T: Element>() -> Self {
        T::DTYPE
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns true if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns true if this is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    /// Short name (e.g., "f32", "i64")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Int8 => "i8",
            Self::UInt8 => "u8",
            Self::Int16 => "i16",
            Self::UInt16 => "u16",
            Self::Int32 => "i32",
            Self::UInt32 => "u32",
            Self::Int64 => "i64",
            Self::UInt64 => "u64",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
        }
    }

    /// Full kind name, as printed by `Display`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "Int8",
            Self::UInt8 => "UInt8",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for DType {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(Error::UnknownKind(id))
    }
}

impl From<DType> for u8 {
    fn from(dtype: DType) -> Self {
        dtype.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        let sizes: Vec<usize> = DType::ALL.iter().map(|d| d.size_in_bytes()).collect();
        assert_eq!(sizes, [1, 1, 2, 2, 4, 4, 8, 8, 4, 8]);
    }

    #[test]
    fn test_dtype_ids_are_declaration_order() {
        for (i, dtype) in DType::ALL.iter().enumerate() {
            assert_eq!(dtype.id() as usize, i);
            assert_eq!(DType::try_from(i as u8).unwrap(), *dtype);
        }
        assert_eq!(DType::try_from(10), Err(Error::UnknownKind(10)));
        assert_eq!(DType::try_from(255), Err(Error::UnknownKind(255)));
    }

    #[test]
    fn test_dtype_categories() {
        assert!(DType::Float32.is_float());
        assert!(!DType::Int32.is_float());
        assert!(DType::Int64.is_signed_int());
        assert!(DType::UInt16.is_unsigned_int());
        assert!(!DType::UInt16.is_signed_int());
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::Float32.to_string(), "Float32");
        assert_eq!(DType::UInt64.to_string(), "UInt64");
        assert_eq!(DType::Int8.short_name(), "i8");
        assert_eq!(DType::default(), DType::Float32);
    }
}
