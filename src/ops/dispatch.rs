//! DType dispatch utilities
//!
//! This module provides the `dispatch_dtype!` macro for runtime type dispatch.
//! It converts a `DType` value into a concrete Rust type so generic kernels can
//! be monomorphized once per registered kind.
//!
//! # Usage
//!
//! ```
//! use nope::dispatch_dtype;
//! use nope::dtype::DType;
//!
//! fn element_size(dtype: DType) -> usize {
//!     dispatch_dtype!(dtype, T => {
//!         // T is now a concrete type (f32, i64, u8, etc.)
//!         std::mem::size_of::<T>()
//!     })
//! }
//!
//! assert_eq!(element_size(DType::Int16), 2);
//! ```
//!
//! ## Supported Types
//!
//! - `Int8` -> `i8`, `UInt8` -> `u8`
//! - `Int16` -> `i16`, `UInt16` -> `u16`
//! - `Int32` -> `i32`, `UInt32` -> `u32`
//! - `Int64` -> `i64`, `UInt64` -> `u64`
//! - `Float32` -> `f32`, `Float64` -> `f64`
//!
//! The registry is closed, so the match is exhaustive and needs no error arm.

/// Macro for runtime dtype dispatch to typed operations.
///
/// Takes a `DType` value and evaluates a block with `$T` bound to the
/// corresponding Rust type. Every arm must produce the same type.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::dtype::DType::Int8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::UInt8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Int16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::UInt16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::Int32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::UInt32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::Int64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::UInt64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::Float32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::Float64 => {
                type $T = f64;
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::dtype::{DType, Element};

    #[test]
    fn test_dispatch_binds_registered_type() {
        for dtype in DType::ALL {
            let bound = dispatch_dtype!(dtype, T => { <T as Element>::DTYPE });
            assert_eq!(bound, dtype);
        }
    }
}
