//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Div, Mul, Sub};

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to nope's runtime dtype registry.
/// It's implemented for exactly the ten registered primitive scalars, so
/// asking for the kind of any other type is a compile error.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Safe memory transmutation (bytemuck)
/// - `Add + Sub + Mul + Div` - Arithmetic operations (Output = Self)
/// - `PartialOrd` - Comparison for min/max operations
pub trait Element:
    Copy
    + Send
    + Sync
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Addition, wrapping on integer overflow
    fn add_elem(self, rhs: Self) -> Self;

    /// Subtraction, wrapping on integer overflow
    fn sub_elem(self, rhs: Self) -> Self;

    /// Multiplication, wrapping on integer overflow
    fn mul_elem(self, rhs: Self) -> Self;

    /// Division; integer division by zero yields zero, floats follow IEEE 754
    fn div_elem(self, rhs: Self) -> Self;
}

macro_rules! impl_int_element {
    ($($ty:ty => $dtype:ident);* $(;)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn add_elem(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                #[inline]
                fn sub_elem(self, rhs: Self) -> Self {
                    self.wrapping_sub(rhs)
                }

                #[inline]
                fn mul_elem(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }

                #[inline]
                fn div_elem(self, rhs: Self) -> Self {
                    if rhs == 0 { 0 } else { self.wrapping_div(rhs) }
                }
            }
        )*
    };
}

macro_rules! impl_float_element {
    ($($ty:ty => $dtype:ident);* $(;)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn add_elem(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline]
                fn sub_elem(self, rhs: Self) -> Self {
                    self - rhs
                }

                #[inline]
                fn mul_elem(self, rhs: Self) -> Self {
                    self * rhs
                }

                #[inline]
                fn div_elem(self, rhs: Self) -> Self {
                    self / rhs
                }
            }
        )*
    };
}

impl_int_element! {
    i8 => Int8;
    u8 => UInt8;
    i16 => Int16;
    u16 => UInt16;
    i32 => Int32;
    u32 => UInt32;
    i64 => Int64;
    u64 => UInt64;
}

impl_float_element! {
    f32 => Float32;
    f64 => Float64;
}
