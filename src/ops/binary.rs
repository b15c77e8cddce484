//! Broadcasting elementwise engine

use super::BinaryOp;
use super::kernels::{binary_contiguous_kernel, binary_strided_kernel};
use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::tensor::{Tensor, broadcast_strides, coalesce_dims_jointly, try_broadcast_shapes};

/// Validate that both operands have the same dtype
pub fn validate_binary_dtypes(a: &Tensor, b: &Tensor) -> Result<DType> {
    if a.dtype() != b.dtype() {
        return Err(Error::DTypeMismatch {
            lhs: a.dtype(),
            rhs: b.dtype(),
        });
    }
    Ok(a.dtype())
}

/// Combine two tensors elementwise with `f`, broadcasting their shapes
///
/// Resolution runs in order and stops at the first failure, before anything
/// is allocated:
/// 1. operand dtypes must match ([`Error::DTypeMismatch`])
/// 2. `T` must be that dtype ([`Error::TypeMismatch`])
/// 3. the shapes must broadcast ([`Error::NotBroadcastable`])
///
/// The result is a fresh contiguous tensor of the broadcast shape. Operands
/// are only read, so they may alias each other.
///
/// # Example
///
/// ```
/// use nope::prelude::*;
/// use nope::ops::map2;
///
/// let a = Tensor::from_slice(&[1i64, 2, 3], &[3, 1])?;
/// let b = Tensor::from_slice(&[10i64, 20], &[2])?;
/// let c = map2(&a, &b, |x: i64, y: i64| x * y)?;
/// assert_eq!(c.shape(), &[3, 2]);
/// assert_eq!(c.to_vec::<i64>()?, [10, 20, 20, 40, 30, 60]);
/// # Ok::<(), nope::error::Error>(())
/// ```
pub fn map2<T, F>(lhs: &Tensor, rhs: &Tensor, f: F) -> Result<Tensor>
where
    T: Element,
    F: Fn(T, T) -> T,
{
    let dtype = validate_binary_dtypes(lhs, rhs)?;
    if dtype != T::DTYPE {
        return Err(Error::TypeMismatch {
            expected: T::DTYPE,
            got: dtype,
        });
    }

    let mut shape = try_broadcast_shapes(&[lhs.shape(), rhs.shape()])?;
    let lhs_strides = broadcast_strides(lhs.shape(), lhs.strides(), &shape)
        .ok_or_else(|| Error::not_broadcastable(&[lhs.shape(), shape.as_slice()]))?;
    let rhs_strides = broadcast_strides(rhs.shape(), rhs.strides(), &shape)
        .ok_or_else(|| Error::not_broadcastable(&[rhs.shape(), shape.as_slice()]))?;

    let out = Tensor::new(&shape, dtype)?;
    let len = out.numel();
    if len == 0 {
        return Ok(out);
    }

    // Merge axes both operands traverse as one run; the output is written
    // sequentially either way
    let mut strides = [lhs_strides, rhs_strides];
    coalesce_dims_jointly(&mut shape, &mut strides);
    let [lhs_strides, rhs_strides] = &strides;

    let unit = dtype.size_in_bytes() as isize;
    let flat = shape.len() <= 1
        && lhs_strides.iter().chain(rhs_strides.iter()).all(|&s| s == unit);

    tracing::debug!(
        %dtype,
        shape = ?out.shape(),
        coalesced = ?shape.as_slice(),
        path = if flat { "contiguous" } else { "strided" },
        "elementwise kernel"
    );

    // SAFETY: operand layouts were bounds-checked at construction and the
    // output is a fresh allocation of `len` elements of `T`
    unsafe {
        let a = lhs.data_unchecked::<u8>();
        let b = rhs.data_unchecked::<u8>();
        let dst = out.storage().as_ptr().cast::<T>();
        if flat {
            binary_contiguous_kernel(f, a, b, dst, len);
        } else {
            binary_strided_kernel(f, a, b, dst, &shape, lhs_strides, rhs_strides);
        }
    }

    Ok(out)
}

/// Apply a [`BinaryOp`] to two tensors of the same dtype, broadcasting their shapes
pub fn binary_op(lhs: &Tensor, rhs: &Tensor, op: BinaryOp) -> Result<Tensor> {
    let dtype = validate_binary_dtypes(lhs, rhs)?;
    dispatch_dtype!(dtype, T => { map2(lhs, rhs, |a: T, b: T| op.apply(a, b)) })
}

impl Tensor {
    /// Elementwise addition with broadcasting
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, BinaryOp::Add)
    }

    /// Elementwise subtraction with broadcasting
    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, BinaryOp::Sub)
    }

    /// Elementwise multiplication with broadcasting
    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, BinaryOp::Mul)
    }

    /// Elementwise division with broadcasting
    pub fn div(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, BinaryOp::Div)
    }

    /// Elementwise maximum with broadcasting
    pub fn maximum(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, BinaryOp::Max)
    }

    /// Elementwise minimum with broadcasting
    pub fn minimum(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, BinaryOp::Min)
    }
}
