//! Binary operation kernels
//!
//! Operand pointers are byte pointers into storage and may be unaligned when
//! the storage wraps foreign memory, so operands are always read with
//! `read_unaligned`. The output is a fresh self-owned allocation and is
//! written directly.

use crate::dtype::Element;
use crate::tensor::StridedIter;

/// Apply `f` to `len` pairs of consecutive elements
///
/// # Safety
/// - `a` and `b` must be valid for reads of `len` elements of `T`
/// - `out` must be aligned and valid for writes of `len` elements of `T`
/// - `out` must not overlap with `a` or `b`
#[inline]
pub(crate) unsafe fn binary_contiguous_kernel<T, F>(
    f: F,
    a: *const u8,
    b: *const u8,
    out: *mut T,
    len: usize,
) where
    T: Element,
    F: Fn(T, T) -> T,
{
    let a = a.cast::<T>();
    let b = b.cast::<T>();
    for i in 0..len {
        // SAFETY: forwarded from the caller
        unsafe {
            let value = f(a.add(i).read_unaligned(), b.add(i).read_unaligned());
            out.add(i).write(value);
        }
    }
}

/// Apply `f` across two strided operands, writing the output in row-major order
///
/// Both operands are walked over `shape` with their own byte strides (0 on
/// broadcast axes) while the output advances one element per step.
///
/// # Safety
/// - Every offset reachable from `a`/`b` through `shape` and the strides must
///   be valid for a read of `T`
/// - `out` must be aligned and valid for writes of `product(shape)` elements
/// - `out` must not overlap with `a` or `b`
#[inline]
pub(crate) unsafe fn binary_strided_kernel<T, F>(
    f: F,
    a: *const u8,
    b: *const u8,
    out: *mut T,
    shape: &[usize],
    a_strides: &[isize],
    b_strides: &[isize],
) where
    T: Element,
    F: Fn(T, T) -> T,
{
    let a_offsets = StridedIter::new(shape, a_strides, 0);
    let b_offsets = StridedIter::new(shape, b_strides, 0);

    for (i, (a_offset, b_offset)) in a_offsets.zip(b_offsets).enumerate() {
        // SAFETY: forwarded from the caller
        unsafe {
            let a_val = a.offset(a_offset).cast::<T>().read_unaligned();
            let b_val = b.offset(b_offset).cast::<T>().read_unaligned();
            out.add(i).write(f(a_val, b_val));
        }
    }
}
