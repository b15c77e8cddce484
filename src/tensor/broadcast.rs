//! NumPy-style broadcasting over any number of shapes

use super::layout::{Shape, Strides};
use crate::error::{Error, Result};

/// Size of `shape` along output axis `axis_from_end` (0 = innermost),
/// treating missing leading axes as size 1
#[inline]
fn aligned_dim(shape: &[usize], axis_from_end: usize) -> usize {
    if axis_from_end < shape.len() {
        shape[shape.len() - 1 - axis_from_end]
    } else {
        1
    }
}

/// Compute the broadcast shape of any number of shapes
///
/// Shapes are right-aligned; missing leading axes behave as size 1 without
/// being materialized. On every output axis each input must either match the
/// first non-1 size seen there or be 1. A 0-dimensional shape broadcasts with
/// anything, and an empty list of shapes resolves to the 0-dimensional shape.
///
/// Returns `None` if the shapes are not broadcastable, which is distinct
/// from `Some` of an empty (0-dimensional) shape.
///
/// # Example
/// ```
/// use nope::tensor::broadcast_shapes;
/// let (a, b): (&[usize], &[usize]) = (&[8, 1, 6, 1], &[7, 1, 5]);
/// assert_eq!(broadcast_shapes(&[a, b]).unwrap().as_slice(), &[8, 7, 6, 5]);
///
/// let (a, b): (&[usize], &[usize]) = (&[2, 1], &[8, 4, 3]);
/// assert!(broadcast_shapes(&[a, b]).is_none());
/// ```
pub fn broadcast_shapes<S: AsRef<[usize]>>(shapes: &[S]) -> Option<Shape> {
    let out_ndim = shapes
        .iter()
        .map(|shape| shape.as_ref().len())
        .max()
        .unwrap_or(0);
    let mut result = Shape::from_elem(1, out_ndim);

    // Iterate from right to left
    for k in 0..out_ndim {
        let mut candidate = 1;
        for shape in shapes {
            let dim = aligned_dim(shape.as_ref(), k);
            if dim != candidate && dim != 1 {
                if candidate != 1 {
                    return None; // Incompatible shapes
                }
                candidate = dim;
            }
        }
        result[out_ndim - 1 - k] = candidate;
    }

    Some(result)
}

/// Compute the broadcast shape, escalating failure to [`Error::NotBroadcastable`]
pub fn try_broadcast_shapes<S: AsRef<[usize]>>(shapes: &[S]) -> Result<Shape> {
    broadcast_shapes(shapes).ok_or_else(|| {
        let err = Error::not_broadcastable(shapes);
        tracing::debug!(%err, "broadcast resolution failed");
        err
    })
}

/// Strides that replay `shape`/`strides` over the broadcast shape `out_shape`
///
/// Each output axis keeps the operand's real stride when the operand's size on
/// that axis is greater than 1, and gets stride 0 otherwise (including
/// missing leading axes), so iteration re-reads the same element instead of
/// copying it. Returns `None` if the lengths disagree or the shape does not
/// broadcast to `out_shape`.
pub fn broadcast_strides(shape: &[usize], strides: &[isize], out_shape: &[usize]) -> Option<Strides> {
    if shape.len() != strides.len() || shape.len() > out_shape.len() {
        return None;
    }

    let pad = out_shape.len() - shape.len();
    let mut result = Strides::from_elem(0, out_shape.len());
    for (i, (&dim, &stride)) in shape.iter().zip(strides.iter()).enumerate() {
        let out_dim = out_shape[pad + i];
        if dim != out_dim && dim != 1 {
            return None;
        }
        if dim > 1 {
            result[pad + i] = stride;
        }
    }

    Some(result)
}
