//! Layout: shape, byte strides and byte offset, plus the stride arithmetic
//! used to validate and normalize them

use super::broadcast::broadcast_strides;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor, outermost first
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: byte offsets between consecutive elements along each dimension
/// NOTE: Strides are in BYTES, not elements
pub type Strides = SmallVec<[isize; STACK_DIMS]>;

/// Check whether `shape`/`strides` describe a row-major contiguous block of
/// `element_size`-byte elements
///
/// A 0-dimensional shape is always contiguous. Mismatched lengths are an
/// error, not a `false` result.
///
/// # Example
/// ```
/// use nope::tensor::is_contiguous;
/// assert!(is_contiguous(&[2, 3, 4], &[48, 16, 4], 4).unwrap());
/// assert!(!is_contiguous(&[3, 2], &[10, 3], 1).unwrap());
/// ```
pub fn is_contiguous(shape: &[usize], strides: &[isize], element_size: usize) -> Result<bool> {
    if shape.len() != strides.len() {
        return Err(Error::length_mismatch(shape, strides));
    }
    let Some(&innermost) = strides.last() else {
        return Ok(true);
    };
    if innermost != element_size as isize {
        return Ok(false);
    }

    Ok((0..shape.len() - 1).rev().all(|i| {
        (shape[i + 1] as isize)
            .checked_mul(strides[i + 1])
            .is_some_and(|expected| strides[i] == expected)
    }))
}

/// Compute contiguous byte strides for a given shape (row-major order)
///
/// # Example
/// ```
/// use nope::tensor::contiguous_strides;
/// assert_eq!(contiguous_strides(&[2, 3, 4], 4).as_slice(), &[48, 16, 4]);
/// ```
pub fn contiguous_strides(shape: &[usize], element_size: usize) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(0, shape.len());
    let mut stride = element_size as isize;

    // Compute strides from last dimension to first
    for (dst, &dim) in strides.iter_mut().zip(shape.iter()).rev() {
        *dst = stride;
        stride = stride.saturating_mul(dim as isize);
    }

    strides
}

/// Merge adjacent axes that address one contiguous run, in place
///
/// Axes `i - 1` and `i` are merged when `shape[i] * strides[i] == strides[i - 1]`:
/// the outer size is multiplied by the inner one and the inner stride is kept.
/// Each axis is visited once, left to right, and never re-examined after it
/// has been folded into its left neighbour. The addressed bytes are unchanged.
/// A merge whose size would overflow `usize` is skipped.
///
/// # Example
/// ```
/// use nope::tensor::{Shape, Strides, coalesce_dims};
/// let mut shape = Shape::from_slice(&[2, 4, 4, 2]);
/// let mut strides = Strides::from_slice(&[512, 64, 16, 8]);
/// coalesce_dims(&mut shape, &mut strides).unwrap();
/// assert_eq!(shape.as_slice(), &[2, 32]);
/// assert_eq!(strides.as_slice(), &[512, 8]);
/// ```
pub fn coalesce_dims(shape: &mut Shape, strides: &mut Strides) -> Result<()> {
    if shape.len() != strides.len() {
        return Err(Error::length_mismatch(shape, strides));
    }
    coalesce_dims_jointly(shape, std::slice::from_mut(strides));
    Ok(())
}

/// Merge adjacent axes shared by several stride sets over one shape
///
/// An axis pair is merged only when the merge is valid for every stride set,
/// so all operands keep addressing the same bytes in the same order, and only
/// when the merged size fits in `usize`. Stride sets must all have
/// `shape.len()` entries.
pub(crate) fn coalesce_dims_jointly(shape: &mut Shape, strides: &mut [Strides]) {
    debug_assert!(strides.iter().all(|s| s.len() == shape.len()));
    if shape.is_empty() {
        return;
    }

    let mut last = 0;
    for i in 1..shape.len() {
        let dim = shape[i];
        let mergeable = strides.iter().all(|s| {
            (dim as isize)
                .checked_mul(s[i])
                .is_some_and(|run| run == s[last])
        });

        let merged = shape[last].checked_mul(dim).filter(|_| mergeable);
        if let Some(merged) = merged {
            shape[last] = merged;
            for s in strides.iter_mut() {
                s[last] = s[i];
            }
        } else {
            last += 1;
            shape[last] = dim;
            for s in strides.iter_mut() {
                s[last] = s[i];
            }
        }
    }

    shape.truncate(last + 1);
    for s in strides.iter_mut() {
        s.truncate(last + 1);
    }
}

/// Product of the dimensions, or `None` on overflow
pub(crate) fn checked_elem_count(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Layout describes how a tensor's elements sit in its byte storage
///
/// Byte address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in bytes) between consecutive elements along each dimension
    strides: Strides,
    /// Offset: starting byte in the underlying storage
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use nope::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4], 4);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[48, 16, 4]);
    /// ```
    pub fn contiguous(shape: &[usize], element_size: usize) -> Self {
        Self {
            shape: Shape::from_slice(shape),
            strides: contiguous_strides(shape, element_size),
            offset: 0,
        }
    }

    /// Create a layout with explicit shape, strides, and offset
    ///
    /// Fails with [`Error::ShapeOverflow`] if the element count does not fit
    /// in `usize`.
    pub fn new(shape: &[usize], strides: &[isize], offset: usize) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::length_mismatch(shape, strides));
        }
        if checked_elem_count(shape).is_none() {
            return Err(Error::ShapeOverflow {
                shape: shape.to_vec(),
            });
        }
        Ok(Self {
            shape: Shape::from_slice(shape),
            strides: Strides::from_slice(strides),
            offset,
        })
    }

    /// Create a scalar (0-dimensional) layout
    pub fn scalar() -> Self {
        Self {
            shape: SmallVec::new(),
            strides: SmallVec::new(),
            offset: 0,
        }
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the byte offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    ///
    /// A scalar holds one element; any zero-sized axis makes it zero.
    /// [`Layout::new`] rejects overflowing shapes; otherwise the count
    /// saturates at `usize::MAX`.
    #[inline]
    pub fn elem_count(&self) -> usize {
        checked_elem_count(&self.shape).unwrap_or(usize::MAX)
    }

    /// Check if the tensor is a scalar (0 dimensions)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if memory is contiguous (row-major order) for the given element size
    pub fn is_contiguous(&self, element_size: usize) -> bool {
        is_contiguous(&self.shape, &self.strides, element_size).unwrap_or(false)
    }

    /// Byte range `[start, end)` relative to storage start touched by this layout
    ///
    /// Returns `None` for layouts with no elements, or if the range would
    /// start before the storage.
    pub fn byte_range(&self, element_size: usize) -> Option<(usize, usize)> {
        if self.elem_count() == 0 {
            return None;
        }

        let mut low = self.offset as isize;
        let mut high = self.offset as isize;
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let span = match stride {
                0 => 0,
                _ => isize::try_from(dim - 1).ok()?.checked_mul(stride)?,
            };
            if span < 0 {
                low = low.checked_add(span)?;
            } else {
                high = high.checked_add(span)?;
            }
        }

        let end = high.checked_add(element_size as isize)?;
        (low >= 0).then_some((low as usize, end as usize))
    }

    /// Byte offset of the element at `indices`, relative to storage start
    pub fn byte_offset(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.ndim() {
            return None;
        }

        let mut offset = self.offset as isize;
        for ((&idx, &dim), &stride) in indices.iter().zip(self.shape.iter()).zip(self.strides.iter())
        {
            if idx >= dim {
                return None;
            }
            offset += idx as isize * stride;
        }

        usize::try_from(offset).ok()
    }

    /// Layout with adjacent contiguous axes merged (same bytes, fewer axes)
    pub fn coalesced(&self) -> Self {
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        coalesce_dims_jointly(&mut shape, std::slice::from_mut(&mut strides));
        Self {
            shape,
            strides,
            offset: self.offset,
        }
    }

    /// Create a broadcast layout to a target shape
    ///
    /// Size-1 and missing leading axes get stride 0. Returns None if the shape
    /// does not broadcast to `target` or the element count of `target`
    /// overflows.
    pub fn broadcast_to(&self, target: &[usize]) -> Option<Self> {
        checked_elem_count(target)?;
        let strides = broadcast_strides(&self.shape, &self.strides, target)?;
        Some(Self {
            shape: Shape::from_slice(target),
            strides,
            offset: self.offset,
        })
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}
