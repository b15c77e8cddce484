//! Strided traversal of an N-dimensional index space

use super::layout::STACK_DIMS;
use smallvec::SmallVec;
use std::iter::FusedIterator;

/// Odometer over a shape that yields the byte offset of every element
///
/// The innermost axis advances first. When an axis wraps, its counter resets
/// and its full sweep (`shape[i] * strides[i]`) is subtracted before carrying
/// into the next outer axis, so the running offset is updated incrementally
/// instead of being recomputed per element. A stride of 0 replays the same
/// element along that axis.
///
/// Offsets are relative to the `base` given at construction.
///
/// # Example
/// ```
/// use nope::tensor::StridedIter;
/// // 2x2 f32 view with a row pitch of 12 bytes
/// let offsets: Vec<isize> = StridedIter::new(&[2, 2], &[12, 4], 0).collect();
/// assert_eq!(offsets, [0, 4, 12, 16]);
/// ```
#[derive(Clone, Debug)]
pub struct StridedIter<'a> {
    shape: &'a [usize],
    strides: &'a [isize],
    index: SmallVec<[usize; STACK_DIMS]>,
    offset: isize,
    remaining: usize,
}

impl<'a> StridedIter<'a> {
    /// Start a traversal at `base`
    ///
    /// `shape` and `strides` must have the same length. An element count
    /// beyond `usize::MAX` is clamped to it.
    pub fn new(shape: &'a [usize], strides: &'a [isize], base: isize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            index: SmallVec::from_elem(0, shape.len()),
            offset: base,
            remaining: shape
                .iter()
                .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
                .unwrap_or(if shape.contains(&0) { 0 } else { usize::MAX }),
        }
    }

    /// Current multi-index
    #[inline]
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Current byte offset
    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// Step to the next element in row-major order
    ///
    /// Stepping past the last element wraps every counter back to zero.
    #[inline]
    pub fn advance(&mut self) {
        for dim in (0..self.shape.len()).rev() {
            self.index[dim] += 1;
            self.offset += self.strides[dim];

            if self.index[dim] < self.shape[dim] {
                return;
            }

            // Reset this dimension and undo its sweep
            self.index[dim] = 0;
            let sweep = (self.shape[dim] as isize).wrapping_mul(self.strides[dim]);
            self.offset = self.offset.wrapping_sub(sweep);
        }
    }
}

impl Iterator for StridedIter<'_> {
    type Item = isize;

    #[inline]
    fn next(&mut self) -> Option<isize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.offset;
        self.remaining -= 1;
        self.advance();
        Some(current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter<'_> {}

impl FusedIterator for StridedIter<'_> {}
