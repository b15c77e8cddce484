//! Core Tensor type

use super::iter::StridedIter;
use super::layout::{Layout, checked_elem_count};
use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::fmt;
use std::ptr::NonNull;

/// Shaped, strided view over a byte [`Storage`]
///
/// `Tensor` consists of:
/// - **Storage**: Reference-counted bytes, self-allocated or foreign
/// - **Layout**: Shape, byte strides, and byte offset defining the view
/// - **DType**: Element kind, checked on every typed access
///
/// # Zero-Copy Views
///
/// Cloning and [`Tensor::view`] produce new tensors sharing the same storage.
/// Shape and strides never change after construction.
///
/// # Example
///
/// ```
/// use nope::prelude::*;
///
/// let t = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
/// assert_eq!(t.strides(), &[12, 4]);
///
/// // Every other column, as a view
/// let cols = t.view(&[2, 2], &[12, 8], 0)?;
/// assert_eq!(cols.to_vec::<f32>()?, [1.0, 3.0, 4.0, 6.0]);
/// # Ok::<(), nope::error::Error>(())
/// ```
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    layout: Layout,
    dtype: DType,
}

/// Bytes needed for a contiguous tensor; a scalar holds one element
fn contiguous_size(shape: &[usize], dtype: DType) -> Result<usize> {
    if shape.contains(&0) {
        return Ok(0);
    }
    shape
        .iter()
        .try_fold(dtype.size_in_bytes(), |acc, &dim| acc.checked_mul(dim))
        .ok_or(Error::AllocationFailed { size: usize::MAX })
}

/// Check shape/strides agree in length and the innermost stride covers an element
fn validate_strides(shape: &[usize], strides: &[isize], element_size: usize) -> Result<()> {
    if shape.len() != strides.len() {
        return Err(Error::length_mismatch(shape, strides));
    }
    if let Some(&last) = strides.last() {
        if last < element_size as isize {
            return Err(Error::InvalidStride {
                stride: last,
                element_size,
            });
        }
    }
    Ok(())
}

impl Tensor {
    /// Allocate a zero-filled contiguous tensor
    ///
    /// The storage holds `product(shape) * dtype.size_in_bytes()` bytes; an
    /// empty shape holds exactly one element and a zero-sized axis holds none.
    pub fn new(shape: &[usize], dtype: DType) -> Result<Self> {
        let storage = Storage::new(contiguous_size(shape, dtype)?)?;
        let layout = Layout::contiguous(shape, dtype.size_in_bytes());
        Ok(Self {
            storage,
            layout,
            dtype,
        })
    }

    /// Create a tensor by copying a slice of data
    ///
    /// Returns an error if `data.len()` does not equal the product of the `shape` dimensions.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        let expected_len = checked_elem_count(shape).ok_or_else(|| Error::ShapeOverflow {
            shape: shape.to_vec(),
        })?;
        if data.len() != expected_len {
            return Err(Error::OutOfBounds {
                required: expected_len.saturating_mul(T::DTYPE.size_in_bytes()),
                capacity: std::mem::size_of_val(data),
            });
        }

        let tensor = Self::new(shape, T::DTYPE)?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        // SAFETY: fresh storage of exactly `bytes.len()` bytes, not yet shared
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), tensor.storage.as_ptr(), bytes.len());
        }
        Ok(tensor)
    }

    /// Allocate a zero-filled contiguous tensor (alias of [`Tensor::new`])
    pub fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::new(shape, dtype)
    }

    /// Create a contiguous tensor filled with `value`
    pub fn full<T: Element>(shape: &[usize], value: T) -> Result<Self> {
        let tensor = Self::new(shape, T::DTYPE)?;
        let dst = tensor.storage.as_ptr().cast::<T>();
        for i in 0..tensor.numel() {
            // SAFETY: fresh contiguous storage of `numel` elements of `T`
            unsafe { dst.add(i).write_unaligned(value) };
        }
        Ok(tensor)
    }

    /// Wrap foreign memory without copying
    ///
    /// The wrapped region starts at `ptr` and spans every byte the shape and
    /// strides address. `release` runs with `ptr` exactly once, after the last
    /// tensor sharing this storage is dropped; pass
    /// [`release_nothing`](super::release_nothing) to keep ownership.
    ///
    /// Fails with [`Error::LengthMismatch`] if shape and strides differ in
    /// length, and with [`Error::InvalidStride`] if the innermost stride is
    /// smaller than one element or a stride would reach before `ptr`.
    /// On failure `release` is not called.
    ///
    /// # Safety
    /// - `ptr` must be valid for reads and writes of every addressed byte
    /// - The memory must remain valid until `release` is invoked
    pub unsafe fn from_raw_parts<F>(
        ptr: NonNull<u8>,
        shape: &[usize],
        strides: &[isize],
        dtype: DType,
        release: F,
    ) -> Result<Self>
    where
        F: FnOnce(NonNull<u8>) + Send + 'static,
    {
        let element_size = dtype.size_in_bytes();
        validate_strides(shape, strides, element_size)?;
        if let Some(&stride) = strides.iter().find(|&&s| s < 0) {
            return Err(Error::InvalidStride {
                stride,
                element_size,
            });
        }

        let layout = Layout::new(shape, strides, 0)?;
        let size = layout.byte_range(element_size).map_or(0, |(_, end)| end);
        // SAFETY: forwarded from the caller
        let storage = unsafe { Storage::from_raw_parts(ptr, size, release) };

        Ok(Self {
            storage,
            layout,
            dtype,
        })
    }

    /// Create a view over existing storage
    ///
    /// Fails if the layout is malformed, its element count overflows `usize`,
    /// or it addresses bytes outside `storage`.
    pub fn from_storage(
        storage: Storage,
        shape: &[usize],
        strides: &[isize],
        offset: usize,
        dtype: DType,
    ) -> Result<Self> {
        let element_size = dtype.size_in_bytes();
        validate_strides(shape, strides, element_size)?;
        let layout = Layout::new(shape, strides, offset)?;

        if layout.elem_count() > 0 {
            let end = layout.byte_range(element_size).map(|(_, end)| end);
            match end {
                Some(end) if end <= storage.size() => {}
                _ => {
                    return Err(Error::OutOfBounds {
                        required: end.unwrap_or(usize::MAX),
                        capacity: storage.size(),
                    });
                }
            }
        }

        Ok(Self {
            storage,
            layout,
            dtype,
        })
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the byte strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the byte offset into storage
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Size of one element in bytes
    #[inline]
    pub fn item_size(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Size of dimension `i`
    pub fn dim(&self, i: usize) -> Option<usize> {
        self.shape().get(i).copied()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Bytes occupied by the elements of this view
    #[inline]
    pub fn nbytes(&self) -> usize {
        self.numel() * self.item_size()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous(self.item_size())
    }

    /// Check if this is a scalar (0-dimensional tensor)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.layout.is_scalar()
    }

    // ===== Views (Zero-Copy) =====

    /// New view over the same storage with explicit shape, strides and offset
    pub fn view(&self, shape: &[usize], strides: &[isize], offset: usize) -> Result<Self> {
        Self::from_storage(self.storage.clone(), shape, strides, offset, self.dtype)
    }

    /// Same elements with adjacent contiguous axes merged
    pub fn coalesced(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            layout: self.layout.coalesced(),
            dtype: self.dtype,
        }
    }

    /// Broadcast to a target shape (zero-copy, stride 0 on replicated axes)
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        if checked_elem_count(shape).is_none() {
            return Err(Error::ShapeOverflow {
                shape: shape.to_vec(),
            });
        }
        let layout = self
            .layout
            .broadcast_to(shape)
            .ok_or_else(|| Error::not_broadcastable(&[self.shape(), shape]))?;

        Ok(Self {
            storage: self.storage.clone(),
            layout,
            dtype: self.dtype,
        })
    }

    // ===== Data Access =====

    /// Pointer to the first element of the view, checked against `T`
    ///
    /// Fails with [`Error::TypeMismatch`] if `T` is not this tensor's dtype.
    /// The pointer may be unaligned for foreign memory.
    pub fn data<T: Element>(&self) -> Result<*const T> {
        self.check_dtype::<T>()?;
        // SAFETY: dtype checked above
        Ok(unsafe { self.data_unchecked::<T>() })
    }

    /// Mutable pointer to the first element of the view, checked against `T`
    pub fn data_mut<T: Element>(&mut self) -> Result<*mut T> {
        self.check_dtype::<T>()?;
        // SAFETY: dtype checked above
        Ok(unsafe { self.data_unchecked::<T>() }.cast_mut())
    }

    /// Pointer to the first element of the view, reinterpreted as `T` without checks
    ///
    /// # Safety
    /// Reading through the pointer as `T` is only meaningful if `T` matches
    /// the tensor's dtype; that is the caller's responsibility.
    #[inline]
    pub unsafe fn data_unchecked<T>(&self) -> *const T {
        self.storage
            .as_ptr()
            .wrapping_add(self.layout.offset())
            .cast::<T>()
            .cast_const()
    }

    /// Read the element at `indices`
    pub fn get<T: Element>(&self, indices: &[usize]) -> Result<T> {
        self.check_dtype::<T>()?;
        let offset = self
            .layout
            .byte_offset(indices)
            .ok_or_else(|| Error::IndexOutOfBounds {
                indices: indices.to_vec(),
                shape: self.shape().to_vec(),
            })?;

        // SAFETY: in-bounds by construction of the layout
        Ok(unsafe { self.storage.as_ptr().add(offset).cast::<T>().read_unaligned() })
    }

    /// Copy the viewed elements to a Vec in row-major order
    ///
    /// Works for any strides, including broadcast (stride 0) views.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.check_dtype::<T>()?;

        let base = self.storage.as_ptr();
        let offsets = StridedIter::new(self.shape(), self.strides(), self.offset() as isize);
        Ok(offsets
            // SAFETY: every offset lies inside storage (checked at construction)
            .map(|offset| unsafe { base.offset(offset).cast::<T>().read_unaligned() })
            .collect())
    }

    fn check_dtype<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.dtype {
            return Err(Error::TypeMismatch {
                expected: T::DTYPE,
                got: self.dtype,
            });
        }
        Ok(())
    }
}

struct Tuple<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for Tuple<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .field("dtype", &self.dtype)
            .field("storage", &self.storage)
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, strides={}, dtype={})",
            Tuple(self.shape()),
            Tuple(self.strides()),
            self.dtype
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::release_nothing;

    #[test]
    fn test_new() {
        let tensor = Tensor::new(&[2, 3], DType::Float32).unwrap();

        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.strides(), &[12, 4]);
        assert_eq!(tensor.dtype(), DType::Float32);
        assert!(tensor.is_contiguous());
        assert_eq!(tensor.numel(), 6);
        assert_eq!(tensor.storage().size(), 24);
        assert_eq!(tensor.to_vec::<f32>().unwrap(), [0.0; 6]);
    }

    #[test]
    fn test_degenerate_shapes() {
        let scalar = Tensor::new(&[], DType::Float64).unwrap();
        assert!(scalar.is_scalar());
        assert_eq!(scalar.storage().size(), 8);
        assert_eq!(scalar.to_vec::<f64>().unwrap(), [0.0]);

        let empty = Tensor::new(&[3, 0, 2], DType::Int16).unwrap();
        assert_eq!(empty.numel(), 0);
        assert_eq!(empty.storage().size(), 0);
        assert!(empty.to_vec::<i16>().unwrap().is_empty());
    }

    #[test]
    fn test_from_slice() {
        let data = [1i32, 2, 3, 4, 5, 6];
        let tensor = Tensor::from_slice(&data, &[3, 2]).unwrap();
        assert_eq!(tensor.dtype(), DType::Int32);
        assert_eq!(tensor.to_vec::<i32>().unwrap(), data);
        assert_eq!(tensor.get::<i32>(&[2, 1]).unwrap(), 6);

        assert!(Tensor::from_slice(&data, &[4, 2]).is_err());
    }

    #[test]
    fn test_full() {
        let tensor = Tensor::full(&[2, 2], 42u16).unwrap();
        assert_eq!(tensor.to_vec::<u16>().unwrap(), [42; 4]);

        let scalar = Tensor::full(&[], -1.5f64).unwrap();
        assert_eq!(scalar.to_vec::<f64>().unwrap(), [-1.5]);
        assert!(Tensor::full(&[0, 3], 1i8).unwrap().to_vec::<i8>().unwrap().is_empty());

        assert!(matches!(
            Tensor::from_slice::<u8>(&[], &[usize::MAX, 2]),
            Err(Error::ShapeOverflow { .. })
        ));
    }

    #[test]
    fn test_checked_access_type_mismatch() {
        let tensor = Tensor::new(&[4], DType::Float32).unwrap();
        assert!(tensor.data::<f32>().is_ok());
        assert_eq!(
            tensor.data::<i32>(),
            Err(Error::TypeMismatch {
                expected: DType::Int32,
                got: DType::Float32,
            })
        );
        assert!(tensor.to_vec::<f64>().is_err());
        assert!(tensor.get::<u32>(&[0]).is_err());
        assert_eq!(
            tensor.get::<f32>(&[4]),
            Err(Error::IndexOutOfBounds {
                indices: vec![4],
                shape: vec![4],
            })
        );
    }

    #[test]
    fn test_data_mut_writes_are_visible_to_aliases() {
        let mut tensor = Tensor::new(&[2, 2], DType::Int64).unwrap();
        let alias = tensor.clone();
        let ptr = tensor.data_mut::<i64>().unwrap();
        unsafe { ptr.add(3).write(7) };
        assert_eq!(alias.to_vec::<i64>().unwrap(), [0, 0, 0, 7]);
    }

    #[test]
    fn test_view_bounds() {
        let tensor = Tensor::from_slice(&[1u8, 2, 3, 4, 5, 6], &[2, 3]).unwrap();

        let col = tensor.view(&[2], &[3], 2).unwrap();
        assert_eq!(col.to_vec::<u8>().unwrap(), [3, 6]);
        assert!(col.storage().same_buffer(tensor.storage()));

        let flat = tensor.view(&[6], &[1], 0).unwrap();
        assert_eq!(flat.to_vec::<u8>().unwrap(), [1, 2, 3, 4, 5, 6]);

        assert!(matches!(
            tensor.view(&[2], &[3], 3),
            Err(Error::OutOfBounds { required: 7, capacity: 6 })
        ));
        assert!(matches!(
            tensor.view(&[2, 3], &[3], 0),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            tensor.view(&[2, 3], &[3, 0], 0),
            Err(Error::InvalidStride { stride: 0, element_size: 1 })
        ));
    }

    #[test]
    fn test_negative_stride_view() {
        let tensor = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]).unwrap();

        // The innermost stride must cover a whole element
        assert_eq!(
            tensor.view(&[3], &[-4], 8).unwrap_err(),
            Error::InvalidStride {
                stride: -4,
                element_size: 4,
            }
        );

        // Outer axes may run backwards
        let flipped = tensor.view(&[3, 1], &[-4, 4], 8).unwrap();
        assert_eq!(flipped.to_vec::<f32>().unwrap(), [3.0, 2.0, 1.0]);
        assert_eq!(flipped.get::<f32>(&[2, 0]).unwrap(), 1.0);
        assert!(matches!(
            tensor.view(&[3, 1], &[-4, 4], 4),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_view_with_overflowing_element_count() {
        let tensor = Tensor::from_slice(&[1u8, 2], &[2]).unwrap();

        // Two bytes addressed, but the element count overflows
        assert_eq!(
            tensor.view(&[usize::MAX, 2], &[0, 1], 0).unwrap_err(),
            Error::ShapeOverflow {
                shape: vec![usize::MAX, 2],
            }
        );

        let replayed = tensor.view(&[usize::MAX, 1], &[0, 1], 1).unwrap();
        assert_eq!(replayed.numel(), usize::MAX);
        assert_eq!(replayed.get::<u8>(&[usize::MAX - 1, 0]).unwrap(), 2);

        assert!(matches!(
            tensor.broadcast_to(&[usize::MAX, 2]),
            Err(Error::ShapeOverflow { .. })
        ));
        assert!(matches!(
            Tensor::new(&[usize::MAX, 2], DType::UInt8),
            Err(Error::AllocationFailed { .. })
        ));
    }

    #[test]
    fn test_coalesced_and_broadcast_views() {
        let tensor = Tensor::new(&[2, 3, 4], DType::Float32).unwrap();
        let flat = tensor.coalesced();
        assert_eq!(flat.shape(), &[24]);
        assert_eq!(flat.strides(), &[4]);

        let row = Tensor::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
        let tiled = row.broadcast_to(&[3, 2]).unwrap();
        assert_eq!(tiled.strides(), &[0, 8]);
        assert_eq!(tiled.to_vec::<f64>().unwrap(), [1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert!(row.broadcast_to(&[3]).is_err());
    }

    #[test]
    fn test_from_raw_parts_validation() {
        let mut bytes = [0u8; 16];
        let ptr = NonNull::new(bytes.as_mut_ptr()).unwrap();

        let err = unsafe {
            Tensor::from_raw_parts(ptr, &[2, 2], &[8], DType::Float32, release_nothing)
        };
        assert!(matches!(err, Err(Error::LengthMismatch { .. })));

        let err = unsafe {
            Tensor::from_raw_parts(ptr, &[4], &[2], DType::Float32, release_nothing)
        };
        assert!(matches!(
            err,
            Err(Error::InvalidStride { stride: 2, element_size: 4 })
        ));

        let err = unsafe {
            Tensor::from_raw_parts(ptr, &[2, 2], &[-8, 4], DType::Float32, release_nothing)
        };
        assert!(matches!(err, Err(Error::InvalidStride { stride: -8, .. })));
    }

    #[test]
    fn test_from_raw_parts_strided() {
        let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let ptr = NonNull::new(data.as_ptr().cast_mut().cast::<u8>()).unwrap();
        // Column 0 and 2 of a 2x3 matrix
        let tensor = unsafe {
            Tensor::from_raw_parts(ptr, &[2, 2], &[12, 8], DType::Float32, release_nothing)
        }
        .unwrap();

        assert_eq!(tensor.storage().size(), 24);
        assert!(!tensor.is_contiguous());
        assert_eq!(tensor.to_vec::<f32>().unwrap(), [1.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_display() {
        let tensor = Tensor::new(&[2, 3], DType::Float32).unwrap();
        assert_eq!(
            tensor.to_string(),
            "Tensor(shape=(2, 3), strides=(12, 4), dtype=Float32)"
        );
        let scalar = Tensor::new(&[], DType::UInt8).unwrap();
        assert_eq!(scalar.to_string(), "Tensor(shape=(), strides=(), dtype=UInt8)");
    }
}
