//! Tensor types and layout arithmetic
//!
//! This module provides the core `Tensor` type, a shaped and strided view over
//! a reference-counted byte [`Storage`], together with the pure stride
//! arithmetic, broadcasting rules and strided traversal it is built on.

mod broadcast;
mod core;
mod iter;
mod layout;
mod storage;

pub use broadcast::{broadcast_shapes, broadcast_strides, try_broadcast_shapes};
pub use core::Tensor;
pub use iter::StridedIter;
pub use layout::{Layout, Shape, Strides, coalesce_dims, contiguous_strides, is_contiguous};
pub(crate) use layout::coalesce_dims_jointly;
pub use storage::{ALLOC_ALIGN, ReleaseFn, Storage, release_nothing};
