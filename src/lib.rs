//! # nope
//!
//! **Strided N-dimensional tensor layout engine.**
//!
//! nope represents a block of raw bytes as a shaped, strided view. It answers
//! the layout questions an array library needs before touching any data:
//! whether a view is contiguous, how few axes describe the same memory, and
//! what shape a set of operands broadcasts to. On top of that it runs
//! broadcasting elementwise operations into freshly allocated results.
//!
//! ## Features
//!
//! - **Stride arithmetic**: contiguity test, row-major stride synthesis,
//!   greedy dimension coalescing
//! - **Broadcasting**: NumPy rules over any number of shapes, zero-stride
//!   replication without copies
//! - **Shared storage**: reference-counted byte buffers, self-allocated or
//!   wrapping foreign memory with a release callback
//! - **Elementwise engine**: add, sub, mul, div, maximum, minimum, or any
//!   closure, over all ten registered scalar kinds
//!
//! ## Quick Start
//!
//! ```rust
//! use nope::prelude::*;
//!
//! let a = Tensor::full(&[2, 3], 1.0f32)?;
//! let b = Tensor::from_slice(&[10.0f32, 20.0, 30.0], &[3])?;
//!
//! let c = a.add(&b)?;
//! assert_eq!(c.shape(), &[2, 3]);
//! assert_eq!(c.to_vec::<f32>()?, [11.0, 21.0, 31.0, 11.0, 21.0, 31.0]);
//! # Ok::<(), nope::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`dtype::DType`]
//!
//! ## Logging
//!
//! Allocation, release and kernel selection are reported through `tracing`
//! events; install a subscriber to see them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{BinaryOp, binary_op, map2};
    pub use crate::tensor::{Layout, Storage, Tensor, broadcast_shapes, release_nothing};
}
