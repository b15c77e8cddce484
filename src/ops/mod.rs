//! Tensor operations
//!
//! This module implements the broadcasting elementwise engine.
//!
//! # Design
//!
//! ```text
//! binary_op(a, b, BinaryOp)           (dtype-agnostic API)
//!     │
//!     │ dispatch_dtype!(dtype, T => ...)
//!     ▼
//! map2::<T, F>(a, b, f)                (typed, any closure)
//!     │  1. exact dtype match
//!     │  2. broadcast shape + zero strides
//!     │  3. allocate output, coalesce operand axes jointly
//!     ▼
//! contiguous kernel | strided kernel   (flat scan or odometer walk)
//! ```
//!
//! No dtype promotion is performed: operands must share one dtype.

mod arithmetic;
mod binary;
mod dispatch;
mod kernels;

pub use arithmetic::BinaryOp;
pub use binary::{binary_op, map2, validate_binary_dtypes};
