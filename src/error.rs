//! Error types for nope

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using nope's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nope operations
///
/// Every operation either fully succeeds or fails with one of these before
/// any caller-visible state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Shape and strides have different lengths
    #[error("Shape and strides have different lengths: shape {shape:?}, strides {strides:?}")]
    LengthMismatch {
        /// Offending shape
        shape: Vec<usize>,
        /// Offending strides
        strides: Vec<isize>,
    },

    /// Tensor data reinterpreted as the wrong element type
    #[error("Type mismatch: tensor holds {got}, requested {expected}")]
    TypeMismatch {
        /// Requested dtype
        expected: DType,
        /// Actual dtype of the tensor
        got: DType,
    },

    /// DType mismatch between operands of an elementwise operation
    ///
    /// Operand form of [`Error::TypeMismatch`]: match both variants to catch
    /// every type mismatch.
    #[error("DType mismatch: {lhs} vs {rhs}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shapes {shapes:?}")]
    NotBroadcastable {
        /// Input shapes
        shapes: Vec<Vec<usize>>,
    },

    /// Innermost stride smaller than one element, or unusable for the wrapped memory
    #[error("Invalid stride {stride} for element size {element_size}")]
    InvalidStride {
        /// The rejected stride
        stride: isize,
        /// Element size in bytes
        element_size: usize,
    },

    /// Buffer format tag not in the registry
    #[error("Unknown tensor data type format: {0:?}")]
    UnknownFormat(String),

    /// Numeric kind id not in the registry
    #[error("Unknown tensor data type id: {0}")]
    UnknownKind(u8),

    /// View addresses bytes outside of its storage
    #[error("View requires {required} bytes but storage holds {capacity}")]
    OutOfBounds {
        /// Bytes the view would address
        required: usize,
        /// Storage size in bytes
        capacity: usize,
    },

    /// Multi-index does not address an element of the view
    #[error("Index {indices:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        /// Requested multi-index
        indices: Vec<usize>,
        /// Shape of the view
        shape: Vec<usize>,
    },

    /// Element count of a shape does not fit in `usize`
    #[error("Element count of shape {shape:?} overflows")]
    ShapeOverflow {
        /// Offending shape
        shape: Vec<usize>,
    },

    /// Host allocation failed or size overflowed
    #[error("Failed to allocate {size} bytes")]
    AllocationFailed {
        /// Requested size in bytes
        size: usize,
    },
}

impl Error {
    /// Create a length mismatch error
    pub fn length_mismatch(shape: &[usize], strides: &[isize]) -> Self {
        Self::LengthMismatch {
            shape: shape.to_vec(),
            strides: strides.to_vec(),
        }
    }

    /// Create a broadcast error from the offending shapes
    pub fn not_broadcastable<S: AsRef<[usize]>>(shapes: &[S]) -> Self {
        Self::NotBroadcastable {
            shapes: shapes.iter().map(|s| s.as_ref().to_vec()).collect(),
        }
    }
}
