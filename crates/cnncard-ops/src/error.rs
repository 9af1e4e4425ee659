use cnncard_tensor::TensorError;
use thiserror::Error;

/// An error type for tensor operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorOpsError {
    /// Operand extents violate the operation's shape contract.
    ///
    /// For operand errors `lhs` and `rhs` are the two conflicting shapes. For result-buffer
    /// errors `lhs` is the expected result shape and `rhs` the one supplied.
    #[error("Shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        /// Name of the operation
        op: &'static str,
        /// First shape
        lhs: [u8; 4],
        /// Second shape
        rhs: [u8; 4],
    },

    /// The result buffer overlaps one of the input buffers.
    #[error("Result buffer of {op} overlaps an input buffer")]
    AliasingViolation {
        /// Name of the operation
        op: &'static str,
    },

    /// The convolution input is smaller than the 2x2 window.
    #[error("Input of {op} is {height}x{width}, smaller than the 2x2 window")]
    SpatialTooSmall {
        /// Name of the operation
        op: &'static str,
        /// Extent of axis 2
        height: u8,
        /// Extent of axis 3
        width: u8,
    },

    /// Tensor error
    #[error("Error with the tensor: {0}")]
    TensorError(#[from] TensorError),
}
