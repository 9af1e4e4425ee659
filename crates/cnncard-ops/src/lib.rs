#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Every operation comes in two flavours:
//!
//! - [`ops`]: validates shapes and buffer aliasing, returns [`TensorOpsError`] on a violated
//!   precondition and leaves the result buffer untouched.
//! - [`unchecked`]: trusts the caller and forwards straight to the kernels.
//!
//! ```rust
//! use cnncard_tensor::Tensor4;
//! use cnncard_ops::{convolve_2x2, max_pool, relu};
//!
//! let x = Tensor4::from_shape_fn([1, 1, 5, 5], |[_, _, r, c]| r as f32 - c as f32);
//! let kernel = Tensor4::from_shape_val([2, 1, 2, 2], 0.25);
//!
//! let mut features = Tensor4::zeros([1, 2, 4, 4]);
//! convolve_2x2(&x, &kernel, &mut features).unwrap();
//! relu(&mut features);
//!
//! let mut pooled = Tensor4::zeros([1, 2, 2, 2]);
//! max_pool(&features, &mut pooled).unwrap();
//! assert!(pooled.iter().all(|&v| v >= 0.0));
//! ```

/// Error types for tensor operations.
///
/// Defines [`TensorOpsError`] for handling violated preconditions.
pub mod error;

/// Checked tensor operations.
///
/// Each operation validates operand shapes and result aliasing before touching any data.
pub mod ops;

/// Operations that trust the caller.
pub mod unchecked;

/// Buffer validation helpers.
pub mod validate;

pub use error::TensorOpsError;
#[cfg(feature = "gemm")]
pub use ops::matmul_gemm;
pub use ops::{add_bias, convolve_2x2, matmul, max_pool, relu, softmax};
