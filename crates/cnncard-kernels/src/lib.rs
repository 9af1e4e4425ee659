#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Every kernel in this crate works on raw row-major buffers plus `[usize; 4]` shapes. None of
//! them allocate, log or return errors: preconditions are checked with `debug_assert!` only and
//! compiled out of release builds. Validated entry points live in `cnncard-ops`.

/// Rectified linear activation.
pub mod activation;

/// Per-channel bias broadcast.
pub mod bias;

/// Fixed 2x2 valid convolution.
pub mod conv;

/// Batched matrix multiplication over the trailing two axes.
pub mod matmul;

/// Non-overlapping 2x2 max pooling.
pub mod pool;

/// Output shape arithmetic shared by the kernels and their callers.
pub mod shape;

/// Numerically stable softmax over the innermost axis.
pub mod softmax;

pub use activation::relu_kernel;
pub use bias::add_bias_kernel;
pub use conv::convolve_2x2_kernel;
#[cfg(feature = "gemm")]
pub use matmul::matmul_gemm_kernel;
pub use matmul::matmul_kernel;
pub use pool::max_pool_2x2_kernel;
pub use softmax::softmax_kernel;
