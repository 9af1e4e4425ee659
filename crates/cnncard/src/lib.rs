#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use cnncard_tensor as tensor;

#[doc(inline)]
pub use cnncard_kernels as kernels;

#[doc(inline)]
pub use cnncard_ops as ops;
