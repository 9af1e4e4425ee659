#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `cnncard-tensor` provides [`Tensor4`], the single data type shared by every kernel in the
//! `cnncard` family: a flat, contiguous buffer of `f32` values plus four `u8` extents
//! `[s0, s1, s2, s3]` laid out row-major (axis 0 varies slowest, axis 3 fastest).
//!
//! The tensor never allocates on its own. It wraps whatever buffer the caller hands it through
//! the [`TensorStorage`] trait, so the same type works over a `static` array on the target and
//! over a `Vec<f32>` in host-side tests.
//!
//! # Quick Start
//!
//! ```rust
//! use cnncard_tensor::Tensor4;
//!
//! let mut buf = [0.0f32; 8];
//! let mut t = Tensor4::from_storage([1, 2, 2, 2], &mut buf[..]).unwrap();
//!
//! t.set([0, 1, 0, 1], 5.0).unwrap();
//! assert_eq!(t.get([0, 1, 0, 1]), Some(5.0));
//! assert_eq!(t.offset([0, 1, 0, 1]).unwrap(), 5);
//! assert!(t.get([0, 2, 0, 0]).is_none());
//! ```
//!
//! # Features
//!
//! - `std` (default): implies `alloc`.
//! - `alloc`: owned constructors over `Vec<f32>` such as [`Tensor4::from_shape_vec`].
//! - `serde`: serialization of tensors as `{ data, shape }`.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(test)]
extern crate std;

/// Serde support for owned tensors.
#[cfg(feature = "serde")]
pub mod serde;

/// Buffer abstraction over caller-owned memory.
///
/// This module provides the [`TensorStorage`] and [`TensorStorageMut`] traits implemented for
/// slices, arrays and (with `alloc`) vectors and boxed slices.
pub mod storage;

/// Tensor module containing [`Tensor4`], its indexing arithmetic and error types.
pub mod tensor;

pub use crate::storage::{TensorStorage, TensorStorageMut};
pub use crate::tensor::{get_strides_from_shape, numel_from_shape, Tensor4, TensorError};

/// Type alias for a tensor owning its buffer.
#[cfg(feature = "alloc")]
pub type OwnedTensor4 = Tensor4<alloc::vec::Vec<f32>>;

/// Type alias for a read-only tensor borrowing its buffer.
pub type Tensor4Ref<'a> = Tensor4<&'a [f32]>;

/// Type alias for a mutable tensor borrowing its buffer.
pub type Tensor4Mut<'a> = Tensor4<&'a mut [f32]>;
