#[cfg(feature = "alloc")]
use alloc::{boxed::Box, vec::Vec};

/// A contiguous buffer of `f32` values backing a [`Tensor4`](crate::Tensor4).
///
/// The tensor only ever reads through this trait. Ownership stays with whoever created the
/// storage: a borrowed slice keeps the buffer with the caller, an owned `Vec` moves it into the
/// tensor.
pub trait TensorStorage {
    /// Returns the buffer as a slice.
    fn as_slice(&self) -> &[f32];

    /// Returns the number of elements in the buffer.
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`TensorStorage`] that can also be written through.
pub trait TensorStorageMut: TensorStorage {
    /// Returns the buffer as a mutable slice.
    fn as_mut_slice(&mut self) -> &mut [f32];
}

impl TensorStorage for &[f32] {
    #[inline]
    fn as_slice(&self) -> &[f32] {
        self
    }
}

impl TensorStorage for &mut [f32] {
    #[inline]
    fn as_slice(&self) -> &[f32] {
        self
    }
}

impl TensorStorageMut for &mut [f32] {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [f32] {
        self
    }
}

impl<const N: usize> TensorStorage for [f32; N] {
    #[inline]
    fn as_slice(&self) -> &[f32] {
        self
    }
}

impl<const N: usize> TensorStorageMut for [f32; N] {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [f32] {
        self
    }
}

#[cfg(feature = "alloc")]
impl TensorStorage for Vec<f32> {
    #[inline]
    fn as_slice(&self) -> &[f32] {
        self
    }
}

#[cfg(feature = "alloc")]
impl TensorStorageMut for Vec<f32> {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [f32] {
        self
    }
}

#[cfg(feature = "alloc")]
impl TensorStorage for Box<[f32]> {
    #[inline]
    fn as_slice(&self) -> &[f32] {
        self
    }
}

#[cfg(feature = "alloc")]
impl TensorStorageMut for Box<[f32]> {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [f32] {
        self
    }
}
