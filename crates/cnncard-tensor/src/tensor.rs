use core::fmt;

use thiserror::Error;

use crate::storage::{TensorStorage, TensorStorageMut};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// An error type for tensor construction and indexing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorError {
    /// The buffer length does not match the product of the extents.
    #[error("Shape mismatch: expected {expected} elements, but the buffer holds {actual}")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the buffer
        actual: usize,
    },

    /// An index passed to a checked accessor exceeds the extent of its axis.
    #[error("Index {index} out of range for axis {axis} of size {size}")]
    IndexOutOfRange {
        /// The axis being indexed, 0 to 3
        axis: usize,
        /// The invalid index that was attempted
        index: usize,
        /// The extent of that axis
        size: usize,
    },

    /// A flat offset is past the end of the buffer.
    #[error("Offset {offset} out of range for tensor of {numel} elements")]
    OffsetOutOfRange {
        /// The invalid flat offset
        offset: usize,
        /// The number of elements in the tensor
        numel: usize,
    },

    /// The requested shape holds a different number of elements.
    #[error("Cannot reshape {from:?} into {to:?}: element counts differ")]
    ReshapeMismatch {
        /// Current extents
        from: [u8; 4],
        /// Requested extents
        to: [u8; 4],
    },
}

impl TensorError {
    /// Creates an InvalidShape error.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an IndexOutOfRange error.
    pub fn index_out_of_range(axis: usize, index: usize, size: usize) -> Self {
        Self::IndexOutOfRange { axis, index, size }
    }

    /// Returns a user-friendly suggestion for resolving the error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidShape { .. } => {
                "Ensure the buffer length equals s0 * s1 * s2 * s3"
            }
            Self::IndexOutOfRange { .. } | Self::OffsetOutOfRange { .. } => {
                "Verify indices are within bounds (0 <= index < extent)"
            }
            Self::ReshapeMismatch { .. } => {
                "The product of the new extents must equal the number of elements"
            }
        }
    }
}

/// Computes the row-major strides for a 4-D shape.
///
/// The innermost axis has stride 1 and each outer axis strides over the product of the extents
/// to its right.
///
/// # Example
///
/// ```rust
/// use cnncard_tensor::get_strides_from_shape;
///
/// assert_eq!(get_strides_from_shape([2, 3, 4, 5]), [60, 20, 5, 1]);
/// ```
pub fn get_strides_from_shape(shape: [u8; 4]) -> [usize; 4] {
    let mut strides = [0; 4];
    let mut stride = 1;
    for i in (0..4).rev() {
        strides[i] = stride;
        stride *= shape[i] as usize;
    }
    strides
}

/// Returns the number of elements described by a 4-D shape.
#[inline]
pub fn numel_from_shape(shape: [u8; 4]) -> usize {
    shape.iter().map(|&s| s as usize).product()
}

/// A dense 4-D tensor of `f32` values.
///
/// `Tensor4` pairs a contiguous buffer with four `u8` extents `[s0, s1, s2, s3]`. The element at
/// logical index `[i0, i1, i2, i3]` lives at flat offset `((i0 * s1 + i1) * s2 + i2) * s3 + i3`.
///
/// The usual axis convention is NCHW: batch, channel, height, width. Matrix multiplication
/// treats axes 0 and 1 as batch axes and axes 2 and 3 as rows and columns.
///
/// The storage type `S` decides who owns the buffer. Kernels only ever receive `&Tensor4<S>`
/// or `&mut Tensor4<S>` and never allocate.
///
/// # Examples
///
/// ```rust
/// use cnncard_tensor::Tensor4;
///
/// let t = Tensor4::from_shape_vec([1, 1, 2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(t.shape(), [1, 1, 2, 2]);
/// assert_eq!(t.strides(), [4, 4, 2, 1]);
/// assert_eq!(t.get([0, 0, 1, 0]), Some(3.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor4<S> {
    storage: S,
    shape: [u8; 4],
}

impl<S: TensorStorage> Tensor4<S> {
    /// Wraps a caller-supplied buffer as a tensor of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if the buffer length differs from
    /// `s0 * s1 * s2 * s3`.
    pub fn from_storage(shape: [u8; 4], storage: S) -> Result<Self, TensorError> {
        let numel = numel_from_shape(shape);
        if numel != storage.len() {
            return Err(TensorError::invalid_shape(numel, storage.len()));
        }
        Ok(Self { storage, shape })
    }

    /// Returns the four extents.
    #[inline]
    pub fn shape(&self) -> [u8; 4] {
        self.shape
    }

    /// Returns the four extents widened to `usize`.
    #[inline]
    pub fn dims(&self) -> [usize; 4] {
        self.shape.map(usize::from)
    }

    /// Returns the row-major strides.
    #[inline]
    pub fn strides(&self) -> [usize; 4] {
        get_strides_from_shape(self.shape)
    }

    /// Returns the number of elements in the tensor.
    #[inline]
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if any extent is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns the tensor data as a slice in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        self.storage.as_slice()
    }

    /// Returns a reference to the underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the tensor and returns its storage.
    #[inline]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns an iterator over the elements in row-major order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, f32> {
        self.as_slice().iter()
    }

    /// Returns a read-only tensor borrowing this tensor's buffer.
    #[inline]
    pub fn view(&self) -> Tensor4<&[f32]> {
        Tensor4 {
            storage: self.as_slice(),
            shape: self.shape,
        }
    }

    /// Computes the flat offset of `index` without checking it against the extents.
    ///
    /// The result is only meaningful when every `index[k] < shape[k]`.
    #[inline]
    pub fn offset_unchecked(&self, index: [usize; 4]) -> usize {
        let [_, s1, s2, s3] = self.dims();
        let [i0, i1, i2, i3] = index;
        ((i0 * s1 + i1) * s2 + i2) * s3 + i3
    }

    /// Computes the flat offset of `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::IndexOutOfRange`] naming the first axis whose index is not below
    /// its extent.
    pub fn offset(&self, index: [usize; 4]) -> Result<usize, TensorError> {
        for (axis, (&idx, size)) in index.iter().zip(self.dims()).enumerate() {
            if idx >= size {
                return Err(TensorError::index_out_of_range(axis, idx, size));
            }
        }
        Ok(self.offset_unchecked(index))
    }

    /// Recovers the logical index of a flat offset. The inverse of [`Self::offset`].
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::OffsetOutOfRange`] if `offset >= numel`.
    pub fn index_of(&self, offset: usize) -> Result<[usize; 4], TensorError> {
        let numel = self.numel();
        if offset >= numel {
            return Err(TensorError::OffsetOutOfRange { offset, numel });
        }
        let mut index = [0; 4];
        let mut rem = offset;
        for (i, stride) in self.strides().iter().enumerate() {
            index[i] = rem / stride;
            rem %= stride;
        }
        Ok(index)
    }

    /// Returns the element at `index`, or `None` if any index is out of range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cnncard_tensor::Tensor4;
    ///
    /// let t = Tensor4::from_shape_vec([1, 1, 1, 2], vec![1.0, 2.0]).unwrap();
    /// assert_eq!(t.get([0, 0, 0, 1]), Some(2.0));
    /// assert_eq!(t.get([0, 0, 0, 2]), None);
    /// ```
    #[inline]
    pub fn get(&self, index: [usize; 4]) -> Option<f32> {
        self.offset(index).ok().map(|o| self.as_slice()[o])
    }

    /// Returns the element at `index` without checking it against the extents.
    ///
    /// Debug builds assert the index; release builds perform no check at all.
    ///
    /// # Safety
    ///
    /// Every `index[k]` must be strictly below `shape[k]`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: [usize; 4]) -> f32 {
        debug_assert!(
            self.offset(index).is_ok(),
            "index {index:?} out of range for shape {:?}",
            self.shape
        );
        let offset = self.offset_unchecked(index);
        // SAFETY: in-range indices give offset < numel
        unsafe { *self.as_slice().get_unchecked(offset) }
    }

    /// Reinterprets the buffer with new extents, keeping the row-major order of elements.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ReshapeMismatch`] if the new shape holds a different number of
    /// elements.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cnncard_tensor::Tensor4;
    ///
    /// let pooled = Tensor4::zeros([1, 4, 2, 2]);
    /// let flat = pooled.reshape([1, 1, 1, 16]).unwrap();
    /// assert_eq!(flat.shape(), [1, 1, 1, 16]);
    /// ```
    pub fn reshape(self, shape: [u8; 4]) -> Result<Self, TensorError> {
        if numel_from_shape(shape) != self.numel() {
            return Err(TensorError::ReshapeMismatch {
                from: self.shape,
                to: shape,
            });
        }
        Ok(Self {
            storage: self.storage,
            shape,
        })
    }

    /// Copies the tensor into a new tensor that owns its buffer.
    #[cfg(feature = "alloc")]
    pub fn to_owned_tensor(&self) -> Tensor4<Vec<f32>> {
        Tensor4 {
            storage: self.as_slice().to_vec(),
            shape: self.shape,
        }
    }
}

impl<S: TensorStorageMut> Tensor4<S> {
    /// Returns the tensor data as a mutable slice in row-major order.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        self.storage.as_mut_slice()
    }

    /// Returns a mutable iterator over the elements in row-major order.
    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, f32> {
        self.as_slice_mut().iter_mut()
    }

    /// Returns a mutable tensor borrowing this tensor's buffer.
    #[inline]
    pub fn view_mut(&mut self) -> Tensor4<&mut [f32]> {
        let shape = self.shape;
        Tensor4 {
            storage: self.as_slice_mut(),
            shape,
        }
    }

    /// Writes `value` at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::IndexOutOfRange`] if any index is out of range; the buffer is left
    /// untouched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cnncard_tensor::Tensor4;
    ///
    /// let mut t = Tensor4::zeros([2, 1, 1, 1]);
    /// t.set([1, 0, 0, 0], 3.5).unwrap();
    /// assert_eq!(t.as_slice(), &[0.0, 3.5]);
    /// ```
    #[inline]
    pub fn set(&mut self, index: [usize; 4], value: f32) -> Result<(), TensorError> {
        let offset = self.offset(index)?;
        self.as_slice_mut()[offset] = value;
        Ok(())
    }

    /// Writes `value` at `index` without checking it against the extents.
    ///
    /// Debug builds assert the index; release builds perform no check at all.
    ///
    /// # Safety
    ///
    /// Every `index[k]` must be strictly below `shape[k]`.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, index: [usize; 4], value: f32) {
        debug_assert!(
            self.offset(index).is_ok(),
            "index {index:?} out of range for shape {:?}",
            self.shape
        );
        let offset = self.offset_unchecked(index);
        // SAFETY: in-range indices give offset < numel
        unsafe { *self.as_slice_mut().get_unchecked_mut(offset) = value };
    }

    /// Sets every element to `value`.
    #[inline]
    pub fn fill(&mut self, value: f32) {
        self.as_slice_mut().fill(value);
    }
}

#[cfg(feature = "alloc")]
impl Tensor4<Vec<f32>> {
    /// Creates a tensor owning `data`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if `data.len()` differs from the element count.
    pub fn from_shape_vec(shape: [u8; 4], data: Vec<f32>) -> Result<Self, TensorError> {
        Self::from_storage(shape, data)
    }

    /// Creates a tensor owning a copy of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if `data.len()` differs from the element count.
    pub fn from_shape_slice(shape: [u8; 4], data: &[f32]) -> Result<Self, TensorError> {
        let numel = numel_from_shape(shape);
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            storage: data.to_vec(),
            shape,
        })
    }

    /// Creates a tensor with every element set to `value`.
    pub fn from_shape_val(shape: [u8; 4], value: f32) -> Self {
        Self {
            storage: alloc::vec![value; numel_from_shape(shape)],
            shape,
        }
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(shape: [u8; 4]) -> Self {
        Self::from_shape_val(shape, 0.0)
    }

    /// Creates a tensor by calling `f` with every logical index in row-major order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cnncard_tensor::Tensor4;
    ///
    /// let eye = Tensor4::from_shape_fn([1, 1, 2, 2], |[_, _, r, c]| {
    ///     if r == c { 1.0 } else { 0.0 }
    /// });
    /// assert_eq!(eye.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
    /// ```
    pub fn from_shape_fn<F>(shape: [u8; 4], mut f: F) -> Self
    where
        F: FnMut([usize; 4]) -> f32,
    {
        let [s0, s1, s2, s3] = shape.map(usize::from);
        let mut data = Vec::with_capacity(s0 * s1 * s2 * s3);
        for i0 in 0..s0 {
            for i1 in 0..s1 {
                for i2 in 0..s2 {
                    for i3 in 0..s3 {
                        data.push(f([i0, i1, i2, i3]));
                    }
                }
            }
        }
        Self {
            storage: data,
            shape,
        }
    }

    /// Consumes the tensor and returns the underlying vector.
    #[inline]
    pub fn into_vec(self) -> Vec<f32> {
        self.storage
    }
}

impl<S: TensorStorage> fmt::Display for Tensor4<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.as_slice();
        if data.is_empty() {
            return write!(f, "[]");
        }

        // number of elements spanned by one step along each axis' parent
        let strides = self.strides();
        let dims = self.dims();
        let blocks: [usize; 4] = core::array::from_fn(|k| strides[k] * dims[k]);

        for (i, v) in data.iter().enumerate() {
            let opens = blocks.iter().filter(|&&b| i % b == 0).count();
            let closes = blocks.iter().filter(|&&b| (i + 1) % b == 0).count();

            if i > 0 && opens > 0 {
                write!(f, "{:width$}", "", width = 4 - opens)?;
            }
            for _ in 0..opens {
                f.write_str("[")?;
            }
            write!(f, "{v:.4}")?;
            for _ in 0..closes {
                f.write_str("]")?;
            }
            if i + 1 < data.len() {
                if closes == 0 {
                    f.write_str(", ")?;
                } else {
                    f.write_str(",")?;
                    for _ in 0..closes {
                        f.write_str("\n")?;
                    }
                }
            }
        }
        Ok(())
    }
}
