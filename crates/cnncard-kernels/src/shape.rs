/// Returns the number of elements of a 4-D shape.
#[inline]
pub fn numel(shape: [usize; 4]) -> usize {
    shape.iter().product()
}

/// Shape of `lhs @ rhs` batched over the two leading axes: `(b0, b1, m, n)`.
///
/// The shape is only meaningful when `lhs = (b0, b1, m, k)` and `rhs = (b0, b1, k, n)`.
#[inline]
pub fn matmul_output_shape(lhs: [usize; 4], rhs: [usize; 4]) -> [usize; 4] {
    [lhs[0], lhs[1], lhs[2], rhs[3]]
}

/// Shape produced by 2x2 max pooling: the spatial extents are halved, rounding down.
///
/// # Example
///
/// ```
/// use cnncard_kernels::shape::pool_output_shape;
///
/// assert_eq!(pool_output_shape([1, 6, 24, 24]), [1, 6, 12, 12]);
/// assert_eq!(pool_output_shape([1, 1, 5, 3]), [1, 1, 2, 1]);
/// ```
#[inline]
pub fn pool_output_shape(src: [usize; 4]) -> [usize; 4] {
    [src[0], src[1], src[2] / 2, src[3] / 2]
}

/// Shape produced by a unit-stride, unpadded 2x2 convolution.
///
/// `src` is `(batch, in_channels, h, w)` and `kernel` is `(out_channels, in_channels, 2, 2)`.
/// Returns `None` when the input is smaller than the 2x2 window along either spatial axis.
///
/// # Example
///
/// ```
/// use cnncard_kernels::shape::conv_output_shape;
///
/// assert_eq!(conv_output_shape([1, 3, 28, 28], [8, 3, 2, 2]), Some([1, 8, 27, 27]));
/// assert_eq!(conv_output_shape([1, 3, 1, 28], [8, 3, 2, 2]), None);
/// ```
#[inline]
pub fn conv_output_shape(src: [usize; 4], kernel: [usize; 4]) -> Option<[usize; 4]> {
    if src[2] < 2 || src[3] < 2 {
        return None;
    }
    Some([src[0], kernel[0], src[2] - 1, src[3] - 1])
}
