use num_traits::Float;

use crate::shape::{numel, pool_output_shape};

/// Non-overlapping 2x2 max pooling over the two innermost axes.
///
/// `dst[b, c, r, col] = max(src[b, c, 2r + dr, 2col + dc])` for `dr, dc` in `{0, 1}`. Batch and
/// channel axes pass through unchanged. With an odd height or width the last row or column of
/// `src` is not covered by any window and is ignored.
///
/// Each window starts from its top-left element and only replaces it with a strictly greater
/// value, so every output equals one of its four inputs exactly.
///
/// # Arguments
///
/// * `src` - Buffer of shape `(n, c, h, w)`.
/// * `src_shape` - `(n, c, h, w)`.
/// * `dst` - Output buffer of shape `(n, c, h / 2, w / 2)`.
///
/// # Example
///
/// ```
/// use cnncard_kernels::max_pool_2x2_kernel;
///
/// let src = [1.0f32, 2.0, 3.0, 4.0];
/// let mut dst = [0.0f32];
/// max_pool_2x2_kernel(&src, [1, 1, 2, 2], &mut dst);
/// assert_eq!(dst, [4.0]);
/// ```
pub fn max_pool_2x2_kernel<T: Float>(src: &[T], src_shape: [usize; 4], dst: &mut [T]) {
    let [n, c, h, w] = src_shape;
    let [_, _, ho, wo] = pool_output_shape(src_shape);
    debug_assert_eq!(src.len(), numel(src_shape), "src size mismatch");
    debug_assert_eq!(dst.len(), n * c * ho * wo, "dst size mismatch");

    for plane in 0..n * c {
        let s = &src[plane * h * w..(plane + 1) * h * w];
        let d = &mut dst[plane * ho * wo..(plane + 1) * ho * wo];

        for r in 0..ho {
            for col in 0..wo {
                let top = 2 * r * w + 2 * col;
                let bottom = top + w;

                let mut max = s[top];
                for v in [s[top + 1], s[bottom], s[bottom + 1]] {
                    if v > max {
                        max = v;
                    }
                }
                d[r * wo + col] = max;
            }
        }
    }
}
