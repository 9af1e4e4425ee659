use num_traits::Float;

use crate::shape::numel;

/// Unit-stride, unpadded 2x2 convolution summed over input channels.
///
/// ```text
/// dst[b, o, r, c] = sum_ic sum_dr sum_dc src[b, ic, r + dr, c + dc] * kernel[o, ic, dr, dc]
/// ```
///
/// Terms are accumulated in ascending `ic`, then `dr`, then `dc`. No bias is added; use
/// [`add_bias_kernel`](crate::add_bias_kernel) afterwards.
///
/// # Arguments
///
/// * `src` - Input of shape `(n, ci, h, w)` with `h >= 2` and `w >= 2`.
/// * `src_shape` - `(n, ci, h, w)`.
/// * `kernel` - Weights of shape `(co, ci, 2, 2)`.
/// * `kernel_shape` - `(co, ci, 2, 2)`.
/// * `dst` - Output of shape `(n, co, h - 1, w - 1)`, fully overwritten.
///
/// # Example
///
/// ```
/// use cnncard_kernels::convolve_2x2_kernel;
///
/// let src = [1.0f32; 9];
/// let kernel = [1.0f32; 4];
/// let mut dst = [0.0f32; 4];
/// convolve_2x2_kernel(&src, [1, 1, 3, 3], &kernel, [1, 1, 2, 2], &mut dst);
/// assert_eq!(dst, [4.0; 4]);
/// ```
pub fn convolve_2x2_kernel<T: Float>(
    src: &[T],
    src_shape: [usize; 4],
    kernel: &[T],
    kernel_shape: [usize; 4],
    dst: &mut [T],
) {
    let [n, ci, h, w] = src_shape;
    let co = kernel_shape[0];
    debug_assert!(h >= 2 && w >= 2, "input smaller than the 2x2 window");
    debug_assert_eq!(kernel_shape, [co, ci, 2, 2], "kernel shape mismatch");
    debug_assert_eq!(src.len(), numel(src_shape), "src size mismatch");
    debug_assert_eq!(kernel.len(), numel(kernel_shape), "kernel size mismatch");

    let (ho, wo) = (h.saturating_sub(1), w.saturating_sub(1));
    debug_assert_eq!(dst.len(), n * co * ho * wo, "dst size mismatch");

    for b in 0..n {
        for o in 0..co {
            let out = &mut dst[(b * co + o) * ho * wo..(b * co + o + 1) * ho * wo];
            for r in 0..ho {
                for c in 0..wo {
                    let mut acc = T::zero();
                    for ic in 0..ci {
                        let plane = &src[(b * ci + ic) * h * w..(b * ci + ic + 1) * h * w];
                        let k = &kernel[(o * ci + ic) * 4..(o * ci + ic + 1) * 4];
                        let top = r * w + c;
                        let bottom = top + w;
                        acc = acc
                            + plane[top] * k[0]
                            + plane[top + 1] * k[1]
                            + plane[bottom] * k[2]
                            + plane[bottom + 1] * k[3];
                    }
                    out[r * wo + c] = acc;
                }
            }
        }
    }
}
