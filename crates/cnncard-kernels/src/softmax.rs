use num_traits::Float;

/// Computes softmax in place over consecutive groups of `group_len` elements.
///
/// For a `(n, c, h, w)` buffer, `group_len = w` normalizes along the innermost axis
/// independently for every `(n, c, h)`. Each group is shifted by its maximum before
/// exponentiation, so large inputs do not overflow:
/// `x_k <- exp(x_k - max) / sum_j exp(x_j - max)`.
///
/// A `group_len` of zero is a no-op.
///
/// # Example
///
/// ```
/// use cnncard_kernels::softmax_kernel;
///
/// let mut data = [1.0f32, 1.0];
/// softmax_kernel(&mut data, 2);
/// assert_eq!(data, [0.5, 0.5]);
/// ```
pub fn softmax_kernel<T: Float>(data: &mut [T], group_len: usize) {
    if group_len == 0 {
        return;
    }
    debug_assert_eq!(data.len() % group_len, 0, "data size mismatch");

    for group in data.chunks_exact_mut(group_len) {
        let max = group.iter().copied().fold(T::neg_infinity(), T::max);

        let mut sum = T::zero();
        for x in group.iter_mut() {
            *x = (*x - max).exp();
            sum = sum + *x;
        }

        for x in group.iter_mut() {
            *x = *x / sum;
        }
    }
}
