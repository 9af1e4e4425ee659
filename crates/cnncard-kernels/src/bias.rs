use num_traits::Float;

/// Adds one bias value per channel to a `(n, c, h, w)` buffer in place.
///
/// `bias[ch]` is added to every element of channel `ch`, across all batch entries and spatial
/// positions. `bias` must hold exactly `c` values, i.e. the flattened `(1, c, 1, 1)` tensor.
///
/// # Arguments
///
/// * `data` - Feature map of shape `shape`, modified in place.
/// * `shape` - `(n, c, h, w)`.
/// * `bias` - `c` bias values.
///
/// # Example
///
/// ```
/// use cnncard_kernels::add_bias_kernel;
///
/// let mut data = [0.0f32; 8];
/// add_bias_kernel(&mut data, [1, 2, 2, 2], &[10.0, -1.0]);
/// assert_eq!(data, [10.0, 10.0, 10.0, 10.0, -1.0, -1.0, -1.0, -1.0]);
/// ```
pub fn add_bias_kernel<T: Float>(data: &mut [T], shape: [usize; 4], bias: &[T]) {
    let [n, c, h, w] = shape;
    debug_assert_eq!(data.len(), n * c * h * w, "data size mismatch");
    debug_assert_eq!(bias.len(), c, "bias size mismatch");

    let plane = h * w;
    if plane == 0 {
        return;
    }

    for (i, channel) in data.chunks_exact_mut(plane).enumerate() {
        let b = bias[i % c];
        channel.iter_mut().for_each(|x| *x = *x + b);
    }
}
