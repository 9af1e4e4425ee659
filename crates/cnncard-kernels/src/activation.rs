use num_traits::Float;

/// Applies ReLU in place: every element becomes `max(0, x)`.
///
/// Works on any buffer length; shape plays no role. NaN values are left untouched.
///
/// # Example
///
/// ```
/// use cnncard_kernels::relu_kernel;
///
/// let mut data = [-1.0f32, 2.0, 3.0, -4.0];
/// relu_kernel(&mut data);
/// assert_eq!(data, [0.0, 2.0, 3.0, 0.0]);
/// ```
#[inline]
pub fn relu_kernel<T: Float>(data: &mut [T]) {
    for x in data.iter_mut() {
        if *x < T::zero() {
            *x = T::zero();
        }
    }
}
