use num_traits::Float;

use crate::shape::numel;

/// Batched matrix product over the trailing two axes.
///
/// For every batch index `(b0, b1)`:
/// `dst[b0, b1, r, c] = sum_k lhs[b0, b1, r, k] * rhs[b0, b1, k, c]`.
///
/// The sum for each output cell is accumulated in ascending `k` starting from zero, so results
/// are reproducible bit for bit across platforms that share the float type.
///
/// # Arguments
///
/// * `lhs` - Buffer of shape `(b0, b1, m, k)`.
/// * `lhs_shape` - `(b0, b1, m, k)`.
/// * `rhs` - Buffer of shape `(b0, b1, k, n)`.
/// * `rhs_shape` - `(b0, b1, k, n)`.
/// * `dst` - Output buffer of shape `(b0, b1, m, n)`, fully overwritten.
///
/// # Example
///
/// ```
/// use cnncard_kernels::matmul_kernel;
///
/// let eye = [1.0f32, 0.0, 0.0, 1.0];
/// let m = [5.0f32, 6.0, 7.0, 8.0];
/// let mut dst = [0.0f32; 4];
/// matmul_kernel(&eye, [1, 1, 2, 2], &m, [1, 1, 2, 2], &mut dst);
/// assert_eq!(dst, m);
/// ```
pub fn matmul_kernel<T: Float>(
    lhs: &[T],
    lhs_shape: [usize; 4],
    rhs: &[T],
    rhs_shape: [usize; 4],
    dst: &mut [T],
) {
    let [b0, b1, m, k] = lhs_shape;
    let n = rhs_shape[3];
    debug_assert_eq!(lhs.len(), numel(lhs_shape), "lhs size mismatch");
    debug_assert_eq!(rhs.len(), numel(rhs_shape), "rhs size mismatch");
    debug_assert_eq!([b0, b1, k], [rhs_shape[0], rhs_shape[1], rhs_shape[2]]);
    debug_assert_eq!(dst.len(), b0 * b1 * m * n, "dst size mismatch");

    for batch in 0..b0 * b1 {
        let a = &lhs[batch * m * k..(batch + 1) * m * k];
        let b = &rhs[batch * k * n..(batch + 1) * k * n];
        let c = &mut dst[batch * m * n..(batch + 1) * m * n];

        for r in 0..m {
            let a_row = &a[r * k..(r + 1) * k];
            for col in 0..n {
                c[r * n + col] = a_row
                    .iter()
                    .enumerate()
                    .fold(T::zero(), |acc, (kk, &x)| acc + x * b[kk * n + col]);
            }
        }
    }
}

/// Batched matrix product implemented with `matrixmultiply::sgemm`.
///
/// Same contract as [`matmul_kernel`] but the accumulation order is chosen by the GEMM
/// micro-kernels, so results may differ from it in the last bits.
#[cfg(feature = "gemm")]
pub fn matmul_gemm_kernel(
    lhs: &[f32],
    lhs_shape: [usize; 4],
    rhs: &[f32],
    rhs_shape: [usize; 4],
    dst: &mut [f32],
) {
    let [b0, b1, m, k] = lhs_shape;
    let n = rhs_shape[3];
    assert_eq!(lhs.len(), numel(lhs_shape), "lhs size mismatch");
    assert_eq!(rhs.len(), b0 * b1 * k * n, "rhs size mismatch");
    assert_eq!(dst.len(), b0 * b1 * m * n, "dst size mismatch");

    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        dst.fill(0.0);
        return;
    }

    for batch in 0..b0 * b1 {
        let a = &lhs[batch * m * k..(batch + 1) * m * k];
        let b = &rhs[batch * k * n..(batch + 1) * k * n];
        let c = &mut dst[batch * m * n..(batch + 1) * m * n];

        // SAFETY: the asserts above bound every pointer to its slice for the given strides
        unsafe {
            matrixmultiply::sgemm(
                /* m */ m,
                /* k */ k,
                /* n */ n,
                /* alpha */ 1.0,
                /* a */ a.as_ptr(),
                /* rsa */ k as isize,
                /* csa */ 1,
                /* b */ b.as_ptr(),
                /* rsb */ n as isize,
                /* csb */ 1,
                /* beta */ 0.0,
                /* c */ c.as_mut_ptr(),
                /* rsc */ n as isize,
                /* csc */ 1,
            );
        }
    }
}
