use cnncard_kernels::shape::{conv_output_shape, matmul_output_shape, pool_output_shape};
use cnncard_tensor::{Tensor4, TensorStorage, TensorStorageMut};

use crate::error::TensorOpsError;
use crate::unchecked;
use crate::validate::{ensure_disjoint, ensure_result_shape, reject};

// every output extent is taken from, or smaller than, an operand extent
fn narrow(shape: [usize; 4]) -> [u8; 4] {
    shape.map(|s| s as u8)
}

fn check_matmul<A, B, R>(
    op: &'static str,
    m1: &Tensor4<A>,
    m2: &Tensor4<B>,
    res: &Tensor4<R>,
) -> Result<(), TensorOpsError>
where
    A: TensorStorage,
    B: TensorStorage,
    R: TensorStorage,
{
    log::trace!(
        "{op}: {:?} @ {:?} -> {:?}",
        m1.shape(),
        m2.shape(),
        res.shape()
    );

    let [a0, a1, _, k] = m1.shape();
    let [b0, b1, k2, _] = m2.shape();
    if [a0, a1, k] != [b0, b1, k2] {
        return reject(TensorOpsError::ShapeMismatch {
            op,
            lhs: m1.shape(),
            rhs: m2.shape(),
        });
    }

    let expected = narrow(matmul_output_shape(m1.dims(), m2.dims()));
    ensure_result_shape(op, expected, res.shape())?;
    ensure_disjoint(op, res.as_slice(), &[m1.as_slice(), m2.as_slice()])
}

/// Batched matrix product `res = m1 @ m2` over the trailing two axes.
///
/// For every batch index `(b0, b1)`:
/// `res[b0, b1, r, c] = sum_k m1[b0, b1, r, k] * m2[b0, b1, k, c]`, accumulated in ascending
/// `k`.
///
/// # Arguments
///
/// * `m1` - Left operand of shape `(b0, b1, m, k)`.
/// * `m2` - Right operand of shape `(b0, b1, k, n)`.
/// * `res` - Result of shape `(b0, b1, m, n)`, fully overwritten.
///
/// # Errors
///
/// * [`TensorOpsError::ShapeMismatch`] if the batch or inner extents disagree, or if `res` is
///   not `(b0, b1, m, n)`.
/// * [`TensorOpsError::AliasingViolation`] if `res` overlaps an operand.
///
/// Nothing is written when an error is returned.
///
/// # Example
///
/// ```
/// use cnncard_tensor::Tensor4;
/// use cnncard_ops::ops::matmul;
///
/// let m1 = Tensor4::from_shape_vec([1, 1, 2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
/// let m2 = Tensor4::from_shape_vec([1, 1, 2, 2], vec![5.0, 6.0, 7.0, 8.0]).unwrap();
/// let mut res = Tensor4::zeros([1, 1, 2, 2]);
/// matmul(&m1, &m2, &mut res).unwrap();
/// assert_eq!(res.as_slice(), &[5.0, 6.0, 7.0, 8.0]);
/// ```
pub fn matmul<A, B, R>(
    m1: &Tensor4<A>,
    m2: &Tensor4<B>,
    res: &mut Tensor4<R>,
) -> Result<(), TensorOpsError>
where
    A: TensorStorage,
    B: TensorStorage,
    R: TensorStorageMut,
{
    check_matmul("matmul", m1, m2, res)?;
    unchecked::matmul(m1, m2, res);
    Ok(())
}

/// Batched matrix product through `matrixmultiply::sgemm`.
///
/// Validates exactly like [`matmul`]; the accumulation order is left to the GEMM
/// micro-kernels, so results may differ from [`matmul`] in the last bits.
///
/// # Errors
///
/// Same as [`matmul`].
#[cfg(feature = "gemm")]
pub fn matmul_gemm<A, B, R>(
    m1: &Tensor4<A>,
    m2: &Tensor4<B>,
    res: &mut Tensor4<R>,
) -> Result<(), TensorOpsError>
where
    A: TensorStorage,
    B: TensorStorage,
    R: TensorStorageMut,
{
    check_matmul("matmul_gemm", m1, m2, res)?;
    unchecked::matmul_gemm(m1, m2, res);
    Ok(())
}

/// Adds a per-channel bias to `t` in place.
///
/// `t[i0, i1, i2, i3] += bias[0, i1, 0, 0]` for every element of `t`.
///
/// # Errors
///
/// * [`TensorOpsError::ShapeMismatch`] if `bias` is not `(1, t.s1, 1, 1)`.
/// * [`TensorOpsError::AliasingViolation`] if `bias` overlaps `t`.
///
/// # Example
///
/// ```
/// use cnncard_tensor::Tensor4;
/// use cnncard_ops::ops::add_bias;
///
/// let mut t = Tensor4::zeros([1, 1, 2, 2]);
/// let bias = Tensor4::from_shape_vec([1, 1, 1, 1], vec![10.0]).unwrap();
/// add_bias(&mut t, &bias).unwrap();
/// assert_eq!(t.as_slice(), &[10.0; 4]);
/// ```
pub fn add_bias<S, B>(t: &mut Tensor4<S>, bias: &Tensor4<B>) -> Result<(), TensorOpsError>
where
    S: TensorStorageMut,
    B: TensorStorage,
{
    const OP: &str = "add_bias";
    log::trace!("{OP}: {:?} + {:?}", t.shape(), bias.shape());

    let [_, channels, _, _] = t.shape();
    if bias.shape() != [1, channels, 1, 1] {
        return reject(TensorOpsError::ShapeMismatch {
            op: OP,
            lhs: t.shape(),
            rhs: bias.shape(),
        });
    }
    ensure_disjoint(OP, t.as_slice(), &[bias.as_slice()])?;

    unchecked::add_bias(t, bias);
    Ok(())
}

/// Replaces every element `x` of `t` with `max(0, x)`.
///
/// Has no preconditions beyond `t` being well formed, and is idempotent.
pub fn relu<S: TensorStorageMut>(t: &mut Tensor4<S>) {
    log::trace!("relu: {:?}", t.shape());
    unchecked::relu(t);
}

/// Normalizes `t` in place with softmax along axis 3.
///
/// Every group of `s3` values sharing `(i0, i1, i2)` is shifted by its maximum, exponentiated
/// and divided by its sum, so each group sums to one. Tensors with `s3 == 0` are left as is.
///
/// # Example
///
/// ```
/// use cnncard_tensor::Tensor4;
/// use cnncard_ops::ops::softmax;
///
/// let mut t = Tensor4::from_shape_vec([1, 1, 1, 2], vec![1.0, 1.0]).unwrap();
/// softmax(&mut t);
/// assert_eq!(t.as_slice(), &[0.5, 0.5]);
/// ```
pub fn softmax<S: TensorStorageMut>(t: &mut Tensor4<S>) {
    log::trace!("softmax: {:?}", t.shape());
    unchecked::softmax(t);
}

/// Non-overlapping 2x2 max pooling of the two innermost axes of `t` into `res`.
///
/// Batch and channel axes pass through. An odd trailing row or column of `t` is ignored.
///
/// # Errors
///
/// * [`TensorOpsError::ShapeMismatch`] if `res` is not `(s0, s1, s2 / 2, s3 / 2)`.
/// * [`TensorOpsError::AliasingViolation`] if `res` overlaps `t`.
///
/// # Example
///
/// ```
/// use cnncard_tensor::Tensor4;
/// use cnncard_ops::ops::max_pool;
///
/// let t = Tensor4::from_shape_fn([1, 1, 4, 4], |[_, _, r, c]| (r * 4 + c + 1) as f32);
/// let mut res = Tensor4::zeros([1, 1, 2, 2]);
/// max_pool(&t, &mut res).unwrap();
/// assert_eq!(res.as_slice(), &[6.0, 8.0, 14.0, 16.0]);
/// ```
pub fn max_pool<S, R>(t: &Tensor4<S>, res: &mut Tensor4<R>) -> Result<(), TensorOpsError>
where
    S: TensorStorage,
    R: TensorStorageMut,
{
    const OP: &str = "max_pool";
    log::trace!("{OP}: {:?} -> {:?}", t.shape(), res.shape());

    let expected = narrow(pool_output_shape(t.dims()));
    ensure_result_shape(OP, expected, res.shape())?;
    ensure_disjoint(OP, res.as_slice(), &[t.as_slice()])?;

    unchecked::max_pool(t, res);
    Ok(())
}

/// Unit-stride, unpadded 2x2 convolution of `x` with `kernel` into `res`.
///
/// `res[b, o, r, c] = sum_ic sum_dr sum_dc x[b, ic, r + dr, c + dc] * kernel[o, ic, dr, dc]`.
/// No bias is added; follow with [`add_bias`].
///
/// # Arguments
///
/// * `x` - Input of shape `(n, ci, h, w)`.
/// * `kernel` - Weights of shape `(co, ci, 2, 2)`.
/// * `res` - Result of shape `(n, co, h - 1, w - 1)`, fully overwritten.
///
/// # Errors
///
/// * [`TensorOpsError::ShapeMismatch`] if `kernel` is not `(co, ci, 2, 2)` for the input's
///   `ci`, or if `res` has the wrong shape.
/// * [`TensorOpsError::SpatialTooSmall`] if `h < 2` or `w < 2`.
/// * [`TensorOpsError::AliasingViolation`] if `res` overlaps `x` or `kernel`.
pub fn convolve_2x2<X, K, R>(
    x: &Tensor4<X>,
    kernel: &Tensor4<K>,
    res: &mut Tensor4<R>,
) -> Result<(), TensorOpsError>
where
    X: TensorStorage,
    K: TensorStorage,
    R: TensorStorageMut,
{
    const OP: &str = "convolve_2x2";
    log::trace!(
        "{OP}: {:?} * {:?} -> {:?}",
        x.shape(),
        kernel.shape(),
        res.shape()
    );

    let [_, in_channels, height, width] = x.shape();
    let [out_channels, ..] = kernel.shape();
    if kernel.shape() != [out_channels, in_channels, 2, 2] {
        return reject(TensorOpsError::ShapeMismatch {
            op: OP,
            lhs: x.shape(),
            rhs: kernel.shape(),
        });
    }

    let Some(expected) = conv_output_shape(x.dims(), kernel.dims()) else {
        return reject(TensorOpsError::SpatialTooSmall {
            op: OP,
            height,
            width,
        });
    };
    ensure_result_shape(OP, narrow(expected), res.shape())?;
    ensure_disjoint(OP, res.as_slice(), &[x.as_slice(), kernel.as_slice()])?;

    unchecked::convolve_2x2(x, kernel, res);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cnncard_tensor::OwnedTensor4;

    fn tensor(shape: [u8; 4], data: &[f32]) -> OwnedTensor4 {
        Tensor4::from_shape_slice(shape, data).unwrap()
    }

    #[test]
    fn test_relu_scenario() {
        let mut t = tensor([1, 1, 2, 2], &[-1.0, 2.0, 3.0, -4.0]);
        relu(&mut t);
        assert_eq!(t.as_slice(), &[0.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_softmax_scenario() {
        let mut t = tensor([1, 1, 1, 2], &[1.0, 1.0]);
        softmax(&mut t);
        assert_eq!(t.as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn test_softmax_per_row() {
        let mut t = Tensor4::from_shape_fn([2, 2, 3, 4], |[a, b, c, d]| {
            (a + 2 * b + c * d) as f32
        });
        softmax(&mut t);
        for row in t.as_slice().chunks_exact(4) {
            assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_max_pool_scenario() -> Result<(), TensorOpsError> {
        let data: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let t = tensor([1, 1, 4, 4], &data);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        max_pool(&t, &mut res)?;
        assert_eq!(res.as_slice(), &[6.0, 8.0, 14.0, 16.0]);
        Ok(())
    }

    #[test]
    fn test_max_pool_odd_extents() -> Result<(), TensorOpsError> {
        let t = Tensor4::from_shape_val([1, 2, 5, 3], 1.0);
        let mut res = Tensor4::zeros([1, 2, 2, 1]);
        max_pool(&t, &mut res)?;
        assert_eq!(res.as_slice(), &[1.0; 4]);
        Ok(())
    }

    #[test]
    fn test_max_pool_wrong_result_shape() {
        let t = Tensor4::zeros([1, 1, 4, 4]);
        let mut res = Tensor4::from_shape_val([1, 1, 2, 3], 7.0);
        assert_eq!(
            max_pool(&t, &mut res),
            Err(TensorOpsError::ShapeMismatch {
                op: "max_pool",
                lhs: [1, 1, 2, 2],
                rhs: [1, 1, 2, 3]
            })
        );
        assert!(res.iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_matmul_scenario() -> Result<(), TensorOpsError> {
        let m1 = tensor([1, 1, 2, 2], &[1.0, 0.0, 0.0, 1.0]);
        let m2 = tensor([1, 1, 2, 2], &[5.0, 6.0, 7.0, 8.0]);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        matmul(&m1, &m2, &mut res)?;
        assert_eq!(res.as_slice(), &[5.0, 6.0, 7.0, 8.0]);
        Ok(())
    }

    #[test]
    fn test_matmul_inner_dim_mismatch() {
        let m1 = Tensor4::zeros([1, 1, 2, 3]);
        let m2 = Tensor4::zeros([1, 1, 2, 2]);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        assert_eq!(
            matmul(&m1, &m2, &mut res),
            Err(TensorOpsError::ShapeMismatch {
                op: "matmul",
                lhs: [1, 1, 2, 3],
                rhs: [1, 1, 2, 2]
            })
        );
    }

    #[test]
    fn test_matmul_batch_mismatch() {
        let m1 = Tensor4::zeros([2, 1, 2, 2]);
        let m2 = Tensor4::zeros([1, 1, 2, 2]);
        let mut res = Tensor4::zeros([2, 1, 2, 2]);
        assert!(matches!(
            matmul(&m1, &m2, &mut res),
            Err(TensorOpsError::ShapeMismatch { op: "matmul", .. })
        ));
    }

    #[test]
    fn test_matmul_wrong_result_shape() {
        let m1 = Tensor4::zeros([1, 2, 3, 4]);
        let m2 = Tensor4::zeros([1, 2, 4, 5]);
        let mut res = Tensor4::zeros([1, 2, 5, 3]);
        assert_eq!(
            matmul(&m1, &m2, &mut res),
            Err(TensorOpsError::ShapeMismatch {
                op: "matmul",
                lhs: [1, 2, 3, 5],
                rhs: [1, 2, 5, 3]
            })
        );
    }

    #[test]
    fn test_add_bias_scenario() -> Result<(), TensorOpsError> {
        let mut t = Tensor4::zeros([1, 1, 3, 3]);
        let bias = tensor([1, 1, 1, 1], &[10.0]);
        add_bias(&mut t, &bias)?;
        assert!(t.iter().all(|&v| v == 10.0));
        Ok(())
    }

    #[test]
    fn test_add_bias_broadcast_delta() -> Result<(), TensorOpsError> {
        let before = Tensor4::from_shape_fn([2, 3, 2, 2], |[a, b, c, d]| {
            (a * 7 + b * 5 + c * 3 + d) as f32
        });
        let bias = tensor([1, 3, 1, 1], &[0.25, -1.5, 4.0]);
        let mut after = before.clone();
        add_bias(&mut after, &bias)?;

        for offset in 0..before.numel() {
            let [_, c, _, _] = before.index_of(offset)?;
            let delta = after.as_slice()[offset] - before.as_slice()[offset];
            assert_eq!(delta, bias.as_slice()[c]);
        }
        Ok(())
    }

    #[test]
    fn test_add_bias_wrong_shape() {
        let mut t = Tensor4::zeros([1, 2, 2, 2]);
        let bias = Tensor4::zeros([1, 3, 1, 1]);
        assert_eq!(
            add_bias(&mut t, &bias),
            Err(TensorOpsError::ShapeMismatch {
                op: "add_bias",
                lhs: [1, 2, 2, 2],
                rhs: [1, 3, 1, 1]
            })
        );

        let spatial_bias = Tensor4::zeros([1, 2, 2, 1]);
        assert!(add_bias(&mut t, &spatial_bias).is_err());
    }

    #[test]
    fn test_convolve_scenario() -> Result<(), TensorOpsError> {
        let x = Tensor4::from_shape_val([1, 1, 3, 3], 1.0);
        let kernel = Tensor4::from_shape_val([1, 1, 2, 2], 1.0);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        convolve_2x2(&x, &kernel, &mut res)?;
        assert_eq!(res.as_slice(), &[4.0; 4]);
        Ok(())
    }

    #[test]
    fn test_convolve_multi_channel() -> Result<(), TensorOpsError> {
        // 2 in channels -> 3 out channels, output channel o uses weight (o + 1)
        let x = Tensor4::from_shape_val([2, 2, 4, 5], 1.0);
        let kernel = Tensor4::from_shape_fn([3, 2, 2, 2], |[o, _, _, _]| (o + 1) as f32);
        let mut res = Tensor4::zeros([2, 3, 3, 4]);
        convolve_2x2(&x, &kernel, &mut res)?;
        for offset in 0..res.numel() {
            let [_, o, _, _] = res.index_of(offset)?;
            assert_eq!(res.as_slice()[offset], 8.0 * (o + 1) as f32);
        }
        Ok(())
    }

    #[test]
    fn test_convolve_channel_mismatch() {
        let x = Tensor4::zeros([1, 2, 3, 3]);
        let kernel = Tensor4::zeros([1, 3, 2, 2]);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        assert_eq!(
            convolve_2x2(&x, &kernel, &mut res),
            Err(TensorOpsError::ShapeMismatch {
                op: "convolve_2x2",
                lhs: [1, 2, 3, 3],
                rhs: [1, 3, 2, 2]
            })
        );
    }

    #[test]
    fn test_convolve_kernel_not_2x2() {
        let x = Tensor4::zeros([1, 1, 4, 4]);
        let kernel = Tensor4::zeros([1, 1, 3, 3]);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        assert!(matches!(
            convolve_2x2(&x, &kernel, &mut res),
            Err(TensorOpsError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_convolve_input_too_small() {
        let x = Tensor4::zeros([1, 1, 1, 5]);
        let kernel = Tensor4::zeros([1, 1, 2, 2]);
        let mut res = Tensor4::zeros([1, 1, 0, 4]);
        assert_eq!(
            convolve_2x2(&x, &kernel, &mut res),
            Err(TensorOpsError::SpatialTooSmall {
                op: "convolve_2x2",
                height: 1,
                width: 5
            })
        );
    }

    #[test]
    fn test_convolve_wrong_result_shape() {
        let x = Tensor4::zeros([1, 1, 3, 3]);
        let kernel = Tensor4::zeros([2, 1, 2, 2]);
        let mut res = Tensor4::zeros([1, 1, 2, 2]);
        assert_eq!(
            convolve_2x2(&x, &kernel, &mut res),
            Err(TensorOpsError::ShapeMismatch {
                op: "convolve_2x2",
                lhs: [1, 2, 2, 2],
                rhs: [1, 1, 2, 2]
            })
        );
    }

    #[test]
    fn test_borrowed_result_buffer() -> Result<(), TensorOpsError> {
        let x = Tensor4::from_shape_val([1, 1, 2, 2], 2.0);
        let kernel = Tensor4::from_shape_val([1, 1, 2, 2], 0.5);
        let mut buf = [0.0f32; 1];
        let mut res = Tensor4::from_storage([1, 1, 1, 1], &mut buf[..])?;
        convolve_2x2(&x, &kernel, &mut res)?;
        assert_eq!(buf, [4.0]);
        Ok(())
    }

    /// Read-only storage over someone else's buffer, used to hand an op a result that aliases
    /// one of its inputs. Writing through it panics.
    struct AliasedStorage {
        ptr: *const f32,
        len: usize,
    }

    impl TensorStorage for AliasedStorage {
        fn as_slice(&self) -> &[f32] {
            // SAFETY: built from a live slice that outlives every use in these tests
            unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
        }
    }

    impl TensorStorageMut for AliasedStorage {
        fn as_mut_slice(&mut self) -> &mut [f32] {
            unreachable!("rejected calls never write")
        }
    }

    fn aliased(shape: [u8; 4], buf: &[f32]) -> Tensor4<AliasedStorage> {
        let storage = AliasedStorage {
            ptr: buf.as_ptr(),
            len: buf.len(),
        };
        Tensor4::from_storage(shape, storage).unwrap()
    }

    #[test]
    fn test_matmul_rejects_aliased_result() -> Result<(), TensorOpsError> {
        let buf = [1.0f32; 8];
        let m1 = Tensor4::from_storage([1, 1, 2, 2], &buf[..4])?;
        let m2 = Tensor4::from_storage([1, 1, 2, 2], &buf[4..])?;
        let mut res = aliased([1, 1, 2, 2], &buf[2..6]);
        assert_eq!(
            matmul(&m1, &m2, &mut res),
            Err(TensorOpsError::AliasingViolation { op: "matmul" })
        );
        Ok(())
    }

    #[test]
    fn test_add_bias_rejects_aliased_bias() -> Result<(), TensorOpsError> {
        let buf = [1.0f32; 4];
        let mut t = aliased([1, 1, 2, 2], &buf);
        let bias = Tensor4::from_storage([1, 1, 1, 1], &buf[3..])?;
        assert_eq!(
            add_bias(&mut t, &bias),
            Err(TensorOpsError::AliasingViolation { op: "add_bias" })
        );
        Ok(())
    }

    #[test]
    fn test_max_pool_rejects_aliased_result() -> Result<(), TensorOpsError> {
        let buf = [1.0f32; 16];
        let t = Tensor4::from_storage([1, 1, 4, 4], &buf[..])?;
        let mut res = aliased([1, 1, 2, 2], &buf[12..]);
        assert_eq!(
            max_pool(&t, &mut res),
            Err(TensorOpsError::AliasingViolation { op: "max_pool" })
        );
        Ok(())
    }

    #[test]
    fn test_convolve_rejects_aliased_result() -> Result<(), TensorOpsError> {
        let buf = [1.0f32; 13];
        let x = Tensor4::from_storage([1, 1, 3, 3], &buf[..9])?;
        let kernel = Tensor4::from_storage([1, 1, 2, 2], &buf[9..])?;
        let mut res = aliased([1, 1, 2, 2], &buf[8..12]);
        assert_eq!(
            convolve_2x2(&x, &kernel, &mut res),
            Err(TensorOpsError::AliasingViolation { op: "convolve_2x2" })
        );
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = TensorOpsError::AliasingViolation { op: "matmul" };
        assert_eq!(
            err.to_string(),
            "Result buffer of matmul overlaps an input buffer"
        );
    }

    #[cfg(feature = "gemm")]
    #[test]
    fn test_matmul_gemm_matches_matmul() -> Result<(), TensorOpsError> {
        use approx::assert_relative_eq;

        let m1 = Tensor4::from_shape_fn([1, 2, 3, 4], |[_, b, r, k]| {
            (b + r * k) as f32 * 0.1
        });
        let m2 = Tensor4::from_shape_fn([1, 2, 4, 2], |[_, b, k, c]| {
            (b * c + k) as f32 * 0.3
        });
        let mut naive = Tensor4::zeros([1, 2, 3, 2]);
        let mut gemm = Tensor4::zeros([1, 2, 3, 2]);
        matmul(&m1, &m2, &mut naive)?;
        matmul_gemm(&m1, &m2, &mut gemm)?;
        for (a, b) in naive.iter().zip(gemm.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
        Ok(())
    }
}
