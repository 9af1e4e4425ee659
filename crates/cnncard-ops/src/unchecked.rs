//! Each function forwards straight to its kernel without validating shapes or aliasing.
//! Violated preconditions are caller bugs: debug builds catch most of them with assertions,
//! release builds give an unspecified result or a slice-index panic.

use cnncard_kernels::{
    add_bias_kernel, convolve_2x2_kernel, matmul_kernel, max_pool_2x2_kernel, relu_kernel,
    softmax_kernel,
};
use cnncard_tensor::{Tensor4, TensorStorage, TensorStorageMut};

/// Batched matrix product `res = m1 @ m2` over the trailing two axes.
///
/// Requires `m1 = (b0, b1, m, k)`, `m2 = (b0, b1, k, n)` and `res = (b0, b1, m, n)`.
pub fn matmul<A, B, R>(m1: &Tensor4<A>, m2: &Tensor4<B>, res: &mut Tensor4<R>)
where
    A: TensorStorage,
    B: TensorStorage,
    R: TensorStorageMut,
{
    matmul_kernel(
        m1.as_slice(),
        m1.dims(),
        m2.as_slice(),
        m2.dims(),
        res.as_slice_mut(),
    );
}

/// Batched matrix product through `matrixmultiply::sgemm`. Not bit-exact with [`matmul`].
#[cfg(feature = "gemm")]
pub fn matmul_gemm<A, B, R>(m1: &Tensor4<A>, m2: &Tensor4<B>, res: &mut Tensor4<R>)
where
    A: TensorStorage,
    B: TensorStorage,
    R: TensorStorageMut,
{
    cnncard_kernels::matmul_gemm_kernel(
        m1.as_slice(),
        m1.dims(),
        m2.as_slice(),
        m2.dims(),
        res.as_slice_mut(),
    );
}

/// Adds `bias[0, c, 0, 0]` to every element of channel `c` of `t`.
///
/// Requires `bias = (1, t.s1, 1, 1)`.
pub fn add_bias<S, B>(t: &mut Tensor4<S>, bias: &Tensor4<B>)
where
    S: TensorStorageMut,
    B: TensorStorage,
{
    let dims = t.dims();
    add_bias_kernel(t.as_slice_mut(), dims, bias.as_slice());
}

/// Replaces every element `x` of `t` with `max(0, x)`.
pub fn relu<S: TensorStorageMut>(t: &mut Tensor4<S>) {
    relu_kernel(t.as_slice_mut());
}

/// Normalizes `t` with softmax along axis 3, independently for every `(i0, i1, i2)`.
pub fn softmax<S: TensorStorageMut>(t: &mut Tensor4<S>) {
    let group_len = t.dims()[3];
    softmax_kernel(t.as_slice_mut(), group_len);
}

/// 2x2 max pooling of `t` into `res`.
///
/// Requires `res = (s0, s1, s2 / 2, s3 / 2)`.
pub fn max_pool<S, R>(t: &Tensor4<S>, res: &mut Tensor4<R>)
where
    S: TensorStorage,
    R: TensorStorageMut,
{
    max_pool_2x2_kernel(t.as_slice(), t.dims(), res.as_slice_mut());
}

/// 2x2 valid convolution of `x` with `kernel` into `res`.
///
/// Requires `x = (n, ci, h, w)` with `h, w >= 2`, `kernel = (co, ci, 2, 2)` and
/// `res = (n, co, h - 1, w - 1)`.
pub fn convolve_2x2<X, K, R>(x: &Tensor4<X>, kernel: &Tensor4<K>, res: &mut Tensor4<R>)
where
    X: TensorStorage,
    K: TensorStorage,
    R: TensorStorageMut,
{
    convolve_2x2_kernel(
        x.as_slice(),
        x.dims(),
        kernel.as_slice(),
        kernel.dims(),
        res.as_slice_mut(),
    );
}
