use approx::assert_relative_eq;
use cnncard_ops::{add_bias, convolve_2x2, matmul, max_pool, relu, softmax, TensorOpsError};
use cnncard_tensor::{OwnedTensor4, Tensor4};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_tensor(rng: &mut StdRng, shape: [u8; 4]) -> OwnedTensor4 {
    Tensor4::from_shape_fn(shape, |_| rng.random_range(-1.0..1.0))
}

#[test]
fn lenet_style_forward_pass() -> Result<(), TensorOpsError> {
    init_logger();
    let mut rng = StdRng::seed_from_u64(7);

    let image = random_tensor(&mut rng, [1, 1, 9, 9]);
    let conv_weights = random_tensor(&mut rng, [4, 1, 2, 2]);
    let conv_bias = random_tensor(&mut rng, [1, 4, 1, 1]);
    let dense_weights = random_tensor(&mut rng, [1, 1, 64, 10]);
    let dense_bias = random_tensor(&mut rng, [1, 10, 1, 1]);

    let mut features = Tensor4::zeros([1, 4, 8, 8]);
    convolve_2x2(&image, &conv_weights, &mut features)?;
    add_bias(&mut features, &conv_bias)?;
    relu(&mut features);
    assert!(features.iter().all(|&v| v >= 0.0));

    let mut pooled = Tensor4::zeros([1, 4, 4, 4]);
    max_pool(&features, &mut pooled)?;

    let flat = pooled.reshape([1, 1, 1, 64])?;
    let mut logits = Tensor4::zeros([1, 1, 1, 10]);
    matmul(&flat, &dense_weights, &mut logits)?;

    // bias is per channel, so move the classes onto axis 1 and back
    let mut logits = logits.reshape([1, 10, 1, 1])?;
    add_bias(&mut logits, &dense_bias)?;
    let mut probs = logits.reshape([1, 1, 1, 10])?;
    softmax(&mut probs);

    assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    assert_relative_eq!(probs.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    Ok(())
}

#[test]
fn forward_pass_is_deterministic() -> Result<(), TensorOpsError> {
    init_logger();
    let mut rng = StdRng::seed_from_u64(11);
    let image = random_tensor(&mut rng, [2, 3, 6, 7]);
    let weights = random_tensor(&mut rng, [5, 3, 2, 2]);

    let run = || -> Result<OwnedTensor4, TensorOpsError> {
        let mut features = Tensor4::zeros([2, 5, 5, 6]);
        convolve_2x2(&image, &weights, &mut features)?;
        relu(&mut features);
        let mut pooled = Tensor4::zeros([2, 5, 2, 3]);
        max_pool(&features, &mut pooled)?;
        softmax(&mut pooled);
        Ok(pooled)
    };

    let first = run()?;
    let second = run()?;
    assert_eq!(
        first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
        second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn set_then_get_round_trips() {
    let mut rng = StdRng::seed_from_u64(3);
    let shape = [3, 4, 5, 6];
    let mut t = Tensor4::zeros(shape);

    for _ in 0..200 {
        let index = shape.map(|s| rng.random_range(0..s as usize));
        let value: f32 = rng.random_range(-100.0..100.0);
        t.set(index, value).unwrap();
        assert_eq!(t.get(index), Some(value));
    }
}

#[test]
fn relu_is_non_negative_and_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut t = random_tensor(&mut rng, [2, 3, 4, 5]);

    relu(&mut t);
    assert!(t.iter().all(|&v| v >= 0.0));

    let once = t.clone();
    relu(&mut t);
    assert_eq!(t, once);
}

#[test]
fn softmax_rows_are_distributions() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut t = Tensor4::from_shape_fn([2, 2, 3, 7], |_| rng.random_range(-20.0..20.0));
    softmax(&mut t);

    for row in t.as_slice().chunks_exact(7) {
        assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert_relative_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn max_pool_dominates_its_window() -> Result<(), TensorOpsError> {
    let mut rng = StdRng::seed_from_u64(13);
    let t = random_tensor(&mut rng, [2, 2, 7, 6]);
    let mut res = Tensor4::zeros([2, 2, 3, 3]);
    max_pool(&t, &mut res)?;

    for offset in 0..res.numel() {
        let [b, c, r, col] = res.index_of(offset)?;
        let pooled = res.as_slice()[offset];
        let window = [(0, 0), (0, 1), (1, 0), (1, 1)].map(|(dr, dc)| {
            t.get([b, c, 2 * r + dr, 2 * col + dc]).unwrap_or(f32::NAN)
        });
        assert!(window.iter().all(|&v| pooled >= v));
        assert!(window.contains(&pooled));
    }
    Ok(())
}

#[test]
fn matmul_with_identity_is_exact() -> Result<(), TensorOpsError> {
    let mut rng = StdRng::seed_from_u64(17);
    let m1 = random_tensor(&mut rng, [2, 3, 4, 5]);
    let identity = Tensor4::from_shape_fn([2, 3, 5, 5], |[_, _, r, c]| {
        if r == c { 1.0 } else { 0.0 }
    });

    let mut res = Tensor4::zeros([2, 3, 4, 5]);
    matmul(&m1, &identity, &mut res)?;
    assert_eq!(res, m1);
    Ok(())
}

#[test]
fn rejected_call_leaves_result_untouched() {
    init_logger();
    let x = Tensor4::from_shape_val([1, 2, 4, 4], 1.0);
    let kernel = Tensor4::from_shape_val([3, 1, 2, 2], 1.0);
    let mut res = Tensor4::from_shape_val([1, 3, 3, 3], -1.0);

    let err = convolve_2x2(&x, &kernel, &mut res);
    assert!(matches!(
        err,
        Err(TensorOpsError::ShapeMismatch {
            op: "convolve_2x2",
            ..
        })
    ));
    assert!(res.iter().all(|&v| v == -1.0));
}
