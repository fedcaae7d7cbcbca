//! Orthogonality regularization for learned transforms.

use burn::prelude::*;

/// Build a `k x k` identity matrix.
pub fn identity<B: Backend>(k: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut values = vec![0.0f32; k * k];
    for i in 0..k {
        values[i * k + i] = 1.0;
    }
    Tensor::from_data(TensorData::new(values, [k, k]), device)
}

/// Orthogonality loss of a batch of transform matrices.
///
/// L = Σ_batch ‖T·Tᵀ − I‖²_F / 2
///
/// Zero exactly when every matrix in the batch is orthogonal. The halving
/// matches the usual `l2_loss` convention.
///
/// Input: t of shape [batch, k, k]
/// Output: scalar loss
///
/// # Panics
/// If the matrices are not square.
pub fn calc_trans_loss<B: Backend>(t: Tensor<B, 3>) -> Tensor<B, 1> {
    let [batch, k1, k2] = t.dims();
    assert_eq!(k1, k2, "transform matrices must be square, got {}x{}", k1, k2);

    let eye = identity::<B>(k1, &t.device())
        .reshape([1, k1, k1])
        .repeat_dim(0, batch);

    let gram = t.clone().matmul(t.swap_dims(1, 2));
    let diff = gram - eye;

    (diff.clone() * diff).sum() * 0.5
}
