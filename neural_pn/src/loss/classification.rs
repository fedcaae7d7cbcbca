//! Per-point classification metrics.

use burn::prelude::*;

/// Fraction of rows whose arg-max column equals the target class.
///
/// Inputs:
/// - logits: [num_points, num_classes]
/// - targets: [num_points] class ids
///
/// Output: scalar in [0, 1]
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let [num_points, _] = logits.dims();
    assert_eq!(targets.dims(), [num_points], "one target per row expected");

    let predicted = logits.argmax(1).reshape([num_points]);
    predicted.equal(targets).float().mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_accuracy() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            [[2.0f32, 0.0], [0.0, 1.0], [3.0, -1.0], [0.5, 0.1]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data([0i64, 1, 1, 0], &device);

        let value: f32 = accuracy(logits, targets).into_scalar();
        assert!((value - 0.75).abs() < 1e-6, "Expected 0.75, got {}", value);
    }

    #[test]
    fn test_perfect_accuracy() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data([[0.0f32, 5.0], [0.0, 5.0]], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_data([1i64, 1], &device);

        let value: f32 = accuracy(logits, targets).into_scalar();
        assert!((value - 1.0).abs() < 1e-6);
    }
}
