use ndarray::{Array1, ArrayView1};

/// Measures how far a model's outputs are from a constant target value.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView1<f32>, target: f32) -> f32;

    /// The derivative of `loss` with respect to each element of `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView1<f32>, target: f32) -> Array1<f32>;
}
