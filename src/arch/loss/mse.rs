use ndarray::{Array1, ArrayView1};

use super::LossFn;

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView1<f32>, target: f32) -> f32 {
        if y_pred.is_empty() {
            return 0.0;
        }

        let sum = y_pred.fold(0.0f64, |acc, &y| acc + f64::from(y - target).powi(2));
        (sum / y_pred.len() as f64) as f32
    }

    fn loss_prime(&self, y_pred: ArrayView1<f32>, target: f32) -> Array1<f32> {
        let scale = 2.0 / y_pred.len() as f32;
        y_pred.mapv(|y| (y - target) * scale)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn loss_at_target_is_zero() {
        let y = array![1.0, 1.0, 1.0];
        assert_eq!(Mse.loss(y.view(), 1.0), 0.0);
    }

    #[test]
    fn loss_is_mean_of_squares() {
        let y = array![0.0, 2.0, 3.0, 1.0];
        assert_eq!(Mse::new().loss(y.view(), 1.0), 1.5);
    }

    #[test]
    fn loss_prime_scales_by_len() {
        let y = array![0.0, 2.0];
        assert_eq!(Mse.loss_prime(y.view(), 1.0), array![-1.0f32, 1.0]);
    }

    #[test]
    fn nan_propagates() {
        let y = array![0.5, f32::NAN];
        assert!(Mse.loss(y.view(), 1.0).is_nan());
    }
}
