use ndarray::ArrayView1;

use crate::{
    Result,
    arch::{Coefficients, Model, NewtonSchulz, loss::LossFn, loss::Mse},
    dataset::Dataset,
};

/// The loss of a model's outputs over a fixed dataset, as a function of the model's parameters.
pub struct Objective<'d, M: Model, L: LossFn> {
    model: M,
    loss_fn: L,
    data: ArrayView1<'d, f32>,
    target: f32,
}

impl<'d> Objective<'d, NewtonSchulz, Mse> {
    /// The mean squared distance to `target` of the dataset after `iterations` steps of the
    /// recurrence.
    pub fn newton_schulz(data: &'d Dataset, iterations: usize, target: f32) -> Self {
        Self::new(NewtonSchulz::new(iterations), Mse::new(), data.view(), target)
    }
}

impl<'d, M: Model, L: LossFn> Objective<'d, M, L> {
    /// Creates a new `Objective`.
    ///
    /// # Arguments
    /// * `model` - The model mapping the data.
    /// * `loss_fn` - The loss function comparing the model's outputs to `target`.
    /// * `data` - The model's inputs, never modified.
    /// * `target` - The value every output should be mapped to.
    pub fn new(model: M, loss_fn: L, data: ArrayView1<'d, f32>, target: f32) -> Self {
        Self {
            model,
            loss_fn,
            data,
            target,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Evaluates the loss at `params`.
    pub fn evaluate(&self, params: &[f32]) -> Result<f32> {
        let y_pred = self.model.forward(params, self.data)?;
        Ok(self.loss_fn.loss(y_pred.view(), self.target))
    }

    /// Evaluates the loss at `params` and overwrites `grad` with its gradient.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - A buffer of the model's size for writing the gradient.
    ///
    /// # Returns
    /// The loss or an error if the buffers don't match the model's size.
    pub fn evaluate_with_grad(&self, params: &[f32], grad: &mut [f32]) -> Result<f32> {
        let y_pred = self.model.forward(params, self.data)?;
        let loss = self.loss_fn.loss(y_pred.view(), self.target);
        let d = self.loss_fn.loss_prime(y_pred.view(), self.target);

        grad.fill(0.0);
        self.model.backward(params, self.data, d.view(), grad)?;
        Ok(loss)
    }
}

/// Returns the mean of `(v − 1)²` over the dataset after `iterations` steps of the recurrence.
pub fn evaluate(coeffs: Coefficients, data: &Dataset, iterations: usize) -> Result<f32> {
    Objective::newton_schulz(data, iterations, 1.0).evaluate(&coeffs.to_array())
}
