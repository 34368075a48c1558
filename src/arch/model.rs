use ndarray::{Array1, ArrayView1};

use crate::Result;

/// A pure elementwise computational model.
///
/// A `Model` defines how to evaluate a function of its parameters and how to accumulate the
/// gradient of those parameters. It does not own the parameters, the data or the training loop.
pub trait Model {
    /// Returns the amount of scalar parameters expected in `params` and `grad`.
    fn size(&self) -> usize;

    /// Computes the model output for the given input.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data.
    ///
    /// # Returns
    /// An output of the same length as `x` or an error if `params` has the wrong length.
    fn forward(&self, params: &[f32], x: ArrayView1<f32>) -> Result<Array1<f32>>;

    /// Accumulates into `grad` the gradient of the loss with respect to the parameters.
    ///
    /// Implementations must add to `grad` rather than overwrite it.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data the forward pass was computed on.
    /// * `d` - The derivative of the loss with respect to each output.
    /// * `grad` - The gradient buffer.
    fn backward(
        &self,
        params: &[f32],
        x: ArrayView1<f32>,
        d: ArrayView1<f32>,
        grad: &mut [f32],
    ) -> Result<()>;
}
