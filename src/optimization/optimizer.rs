use crate::Result;

/// Defines the strategy for updating parameters based on calculated gradients.
///
/// The `Optimizer` is responsible for the transition of the parameters from step `t` to `t+1`,
/// every parameter is updated within the same call.
pub trait Optimizer {
    /// Updates the provided parameters using their gradient.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient of the loss with respect to `params`.
    ///
    /// # Returns
    /// An error if `params` and `grad` don't have the same length.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;
}
