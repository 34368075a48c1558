use std::num::NonZeroUsize;

use log::debug;

use super::{LossHistory, Objective};
use crate::{
    Result, SimErr,
    arch::{Coefficients, Model, loss::LossFn},
    dataset::Dataset,
    optimization::{GradientDescentWithMomentum, Optimizer},
    progress::Progress,
};

/// Recurrence depth used while training.
pub const TRAIN_ITERATIONS: usize = 5;

/// Steps between two recorded losses.
pub const RECORD_EVERY: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// The state reached after a training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub params: Coefficients,
    pub loss_history: LossHistory,
}

/// Runs a fixed amount of optimization steps, there is no early stopping.
#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    num_steps: usize,
    record_every: NonZeroUsize,
}

impl Trainer {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `num_steps` - The amount of optimization steps to run.
    /// * `record_every` - The amount of steps between two recorded losses.
    pub fn new(num_steps: usize, record_every: NonZeroUsize) -> Self {
        Self {
            num_steps,
            record_every,
        }
    }

    /// Minimizes `objective` starting from `initial`.
    ///
    /// Each step evaluates the loss and its gradient at the current coefficients and lets the
    /// optimizer update all of them at once. The loss of every `record_every`-th step, starting
    /// at step 0, is recorded before the update. When no step is run the history holds the loss
    /// at `initial` only.
    ///
    /// Diverging coefficients are not an error, the non finite values are kept as they are.
    ///
    /// # Arguments
    /// * `objective` - The function to minimize.
    /// * `optimizer` - A fresh optimizer, its state is carried along the steps.
    /// * `initial` - The starting coefficients.
    ///
    /// # Returns
    /// The final coefficients and the loss history, or an error if the objective's model or the
    /// optimizer don't take exactly three parameters.
    pub fn train<M, L, O>(
        &self,
        objective: &Objective<'_, M, L>,
        optimizer: &mut O,
        initial: Coefficients,
    ) -> Result<TrainOutcome>
    where
        M: Model,
        L: LossFn,
        O: Optimizer + ?Sized,
    {
        let size = objective.model().size();
        if size != Coefficients::LEN {
            return Err(SimErr::SizeMismatch {
                a: "model",
                b: "coefficients",
                got: size,
                expected: Coefficients::LEN,
            });
        }

        let every = self.record_every.get();
        let mut params = initial.to_array();
        let mut grad = [0.0; Coefficients::LEN];
        let mut loss_history = LossHistory::new(self.record_every);
        let mut progress = Progress::new("optimizing", self.num_steps);

        for step in 0..self.num_steps {
            let loss = objective.evaluate_with_grad(&params, &mut grad)?;
            optimizer.update_params(&mut params, &grad)?;
            progress.advance(1);

            if step % every == 0 {
                debug!(step = step, loss = loss; "loss recorded");
                loss_history.push(loss);
            }
        }

        if self.num_steps == 0 {
            loss_history.push(objective.evaluate(&params)?);
        }

        let [k, x1, x2] = params;
        Ok(TrainOutcome {
            params: Coefficients::new(k, x1, x2),
            loss_history,
        })
    }
}

/// Fits the recurrence's coefficients to `data` with momentum gradient descent, training on
/// the default depth of five steps and recording the loss every thousand steps.
///
/// # Arguments
/// * `initial` - The starting coefficients.
/// * `data` - The normalized singular values.
/// * `learning_rate` - The optimizer's learning rate.
/// * `momentum` - The optimizer's momentum.
/// * `num_steps` - The amount of optimization steps.
pub fn optimize(
    initial: Coefficients,
    data: &Dataset,
    learning_rate: f32,
    momentum: f32,
    num_steps: usize,
) -> Result<TrainOutcome> {
    let objective = Objective::newton_schulz(data, TRAIN_ITERATIONS, 1.0);
    let mut optimizer =
        GradientDescentWithMomentum::new(Coefficients::LEN, learning_rate, momentum);
    Trainer::new(num_steps, RECORD_EVERY).train(&objective, &mut optimizer, initial)
}
