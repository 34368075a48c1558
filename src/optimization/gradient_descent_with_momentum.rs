use super::Optimizer;
use crate::{Result, SimErr};

/// Gradient descent with momentum: `v ← μ·v + g`, `p ← p − lr·v`.
#[derive(Debug)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Box<[f32]>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer with a zeroed velocity.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The decay of the accumulated velocity.
    pub fn new(len: usize, learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: vec![0.; len].into_boxed_slice(),
        }
    }

    /// Returns the accumulated velocity, one value per parameter.
    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        for (a, got) in [("grad", grad.len()), ("velocity", self.velocity.len())] {
            if got != params.len() {
                return Err(SimErr::SizeMismatch {
                    a,
                    b: "params",
                    got,
                    expected: params.len(),
                });
            }
        }

        let lr = self.learning_rate;
        let mu = self.momentum;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = (mu * *v) + g;
                *p -= lr * *v;
            });

        Ok(())
    }
}
