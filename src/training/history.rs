use std::num::NonZeroUsize;

/// The losses recorded every `every` optimization steps, in step order.
#[derive(Debug, Clone, PartialEq)]
pub struct LossHistory {
    every: NonZeroUsize,
    losses: Vec<f32>,
}

impl LossHistory {
    /// Creates an empty `LossHistory`.
    ///
    /// # Arguments
    /// * `every` - The amount of steps between two recorded losses.
    pub fn new(every: NonZeroUsize) -> Self {
        Self {
            every,
            losses: Vec::new(),
        }
    }

    pub fn push(&mut self, loss: f32) {
        self.losses.push(loss);
    }

    pub fn len(&self) -> usize {
        self.losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    pub fn losses(&self) -> &[f32] {
        &self.losses
    }

    pub fn last(&self) -> Option<f32> {
        self.losses.last().copied()
    }

    /// Iterates over `(step, loss)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        let every = self.every.get();
        self.losses
            .iter()
            .enumerate()
            .map(move |(i, &loss)| (i * every, loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_are_spaced_by_every() {
        let mut history = LossHistory::new(NonZeroUsize::new(1000).unwrap());
        history.push(0.5);
        history.push(0.25);

        let points: Vec<_> = history.points().collect();
        assert_eq!(points, [(0, 0.5), (1000, 0.25)]);
        assert_eq!(history.last(), Some(0.25));
    }
}
