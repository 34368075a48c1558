use std::num::NonZeroUsize;

use log::{error, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Result, SimErr,
    arch::Coefficients,
    config::SimulationConfig,
    optimization::{GradientDescent, GradientDescentWithMomentum, Optimizer},
    report::RunResult,
    sampling::generate_singular_value_data,
    training::{Objective, Trainer},
};

/// What remains after running every configuration of a sweep.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// The table row of every configuration that ran, in enumeration order.
    pub table: Vec<String>,
    /// The result of the last configuration that ran.
    pub last: Option<RunResult>,
    /// The amount of configurations that failed.
    pub failed: usize,
}

/// Runs the whole pipeline, sampling, fitting and reporting, for every `(n, m, T)` combination
/// of a `SimulationConfig`.
#[derive(Debug)]
pub struct Sweep {
    config: SimulationConfig,
    record_every: NonZeroUsize,
}

impl Sweep {
    /// Creates a new `Sweep`.
    ///
    /// # Returns
    /// An error if the configuration is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let record_every =
            NonZeroUsize::new(config.record_every).ok_or(SimErr::InvalidArgument {
                what: "record_every",
                got: config.record_every,
            })?;

        Ok(Self {
            config,
            record_every,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs every configuration in order with a generator seeded once from the configuration's
    /// seed, printing each configuration's report as it finishes.
    ///
    /// A failing configuration is logged and skipped.
    pub fn run(&self) -> SweepOutcome {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut outcome = SweepOutcome::default();

        for (rows, cols, iterations) in self.config.grid() {
            match self.run_configuration(rows, cols, iterations, &mut rng) {
                Ok(result) => {
                    outcome.table.push(result.table_row());
                    outcome.last = Some(result);
                }
                Err(e) => {
                    error!("configuration n={rows} m={cols} T={iterations} failed: {e}");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Samples a fresh dataset, fits the coefficients on it and measures the fitted coefficients
    /// at `iterations` recurrence steps.
    ///
    /// # Arguments
    /// * `rows` - The amount of rows `n` of the sampled matrices.
    /// * `cols` - The amount of columns `m` of the sampled matrices.
    /// * `iterations` - The recurrence depth `T` of the final loss.
    /// * `rng` - The generator the matrices are drawn from.
    pub fn run_configuration<R: Rng + ?Sized>(
        &self,
        rows: usize,
        cols: usize,
        iterations: usize,
        rng: &mut R,
    ) -> Result<RunResult> {
        let config = &self.config;

        println!("=== Newton-Schulz coefficient fit ===");
        println!("matrix dimensions: {rows} x {cols}");
        println!("iterations: {iterations}");
        println!();

        println!("step 1: sampling singular values...");
        let data = generate_singular_value_data(rows, cols, config.num_samples, rng)?;
        println!("dataset shape: [{}]", data.len());
        println!();

        let Coefficients { k, x1, x2 } = config.initial;
        println!("step 2: initial coefficients k={k}, x1={x1}, x2={x2}");
        println!();

        println!("step 3: optimizing...");
        let objective = Objective::newton_schulz(&data, config.train_iterations, config.target);
        let mut optimizer = self.optimizer();
        let trained = Trainer::new(config.num_steps, self.record_every).train(
            &objective,
            optimizer.as_mut(),
            config.initial,
        )?;
        info!(
            rows = rows, cols = cols, iterations = iterations;
            "optimization finished after {} steps", config.num_steps
        );

        let final_loss = Objective::newton_schulz(&data, iterations, config.target)
            .evaluate(&trained.params.to_array())?;

        let result = RunResult {
            rows,
            cols,
            iterations,
            params: trained.params,
            final_loss,
            loss_history: trained.loss_history,
        };

        if !result.converged() {
            warn!("n={rows} m={cols} T={iterations} diverged: final loss {final_loss}");
        }

        println!();
        println!("{result}");
        println!();
        println!("=== table row ===");
        println!("{}", result.table_row());
        println!();

        Ok(result)
    }

    fn optimizer(&self) -> Box<dyn Optimizer> {
        let SimulationConfig {
            learning_rate,
            momentum,
            ..
        } = self.config;

        if momentum == 0.0 {
            Box::new(GradientDescent::new(learning_rate))
        } else {
            Box::new(GradientDescentWithMomentum::new(
                Coefficients::LEN,
                learning_rate,
                momentum,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            rows: vec![4, 6],
            cols: vec![4],
            iterations: vec![3, 10],
            num_samples: 2,
            num_steps: 10,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn runs_every_configuration() {
        let outcome = Sweep::new(small_config()).unwrap().run();

        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.table.len(), 4);
        assert!(outcome.table[0].starts_with("4 & 4 & 3 & "));
        assert!(outcome.table[3].starts_with("6 & 4 & 10 & "));

        let last = outcome.last.unwrap();
        assert_eq!((last.rows, last.cols, last.iterations), (6, 4, 10));
        assert_eq!(last.loss_history.len(), 1);
    }

    #[test]
    fn same_seed_same_table() {
        let a = Sweep::new(small_config()).unwrap().run();
        let b = Sweep::new(small_config()).unwrap().run();
        assert_eq!(a.table, b.table);
    }

    #[test]
    fn zero_momentum_uses_plain_descent() {
        let config = SimulationConfig {
            momentum: 0.0,
            ..small_config()
        };
        let sweep = Sweep::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let result = sweep.run_configuration(4, 4, 5, &mut rng).unwrap();
        assert!(result.params.is_finite());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = SimulationConfig {
            num_samples: 0,
            ..small_config()
        };
        assert!(Sweep::new(config).is_err());
    }

    #[test]
    fn zero_rows_fail_the_configuration() {
        let sweep = Sweep::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let err = sweep.run_configuration(0, 4, 5, &mut rng).unwrap_err();
        assert!(matches!(err, SimErr::InvalidArgument { what: "rows", .. }));
    }
}
