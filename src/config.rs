use std::{env, path::PathBuf};

use serde::Deserialize;

use crate::{Result, SimErr, arch::Coefficients};

/// Environment variable holding an inline JSON object with configuration overrides.
pub const CONFIG_ENV: &str = "NS_CONFIG";

/// Hyperparameters and sweep grid of a simulation.
///
/// Every field has a default, so an override only needs to name the fields it changes, e.g.
/// `NS_CONFIG='{"rows": [64], "cols": [64], "num_steps": 2000}'`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Row counts `n` of the sampled matrices.
    pub rows: Vec<usize>,
    /// Column counts `m` of the sampled matrices.
    pub cols: Vec<usize>,
    /// Recurrence depths `T` the converged coefficients are evaluated at.
    pub iterations: Vec<usize>,
    /// Amount of matrices sampled per configuration.
    pub num_samples: usize,
    pub learning_rate: f32,
    pub momentum: f32,
    pub num_steps: usize,
    /// Recurrence depth used while training.
    pub train_iterations: usize,
    /// The loss is recorded once every `record_every` steps.
    pub record_every: usize,
    pub seed: u64,
    pub initial: Coefficients,
    /// The value every singular value should be mapped to.
    pub target: f32,
    pub plot_path: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        const SIZES: [usize; 4] = [1024, 2048, 4096, 8192];

        Self {
            rows: SIZES.to_vec(),
            cols: SIZES.to_vec(),
            iterations: vec![3, 5, 10],
            num_samples: 1000,
            learning_rate: 0.01,
            momentum: 0.9,
            num_steps: 100_000,
            train_iterations: 5,
            record_every: 1000,
            seed: 42,
            initial: Coefficients::new(1.0, 0.9, 1.1),
            target: 1.0,
            plot_path: PathBuf::from("loss_curve.svg"),
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration from a JSON object, missing fields take their default value.
    ///
    /// # Arguments
    /// * `json` - The JSON text.
    ///
    /// # Returns
    /// The validated configuration or an error if the text is not valid JSON or the values are
    /// rejected by `validate`.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from the `NS_CONFIG` environment variable, falling back to the
    /// defaults when it is unset or blank.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(json) if !json.trim().is_empty() => Self::from_json(&json),
            _ => Ok(Self::default()),
        }
    }

    /// Checks that the configuration describes at least one runnable configuration.
    pub fn validate(&self) -> Result<()> {
        let grids = [
            ("rows", &self.rows),
            ("cols", &self.cols),
            ("iterations", &self.iterations),
        ];

        for (name, grid) in grids {
            if grid.is_empty() {
                return Err(SimErr::InvalidConfig(format!("{name} must not be empty")));
            }
        }

        for (name, grid) in [("rows", &self.rows), ("cols", &self.cols)] {
            if grid.contains(&0) {
                return Err(SimErr::InvalidConfig(format!(
                    "{name} must only contain positive sizes"
                )));
            }
        }

        if self.num_samples == 0 {
            return Err(SimErr::InvalidConfig("num_samples must be positive".into()));
        }

        if self.record_every == 0 {
            return Err(SimErr::InvalidConfig("record_every must be positive".into()));
        }

        Ok(())
    }

    /// Enumerates every `(n, m, T)` combination, `n` varying slowest and `T` fastest.
    pub fn grid(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.rows.iter().flat_map(move |&n| {
            self.cols
                .iter()
                .flat_map(move |&m| self.iterations.iter().map(move |&t| (n, m, t)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_span_the_full_grid() {
        let config = SimulationConfig::default();
        let grid: Vec<_> = config.grid().collect();

        assert_eq!(grid.len(), 48);
        assert_eq!(grid[0], (1024, 1024, 3));
        assert_eq!(grid[1], (1024, 1024, 5));
        assert_eq!(grid[3], (1024, 2048, 3));
        assert_eq!(grid[47], (8192, 8192, 10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config = SimulationConfig::from_json(r#"{"rows": [4], "num_steps": 10}"#).unwrap();

        assert_eq!(config.rows, [4]);
        assert_eq!(config.num_steps, 10);
        assert_eq!(config.cols, SimulationConfig::default().cols);
        assert_eq!(config.initial, Coefficients::new(1.0, 0.9, 1.1));
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn initial_coefficients_override() {
        let json = r#"{"initial": {"k": 0.5, "x1": 0.8, "x2": 1.2}}"#;
        let config = SimulationConfig::from_json(json).unwrap();

        assert_eq!(config.initial, Coefficients::new(0.5, 0.8, 1.2));
    }

    #[test]
    fn rejects_zero_sizes() {
        let err = SimulationConfig::from_json(r#"{"cols": [4, 0]}"#).unwrap_err();
        assert!(matches!(err, SimErr::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_grid() {
        let err = SimulationConfig::from_json(r#"{"iterations": []}"#).unwrap_err();
        assert!(matches!(err, SimErr::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = SimulationConfig::from_json(r#"{"epochs": 3}"#).unwrap_err();
        assert!(matches!(err, SimErr::ConfigParse(_)));
    }
}
