use std::fmt::{self, Display};

use crate::{
    arch::{Coefficients, Quintic},
    training::LossHistory,
};

/// The outcome of fitting the coefficients for a single `(n, m, T)` configuration.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub rows: usize,
    pub cols: usize,
    /// The recurrence depth `final_loss` was measured at.
    pub iterations: usize,
    pub params: Coefficients,
    pub final_loss: f32,
    pub loss_history: LossHistory,
}

impl RunResult {
    pub fn quintic(&self) -> Quintic {
        self.params.quintic()
    }

    /// Whether both the coefficients and the final loss are finite.
    pub fn converged(&self) -> bool {
        self.params.is_finite() && self.final_loss.is_finite()
    }

    /// Formats the result as a single row of a LaTeX style table:
    /// `n & m & T & k & x1 & x2 & a & b & c & loss`.
    pub fn table_row(&self) -> String {
        let Coefficients { k, x1, x2 } = self.params;
        let Quintic { a, b, c } = self.quintic();

        format!(
            "{} & {} & {} & {k:.3} & {x1:.3} & {x2:.3} & {a:.3} & {b:.3} & {c:.3} & {:.5}",
            self.rows, self.cols, self.iterations, self.final_loss
        )
    }
}

impl Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Coefficients { k, x1, x2 } = self.params;
        let Quintic { a, b, c } = self.quintic();

        writeln!(f, "=== results ===")?;
        writeln!(f, "optimized coefficients:")?;
        writeln!(f, "  k  = {k:.6}")?;
        writeln!(f, "  x1 = {x1:.6}")?;
        writeln!(f, "  x2 = {x2:.6}")?;
        writeln!(f)?;
        writeln!(f, "quintic a·v + b·v³ + c·v⁵:")?;
        writeln!(f, "  a = {a:.6}")?;
        writeln!(f, "  b = {b:.6}")?;
        writeln!(f, "  c = {c:.6}")?;
        write!(
            f,
            "  final loss (T = {}) = {:.8}",
            self.iterations, self.final_loss
        )
    }
}
