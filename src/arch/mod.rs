pub mod loss;
mod model;
mod newton_schulz;

pub use model::Model;
pub use newton_schulz::{Coefficients, NewtonSchulz, Quintic};
