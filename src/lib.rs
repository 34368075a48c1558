//! Fits the coefficients of a fixed depth Newton-Schulz style recurrence to the empirical
//! distribution of normalized singular values of random gaussian matrices.

pub mod arch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod optimization;
pub mod plot;
mod progress;
pub mod report;
pub mod sampling;
pub mod sweep;
pub mod training;

pub use error::{Result, SimErr};
