mod history;
mod objective;
mod trainer;

pub use history::LossHistory;
pub use objective::{Objective, evaluate};
pub use trainer::{TrainOutcome, Trainer, optimize};
