mod singular_values;

pub use singular_values::{SpectrumSampler, generate_singular_value_data, singular_values};
