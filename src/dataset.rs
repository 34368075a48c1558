use ndarray::{Array1, ArrayView1};

use crate::{Result, SimErr};

/// The flat collection of normalized singular values of every sampled matrix.
///
/// The values are stored spectrum after spectrum, each spectrum holding `spectrum_len` values.
/// Once built the dataset is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    values: Array1<f32>,
    spectrum_len: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `values` - The concatenated spectra.
    /// * `spectrum_len` - The length of each individual spectrum.
    ///
    /// # Returns
    /// An error if `spectrum_len` is zero or doesn't evenly divide the amount of values.
    pub fn new(values: Array1<f32>, spectrum_len: usize) -> Result<Self> {
        if spectrum_len == 0 {
            return Err(SimErr::InvalidArgument {
                what: "spectrum_len",
                got: spectrum_len,
            });
        }

        if values.len() % spectrum_len != 0 {
            return Err(SimErr::SizeMismatch {
                a: "values",
                b: "spectrum_len",
                got: values.len() % spectrum_len,
                expected: 0,
            });
        }

        Ok(Self {
            values,
            spectrum_len,
        })
    }

    /// Returns the total amount of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn spectrum_len(&self) -> usize {
        self.spectrum_len
    }

    /// Returns the amount of spectra, that is, the amount of sampled matrices.
    pub fn num_spectra(&self) -> usize {
        self.values.len() / self.spectrum_len
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }

    /// Iterates over the spectra of each sampled matrix in sampling order.
    pub fn spectra(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> {
        self.values.exact_chunks(self.spectrum_len).into_iter()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn splits_into_spectra() {
        let dataset = Dataset::new(array![0.6, 0.8, 1.0, 0.0], 2).unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.num_spectra(), 2);

        let spectra: Vec<_> = dataset.spectra().collect();
        assert_eq!(spectra[0], array![0.6f32, 0.8]);
        assert_eq!(spectra[1], array![1.0f32, 0.0]);
    }

    #[test]
    fn rejects_ragged_values() {
        let err = Dataset::new(array![0.6, 0.8, 1.0], 2).unwrap_err();
        assert!(matches!(err, SimErr::SizeMismatch { .. }));
    }

    #[test]
    fn rejects_empty_spectra() {
        let err = Dataset::new(Array1::zeros(0), 0).unwrap_err();
        assert!(matches!(err, SimErr::InvalidArgument { .. }));
    }
}
