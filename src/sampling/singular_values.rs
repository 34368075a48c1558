use std::mem;

use log::info;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2};
use ndarray_rand::{RandomExt, rand_distr::StandardNormal};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::{Result, SimErr, dataset::Dataset, progress::Progress};

/// Bytes of matrix entries allowed to be alive at once across the parallel draws.
const SAMPLING_MEMORY_BUDGET: usize = 1 << 30;

/// Samples the normalized singular value spectrum of random gaussian matrices.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumSampler {
    rows: usize,
    cols: usize,
}

impl SpectrumSampler {
    /// Creates a new `SpectrumSampler`.
    ///
    /// # Arguments
    /// * `rows` - The amount of rows of the sampled matrices.
    /// * `cols` - The amount of columns of the sampled matrices.
    ///
    /// # Returns
    /// An error if any of the dimensions is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 {
            return Err(SimErr::InvalidArgument {
                what: "rows",
                got: rows,
            });
        }

        if cols == 0 {
            return Err(SimErr::InvalidArgument {
                what: "cols",
                got: cols,
            });
        }

        Ok(Self { rows, cols })
    }

    /// Returns the length of every sampled spectrum, `min(rows, cols)`.
    pub fn spectrum_len(&self) -> usize {
        self.rows.min(self.cols)
    }

    /// Draws a matrix with i.i.d. standard normal entries and returns its singular values scaled
    /// to unit L2 norm.
    ///
    /// # Arguments
    /// * `rng` - The random number generator the entries are drawn from.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Array1<f32>> {
        let matrix = Array2::<f32>::random_using((self.rows, self.cols), StandardNormal, rng);

        // A freshly drawn matrix is row major with no offset. Read column by column its buffer is
        // the transpose, which has the same singular values, so it is moved instead of copied.
        let (entries, _) = matrix.into_raw_vec_and_offset();
        let transposed = DMatrix::from_vec(self.cols, self.rows, entries);

        let spectrum = decompose(transposed, self.rows, self.cols)?;
        Ok(normalize(spectrum))
    }

    /// Returns how many matrices may be drawn at once without exceeding the memory budget.
    fn parallel_width(&self) -> usize {
        let matrix_bytes = self.rows * self.cols * mem::size_of::<f32>();
        (SAMPLING_MEMORY_BUDGET / matrix_bytes).max(1)
    }
}

/// Computes the singular values of `matrix`, in descending order.
pub fn singular_values(matrix: ArrayView2<f32>) -> Result<Array1<f32>> {
    let (rows, cols) = matrix.dim();

    // nalgebra stores column by column, iterating the transpose yields exactly that order.
    let matrix = DMatrix::from_iterator(rows, cols, matrix.t().iter().copied());
    decompose(matrix, rows, cols)
}

fn decompose(matrix: DMatrix<f32>, rows: usize, cols: usize) -> Result<Array1<f32>> {
    let svd = matrix
        .try_svd(false, false, f32::EPSILON, 0)
        .ok_or(SimErr::SvdFailed { rows, cols })?;

    Ok(svd.singular_values.iter().copied().collect())
}

fn normalize(spectrum: Array1<f32>) -> Array1<f32> {
    let norm = spectrum.dot(&spectrum).sqrt();
    spectrum.mapv_into(|s| s / norm)
}

/// Samples `num_samples` matrices of shape `rows x cols` and concatenates their normalized
/// singular value spectra.
///
/// Each matrix is drawn from its own generator, seeded with a value taken from `rng` in sampling
/// order, so the matrices are sampled in parallel and the result only depends on the state of
/// `rng`. Matrices are drawn in batches small enough to keep at most a gigabyte of entries alive.
///
/// # Arguments
/// * `rows` - The amount of rows of the sampled matrices.
/// * `cols` - The amount of columns of the sampled matrices.
/// * `num_samples` - The amount of matrices to sample.
/// * `rng` - The generator the per matrix seeds are drawn from.
///
/// # Returns
/// A dataset of `num_samples * min(rows, cols)` values or an error if any argument is zero.
pub fn generate_singular_value_data<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    num_samples: usize,
    rng: &mut R,
) -> Result<Dataset> {
    let sampler = SpectrumSampler::new(rows, cols)?;
    if num_samples == 0 {
        return Err(SimErr::InvalidArgument {
            what: "num_samples",
            got: num_samples,
        });
    }

    let seeds: Vec<u64> = (0..num_samples).map(|_| rng.random()).collect();
    let spectrum_len = sampler.spectrum_len();
    let mut values = Vec::with_capacity(num_samples * spectrum_len);
    let mut progress = Progress::new("sampling singular values", num_samples);

    for batch in seeds.chunks(sampler.parallel_width()) {
        let spectra = batch
            .par_iter()
            .map(|&seed| sampler.sample(&mut StdRng::seed_from_u64(seed)))
            .collect::<Result<Vec<_>>>()?;

        for spectrum in &spectra {
            values.extend(spectrum.iter().copied());
        }
        progress.advance(batch.len());
    }

    info!("sampled {num_samples} spectra of {rows}x{cols} matrices");
    Dataset::new(Array1::from_vec(values), spectrum_len)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn singular_values_of_diagonal() {
        let matrix = array![[3.0, 0.0], [0.0, -4.0], [0.0, 0.0]];
        let s = singular_values(matrix.view()).unwrap();

        assert_eq!(s.len(), 2);
        assert!((s[0] - 4.0).abs() < 1e-5);
        assert!((s[1] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn singular_values_of_rank_one() {
        // [1 2; 2 4] = v v^T with |v|^2 = 5.
        let matrix = array![[1.0, 2.0], [2.0, 4.0]];
        let s = singular_values(matrix.view()).unwrap();

        assert!((s[0] - 5.0).abs() < 1e-4);
        assert!(s[1].abs() < 1e-4);
    }

    #[test]
    fn spectrum_has_unit_norm() {
        let sampler = SpectrumSampler::new(6, 4).unwrap();
        let spectrum = sampler.sample(&mut seeded_rng()).unwrap();

        assert_eq!(spectrum.len(), 4);
        assert!((spectrum.dot(&spectrum) - 1.0).abs() < 1e-5);
        assert!(spectrum.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn sample_matches_the_drawn_matrix() {
        for (rows, cols) in [(5, 3), (3, 5), (4, 4)] {
            let sampler = SpectrumSampler::new(rows, cols).unwrap();
            let spectrum = sampler.sample(&mut seeded_rng()).unwrap();

            let matrix =
                Array2::<f32>::random_using((rows, cols), StandardNormal, &mut seeded_rng());
            let expected = normalize(singular_values(matrix.view()).unwrap());

            assert_eq!(spectrum.len(), rows.min(cols));
            for (s, e) in spectrum.iter().zip(&expected) {
                assert!((s - e).abs() < 1e-5, "{rows}x{cols}: {spectrum} vs {expected}");
            }
        }
    }

    #[test]
    fn large_matrices_are_drawn_in_small_batches() {
        assert_eq!(SpectrumSampler::new(8192, 8192).unwrap().parallel_width(), 4);
        assert_eq!(SpectrumSampler::new(1024, 1024).unwrap().parallel_width(), 256);
        assert_eq!(SpectrumSampler::new(1 << 16, 1 << 16).unwrap().parallel_width(), 1);
    }

    #[test]
    fn batching_does_not_change_the_dataset() {
        let sampler = SpectrumSampler::new(6, 5).unwrap();
        let data = generate_singular_value_data(6, 5, 7, &mut seeded_rng()).unwrap();

        let mut rng = seeded_rng();
        let seeds: Vec<u64> = (0..7).map(|_| rng.random()).collect();
        for (spectrum, seed) in data.spectra().zip(seeds) {
            let expected = sampler.sample(&mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(spectrum, expected);
        }
    }

    #[test]
    fn wide_and_tall_matrices() {
        let mut rng = seeded_rng();

        let wide = generate_singular_value_data(3, 7, 5, &mut rng).unwrap();
        assert_eq!(wide.len(), 15);
        assert_eq!(wide.spectrum_len(), 3);

        let tall = generate_singular_value_data(7, 3, 5, &mut rng).unwrap();
        assert_eq!(tall.len(), 15);
        assert_eq!(tall.num_spectra(), 5);
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = generate_singular_value_data(8, 8, 4, &mut seeded_rng()).unwrap();
        let b = generate_singular_value_data(8, 8, 4, &mut seeded_rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_draws_differ() {
        let mut rng = seeded_rng();
        let a = generate_singular_value_data(8, 8, 2, &mut rng).unwrap();
        let b = generate_singular_value_data(8, 8, 2, &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_zero_arguments() {
        let mut rng = seeded_rng();

        let err = generate_singular_value_data(0, 4, 1, &mut rng).unwrap_err();
        assert!(matches!(err, SimErr::InvalidArgument { what: "rows", .. }));

        let err = generate_singular_value_data(4, 0, 1, &mut rng).unwrap_err();
        assert!(matches!(err, SimErr::InvalidArgument { what: "cols", .. }));

        let err = generate_singular_value_data(4, 4, 0, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SimErr::InvalidArgument {
                what: "num_samples",
                ..
            }
        ));
    }
}
