use ndarray::{Array1, ArrayView1, Zip, s};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Model;
use crate::{Result, SimErr};

/// Amount of elements each parallel task of the backward pass reduces.
const CHUNK_SIZE: usize = 1 << 14;

/// The three scalars parametrizing the recurrence: the rate `k` and the roots `x1` and `x2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub k: f32,
    pub x1: f32,
    pub x2: f32,
}

impl Coefficients {
    /// The amount of scalars in a `Coefficients`.
    pub const LEN: usize = 3;

    pub fn new(k: f32, x1: f32, x2: f32) -> Self {
        Self { k, x1, x2 }
    }

    /// Reads the coefficients from a `[k, x1, x2]` parameter slice.
    ///
    /// # Returns
    /// An error if `params` doesn't hold exactly three values.
    pub fn from_slice(params: &[f32]) -> Result<Self> {
        match *params {
            [k, x1, x2] => Ok(Self { k, x1, x2 }),
            _ => Err(SimErr::SizeMismatch {
                a: "params",
                b: "coefficients",
                got: params.len(),
                expected: Self::LEN,
            }),
        }
    }

    pub fn to_array(self) -> [f32; Self::LEN] {
        [self.k, self.x1, self.x2]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }

    /// Expands one step of the recurrence into the odd quintic `a·v + b·v³ + c·v⁵`.
    pub fn quintic(&self) -> Quintic {
        let Self { k, x1, x2 } = *self;
        let (a1, a2) = (x1 * x1, x2 * x2);

        Quintic {
            a: 1.0 + k * a1 * a2,
            b: -k * (a1 + a2),
            c: k,
        }
    }
}

/// The coefficients of an odd quintic polynomial `a·v + b·v³ + c·v⁵`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quintic {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Quintic {
    pub fn eval(&self, v: f32) -> f32 {
        let v2 = v * v;
        v * (self.a + v2 * (self.b + v2 * self.c))
    }
}

/// The Newton-Schulz style recurrence `v ← v + k·v·(v² − x1²)·(v² − x2²)`, applied elementwise a
/// fixed amount of times.
///
/// The parameters are laid out as `[k, x1, x2]`. Diverging parameters yield non finite outputs,
/// which are returned as is.
#[derive(Debug, Clone, Copy)]
pub struct NewtonSchulz {
    iterations: usize,
}

impl NewtonSchulz {
    /// Creates a new `NewtonSchulz`.
    ///
    /// # Arguments
    /// * `iterations` - The amount of times the recurrence is unrolled.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Applies the recurrence to every element of `x`.
    ///
    /// # Arguments
    /// * `x` - The input values.
    /// * `coeffs` - The recurrence's coefficients.
    ///
    /// # Returns
    /// An array of the same shape as `x`.
    pub fn apply(&self, x: ArrayView1<f32>, coeffs: Coefficients) -> Array1<f32> {
        let Coefficients { k, x1, x2 } = coeffs;
        let (a1, a2) = (x1 * x1, x2 * x2);

        Zip::from(&x).par_map_collect(|&v| {
            (0..self.iterations).fold(v, |v, _| step(v, k, a1, a2))
        })
    }

    /// Replays the recurrence for every element of `x` and returns the summed partial derivatives
    /// of the loss with respect to `k`, `x1²` and `x2²`.
    fn backward_chunk(
        &self,
        coeffs: Coefficients,
        x: ArrayView1<f32>,
        d: ArrayView1<f32>,
    ) -> [f64; 3] {
        let Coefficients { k, x1, x2 } = coeffs;
        let (a1, a2) = (x1 * x1, x2 * x2);

        let mut trajectory = Vec::with_capacity(self.iterations);
        let mut acc = [0.0f64; 3];

        for (&v0, &d) in x.iter().zip(d) {
            trajectory.clear();
            let mut v = v0;
            for _ in 0..self.iterations {
                trajectory.push(v);
                v = step(v, k, a1, a2);
            }

            let (mut dk, mut da1, mut da2) = (0.0f32, 0.0f32, 0.0f32);
            let mut adj = d;

            for &v in trajectory.iter().rev() {
                let v2 = v * v;
                let p = v2 - a1;
                let q = v2 - a2;

                dk += adj * v * p * q;
                da1 -= adj * k * v * q;
                da2 -= adj * k * v * p;
                adj *= 1.0 + k * (p * q + 2.0 * v2 * (p + q));
            }

            acc[0] += f64::from(dk);
            acc[1] += f64::from(da1);
            acc[2] += f64::from(da2);
        }

        acc
    }
}

#[inline]
fn step(v: f32, k: f32, a1: f32, a2: f32) -> f32 {
    let v2 = v * v;
    v + k * v * (v2 - a1) * (v2 - a2)
}

impl Model for NewtonSchulz {
    fn size(&self) -> usize {
        Coefficients::LEN
    }

    fn forward(&self, params: &[f32], x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let coeffs = Coefficients::from_slice(params)?;
        Ok(self.apply(x, coeffs))
    }

    fn backward(
        &self,
        params: &[f32],
        x: ArrayView1<f32>,
        d: ArrayView1<f32>,
        grad: &mut [f32],
    ) -> Result<()> {
        let coeffs = Coefficients::from_slice(params)?;

        if grad.len() != Coefficients::LEN {
            return Err(SimErr::SizeMismatch {
                a: "grad",
                b: "coefficients",
                got: grad.len(),
                expected: Coefficients::LEN,
            });
        }

        if d.len() != x.len() {
            return Err(SimErr::SizeMismatch {
                a: "d",
                b: "x",
                got: d.len(),
                expected: x.len(),
            });
        }

        // Chunks are reduced in order so the gradient doesn't depend on thread scheduling.
        let len = x.len();
        let partials: Vec<[f64; 3]> = (0..len.div_ceil(CHUNK_SIZE))
            .into_par_iter()
            .map(|i| {
                let range = i * CHUNK_SIZE..((i + 1) * CHUNK_SIZE).min(len);
                self.backward_chunk(coeffs, x.slice(s![range.clone()]), d.slice(s![range]))
            })
            .collect();

        let [dk, da1, da2] = partials.iter().fold([0.0f64; 3], |acc, p| {
            [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]
        });

        // d(x²)/dx = 2x
        grad[0] += dk as f32;
        grad[1] += (da1 * 2.0 * f64::from(coeffs.x1)) as f32;
        grad[2] += (da2 * 2.0 * f64::from(coeffs.x2)) as f32;

        Ok(())
    }
}
