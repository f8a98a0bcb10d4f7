use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Row-major weight matrix. Dense layers store `input_size` rows of `size`
/// columns, so a forward pass is `x · W`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Recommended before ReLU layers. `rows` is the fan-in.
    pub fn he(rows: usize, cols: usize) -> Matrix {
        let std_dev = (2.0 / rows.max(1) as f64).sqrt();
        Matrix::sampled(rows, cols, std_dev)
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / rows)).
    ///
    /// Recommended before Sigmoid/Tanh/Softmax layers.
    pub fn xavier(rows: usize, cols: usize) -> Matrix {
        let std_dev = (1.0 / rows.max(1) as f64).sqrt();
        Matrix::sampled(rows, cols, std_dev)
    }

    fn sampled(rows: usize, cols: usize, std_dev: f64) -> Matrix {
        let mut rng = rand::thread_rng();
        let data = (0..rows)
            .map(|_| (0..cols).map(|_| sample_standard_normal(&mut rng) * std_dev).collect())
            .collect();
        Matrix { rows, cols, data }
    }

    /// Builds a matrix from nested rows. An empty outer vector yields a 0×0 matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |r| r.len()),
            data,
        }
    }

    /// `true` when the declared shape matches the stored rows.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows && self.data.iter().all(|r| r.len() == self.cols)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().flatten().all(|x| x.is_finite())
    }

    /// Computes the row vector `input · self`.
    ///
    /// `input.len()` must equal `self.rows`; the result has `self.cols` entries.
    pub fn vec_mul(&self, input: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.cols];
        for (x, row) in input.iter().zip(self.data.iter()) {
            if *x == 0.0 {
                continue;
            }
            for (o, w) in out.iter_mut().zip(row.iter()) {
                *o += x * w;
            }
        }
        out
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Both draws in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// He-initialized flat buffer of `len` values with the given fan-in.
pub fn he_vec(len: usize, fan_in: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
    (0..len).map(|_| sample_standard_normal(&mut rng) * std_dev).collect()
}
