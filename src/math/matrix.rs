use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Dense row-major matrix.
///
/// Weight matrices are stored as (fan_in, fan_out) so a row vector `x`
/// propagates as `x · W`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    /// He initialization: N(0, sqrt(2 / fan_in)).
    ///
    /// Recommended before ReLU layers. The variance 2/fan_in accounts for
    /// ReLU zeroing half of its inputs on average.
    pub fn he<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Matrix {
        Matrix::normal(fan_in, fan_out, (2.0 / fan_in as f64).sqrt(), rng)
    }

    /// Xavier (Glorot) initialization: N(0, sqrt(1 / fan_in)).
    ///
    /// Recommended before Sigmoid layers.
    pub fn xavier<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Matrix {
        Matrix::normal(fan_in, fan_out, (1.0 / fan_in as f64).sqrt(), rng)
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Row vector times matrix: `x · M`, with `x.len() == rows`.
    pub fn vec_mul(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.rows);
        let mut out = vec![0.0; self.cols];
        for (i, &xi) in x.iter().enumerate() {
            // Solid swatches leave two thirds of the inputs at zero.
            if xi == 0.0 {
                continue;
            }
            for (o, &w) in out.iter_mut().zip(self.row(i)) {
                *o += xi * w;
            }
        }
        out
    }

    /// Matrix times column vector: `M · d`, with `d.len() == cols`.
    pub fn mul_vec(&self, d: &[f64]) -> Vec<f64> {
        debug_assert_eq!(d.len(), self.cols);
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(d).map(|(w, v)| w * v).sum())
            .collect()
    }

    /// Accumulates the outer product `x ⊗ d` into `self`.
    pub fn add_outer(&mut self, x: &[f64], d: &[f64]) {
        debug_assert_eq!(x.len(), self.rows);
        debug_assert_eq!(d.len(), self.cols);
        let cols = self.cols;
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            for (g, &dj) in self.data[i * cols..(i + 1) * cols].iter_mut().zip(d) {
                *g += xi * dj;
            }
        }
    }

    pub fn scale(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|v| *v *= factor);
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// True when `data` actually holds `rows × cols` values.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows * self.cols
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
