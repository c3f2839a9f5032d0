//! Random initialization. Every constructor takes the generator explicitly
//! so callers own the seed.

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::api::error::{TensorError, TensorResult};
use crate::core::tensor2d::Tensor2D;

impl Tensor2D {
    /// Values drawn uniformly from `[low, high)`, row-major draw order.
    pub fn uniform<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> TensorResult<Tensor2D> {
        if !(low < high) {
            return Err(TensorError::InvalidOperation(format!(
                "uniform range [{low}, {high}) is empty"
            )));
        }
        let dist = Uniform::new(low, high);
        let data = (0..rows * cols).map(|_| dist.sample(rng)).collect();
        Tensor2D::from_vec(rows, cols, data)
    }

    /// Values drawn from `N(0, stddev²)`, row-major draw order.
    pub fn gaussian<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        stddev: f64,
        rng: &mut R,
    ) -> TensorResult<Tensor2D> {
        if !stddev.is_finite() || stddev < 0.0 {
            return Err(TensorError::InvalidOperation(format!(
                "gaussian stddev must be finite and non-negative, got {stddev}"
            )));
        }
        let normal = Normal::new(0.0, stddev).map_err(|e| {
            TensorError::InvalidOperation(format!("gaussian stddev {stddev}: {e}"))
        })?;
        let data = (0..rows * cols).map(|_| normal.sample(rng)).collect();
        Tensor2D::from_vec(rows, cols, data)
    }

    /// Weight initialization scaled by fan-in: `N(0, (2 / sqrt(fan_in))²)`
    /// for a [rows, fan_in] weight tensor.
    pub fn he<R: Rng + ?Sized>(rows: usize, fan_in: usize, rng: &mut R) -> TensorResult<Tensor2D> {
        if fan_in == 0 {
            return Err(TensorError::Empty("he initialization with zero fan-in"));
        }
        Tensor2D::gaussian(rows, fan_in, he_stddev(fan_in), rng)
    }
}

/// Standard deviation used by [`Tensor2D::he`].
pub fn he_stddev(fan_in: usize) -> f64 {
    2.0 / (fan_in as f64).sqrt()
}
