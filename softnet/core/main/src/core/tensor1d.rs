use std::fmt;
use std::ops::Index;

use crate::api::error::{TensorError, TensorResult};

/// Fixed-length `f64` vector. Used for biases, bias gradients and
/// per-example losses.
#[derive(Clone, PartialEq)]
pub struct Tensor1D {
    data: Vec<f64>,
}

impl Tensor1D {
    // ==================== Constructors ====================

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub fn filled(len: usize, value: f64) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { data }
    }

    // ==================== Accessors ====================

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn get(&self, i: usize) -> f64 {
        self.data[i]
    }

    pub fn try_get(&self, i: usize) -> TensorResult<f64> {
        self.data
            .get(i)
            .copied()
            .ok_or(TensorError::IndexOutOfBounds {
                dim: 0,
                index: i,
                size: self.data.len(),
            })
    }

    pub fn set(&mut self, i: usize, value: f64) {
        self.data[i] = value;
    }

    // ==================== Element-wise ====================

    fn check_len(&self, other: &Tensor1D, op: &'static str) -> TensorResult<()> {
        if self.len() != other.len() {
            return Err(TensorError::shape(
                op,
                format!("[{}]", self.len()),
                format!("[{}]", other.len()),
            ));
        }
        Ok(())
    }

    pub fn add(&self, other: &Tensor1D) -> TensorResult<Tensor1D> {
        self.check_len(other, "add")?;
        Ok(Tensor1D::from_vec(
            self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect(),
        ))
    }

    pub fn scale(&self, k: f64) -> Tensor1D {
        Tensor1D::from_vec(self.data.iter().map(|v| v * k).collect())
    }

    /// `self += k * other`
    pub fn add_scaled(&mut self, other: &Tensor1D, k: f64) -> TensorResult<()> {
        self.check_len(other, "add_scaled")?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += k * b;
        }
        Ok(())
    }

    pub fn scale_in_place(&mut self, k: f64) {
        for v in &mut self.data {
            *v *= k;
        }
    }

    // ==================== Reductions ====================

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as f64
    }

    /// Sum of squares.
    pub fn l2_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    /// Index of the largest value; first occurrence wins.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| i)
    }
}

impl Index<usize> for Tensor1D {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl From<Vec<f64>> for Tensor1D {
    fn from(data: Vec<f64>) -> Self {
        Self { data }
    }
}

impl fmt::Debug for Tensor1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor1D({:?})", self.data)
    }
}
