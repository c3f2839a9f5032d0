//! Dense row-major `f64` matrix.

use std::fmt;

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::Dims;
use crate::core::runtime::for_each_row;
use crate::core::tensor1d::Tensor1D;

/// A rows × columns grid of `f64`, stored row-major.
///
/// Weight tensors use rows = output units and columns = input units. Data
/// tensors use rows = features and columns = examples.
#[derive(Clone, PartialEq)]
pub struct Tensor2D {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) data: Vec<f64>,
}

impl Tensor2D {
    // ==================== Constructors ====================

    /// Create a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a tensor filled with a specific value.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Create a tensor from row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> TensorResult<Self> {
        if data.len() != rows * cols {
            return Err(TensorError::shape(
                "from_vec",
                format!("{} values for {}", rows * cols, Dims::new(rows, cols)),
                data.len(),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a tensor whose rows are the given slices.
    pub fn from_rows(rows: &[Vec<f64>]) -> TensorResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(TensorError::shape(
                    "from_rows",
                    format!("row {r} of length {cols}"),
                    row.len(),
                ));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Create a tensor whose columns are the given slices. This is the
    /// natural way to build a data tensor from per-example feature vectors.
    pub fn from_columns(columns: &[Vec<f64>]) -> TensorResult<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        let cols = columns.len();
        let mut out = Self::zeros(rows, cols);
        for (c, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(TensorError::shape(
                    "from_columns",
                    format!("column {c} of length {rows}"),
                    column.len(),
                ));
            }
            for (r, &v) in column.iter().enumerate() {
                out.data[r * cols + c] = v;
            }
        }
        Ok(out)
    }

    // ==================== Accessors ====================

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.rows, self.cols)
    }

    pub fn numel(&self) -> usize {
        self.data.len()
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

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        debug_assert!(r < self.rows && c < self.cols);
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        debug_assert!(r < self.rows && c < self.cols);
        self.data[r * self.cols + c] = value;
    }

    pub fn try_get(&self, r: usize, c: usize) -> TensorResult<f64> {
        self.check_row(r)?;
        self.check_col(c)?;
        Ok(self.get(r, c))
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn column(&self, c: usize) -> Tensor1D {
        Tensor1D::from_vec((0..self.rows).map(|r| self.get(r, c)).collect())
    }

    /// Copy of the half-open column range `start..end`.
    pub fn columns(&self, start: usize, end: usize) -> TensorResult<Tensor2D> {
        if start > end || end > self.cols {
            return Err(TensorError::IndexOutOfBounds {
                dim: 1,
                index: end,
                size: self.cols,
            });
        }
        let width = end - start;
        let mut data = Vec::with_capacity(self.rows * width);
        for r in 0..self.rows {
            data.extend_from_slice(&self.row(r)[start..end]);
        }
        Ok(Tensor2D {
            rows: self.rows,
            cols: width,
            data,
        })
    }

    /// Copy of the given columns, in the given order.
    pub fn select_columns(&self, indices: &[usize]) -> TensorResult<Tensor2D> {
        if let Some(&bad) = indices.iter().find(|&&c| c >= self.cols) {
            return Err(TensorError::IndexOutOfBounds {
                dim: 1,
                index: bad,
                size: self.cols,
            });
        }
        let mut out = Tensor2D::zeros(self.rows, indices.len());
        for r in 0..self.rows {
            let src = self.row(r);
            let dst = out.row_mut(r);
            for (d, &c) in dst.iter_mut().zip(indices) {
                *d = src[c];
            }
        }
        Ok(out)
    }

    pub fn transpose(&self) -> Tensor2D {
        let mut out = Tensor2D::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    pub(crate) fn check_row(&self, r: usize) -> TensorResult<()> {
        if r >= self.rows {
            return Err(TensorError::IndexOutOfBounds {
                dim: 0,
                index: r,
                size: self.rows,
            });
        }
        Ok(())
    }

    pub(crate) fn check_col(&self, c: usize) -> TensorResult<()> {
        if c >= self.cols {
            return Err(TensorError::IndexOutOfBounds {
                dim: 1,
                index: c,
                size: self.cols,
            });
        }
        Ok(())
    }

    pub(crate) fn check_same_shape(&self, other: &Tensor2D, op: &'static str) -> TensorResult<()> {
        if self.shape() != other.shape() {
            return Err(TensorError::shape(op, self.dims(), other.dims()));
        }
        Ok(())
    }

    // ==================== Element-wise ====================

    fn zip_map(
        &self,
        other: &Tensor2D,
        op: &'static str,
        f: fn(f64, f64) -> f64,
    ) -> TensorResult<Tensor2D> {
        self.check_same_shape(other, op)?;
        let mut out = Tensor2D::zeros(self.rows, self.cols);
        let cols = self.cols;
        for_each_row(&mut out.data, cols, |r, row| {
            let a = &self.data[r * cols..(r + 1) * cols];
            let b = &other.data[r * cols..(r + 1) * cols];
            for ((o, &x), &y) in row.iter_mut().zip(a).zip(b) {
                *o = f(x, y);
            }
        });
        Ok(out)
    }

    pub fn add(&self, other: &Tensor2D) -> TensorResult<Tensor2D> {
        self.zip_map(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor2D) -> TensorResult<Tensor2D> {
        self.zip_map(other, "sub", |a, b| a - b)
    }

    /// Apply `f` to every element, producing a new tensor.
    pub fn map<F>(&self, f: F) -> Tensor2D
    where
        F: Fn(f64) -> f64 + Send + Sync,
    {
        let mut out = self.clone();
        out.map_in_place(f);
        out
    }

    pub fn map_in_place<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64 + Send + Sync,
    {
        let cols = self.cols;
        for_each_row(&mut self.data, cols, |_, row| {
            for v in row.iter_mut() {
                *v = f(*v);
            }
        });
    }

    pub fn scale(&self, k: f64) -> Tensor2D {
        self.map(move |v| v * k)
    }

    pub fn divide(&self, k: f64) -> Tensor2D {
        self.map(move |v| v / k)
    }

    /// Element-wise `max(v, floor)`; with `floor = 0` this is ReLU.
    pub fn max_scalar(&self, floor: f64) -> Tensor2D {
        self.map(move |v| v.max(floor))
    }

    pub fn scale_in_place(&mut self, k: f64) {
        self.map_in_place(move |v| v * k);
    }

    /// `self += k * other`
    pub fn add_scaled(&mut self, other: &Tensor2D, k: f64) -> TensorResult<()> {
        self.check_same_shape(other, "add_scaled")?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += k * b;
        }
        Ok(())
    }

    /// Zero every entry whose counterpart in `activations` is `<= 0`.
    /// This is the ReLU derivative applied to an upstream gradient.
    pub fn relu_mask_zero(&mut self, activations: &Tensor2D) -> TensorResult<()> {
        self.check_same_shape(activations, "relu_mask_zero")?;
        for (g, &a) in self.data.iter_mut().zip(&activations.data) {
            if a <= 0.0 {
                *g = 0.0;
            }
        }
        Ok(())
    }

    pub fn zero_row(&mut self, r: usize) -> TensorResult<()> {
        self.check_row(r)?;
        self.row_mut(r).fill(0.0);
        Ok(())
    }

    // ==================== Reductions ====================

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Sum of squares of every entry.
    pub fn l2_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    pub fn row_sums(&self) -> Tensor1D {
        Tensor1D::from_vec((0..self.rows).map(|r| self.row(r).iter().sum()).collect())
    }

    pub fn column_sums(&self) -> Tensor1D {
        let mut sums = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (s, v) in sums.iter_mut().zip(self.row(r)) {
                *s += v;
            }
        }
        Tensor1D::from_vec(sums)
    }

    pub fn column_max(&self) -> Tensor1D {
        let mut maxes = vec![f64::NEG_INFINITY; self.cols];
        for r in 0..self.rows {
            for (m, &v) in maxes.iter_mut().zip(self.row(r)) {
                if v > *m {
                    *m = v;
                }
            }
        }
        Tensor1D::from_vec(maxes)
    }

    /// Row index of the largest value in column `c`; ties go to the lowest
    /// index.
    pub fn argmax_column(&self, c: usize) -> TensorResult<usize> {
        self.check_col(c)?;
        if self.rows == 0 {
            return Err(TensorError::Empty("argmax_column"));
        }
        let mut best = 0;
        let mut best_val = self.get(0, c);
        for r in 1..self.rows {
            let v = self.get(r, c);
            if v > best_val {
                best = r;
                best_val = v;
            }
        }
        Ok(best)
    }

    /// Largest absolute element-wise difference; `None` on shape mismatch.
    pub fn max_abs_diff(&self, other: &Tensor2D) -> Option<f64> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl fmt::Debug for Tensor2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tensor2D {} [", self.dims())?;
        for r in 0..self.rows {
            writeln!(f, "  {:?}", self.row(r))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(rows: usize, cols: usize, data: &[f64]) -> Tensor2D {
        Tensor2D::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(matches!(
            Tensor2D::from_vec(2, 2, vec![1.0; 3]),
            Err(TensorError::ShapeMismatch { op: "from_vec", .. })
        ));
    }

    #[test]
    fn from_columns_lays_out_examples_as_columns() {
        let x = Tensor2D::from_columns(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x.row(0), &[1.0, 3.0, 5.0]);
        assert_eq!(x.row(1), &[2.0, 4.0, 6.0]);
        assert_eq!(x.column(1).as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn column_slicing() {
        let x = t(2, 4, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let mid = x.columns(1, 3).unwrap();
        assert_eq!(mid.shape(), (2, 2));
        assert_eq!(mid.as_slice(), &[1.0, 2.0, 5.0, 6.0]);

        let picked = x.select_columns(&[3, 0]).unwrap();
        assert_eq!(picked.as_slice(), &[3.0, 0.0, 7.0, 4.0]);

        assert!(x.columns(2, 5).is_err());
        assert!(x.select_columns(&[4]).is_err());
    }

    #[test]
    fn sums_and_norm() {
        let x = t(2, 3, &[1.0, 2.0, 3.0, -1.0, 0.0, 4.0]);
        assert_eq!(x.row_sums().as_slice(), &[6.0, 3.0]);
        assert_eq!(x.column_sums().as_slice(), &[0.0, 2.0, 7.0]);
        assert_eq!(x.column_max().as_slice(), &[1.0, 2.0, 4.0]);
        assert_eq!(x.l2_norm(), 1.0 + 4.0 + 9.0 + 1.0 + 16.0);
    }

    #[test]
    fn argmax_column_ties_break_low() {
        let x = t(3, 2, &[1.0, 5.0, 3.0, 5.0, 3.0, 2.0]);
        assert_eq!(x.argmax_column(0).unwrap(), 1);
        assert_eq!(x.argmax_column(1).unwrap(), 0);
        assert!(x.argmax_column(2).is_err());
    }

    #[test]
    fn relu_mask_zero_uses_activations() {
        let mut g = t(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let a = t(2, 2, &[0.5, 0.0, -1.0, 2.0]);
        g.relu_mask_zero(&a).unwrap();
        assert_eq!(g.as_slice(), &[1.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn elementwise_ops() {
        let a = t(1, 3, &[1.0, -2.0, 3.0]);
        let b = t(1, 3, &[1.0, 1.0, 1.0]);
        assert_eq!(a.add(&b).unwrap().as_slice(), &[2.0, -1.0, 4.0]);
        assert_eq!(a.sub(&b).unwrap().as_slice(), &[0.0, -3.0, 2.0]);
        assert_eq!(a.scale(2.0).as_slice(), &[2.0, -4.0, 6.0]);
        assert_eq!(a.divide(2.0).as_slice(), &[0.5, -1.0, 1.5]);
        assert_eq!(a.max_scalar(0.0).as_slice(), &[1.0, 0.0, 3.0]);

        let mut c = a.clone();
        c.add_scaled(&b, -1.0).unwrap();
        assert_eq!(c.as_slice(), &[0.0, -3.0, 2.0]);
        assert!(c.add_scaled(&t(3, 1, &[0.0; 3]), 1.0).is_err());
    }

    #[test]
    fn zero_row_and_transpose() {
        let mut x = t(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(x.transpose().as_slice(), &[1.0, 3.0, 2.0, 4.0]);
        x.zero_row(1).unwrap();
        assert_eq!(x.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
        assert!(x.zero_row(2).is_err());
    }
}
