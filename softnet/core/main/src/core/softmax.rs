//! Column-wise softmax, cross-entropy and the combined gradient.
//!
//! Scores are [classes, examples]; every column is one example.

use crate::api::error::{TensorError, TensorResult};
use crate::core::runtime::for_each_row;
use crate::core::tensor1d::Tensor1D;
use crate::core::tensor2d::Tensor2D;

impl Tensor2D {
    /// Subtract each column's maximum from that column.
    pub fn shift_columns_by_max(&mut self) -> &mut Self {
        let maxes = self.column_max();
        let cols = self.cols;
        for_each_row(&mut self.data, cols, |_, row| {
            for (v, m) in row.iter_mut().zip(maxes.as_slice()) {
                *v -= m;
            }
        });
        self
    }

    pub fn exp_in_place(&mut self) -> &mut Self {
        self.map_in_place(f64::exp);
        self
    }

    /// Divide each column by its sum.
    pub fn normalize_columns(&mut self) -> &mut Self {
        let sums = self.column_sums();
        let cols = self.cols;
        for_each_row(&mut self.data, cols, |_, row| {
            for (v, s) in row.iter_mut().zip(sums.as_slice()) {
                *v /= s;
            }
        });
        self
    }

    /// Numerically stable softmax over every column, in place.
    ///
    /// After the max shift the largest entry of each column is `exp(0) = 1`,
    /// so column sums are at least 1 and never overflow.
    pub fn shift_and_exp_and_normalize(&mut self) -> &mut Self {
        self.shift_columns_by_max().exp_in_place().normalize_columns()
    }

    /// Per-example loss `-ln(probs[labels[i], i])`.
    pub fn cross_entropy_loss(&self, labels: &[usize]) -> TensorResult<Tensor1D> {
        self.check_labels(labels, "cross_entropy_loss")?;
        Ok(Tensor1D::from_vec(
            labels
                .iter()
                .enumerate()
                .map(|(i, &y)| -self.get(y, i).ln())
                .collect(),
        ))
    }

    /// Gradient of the mean cross-entropy with respect to the scores that
    /// produced `self` (the probabilities): subtract 1 at the true class and
    /// divide everything by the example count.
    pub fn softmax_grad(&self, labels: &[usize]) -> TensorResult<Tensor2D> {
        let mut grad = self.clone();
        grad.softmax_grad_in_place(labels)?;
        Ok(grad)
    }

    pub fn softmax_grad_in_place(&mut self, labels: &[usize]) -> TensorResult<()> {
        self.check_labels(labels, "softmax_grad")?;
        for (i, &y) in labels.iter().enumerate() {
            let idx = y * self.cols + i;
            self.data[idx] -= 1.0;
        }
        if !labels.is_empty() {
            self.scale_in_place(1.0 / labels.len() as f64);
        }
        Ok(())
    }

    fn check_labels(&self, labels: &[usize], op: &'static str) -> TensorResult<()> {
        if labels.len() != self.cols {
            return Err(TensorError::shape(
                op,
                format!("{} labels", self.cols),
                labels.len(),
            ));
        }
        if let Some((example, &label)) = labels.iter().enumerate().find(|(_, &y)| y >= self.rows) {
            return Err(TensorError::InvalidLabel {
                example,
                label,
                classes: self.rows,
            });
        }
        Ok(())
    }
}
