//! Matrix products and the affine activation.
//!
//! Every kernel parallelizes over output rows; each output element is
//! accumulated in ascending order of the inner index, so results do not
//! depend on the thread count.

use crate::api::error::{TensorError, TensorResult};
use crate::core::runtime::for_each_row;
use crate::core::tensor1d::Tensor1D;
use crate::core::tensor2d::Tensor2D;

impl Tensor2D {
    /// `self · other`: [m, k] × [k, n] → [m, n].
    pub fn matmul(&self, other: &Tensor2D) -> TensorResult<Tensor2D> {
        if self.cols != other.rows {
            return Err(TensorError::shape(
                "matmul",
                format!("[_, {}] x [{}, _]", self.cols, self.cols),
                format!("{} x {}", self.dims(), other.dims()),
            ));
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut out = Tensor2D::zeros(m, n);
        for_each_row(&mut out.data, n, |i, row| {
            let a_row = &self.data[i * k..(i + 1) * k];
            for (j, o) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (p, &a) in a_row.iter().enumerate() {
                    acc += a * other.data[p * n + j];
                }
                *o = acc;
            }
        });
        Ok(out)
    }

    /// `selfᵀ · other`: [k, m] × [k, n] → [m, n], without materializing the
    /// transpose.
    pub fn matmul_transpose_a(&self, other: &Tensor2D) -> TensorResult<Tensor2D> {
        if self.rows != other.rows {
            return Err(TensorError::shape(
                "matmul_transpose_a",
                format!("[{}, _]^T x [{}, _]", self.rows, self.rows),
                format!("{}^T x {}", self.dims(), other.dims()),
            ));
        }
        let (k, m, n) = (self.rows, self.cols, other.cols);
        let mut out = Tensor2D::zeros(m, n);
        for_each_row(&mut out.data, n, |i, row| {
            for (j, o) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for p in 0..k {
                    acc += self.data[p * m + i] * other.data[p * n + j];
                }
                *o = acc;
            }
        });
        Ok(out)
    }

    /// `self · otherᵀ`: [m, k] × [n, k] → [m, n], without materializing the
    /// transpose.
    pub fn matmul_transpose_b(&self, other: &Tensor2D) -> TensorResult<Tensor2D> {
        if self.cols != other.cols {
            return Err(TensorError::shape(
                "matmul_transpose_b",
                format!("[_, {}] x [_, {}]^T", self.cols, self.cols),
                format!("{} x {}^T", self.dims(), other.dims()),
            ));
        }
        let (m, k, n) = (self.rows, self.cols, other.rows);
        let mut out = Tensor2D::zeros(m, n);
        for_each_row(&mut out.data, n, |i, row| {
            let a_row = &self.data[i * k..(i + 1) * k];
            for (j, o) in row.iter_mut().enumerate() {
                let b_row = &other.data[j * k..(j + 1) * k];
                *o = a_row.iter().zip(b_row).map(|(a, b)| a * b).sum();
            }
        });
        Ok(out)
    }

    /// `self · v`: [m, k] × [k] → [m].
    pub fn matvec(&self, v: &Tensor1D) -> TensorResult<Tensor1D> {
        if self.cols != v.len() {
            return Err(TensorError::shape(
                "matvec",
                format!("[{}]", self.cols),
                format!("{} x [{}]", self.dims(), v.len()),
            ));
        }
        let mut out = vec![0.0; self.rows];
        for_each_row(&mut out, 1, |i, o| {
            o[0] = self
                .row(i)
                .iter()
                .zip(v.as_slice())
                .map(|(a, b)| a * b)
                .sum();
        });
        Ok(Tensor1D::from_vec(out))
    }

    /// Affine activation `W·X + b`, broadcasting `b` over the columns of `X`.
    ///
    /// `weights` is [out, in], `inputs` is [in, n] (one column per example,
    /// n = 1 for a single example) and `bias` has length `out`.
    pub fn activation(
        weights: &Tensor2D,
        inputs: &Tensor2D,
        bias: &Tensor1D,
    ) -> TensorResult<Tensor2D> {
        if weights.cols != inputs.rows {
            return Err(TensorError::shape(
                "activation",
                format!("input with {} features", weights.cols),
                format!("input {} for weights {}", inputs.dims(), weights.dims()),
            ));
        }
        if bias.len() != weights.rows {
            return Err(TensorError::shape(
                "activation",
                format!("bias of length {}", weights.rows),
                bias.len(),
            ));
        }
        let mut out = weights.matmul(inputs)?;
        let n = out.cols;
        for_each_row(&mut out.data, n, |i, row| {
            let b = bias.get(i);
            for v in row.iter_mut() {
                *v += b;
            }
        });
        Ok(out)
    }
}
