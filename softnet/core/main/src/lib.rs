//! # softnet core
//!
//! Dense `f64` tensor algebra for the softnet classifier engine.
//!
//! Two containers are provided: [`Tensor1D`] for bias vectors and per-example
//! losses, and [`Tensor2D`] for weights and data. Data tensors are laid out
//! features × examples, so every example is one column.
//!
//! ## Features
//!
//! - Matrix products with transposed-operand variants (no explicit transposes)
//! - Affine activation `W·X + b` with column broadcast of the bias
//! - Numerically stable column-wise softmax, cross-entropy and its gradient
//! - Seeded uniform / Gaussian initialization
//! - Row-parallel kernels via rayon above a configurable size threshold
//!
//! ## Example
//!
//! ```rust
//! use softnet_core::{Tensor1D, Tensor2D};
//!
//! let w = Tensor2D::from_vec(2, 3, vec![1.0, 0.0, 2.0, 0.0, 1.0, -1.0]).unwrap();
//! let x = Tensor2D::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
//! let b = Tensor1D::from_vec(vec![0.5, -0.5]);
//! let s = Tensor2D::activation(&w, &x, &b).unwrap();
//! assert_eq!(s.shape(), (2, 1));
//! assert_eq!(s.get(0, 0), 7.5);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
