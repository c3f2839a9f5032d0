//! # softnet nn
//!
//! Stacked feed-forward classifiers trained by mini-batch gradient descent.
//!
//! A [`Network`] is zero or more ReLU hidden layers followed by exactly one
//! softmax output layer. A [`Classifier`] owns a network, the training data,
//! the hyperparameters and a seeded generator, and drives the training loop:
//! batching, momentum, L2 regularization, learning-rate decay, early stopping
//! and divergence detection.
//!
//! ## Example
//!
//! ```rust
//! use softnet_nn::{datasets, Architecture, BufferLog, Classifier, Settings};
//!
//! let data = datasets::xor();
//! let settings = Settings::default()
//!     .with_learning_rate(0.1)
//!     .with_regularization(0.0)
//!     .with_epochs(50);
//! let architecture = Architecture::neural_net(vec![8]);
//! let mut classifier =
//!     Classifier::new(data.inputs.clone(), data.labels.clone(), settings, architecture).unwrap();
//!
//! let mut log = BufferLog::new();
//! let summary = classifier.train(&mut log).unwrap();
//! assert!(summary.iterations > 0);
//! ```

pub mod api;
mod core;
mod saf;

pub use saf::*;
