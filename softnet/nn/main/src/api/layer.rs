use rand::RngCore;
use softnet_core::{Tensor1D, Tensor2D};

use crate::api::error::{NnError, NnResult};

/// Gradient source handed to [`Layer::backward`].
#[derive(Debug, Clone, Copy)]
pub enum BackwardSignal<'a> {
    /// True class per example. Consumed by the output layer.
    Labels(&'a [usize]),
    /// Weights and score gradient of the following layer. Consumed by hidden
    /// layers.
    Upstream {
        weights: &'a Tensor2D,
        grad: &'a Tensor2D,
    },
}

/// Where a layer is in its training cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPhase {
    /// Weights initialized, nothing cached yet.
    Initialized,
    /// Input and scores cached by `forward`.
    Forwarded,
    /// Gradients computed by `backward`.
    Backpropagated,
    /// Gradients applied by `update_weights`.
    Updated,
}

/// One dense layer of a [`Network`](crate::Network).
///
/// Hidden (ReLU) and output (softmax) layers differ only in their
/// nonlinearity and in the gradient they consume, so the network drives both
/// through this one trait.
pub trait Layer {
    /// Training forward pass. Caches the input and the scores.
    fn forward(&mut self, input: &Tensor2D) -> NnResult<&Tensor2D>;

    /// Evaluation forward pass. Touches no cached state.
    fn predict(&self, input: &Tensor2D) -> NnResult<Tensor2D>;

    /// Compute and store the parameter gradients. Returns this layer's loss
    /// contribution: data + regularization loss for the output layer, the
    /// regularization loss alone for a hidden layer.
    fn backward(&mut self, signal: BackwardSignal<'_>) -> NnResult<f64>;

    /// `W -= η·dW`, `b -= η·dB`.
    fn update_weights(&mut self, learning_rate: f64) -> NnResult<()>;

    /// Zero whole output units with the given probability. No-op for layers
    /// without dropout.
    fn dropout(&mut self, _probability: f64, _rng: &mut dyn RngCore) {}

    /// Draw fresh weights, zero the bias and drop every cache.
    fn reinitialize(&mut self, rng: &mut dyn RngCore) -> NnResult<()>;

    /// Replace weights and bias (checkpoint restore). Shapes must match.
    fn set_parameters(&mut self, weights: Tensor2D, bias: Tensor1D) -> NnResult<()>;

    fn weights(&self) -> &Tensor2D;
    fn bias(&self) -> &Tensor1D;
    fn weight_grad(&self) -> Option<&Tensor2D>;
    fn bias_grad(&self) -> Option<&Tensor1D>;

    /// Scores from the last `forward`.
    fn scores(&self) -> Option<&Tensor2D>;

    /// Gradient of the loss with respect to this layer's scores, from the
    /// last `backward`.
    fn grad_scores(&self) -> Option<&Tensor2D>;

    /// Predicted class of example `i` from the last `forward`. Only the
    /// output layer produces classes.
    fn classify(&self, _i: usize) -> NnResult<usize> {
        Err(NnError::InvalidState(format!("{} layer has no class output", self.name())))
    }

    /// `λ/2 · Σ W²` for the current weights.
    fn regularization_loss(&self) -> f64;

    fn phase(&self) -> LayerPhase;
    fn is_output(&self) -> bool;
    fn name(&self) -> &str;

    fn input_size(&self) -> usize {
        self.weights().cols()
    }

    fn output_size(&self) -> usize {
        self.weights().rows()
    }

    fn parameter_count(&self) -> usize {
        self.weights().numel() + self.bias().len()
    }
}
