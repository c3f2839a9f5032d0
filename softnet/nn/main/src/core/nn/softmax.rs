use rand::RngCore;
use softnet_core::{Tensor1D, Tensor2D};

use crate::api::error::{NnError, NnResult};
use crate::api::layer::{BackwardSignal, Layer, LayerPhase};
use crate::core::nn::params::{DenseParams, LayerConfig};

/// Output layer: affine scores, softmax probabilities and mean
/// cross-entropy loss.
#[derive(Debug, Clone)]
pub struct SoftmaxLayer {
    params: DenseParams,
}

impl SoftmaxLayer {
    pub fn new(
        inputs: usize,
        classes: usize,
        config: LayerConfig,
        rng: &mut dyn RngCore,
    ) -> NnResult<Self> {
        Ok(Self {
            params: DenseParams::new(inputs, classes, config, rng)?,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.params.weights.rows()
    }
}

/// Mean cross-entropy of `scores` against `labels`. `scores` is consumed and
/// turned into probabilities.
pub(crate) fn data_loss(mut scores: Tensor2D, labels: &[usize]) -> NnResult<(f64, Tensor2D)> {
    scores.shift_and_exp_and_normalize();
    let loss = scores.cross_entropy_loss(labels)?.mean();
    Ok((loss, scores))
}

impl Layer for SoftmaxLayer {
    fn forward(&mut self, input: &Tensor2D) -> NnResult<&Tensor2D> {
        let scores = self.predict(input)?;
        Ok(self.params.store_forward(input, scores))
    }

    fn predict(&self, input: &Tensor2D) -> NnResult<Tensor2D> {
        self.params.affine(input)
    }

    fn backward(&mut self, signal: BackwardSignal<'_>) -> NnResult<f64> {
        let BackwardSignal::Labels(labels) = signal else {
            return Err(NnError::InvalidState(
                "softmax layer expects labels, got an upstream gradient".into(),
            ));
        };
        self.params.require_forward("softmax")?;
        let scores = self
            .params
            .scores
            .clone()
            .ok_or_else(|| NnError::InvalidState("softmax: no cached scores".into()))?;

        let (loss, mut probs) = data_loss(scores, labels)?;
        probs.softmax_grad_in_place(labels)?;
        let reg_loss = self.params.accumulate_gradients(probs)?;
        Ok(loss + reg_loss)
    }

    fn update_weights(&mut self, learning_rate: f64) -> NnResult<()> {
        self.params.update(learning_rate, "softmax")
    }

    fn reinitialize(&mut self, rng: &mut dyn RngCore) -> NnResult<()> {
        self.params.reinitialize(rng)
    }

    fn set_parameters(&mut self, weights: Tensor2D, bias: Tensor1D) -> NnResult<()> {
        self.params.set_parameters(weights, bias)
    }

    fn weights(&self) -> &Tensor2D {
        &self.params.weights
    }

    fn bias(&self) -> &Tensor1D {
        &self.params.bias
    }

    fn weight_grad(&self) -> Option<&Tensor2D> {
        self.params.weight_grad.as_ref()
    }

    fn bias_grad(&self) -> Option<&Tensor1D> {
        self.params.bias_grad.as_ref()
    }

    fn scores(&self) -> Option<&Tensor2D> {
        self.params.scores.as_ref()
    }

    fn grad_scores(&self) -> Option<&Tensor2D> {
        self.params.grad_scores.as_ref()
    }

    /// The argmax of the raw scores equals the argmax of the probabilities.
    fn classify(&self, i: usize) -> NnResult<usize> {
        let scores = self
            .params
            .scores
            .as_ref()
            .ok_or_else(|| {
                NnError::InvalidState("softmax: classify called before forward".into())
            })?;
        Ok(scores.argmax_column(i)?)
    }

    fn regularization_loss(&self) -> f64 {
        self.params.regularization_loss()
    }

    fn phase(&self) -> LayerPhase {
        self.params.phase
    }

    fn is_output(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "softmax"
    }
}
