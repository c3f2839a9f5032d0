use rand::RngCore;
use softnet_core::Tensor2D;

use crate::api::error::{NnError, NnResult};
use crate::api::layer::{BackwardSignal, Layer};
use crate::core::nn::hidden::ReluLayer;
use crate::core::nn::params::LayerConfig;
use crate::core::nn::softmax::{data_loss, SoftmaxLayer};

/// Ordered stack of dense layers ending in exactly one softmax output layer.
///
/// Layer `i`'s output size equals layer `i + 1`'s input size. Both are
/// checked once at construction.
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
}

impl Network {
    pub fn new(layers: Vec<Box<dyn Layer>>) -> NnResult<Self> {
        let Some(last) = layers.last() else {
            return Err(NnError::InvalidConfig("network has no layers".into()));
        };
        if !last.is_output() {
            return Err(NnError::InvalidConfig(format!(
                "last layer must be the output layer, got {}",
                last.name()
            )));
        }
        if let Some(i) = layers[..layers.len() - 1].iter().position(|l| l.is_output()) {
            return Err(NnError::InvalidConfig(format!(
                "output layer at position {i} is not last"
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(NnError::InvalidConfig(format!(
                    "layer {i} produces {} units but layer {} expects {}",
                    pair[0].output_size(),
                    i + 1,
                    pair[1].input_size()
                )));
            }
        }
        Ok(Self { layers })
    }

    /// `features -> hidden[0] -> ... -> classes`, ReLU hidden layers and a
    /// softmax output layer, weights drawn from `rng` in layer order.
    pub fn build(
        features: usize,
        hidden: &[usize],
        classes: usize,
        config: LayerConfig,
        rng: &mut dyn RngCore,
    ) -> NnResult<Self> {
        let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(hidden.len() + 1);
        let mut width = features;
        for &units in hidden {
            layers.push(Box::new(ReluLayer::new(width, units, config, rng)?));
            width = units;
        }
        layers.push(Box::new(SoftmaxLayer::new(width, classes, config, rng)?));
        Self::new(layers)
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Box<dyn Layer>] {
        &mut self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn num_classes(&self) -> usize {
        self.output().output_size()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    fn output(&self) -> &dyn Layer {
        self.layers[self.layers.len() - 1].as_ref()
    }

    /// Training forward pass without dropout. Returns the output scores.
    pub fn forward(&mut self, input: &Tensor2D) -> NnResult<&Tensor2D> {
        self.run_forward(input, 0.0, None)
    }

    /// Training forward pass; hidden layers drop units with probability
    /// `dropout` right after their own forward.
    pub fn forward_training(
        &mut self,
        input: &Tensor2D,
        dropout: f64,
        rng: &mut dyn RngCore,
    ) -> NnResult<&Tensor2D> {
        self.run_forward(input, dropout, Some(rng))
    }

    fn run_forward(
        &mut self,
        input: &Tensor2D,
        dropout: f64,
        mut rng: Option<&mut dyn RngCore>,
    ) -> NnResult<&Tensor2D> {
        for i in 0..self.layers.len() {
            let (done, rest) = self.layers.split_at_mut(i);
            let x = match done.last() {
                Some(prev) => prev.scores().ok_or_else(|| {
                    NnError::InvalidState(format!("layer {} produced no scores", i - 1))
                })?,
                None => input,
            };
            let layer = &mut rest[0];
            layer.forward(x)?;
            if !layer.is_output() && dropout > 0.0 {
                if let Some(rng) = rng.as_deref_mut() {
                    layer.dropout(dropout, rng);
                }
            }
        }
        self.output()
            .scores()
            .ok_or_else(|| NnError::InvalidState("output layer produced no scores".into()))
    }

    /// Side-effect free forward pass returning the output scores.
    pub fn predict(&self, input: &Tensor2D) -> NnResult<Tensor2D> {
        let mut layers = self.layers.iter();
        let mut scores = match layers.next() {
            Some(first) => first.predict(input)?,
            None => return Err(NnError::InvalidState("network has no layers".into())),
        };
        for layer in layers {
            scores = layer.predict(&scores)?;
        }
        Ok(scores)
    }

    /// Mean cross-entropy of `predict(input)` plus every layer's
    /// regularization loss. Touches no cached state.
    pub fn evaluate_loss(&self, input: &Tensor2D, labels: &[usize]) -> NnResult<f64> {
        let (loss, _) = data_loss(self.predict(input)?, labels)?;
        let reg: f64 = self.layers.iter().map(|l| l.regularization_loss()).sum();
        Ok(loss + reg)
    }

    /// Gradient half of a training step: output layer first, then hidden
    /// layers in reverse, each fed the following layer's weights and score
    /// gradient. Returns data loss plus all regularization terms.
    pub fn compute_gradients(&mut self, labels: &[usize]) -> NnResult<f64> {
        let n = self.layers.len();
        let mut loss = self.layers[n - 1].backward(BackwardSignal::Labels(labels))?;
        for i in (0..n - 1).rev() {
            let (head, tail) = self.layers.split_at_mut(i + 1);
            let next = &tail[0];
            let grad = next.grad_scores().ok_or_else(|| {
                NnError::InvalidState(format!("layer {} has no score gradient", i + 1))
            })?;
            loss += head[i].backward(BackwardSignal::Upstream {
                weights: next.weights(),
                grad,
            })?;
        }
        Ok(loss)
    }

    pub fn update_weights(&mut self, learning_rate: f64) -> NnResult<()> {
        for layer in &mut self.layers {
            layer.update_weights(learning_rate)?;
        }
        Ok(())
    }

    /// `compute_gradients` followed by `update_weights`.
    pub fn backward(&mut self, labels: &[usize], learning_rate: f64) -> NnResult<f64> {
        let loss = self.compute_gradients(labels)?;
        self.update_weights(learning_rate)?;
        Ok(loss)
    }

    /// Argmax of column `i` of the output scores from the last `forward`.
    pub fn classify(&self, i: usize) -> NnResult<usize> {
        self.output().classify(i)
    }

    pub fn reinitialize(&mut self, rng: &mut dyn RngCore) -> NnResult<()> {
        for layer in &mut self.layers {
            layer.reinitialize(rng)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shapes: Vec<String> = self
            .layers
            .iter()
            .map(|l| format!("{}({} -> {})", l.name(), l.input_size(), l.output_size()))
            .collect();
        f.debug_struct("Network").field("layers", &shapes).finish()
    }
}
