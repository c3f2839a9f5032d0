//! Parameters, caches and gradient bookkeeping shared by both layer kinds.

use rand::RngCore;
use softnet_core::{Tensor1D, Tensor2D};

use crate::api::error::{NnError, NnResult};
use crate::api::layer::LayerPhase;

/// Per-layer optimization coefficients. Zero disables the mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerConfig {
    /// L2 strength λ.
    pub regularization: f64,
    /// Momentum coefficient μ.
    pub momentum: f64,
}

/// Weights `W` [out, in], bias `b` [out] and everything a dense layer caches
/// between `forward`, `backward` and `update_weights`.
#[derive(Debug, Clone)]
pub(crate) struct DenseParams {
    pub(crate) weights: Tensor2D,
    pub(crate) bias: Tensor1D,
    pub(crate) input: Option<Tensor2D>,
    pub(crate) scores: Option<Tensor2D>,
    pub(crate) grad_scores: Option<Tensor2D>,
    pub(crate) weight_grad: Option<Tensor2D>,
    pub(crate) bias_grad: Option<Tensor1D>,
    prev_weight_grad: Option<Tensor2D>,
    prev_bias_grad: Option<Tensor1D>,
    /// Regularization loss of the weights the current gradient was built on.
    pub(crate) reg_loss: f64,
    pub(crate) phase: LayerPhase,
    pub(crate) config: LayerConfig,
}

impl DenseParams {
    pub(crate) fn new(
        inputs: usize,
        outputs: usize,
        config: LayerConfig,
        rng: &mut dyn RngCore,
    ) -> NnResult<Self> {
        if inputs == 0 || outputs == 0 {
            return Err(NnError::InvalidConfig(format!(
                "layer dimensions must be positive, got {inputs} -> {outputs}"
            )));
        }
        Ok(Self {
            weights: Tensor2D::he(outputs, inputs, rng)?,
            bias: Tensor1D::zeros(outputs),
            input: None,
            scores: None,
            grad_scores: None,
            weight_grad: None,
            bias_grad: None,
            prev_weight_grad: None,
            prev_bias_grad: None,
            reg_loss: 0.0,
            phase: LayerPhase::Initialized,
            config,
        })
    }

    pub(crate) fn reinitialize(&mut self, rng: &mut dyn RngCore) -> NnResult<()> {
        self.weights = Tensor2D::he(self.weights.rows(), self.weights.cols(), rng)?;
        self.bias = Tensor1D::zeros(self.bias.len());
        self.clear_caches();
        Ok(())
    }

    pub(crate) fn set_parameters(&mut self, weights: Tensor2D, bias: Tensor1D) -> NnResult<()> {
        if weights.shape() != self.weights.shape() || bias.len() != self.bias.len() {
            return Err(NnError::InvalidConfig(format!(
                "parameter shapes {} / [{}] do not match layer {} / [{}]",
                weights.dims(),
                bias.len(),
                self.weights.dims(),
                self.bias.len()
            )));
        }
        self.weights = weights;
        self.bias = bias;
        self.clear_caches();
        Ok(())
    }

    fn clear_caches(&mut self) {
        self.input = None;
        self.scores = None;
        self.grad_scores = None;
        self.weight_grad = None;
        self.bias_grad = None;
        self.prev_weight_grad = None;
        self.prev_bias_grad = None;
        self.reg_loss = 0.0;
        self.phase = LayerPhase::Initialized;
    }

    /// `W·X + b` for this layer.
    pub(crate) fn affine(&self, input: &Tensor2D) -> NnResult<Tensor2D> {
        Ok(Tensor2D::activation(&self.weights, input, &self.bias)?)
    }

    /// Cache the input and scores of a training forward pass.
    pub(crate) fn store_forward(&mut self, input: &Tensor2D, scores: Tensor2D) -> &Tensor2D {
        self.input = Some(input.clone());
        self.grad_scores = None;
        self.phase = LayerPhase::Forwarded;
        self.scores.insert(scores)
    }

    pub(crate) fn regularization_loss(&self) -> f64 {
        if self.config.regularization == 0.0 {
            return 0.0;
        }
        0.5 * self.config.regularization * self.weights.l2_norm()
    }

    pub(crate) fn require_forward(&self, layer: &str) -> NnResult<()> {
        if self.phase == LayerPhase::Initialized || self.input.is_none() || self.scores.is_none() {
            return Err(NnError::InvalidState(format!(
                "{layer}: backward called before forward"
            )));
        }
        Ok(())
    }

    /// Build `dW`, `dB` from the gradient of this layer's scores.
    ///
    /// Momentum adds `μ` times the previously applied gradient; L2 adds
    /// `λ/2 · W`. The regularization loss is refreshed first so it describes
    /// the weights this gradient is taken at.
    pub(crate) fn accumulate_gradients(&mut self, grad_scores: Tensor2D) -> NnResult<f64> {
        self.reg_loss = self.regularization_loss();

        let input = self
            .input
            .as_ref()
            .ok_or_else(|| NnError::InvalidState("no cached input".into()))?;
        let mut weight_grad = grad_scores.matmul_transpose_b(input)?;
        let mut bias_grad = grad_scores.row_sums();

        let LayerConfig {
            regularization,
            momentum,
        } = self.config;

        if momentum > 0.0 {
            if let (Some(prev_w), Some(prev_b)) = (&self.prev_weight_grad, &self.prev_bias_grad) {
                weight_grad.add_scaled(prev_w, momentum)?;
                bias_grad.add_scaled(prev_b, momentum)?;
            }
        }
        if regularization > 0.0 {
            weight_grad.add_scaled(&self.weights, 0.5 * regularization)?;
        }

        self.weight_grad = Some(weight_grad);
        self.bias_grad = Some(bias_grad);
        self.grad_scores = Some(grad_scores);
        self.phase = LayerPhase::Backpropagated;
        Ok(self.reg_loss)
    }

    pub(crate) fn update(&mut self, learning_rate: f64, layer: &str) -> NnResult<()> {
        if self.phase != LayerPhase::Backpropagated {
            return Err(NnError::InvalidState(format!(
                "{layer}: update_weights called in phase {:?}",
                self.phase
            )));
        }
        let (Some(weight_grad), Some(bias_grad)) = (self.weight_grad.take(), self.bias_grad.take())
        else {
            return Err(NnError::InvalidState(format!("{layer}: no gradient to apply")));
        };
        self.weights.add_scaled(&weight_grad, -learning_rate)?;
        self.bias.add_scaled(&bias_grad, -learning_rate)?;

        if self.config.momentum > 0.0 {
            self.prev_weight_grad = Some(weight_grad.clone());
            self.prev_bias_grad = Some(bias_grad.clone());
        }
        self.weight_grad = Some(weight_grad);
        self.bias_grad = Some(bias_grad);
        self.phase = LayerPhase::Updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(config: LayerConfig) -> DenseParams {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = DenseParams::new(2, 1, config, &mut rng).unwrap();
        p.set_parameters(
            Tensor2D::from_vec(1, 2, vec![1.0, -2.0]).unwrap(),
            Tensor1D::zeros(1),
        )
        .unwrap();
        p
    }

    fn forward_backward(p: &mut DenseParams) {
        let x = Tensor2D::from_vec(2, 1, vec![1.0, 1.0]).unwrap();
        let s = p.affine(&x).unwrap();
        p.store_forward(&x, s);
        p.accumulate_gradients(Tensor2D::filled(1, 1, 1.0)).unwrap();
    }

    #[test]
    fn zero_dimension_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(DenseParams::new(0, 3, LayerConfig::default(), &mut rng).is_err());
    }

    #[test]
    fn plain_gradient_without_extras() {
        let mut p = params(LayerConfig::default());
        forward_backward(&mut p);
        assert_eq!(p.weight_grad.as_ref().unwrap().as_slice(), &[1.0, 1.0]);
        assert_eq!(p.bias_grad.as_ref().unwrap().as_slice(), &[1.0]);
        assert_eq!(p.reg_loss, 0.0);
    }

    #[test]
    fn regularization_adds_half_lambda_weights() {
        let mut p = params(LayerConfig {
            regularization: 0.2,
            momentum: 0.0,
        });
        forward_backward(&mut p);
        // dW = [1, 1] + 0.1 * [1, -2]
        let g = p.weight_grad.as_ref().unwrap().as_slice();
        assert!((g[0] - 1.1).abs() < 1e-12);
        assert!((g[1] - 0.8).abs() < 1e-12);
        // R = 0.1 * (1 + 4)
        assert!((p.reg_loss - 0.5).abs() < 1e-12);
    }

    #[test]
    fn momentum_carries_previous_applied_gradient() {
        let mut p = params(LayerConfig {
            regularization: 0.0,
            momentum: 0.5,
        });
        forward_backward(&mut p);
        p.update(0.0, "test").unwrap();
        forward_backward(&mut p);
        // raw [1, 1] + 0.5 * previous [1, 1]
        assert_eq!(p.weight_grad.as_ref().unwrap().as_slice(), &[1.5, 1.5]);
        assert_eq!(p.bias_grad.as_ref().unwrap().as_slice(), &[1.5]);
    }

    #[test]
    fn update_requires_backward() {
        let mut p = params(LayerConfig::default());
        assert!(matches!(p.update(0.1, "test"), Err(NnError::InvalidState(_))));
        forward_backward(&mut p);
        p.update(0.1, "test").unwrap();
        assert_eq!(p.phase, LayerPhase::Updated);
        assert!(p.update(0.1, "test").is_err());
    }
}
