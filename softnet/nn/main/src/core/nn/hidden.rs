use rand::{Rng, RngCore};
use softnet_core::{Tensor1D, Tensor2D};

use crate::api::error::{NnError, NnResult};
use crate::api::layer::{BackwardSignal, Layer, LayerPhase};
use crate::core::nn::params::{DenseParams, LayerConfig};

/// Hidden layer: `relu(W·X + b)`.
#[derive(Debug, Clone)]
pub struct ReluLayer {
    params: DenseParams,
}

impl ReluLayer {
    pub fn new(
        inputs: usize,
        outputs: usize,
        config: LayerConfig,
        rng: &mut dyn RngCore,
    ) -> NnResult<Self> {
        Ok(Self {
            params: DenseParams::new(inputs, outputs, config, rng)?,
        })
    }
}

impl Layer for ReluLayer {
    fn forward(&mut self, input: &Tensor2D) -> NnResult<&Tensor2D> {
        let scores = self.predict(input)?;
        Ok(self.params.store_forward(input, scores))
    }

    fn predict(&self, input: &Tensor2D) -> NnResult<Tensor2D> {
        let mut scores = self.params.affine(input)?;
        scores.map_in_place(|v| v.max(0.0));
        Ok(scores)
    }

    /// Zero each unit's entire output row with probability `probability`.
    /// Dropped units produce no gradient because their scores are 0.
    fn dropout(&mut self, probability: f64, rng: &mut dyn RngCore) {
        if probability <= 0.0 {
            return;
        }
        let Some(scores) = self.params.scores.as_mut() else {
            return;
        };
        let mut dropped = 0;
        for unit in 0..scores.rows() {
            if rng.gen::<f64>() < probability {
                scores.row_mut(unit).fill(0.0);
                dropped += 1;
            }
        }
        log::trace!("dropout p={probability}: {dropped}/{} units dropped", scores.rows());
    }

    fn backward(&mut self, signal: BackwardSignal<'_>) -> NnResult<f64> {
        let BackwardSignal::Upstream { weights, grad } = signal else {
            return Err(NnError::InvalidState(
                "relu layer expects the following layer's gradient, got labels".into(),
            ));
        };
        self.params.require_forward("relu")?;

        let mut hidden_grad = weights.matmul_transpose_a(grad)?;
        if let Some(scores) = self.params.scores.as_ref() {
            hidden_grad.relu_mask_zero(scores)?;
        }
        self.params.accumulate_gradients(hidden_grad)
    }

    fn update_weights(&mut self, learning_rate: f64) -> NnResult<()> {
        self.params.update(learning_rate, "relu")
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

    fn regularization_loss(&self) -> f64 {
        self.params.regularization_loss()
    }

    fn phase(&self) -> LayerPhase {
        self.params.phase
    }

    fn is_output(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "relu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer() -> ReluLayer {
        let mut rng = StdRng::seed_from_u64(5);
        let mut l = ReluLayer::new(2, 2, LayerConfig::default(), &mut rng).unwrap();
        l.set_parameters(
            Tensor2D::from_vec(2, 2, vec![1.0, 1.0, -1.0, -1.0]).unwrap(),
            Tensor1D::zeros(2),
        )
        .unwrap();
        l
    }

    #[test]
    fn forward_clamps_negatives() {
        let mut l = layer();
        let x = Tensor2D::from_vec(2, 2, vec![1.0, -1.0, 2.0, -2.0]).unwrap();
        let s = l.forward(&x).unwrap();
        assert_eq!(s.as_slice(), &[3.0, 0.0, 0.0, 3.0]);
        assert_eq!(l.phase(), LayerPhase::Forwarded);
    }

    #[test]
    fn backward_masks_inactive_units() {
        let mut l = layer();
        let x = Tensor2D::from_vec(2, 2, vec![1.0, -1.0, 2.0, -2.0]).unwrap();
        l.forward(&x).unwrap();

        let next_w = Tensor2D::from_vec(1, 2, vec![1.0, 1.0]).unwrap();
        let next_g = Tensor2D::from_vec(1, 2, vec![1.0, 1.0]).unwrap();
        let reg = l
            .backward(BackwardSignal::Upstream {
                weights: &next_w,
                grad: &next_g,
            })
            .unwrap();
        assert_eq!(reg, 0.0);
        // Unit 0 active only for example 0, unit 1 only for example 1.
        let g = l.grad_scores().unwrap();
        assert_eq!(g.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
        // dW = dH · X^T
        assert_eq!(l.weight_grad().unwrap().as_slice(), &[1.0, 2.0, -1.0, -2.0]);
        assert_eq!(l.bias_grad().unwrap().as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn backward_before_forward_is_error() {
        let mut l = layer();
        let w = Tensor2D::zeros(1, 2);
        let g = Tensor2D::zeros(1, 1);
        assert!(matches!(
            l.backward(BackwardSignal::Upstream { weights: &w, grad: &g }),
            Err(NnError::InvalidState(_))
        ));
    }

    #[test]
    fn labels_signal_is_rejected() {
        let mut l = layer();
        let x = Tensor2D::zeros(2, 1);
        l.forward(&x).unwrap();
        assert!(l.backward(BackwardSignal::Labels(&[0])).is_err());
    }

    #[test]
    fn hidden_layer_has_no_classes() {
        let mut l = layer();
        l.forward(&Tensor2D::zeros(2, 1)).unwrap();
        assert!(matches!(l.classify(0), Err(NnError::InvalidState(_))));
    }

    #[test]
    fn dropout_zero_is_identity() {
        let mut l = layer();
        let x = Tensor2D::from_vec(2, 2, vec![1.0, -1.0, 2.0, -2.0]).unwrap();
        let before = l.forward(&x).unwrap().clone();
        let mut rng = StdRng::seed_from_u64(9);
        l.dropout(0.0, &mut rng);
        assert_eq!(l.scores().unwrap(), &before);
    }

    #[test]
    fn dropout_zeroes_whole_rows() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut l = ReluLayer::new(3, 64, LayerConfig::default(), &mut rng).unwrap();
        let x = Tensor2D::filled(3, 5, 1.0);
        let before = l.forward(&x).unwrap().clone();
        l.dropout(0.5, &mut rng);
        let after = l.scores().unwrap();

        let active: Vec<usize> = (0..64).filter(|&r| before.row(r)[0] > 0.0).collect();
        let dropped = active
            .iter()
            .filter(|&&r| after.row(r).iter().all(|&v| v == 0.0))
            .count();
        assert!(active.len() > 4, "too few active units");
        assert!(dropped > 0 && dropped < active.len(), "{dropped} of {} dropped", active.len());
        for &r in &active {
            let row = after.row(r);
            let untouched = row == before.row(r);
            let zeroed = row.iter().all(|&v| v == 0.0);
            assert!(untouched || zeroed, "row {r} partially dropped");
        }
    }
}
