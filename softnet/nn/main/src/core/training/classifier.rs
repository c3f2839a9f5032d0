use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use softnet_core::{Tensor2D, TensorError};

use crate::api::error::{NnError, NnResult};
use crate::api::sink::TrainingLog;
use crate::core::config::settings::{Architecture, Settings};
use crate::core::nn::network::Network;

/// Why [`Classifier::train`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ran the configured number of epochs.
    EpochsExhausted,
    /// Two consecutive losses were within the stop threshold.
    Converged,
    /// The loss became NaN or infinite.
    Diverged,
}

#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub iterations: usize,
    pub final_loss: f64,
    /// Loss returned by every `iterate` call, in order.
    pub losses: Vec<f64>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// A network together with its training set, hyperparameters and random
/// generator.
///
/// Every source of randomness (weight init, shuffling, dropout) draws from
/// the one `StdRng` seeded from `Settings::seed`, so two classifiers built
/// from the same inputs end up with bit-identical weights.
pub struct Classifier {
    inputs: Tensor2D,
    labels: Vec<usize>,
    settings: Settings,
    architecture: Architecture,
    network: Network,
    rng: StdRng,
    learning_rate: f64,
    iteration: usize,
    order: Vec<usize>,
    eval_scores: Option<Tensor2D>,
}

impl Classifier {
    /// `inputs` is [features, examples]; `labels[i]` is the class of column
    /// `i`. The class count is `max(labels) + 1`.
    pub fn new(
        inputs: Tensor2D,
        labels: Vec<usize>,
        settings: Settings,
        architecture: Architecture,
    ) -> NnResult<Self> {
        let classes = labels.iter().max().map_or(0, |&m| m + 1);
        Self::new_with_classes(inputs, labels, classes, settings, architecture)
    }

    /// Like [`Classifier::new`] with an explicit class count, for training
    /// sets that do not contain every class (cross-validation folds).
    pub fn new_with_classes(
        inputs: Tensor2D,
        labels: Vec<usize>,
        classes: usize,
        settings: Settings,
        architecture: Architecture,
    ) -> NnResult<Self> {
        settings.validate()?;
        architecture.validate()?;
        if inputs.cols() == 0 || inputs.rows() == 0 {
            return Err(NnError::InvalidConfig(format!(
                "training set must have at least one feature and one example, got {}",
                inputs.dims()
            )));
        }
        if labels.len() != inputs.cols() {
            return Err(NnError::InvalidConfig(format!(
                "{} labels for {} examples",
                labels.len(),
                inputs.cols()
            )));
        }
        if let Some((example, &label)) = labels.iter().enumerate().find(|(_, &y)| y >= classes) {
            return Err(TensorError::InvalidLabel {
                example,
                label,
                classes,
            }
            .into());
        }

        let mut rng = StdRng::seed_from_u64(settings.seed);
        let network = Network::build(
            inputs.rows(),
            architecture.hidden_sizes(),
            classes,
            settings.layer_config(),
            &mut rng,
        )?;
        log::debug!(
            "classifier: {} features, {} examples, {} classes, {:?}",
            inputs.rows(),
            inputs.cols(),
            classes,
            network
        );

        let order = (0..inputs.cols()).collect();
        Ok(Self {
            learning_rate: settings.learning_rate,
            inputs,
            labels,
            settings,
            architecture,
            network,
            rng,
            iteration: 0,
            order,
            eval_scores: None,
        })
    }

    /// Reseed the generator, redraw every weight and reset the learning rate
    /// and iteration counter.
    pub fn reinitialize(&mut self) -> NnResult<()> {
        self.rng = StdRng::seed_from_u64(self.settings.seed);
        self.network.reinitialize(&mut self.rng)?;
        self.learning_rate = self.settings.learning_rate;
        self.iteration = 0;
        self.order = (0..self.inputs.cols()).collect();
        self.eval_scores = None;
        Ok(())
    }

    /// One optimization step. Returns the training loss, data plus
    /// regularization.
    ///
    /// With `batch_size == 0` this is a single full-batch step and the loss
    /// is the one computed during that step. Otherwise every consecutive
    /// mini-batch gets its own step, and the loss is measured afterwards on
    /// the full training set.
    pub fn iterate(&mut self) -> NnResult<f64> {
        let dropout = self.settings.dropout;
        let batch_size = self.settings.batch_size;

        let loss = if batch_size == 0 {
            self.network
                .forward_training(&self.inputs, dropout, &mut self.rng)?;
            self.network.backward(&self.labels, self.learning_rate)?
        } else {
            if self.settings.shuffle {
                self.order.shuffle(&mut self.rng);
            }
            for (b, chunk) in self.order.chunks(batch_size).enumerate() {
                let started = Instant::now();
                let x = self.inputs.select_columns(chunk)?;
                let y: Vec<usize> = chunk.iter().map(|&i| self.labels[i]).collect();
                self.network.forward_training(&x, dropout, &mut self.rng)?;
                self.network.backward(&y, self.learning_rate)?;
                log::trace!("batch {b}: {} examples in {:?}", y.len(), started.elapsed());
            }
            self.network.evaluate_loss(&self.inputs, &self.labels)?
        };

        let decay = self.settings.learning_rate_decay;
        if decay > 0.0 {
            self.learning_rate = (self.learning_rate - decay).max(0.0);
        }
        self.iteration += 1;
        log::debug!(
            "iteration {}: loss {loss:.6}, learning rate {:.6}",
            self.iteration,
            self.learning_rate
        );
        Ok(loss)
    }

    /// Reinitialize, then iterate until the epoch count is reached, the loss
    /// stops moving or the loss diverges.
    pub fn train(&mut self, sink: &mut dyn TrainingLog) -> NnResult<TrainSummary> {
        self.reinitialize()?;
        let started = Instant::now();
        let epochs = self.settings.epochs;
        let threshold = self.settings.stop_threshold;
        let log_every = self.settings.log_every;
        log::info!(
            "training {} parameters on {} examples for up to {epochs} epochs",
            self.network.parameter_count(),
            self.inputs.cols()
        );

        let mut losses: Vec<f64> = Vec::with_capacity(epochs);
        let mut stop_reason = StopReason::EpochsExhausted;
        while !self.is_done() {
            let loss = self.iterate()?;
            let index = losses.len();
            let previous = losses.last().copied();
            losses.push(loss);

            if !loss.is_finite() {
                let msg = format!(
                    "iteration {}: loss is {loss}, training stopped",
                    self.iteration
                );
                log::warn!("{msg}");
                sink.append_error(&msg);
                stop_reason = StopReason::Diverged;
                break;
            }
            if log_every > 0 && self.iteration % log_every == 0 {
                sink.append_text(&format!("iteration {}: loss {loss:.6}", self.iteration));
            }
            if threshold > 0.0 && index > 2 {
                if let Some(prev) = previous {
                    if (prev - loss).abs() <= threshold {
                        sink.append_text(&format!(
                            "iteration {}: converged, loss {loss:.6}",
                            self.iteration
                        ));
                        stop_reason = StopReason::Converged;
                        break;
                    }
                }
            }
        }

        let summary = TrainSummary {
            iterations: self.iteration,
            final_loss: losses.last().copied().unwrap_or(f64::NAN),
            losses,
            stop_reason,
            elapsed: started.elapsed(),
        };
        log::info!(
            "training finished after {} iterations ({:?}): loss {:.6} in {:?}",
            summary.iterations,
            summary.stop_reason,
            summary.final_loss,
            summary.elapsed
        );
        Ok(summary)
    }

    pub fn is_done(&self) -> bool {
        self.iteration >= self.settings.epochs
    }

    /// Score external inputs without touching the training caches. The
    /// scores are kept for [`Classifier::classify`].
    pub fn activation(&mut self, inputs: &Tensor2D) -> NnResult<&Tensor2D> {
        let scores = self.network.predict(inputs)?;
        Ok(&*self.eval_scores.insert(scores))
    }

    /// Predicted class of column `i` of the last [`Classifier::activation`]
    /// input.
    pub fn classify(&self, i: usize) -> NnResult<usize> {
        let scores = self
            .eval_scores
            .as_ref()
            .ok_or_else(|| NnError::InvalidState("classify called before activation".into()))?;
        Ok(scores.argmax_column(i)?)
    }

    /// Predicted class of every column of `inputs`.
    pub fn classify_all(&mut self, inputs: &Tensor2D) -> NnResult<Vec<usize>> {
        let n = self.activation(inputs)?.cols();
        (0..n).map(|i| self.classify(i)).collect()
    }

    /// Fraction of `inputs` columns classified as `labels`.
    pub fn accuracy(&mut self, inputs: &Tensor2D, labels: &[usize]) -> NnResult<f64> {
        if labels.len() != inputs.cols() {
            return Err(NnError::InvalidConfig(format!(
                "{} labels for {} examples",
                labels.len(),
                inputs.cols()
            )));
        }
        if labels.is_empty() {
            return Ok(0.0);
        }
        let predicted = self.classify_all(inputs)?;
        let correct = predicted.iter().zip(labels).filter(|(p, y)| p == y).count();
        Ok(correct as f64 / labels.len() as f64)
    }

    pub fn training_accuracy(&mut self) -> NnResult<f64> {
        let inputs = self.inputs.clone();
        let labels = self.labels.clone();
        self.accuracy(&inputs, &labels)
    }

    /// Data plus regularization loss on the training set at the current
    /// weights.
    pub fn training_loss(&self) -> NnResult<f64> {
        self.network.evaluate_loss(&self.inputs, &self.labels)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn num_features(&self) -> usize {
        self.inputs.rows()
    }

    pub fn num_classes(&self) -> usize {
        self.network.num_classes()
    }

    pub fn inputs(&self) -> &Tensor2D {
        &self.inputs
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}
