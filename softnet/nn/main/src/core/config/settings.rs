use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::error::{NnError, NnResult};
use crate::core::nn::params::LayerConfig;

/// Training hyperparameters. A value of 0 switches the matching mechanism
/// off: no decay, no regularization, no momentum, no dropout, full-batch
/// steps, no early stopping, no progress lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Initial step size η.
    pub learning_rate: f64,
    /// Subtracted from η after every iteration, floored at 0.
    pub learning_rate_decay: f64,
    /// L2 strength λ.
    pub regularization: f64,
    /// Momentum coefficient μ.
    pub momentum: f64,
    /// Probability of dropping a hidden unit during training.
    pub dropout: f64,
    /// Examples per mini-batch. 0 trains on the full set.
    pub batch_size: usize,
    /// Iterations `train` runs at most.
    pub epochs: usize,
    /// `train` stops once two consecutive losses differ by at most this.
    pub stop_threshold: f64,
    pub seed: u64,
    /// Emit a progress line every this many iterations.
    pub log_every: usize,
    /// Reshuffle the example order before every epoch of mini-batches.
    pub shuffle: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            learning_rate_decay: 0.0,
            regularization: 0.001,
            momentum: 0.0,
            dropout: 0.0,
            batch_size: 0,
            epochs: 100,
            stop_threshold: 0.0,
            seed: 42,
            log_every: 10,
            shuffle: false,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON object. Missing fields take their default.
    pub fn from_json_str(json: &str) -> NnResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> NnResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let settings: Settings = serde_json::from_reader(reader)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> NnResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> NnResult<()> {
        fn non_negative(name: &str, v: f64) -> NnResult<()> {
            if !v.is_finite() || v < 0.0 {
                return Err(NnError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {v}"
                )));
            }
            Ok(())
        }

        non_negative("learning_rate", self.learning_rate)?;
        non_negative("learning_rate_decay", self.learning_rate_decay)?;
        non_negative("regularization", self.regularization)?;
        non_negative("momentum", self.momentum)?;
        non_negative("stop_threshold", self.stop_threshold)?;
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(NnError::InvalidConfig(format!(
                "dropout must lie in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.epochs == 0 {
            return Err(NnError::InvalidConfig("epochs must be positive".into()));
        }
        Ok(())
    }

    pub fn layer_config(&self) -> LayerConfig {
        LayerConfig {
            regularization: self.regularization,
            momentum: self.momentum,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_learning_rate_decay(mut self, decay: f64) -> Self {
        self.learning_rate_decay = decay;
        self
    }

    pub fn with_regularization(mut self, lambda: f64) -> Self {
        self.regularization = lambda;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout = probability;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_stop_threshold(mut self, threshold: f64) -> Self {
        self.stop_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_log_every(mut self, every: usize) -> Self {
        self.log_every = every;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

/// Layer stack shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Architecture {
    /// A single softmax layer on the raw features.
    #[default]
    Softmax,
    /// ReLU hidden layers of the given widths, then the softmax layer.
    NeuralNet { hidden: Vec<usize> },
}

impl Architecture {
    pub fn neural_net(hidden: Vec<usize>) -> Self {
        Architecture::NeuralNet { hidden }
    }

    pub fn hidden_sizes(&self) -> &[usize] {
        match self {
            Architecture::Softmax => &[],
            Architecture::NeuralNet { hidden } => hidden.as_slice(),
        }
    }

    pub fn validate(&self) -> NnResult<()> {
        if let Architecture::NeuralNet { hidden } = self {
            if hidden.is_empty() {
                return Err(NnError::InvalidConfig(
                    "neural_net architecture needs at least one hidden layer".into(),
                ));
            }
            if let Some(i) = hidden.iter().position(|&h| h == 0) {
                return Err(NnError::InvalidConfig(format!("hidden layer {i} has zero units")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
        Architecture::default().validate().unwrap();
    }

    #[test]
    fn missing_fields_take_defaults() {
        let s = Settings::from_json_str(r#"{"learning_rate": 0.5, "batch_size": 16}"#).unwrap();
        assert_eq!(s.learning_rate, 0.5);
        assert_eq!(s.batch_size, 16);
        assert_eq!(s.epochs, Settings::default().epochs);
    }

    #[test]
    fn json_round_trip() {
        let s = Settings::default().with_momentum(0.9).with_shuffle(true);
        let back = Settings::from_json_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            Settings::from_json_str("{not json"),
            Err(NnError::ConfigParse(_))
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let bad = [
            Settings::default().with_learning_rate(-0.1),
            Settings::default().with_regularization(f64::NAN),
            Settings::default().with_momentum(f64::INFINITY),
            Settings::default().with_dropout(1.0),
            Settings::default().with_dropout(-0.2),
            Settings::default().with_epochs(0),
        ];
        for s in bad {
            assert!(matches!(s.validate(), Err(NnError::InvalidConfig(_))), "{s:?}");
        }
    }

    #[test]
    fn architecture_json_shape() {
        let a: Architecture =
            serde_json::from_str(r#"{"kind": "neural_net", "hidden": [8, 4]}"#).unwrap();
        assert_eq!(a.hidden_sizes(), &[8, 4]);
        let s: Architecture = serde_json::from_str(r#"{"kind": "softmax"}"#).unwrap();
        assert!(s.hidden_sizes().is_empty());
    }

    #[test]
    fn empty_hidden_list_rejected() {
        assert!(Architecture::neural_net(vec![]).validate().is_err());
        assert!(Architecture::neural_net(vec![4, 0]).validate().is_err());
        Architecture::neural_net(vec![4]).validate().unwrap();
    }
}
