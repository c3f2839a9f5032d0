//! Public facade: everything a caller needs, re-exported flat.

// API traits and types
pub use crate::api::error::{NnError, NnResult};
pub use crate::api::layer::{BackwardSignal, Layer, LayerPhase};
pub use crate::api::sink::TrainingLog;

// Layers and networks
pub use crate::core::nn::hidden::ReluLayer;
pub use crate::core::nn::network::Network;
pub use crate::core::nn::params::LayerConfig;
pub use crate::core::nn::softmax::SoftmaxLayer;

// Configuration
pub use crate::core::config::settings::{Architecture, Settings};

// Training
pub use crate::core::training::classifier::{Classifier, StopReason, TrainSummary};
pub use crate::core::training::cross_validation::{cross_validate, CrossValidation};
pub use crate::core::training::metrics::ClassificationMetrics;
pub use crate::core::training::sinks::{BufferLog, LogLine, LogSink, NullLog};
pub use crate::core::training::summary::network_summary;

// Serialization
pub use crate::core::checkpoint::{load_checkpoint, save_checkpoint, Checkpoint, SavedLayer};

// Toy datasets
pub use crate::core::data as datasets;
pub use crate::core::data::LabeledData;
