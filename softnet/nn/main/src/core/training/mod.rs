pub mod classifier;
pub mod cross_validation;
pub mod metrics;
pub mod sinks;
pub mod summary;
