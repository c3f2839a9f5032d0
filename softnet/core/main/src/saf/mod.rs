//! Facade re-exports for softnet-core

pub use crate::api::error::*;
pub use crate::api::types::*;
pub use crate::core::runtime::RuntimeConfig;
pub use crate::core::tensor1d::Tensor1D;
pub use crate::core::tensor2d::Tensor2D;
pub use crate::core::init::he_stddev;
