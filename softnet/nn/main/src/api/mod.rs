pub mod error;
pub mod layer;
pub mod sink;
