pub mod hidden;
pub mod network;
pub(crate) mod params;
pub mod softmax;
