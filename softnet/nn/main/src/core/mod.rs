pub mod checkpoint;
pub mod config;
pub mod data;
pub mod nn;
pub mod training;
