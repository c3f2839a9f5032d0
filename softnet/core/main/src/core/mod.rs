pub mod init;
pub mod ops;
pub mod runtime;
pub mod softmax;
pub mod tensor1d;
pub mod tensor2d;
