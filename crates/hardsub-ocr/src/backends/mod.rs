#[cfg(feature = "engine-command")]
pub mod command;

#[cfg(feature = "engine-onnx")]
pub mod onnx;
