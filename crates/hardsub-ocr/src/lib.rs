mod backends;
mod engine;
mod error;
mod plane;
mod request;

#[cfg(feature = "engine-command")]
pub use backends::command::CommandOcrEngine;
#[cfg(feature = "engine-onnx")]
pub use backends::onnx::OnnxOcrEngine;
pub use engine::{NoopOcrEngine, OcrEngine};
pub use error::OcrError;
pub use hardsub_types::{OcrRegion, OcrResponse, OcrText};
pub use plane::LumaPlane;
pub use request::OcrRequest;
