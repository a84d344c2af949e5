pub mod ocr;
pub mod progress;
pub mod writer;
