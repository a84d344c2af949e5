use hardsub_ocr::OcrError;
use hardsub_text::TextError;
use hardsub_video::VideoError;
use thiserror::Error;

use crate::settings::ConfigError;
use crate::stage::ocr::OcrStageError;
use crate::stage::writer::WriterError;

/// Any fatal condition of a run. Each variant names the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create a temporary directory: {0}")]
    Scratch(std::io::Error),

    #[error("video acquisition failed: {0}")]
    Acquire(#[source] VideoError),

    #[error("frame sampling failed: {0}")]
    Sampling(#[source] VideoError),

    #[error("failed to initialize OCR engine: {0}")]
    OcrInit(#[source] OcrError),

    #[error(transparent)]
    Ocr(#[from] OcrStageError),

    #[error(transparent)]
    Dedup(#[from] TextError),

    #[error(transparent)]
    Output(#[from] WriterError),
}
