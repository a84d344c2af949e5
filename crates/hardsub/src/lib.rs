//! Turn a video's burned-in subtitles into a plain text transcript.
//!
//! Frames are sampled with ffmpeg, the bottom band of each one is read by an
//! [`OcrEngine`](hardsub_ocr::OcrEngine), and consecutive near-identical
//! readings collapse into one line before the transcript is written.

pub mod cli;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod stage;

pub use error::PipelineError;
pub use pipeline::{PipelineConfig, RunSummary, build_ocr_engine, run, run_pipeline};
pub use settings::{ConfigError, EffectiveSettings, resolve_settings};
