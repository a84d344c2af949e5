//! Text-side half of the pipeline: LCS similarity between recognitions and the
//! adjacent-only collapse that turns a per-frame OCR stream into unique lines.

mod dedup;
mod similarity;

pub use dedup::{DEFAULT_SIMILARITY_THRESHOLD, Deduplicator, deduplicate, validate_threshold};
pub use similarity::{lcs_len, similarity};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TextError {
    #[error("similarity threshold must be within [0, 1], got {value}")]
    InvalidThreshold { value: f64 },
}

#[cfg(test)]
mod tests;
