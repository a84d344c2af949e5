//! Shared domain models for the hardsub workspace.
//!
//! This crate holds the lightweight data structures passed between the video,
//! OCR, and CLI crates. Keep it free of heavy dependencies so every crate can
//! depend on it without pulling codecs or inference runtimes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

pub type FrameResult<T> = Result<T, FrameError>;

/// A still produced by the sampler, numbered from 1 in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledFrame {
    index: u64,
    path: PathBuf,
}

impl SampledFrame {
    pub fn new(index: u64, path: PathBuf) -> Self {
        Self { index, path }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Owned 8-bit luminance pixels for one (cropped) frame.
#[derive(Clone)]
pub struct LumaFrame {
    width: u32,
    height: u32,
    stride: usize,
    frame_index: Option<u64>,
    data: Arc<[u8]>,
}

impl fmt::Debug for LumaFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LumaFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

impl LumaFrame {
    pub fn from_owned(width: u32, height: u32, stride: usize, data: Vec<u8>) -> FrameResult<Self> {
        if stride < width as usize {
            return Err(FrameError::InvalidFrame {
                reason: format!("stride {stride} is smaller than width {width}"),
            });
        }
        let required =
            stride
                .checked_mul(height as usize)
                .ok_or_else(|| FrameError::InvalidFrame {
                    reason: "calculated luma plane length overflowed".into(),
                })?;
        if data.len() < required {
            return Err(FrameError::InvalidFrame {
                reason: format!(
                    "insufficient luma bytes: got {} expected at least {}",
                    data.len(),
                    required
                ),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            frame_index: None,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    pub fn with_frame_index(mut self, index: Option<u64>) -> Self {
        self.frame_index = index;
        self
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Pixel rectangle covering the full frame width and the bottom band of its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Bottom `ratio` of a `width x height` frame. `ratio` must lie in `(0, 1]`.
    pub fn bottom_band(width: u32, height: u32, ratio: f64) -> FrameResult<Self> {
        validate_crop_ratio(ratio)?;
        let band = (f64::from(height) * ratio).round() as u32;
        let band = band.min(height);
        Ok(Self {
            top: height - band,
            width,
            height: band,
        })
    }
}

pub fn validate_crop_ratio(ratio: f64) -> FrameResult<()> {
    if ratio > 0.0 && ratio <= 1.0 {
        Ok(())
    } else {
        Err(FrameError::configuration(format!(
            "crop ratio must be within (0, 1], got {ratio}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl OcrRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }
}

/// One text fragment reported by an OCR engine.
#[derive(Debug, Clone)]
pub struct OcrText {
    pub region: OcrRegion,
    pub text: String,
    pub confidence: Option<f32>,
}

impl OcrText {
    pub fn new(region: OcrRegion, text: String) -> Self {
        Self {
            region,
            text,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, value: f32) -> Self {
        self.confidence = Some(value);
        self
    }
}

/// Fragments in the order the engine returned them.
#[derive(Debug, Clone)]
pub struct OcrResponse {
    pub texts: Vec<OcrText>,
}

impl OcrResponse {
    pub fn new(texts: Vec<OcrText>) -> Self {
        Self { texts }
    }

    pub fn empty() -> Self {
        Self { texts: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Transcriptions joined by single spaces, in engine order.
    pub fn joined_text(&self) -> String {
        self.texts
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
