use std::sync::Arc;

use hardsub_ocr::{OcrEngine, OcrError, OcrRegion, OcrRequest};
use hardsub_types::SampledFrame;
use hardsub_video::{VideoError, load_cropped_frame};
use thiserror::Error;

use super::progress::OcrProgress;

#[derive(Debug, Error)]
pub enum OcrStageError {
    #[error("failed to load frame {frame}: {source}")]
    Frame { frame: u64, source: VideoError },
    #[error("OCR failed on frame {frame}: {source}")]
    Engine { frame: u64, source: OcrError },
    #[error("OCR worker stopped unexpectedly: {0}")]
    Join(String),
}

/// Reads the subtitle band of every sampled frame, in order, on a blocking
/// worker thread.
pub struct SubtitleOcr {
    engine: Arc<dyn OcrEngine>,
    crop_ratio: f64,
    show_progress: bool,
}

impl SubtitleOcr {
    pub fn new(engine: Arc<dyn OcrEngine>, crop_ratio: f64) -> Self {
        Self {
            engine,
            crop_ratio,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Returns one trimmed line per frame that produced text. Frames with no
    /// text are skipped; the first failing frame aborts the pass.
    pub async fn run(self, frames: Vec<SampledFrame>) -> Result<Vec<String>, OcrStageError> {
        tokio::task::spawn_blocking(move || self.run_blocking(&frames))
            .await
            .map_err(|err| OcrStageError::Join(err.to_string()))?
    }

    fn run_blocking(&self, frames: &[SampledFrame]) -> Result<Vec<String>, OcrStageError> {
        log::info!(
            "running OCR ({}) on {} frames",
            self.engine.name(),
            frames.len()
        );
        let mut progress = OcrProgress::new(frames.len() as u64, self.show_progress);
        let mut lines = Vec::new();

        for (position, frame) in (1u64..).zip(frames) {
            progress.starting(position);
            let text = match recognize_frame(self.engine.as_ref(), frame, self.crop_ratio) {
                Ok(text) => text,
                Err(err) => {
                    progress.fail(&err.to_string());
                    return Err(err);
                }
            };
            progress.observe(text.is_some());
            if let Some(line) = text {
                log::trace!("frame {}: {line}", frame.index());
                lines.push(line);
            }
        }

        progress.finish();
        Ok(lines)
    }
}

/// Crops and reads one frame. `None` when the engine found nothing but
/// whitespace.
pub fn recognize_frame(
    engine: &dyn OcrEngine,
    frame: &SampledFrame,
    crop_ratio: f64,
) -> Result<Option<String>, OcrStageError> {
    let luma = load_cropped_frame(frame, crop_ratio).map_err(|source| OcrStageError::Frame {
        frame: frame.index(),
        source,
    })?;
    let regions = [OcrRegion::full(luma.width(), luma.height())];
    let request = OcrRequest::for_frame(&luma, &regions);
    let response = engine
        .recognize(&request)
        .map_err(|source| OcrStageError::Engine {
            frame: frame.index(),
            source,
        })?;

    let text = response.joined_text();
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}
