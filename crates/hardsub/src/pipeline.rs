use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hardsub_ocr::{NoopOcrEngine, OcrEngine, OcrError};
use hardsub_text::Deduplicator;
use hardsub_video::{
    FfmpegExtractor, FrameExtractor, LocalFileSource, Source, VideoSource, YtDlpSource,
    find_ffmpeg,
};
use tempfile::TempDir;

use crate::cli::OcrBackend;
use crate::error::PipelineError;
use crate::settings::{EffectiveSettings, OcrSettings};
use crate::stage::ocr::SubtitleOcr;
use crate::stage::writer::write_transcript;

const FRAMES_DIR: &str = "frames";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output: PathBuf,
    pub interval: f64,
    pub crop_ratio: f64,
    pub threshold: f64,
    pub keep_frames: bool,
    pub show_progress: bool,
}

impl PipelineConfig {
    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        Self {
            output: settings.output.clone(),
            interval: settings.interval,
            crop_ratio: settings.crop_ratio,
            threshold: settings.threshold,
            keep_frames: settings.keep_frames,
            show_progress: true,
        }
    }
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub frames: usize,
    pub recognized: usize,
    pub lines: usize,
    pub kept_dir: Option<PathBuf>,
}

/// Builds the collaborators described by `settings` and runs the pipeline.
pub async fn run(settings: &EffectiveSettings) -> Result<RunSummary, PipelineError> {
    let engine = build_ocr_engine(&settings.ocr).map_err(PipelineError::OcrInit)?;
    let ffmpeg = find_ffmpeg(settings.download.ffmpeg.as_deref()).map_err(PipelineError::Acquire)?;
    let extractor = FfmpegExtractor::new(ffmpeg.clone());
    let config = PipelineConfig::from_settings(settings);

    match &settings.source {
        Source::Url(url) => {
            let source = build_downloader(settings, ffmpeg);
            run_pipeline(url, &source, &extractor, engine, &config).await
        }
        Source::File(path) => {
            let locator = path.to_string_lossy();
            run_pipeline(&locator, &LocalFileSource, &extractor, engine, &config).await
        }
    }
}

fn build_downloader(settings: &EffectiveSettings, ffmpeg: PathBuf) -> YtDlpSource {
    let mut source = YtDlpSource::new()
        .with_ffmpeg(Some(ffmpeg))
        .with_cookies(settings.download.cookies.clone());
    if let Some((program, args)) = settings
        .download
        .yt_dlp
        .as_deref()
        .and_then(<[String]>::split_first)
    {
        source = source.with_program(program, args.iter().map(OsString::from).collect());
    }
    source
}

/// Acquire, sample, recognize, deduplicate, write. Each stage starts only
/// after the previous one finished; the first failure ends the run.
pub async fn run_pipeline<S, X>(
    locator: &str,
    source: &S,
    extractor: &X,
    engine: Arc<dyn OcrEngine>,
    config: &PipelineConfig,
) -> Result<RunSummary, PipelineError>
where
    S: VideoSource,
    X: FrameExtractor,
{
    let scratch = ScratchDir::create(config.keep_frames)?;

    let video = source
        .acquire(locator, scratch.path())
        .await
        .map_err(PipelineError::Acquire)?;

    let frames = extractor
        .extract(&video, config.interval, &scratch.path().join(FRAMES_DIR))
        .await
        .map_err(PipelineError::Sampling)?;
    let frame_count = frames.len();

    let recognized = SubtitleOcr::new(engine, config.crop_ratio)
        .with_progress(config.show_progress)
        .run(frames)
        .await?;
    log::info!("OCR found {} text lines", recognized.len());

    let mut dedup = Deduplicator::new(config.threshold)?;
    let lines: Vec<String> = recognized
        .iter()
        .filter_map(|line| dedup.push(line.clone()))
        .collect();
    log::debug!(
        "deduplicator kept {} of {} lines",
        dedup.emitted(),
        dedup.seen()
    );
    log::info!("after deduplication: {} unique lines", lines.len());

    let kept_dir = scratch.finish();

    write_transcript(&config.output, &lines).await?;

    Ok(RunSummary {
        output: config.output.clone(),
        frames: frame_count,
        recognized: recognized.len(),
        lines: lines.len(),
        kept_dir,
    })
}

/// Working directory for the downloaded video and sampled frames. Removed
/// when dropped unless it was created as kept.
enum ScratchDir {
    Temporary(TempDir),
    Kept(PathBuf),
}

impl ScratchDir {
    fn create(keep: bool) -> Result<Self, PipelineError> {
        let dir = tempfile::Builder::new()
            .prefix("hardsub-")
            .tempdir()
            .map_err(PipelineError::Scratch)?;
        if keep {
            let path = dir.keep();
            log::info!("frames will be kept in {}", path.display());
            Ok(Self::Kept(path))
        } else {
            log::debug!("working in {}", dir.path().display());
            Ok(Self::Temporary(dir))
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Kept(path) => path,
        }
    }

    /// Releases the directory, returning its path when it was kept.
    fn finish(self) -> Option<PathBuf> {
        match self {
            Self::Temporary(dir) => {
                if let Err(err) = dir.close() {
                    log::warn!("failed to remove temporary directory: {err}");
                }
                None
            }
            Self::Kept(path) => Some(path),
        }
    }
}

pub fn build_ocr_engine(settings: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    let engine = match settings.backend {
        OcrBackend::Noop => build_noop_engine(),
        OcrBackend::Onnx => build_onnx_engine(settings),
        OcrBackend::Command => build_command_engine(settings),
        OcrBackend::Auto => build_auto_engine(settings),
    }?;
    engine.warm_up()?;
    log::debug!("using OCR engine {}", engine.name());
    Ok(engine)
}

fn build_noop_engine() -> Result<Arc<dyn OcrEngine>, OcrError> {
    Ok(Arc::new(NoopOcrEngine))
}

#[cfg(feature = "ocr-onnx")]
fn build_onnx_engine(settings: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    let model = settings
        .onnx_model
        .clone()
        .ok_or_else(|| OcrError::backend("the onnx backend needs --onnx-model"))?;
    let engine = hardsub_ocr::OnnxOcrEngine::new(model, settings.onnx_dict.as_deref())?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "ocr-onnx"))]
fn build_onnx_engine(_settings: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    Err(OcrError::backend(
        "onnx OCR backend is not available; rebuild with the \"ocr-onnx\" feature",
    ))
}

#[cfg(feature = "ocr-command")]
fn build_command_engine(settings: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    let engine = match settings.command.as_deref().and_then(<[String]>::split_first) {
        Some((program, args)) => hardsub_ocr::CommandOcrEngine::new(program.clone(), args.to_vec())?,
        None => hardsub_ocr::CommandOcrEngine::tesseract(&settings.language)?,
    };
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "ocr-command"))]
fn build_command_engine(_settings: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    Err(OcrError::backend(
        "command OCR backend is not available; rebuild with the \"ocr-command\" feature",
    ))
}

fn build_auto_engine(settings: &OcrSettings) -> Result<Arc<dyn OcrEngine>, OcrError> {
    if settings.onnx_model.is_some() && cfg!(feature = "ocr-onnx") {
        return build_onnx_engine(settings);
    }
    if cfg!(feature = "ocr-command") {
        return build_command_engine(settings);
    }
    log::warn!("no OCR backend was built in; every frame will read as empty");
    build_noop_engine()
}
