use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use hardsub_types::SampledFrame;
use tokio::process::Command;

use crate::error::VideoError;

/// JPEG quality passed to ffmpeg as `-q:v` (2 is near-lossless).
pub const FRAME_QUALITY: u8 = 2;

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = "jpg";

/// Turns a video into numbered stills at a fixed temporal cadence.
pub trait FrameExtractor: Send + Sync {
    /// Samples one still every `interval` seconds into `out_dir` and returns
    /// them ordered by frame number, starting at 1.
    fn extract(
        &self,
        video: &Path,
        interval: f64,
        out_dir: &Path,
    ) -> impl Future<Output = Result<Vec<SampledFrame>, VideoError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    fn command(&self, video: &Path, interval: f64, out_dir: &Path) -> Command {
        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(format!("fps=1/{interval}"))
            .arg("-q:v")
            .arg(FRAME_QUALITY.to_string())
            .arg(out_dir.join(format!("{FRAME_PREFIX}%06d.{FRAME_EXTENSION}")))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl FrameExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        video: &Path,
        interval: f64,
        out_dir: &Path,
    ) -> Result<Vec<SampledFrame>, VideoError> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(VideoError::InvalidInterval(interval));
        }
        tokio::fs::create_dir_all(out_dir).await?;
        log::info!("extracting frames every {interval}s");

        let output = self
            .command(video, interval, out_dir)
            .output()
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => VideoError::ToolNotFound {
                    tool: "ffmpeg",
                    hint: format!("could not run {}", self.ffmpeg.display()),
                },
                _ => VideoError::Io(err),
            })?;
        if !output.status.success() {
            return Err(VideoError::tool_failed("ffmpeg", output.status, &output.stderr));
        }

        let frames = collect_frames(out_dir).await?;
        log::info!("extracted {} frames", frames.len());
        Ok(frames)
    }
}

/// Lists `frame_NNNNNN.jpg` files in `dir`, sorted by number. The numbers must
/// run 1..=n without gaps; anything else in the directory is ignored.
pub async fn collect_frames(dir: &Path) -> Result<Vec<SampledFrame>, VideoError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(index) = frame_number(&path) {
            frames.push(SampledFrame::new(index, path));
        }
    }

    if frames.is_empty() {
        return Err(VideoError::NoFrames {
            dir: dir.to_path_buf(),
        });
    }

    frames.sort_by_key(SampledFrame::index);
    for (expected, frame) in (1u64..).zip(&frames) {
        if frame.index() != expected {
            return Err(VideoError::FrameSequence {
                dir: dir.to_path_buf(),
                message: format!("expected frame {expected}, found frame {}", frame.index()),
            });
        }
    }
    Ok(frames)
}

fn frame_number(path: &Path) -> Option<u64> {
    if path.extension()?.to_str()? != FRAME_EXTENSION {
        return None;
    }
    let digits = path.file_stem()?.to_str()?.strip_prefix(FRAME_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
