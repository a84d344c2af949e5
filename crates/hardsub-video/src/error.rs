use std::path::PathBuf;

use hardsub_types::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("{tool} not found: {hint}")]
    ToolNotFound { tool: &'static str, hint: String },

    #[error("{tool} failed ({status}): {detail}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        detail: String,
    },

    #[error("failed to acquire video from {locator}: {message}")]
    Acquisition { locator: String, message: String },

    #[error("no frames were extracted into {}", dir.display())]
    NoFrames { dir: PathBuf },

    #[error("unexpected frame sequence in {}: {message}", dir.display())]
    FrameSequence { dir: PathBuf, message: String },

    #[error("sampling interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    #[error("failed to decode frame {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VideoError {
    pub fn acquisition(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquisition {
            locator: locator.into(),
            message: message.into(),
        }
    }

    pub(crate) fn tool_failed(
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: &[u8],
    ) -> Self {
        Self::ToolFailed {
            tool,
            status: status.to_string(),
            detail: stderr_tail(stderr),
        }
    }
}

/// Last few lines of a tool's stderr, enough to explain a failure.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return "no diagnostic output".to_string();
    }
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}
