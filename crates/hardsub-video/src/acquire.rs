use std::ffi::OsString;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::error::VideoError;

const VIDEO_FILE_NAME: &str = "video.mp4";
const FORMAT_SELECTOR: &str =
    "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080][ext=mp4]/best";

/// What the user pointed us at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// An existing file is used in place; anything else goes to the downloader.
    pub fn parse(locator: &str) -> Self {
        let lower = locator.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Source::Url(locator.trim().to_string());
        }
        let path = Path::new(locator);
        if path.is_file() {
            Source::File(path.to_path_buf())
        } else {
            Source::Url(locator.trim().to_string())
        }
    }
}

/// Produces a local video file for a locator. `dest` is a scratch directory
/// owned by the caller; implementations may write into it.
pub trait VideoSource: Send + Sync {
    fn acquire(
        &self,
        locator: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<PathBuf, VideoError>> + Send;
}

/// Uses an existing file in place. Nothing is copied and nothing is deleted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSource;

impl VideoSource for LocalFileSource {
    async fn acquire(&self, locator: &str, _dest: &Path) -> Result<PathBuf, VideoError> {
        let path = PathBuf::from(locator);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(VideoError::acquisition(locator, "not a regular file")),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(VideoError::acquisition(locator, "file does not exist"))
            }
            Err(err) => Err(VideoError::acquisition(locator, err.to_string())),
        }
    }
}

/// Where yt-dlp should read authentication cookies from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CookieSource {
    #[default]
    None,
    File(PathBuf),
    Browser(String),
}

impl CookieSource {
    /// A cookies file wins over a browser name when both are given.
    pub fn from_options(file: Option<PathBuf>, browser: Option<String>) -> Self {
        match (file, browser) {
            (Some(file), _) => CookieSource::File(file),
            (None, Some(browser)) if !browser.trim().is_empty() => {
                CookieSource::Browser(browser.trim().to_string())
            }
            _ => CookieSource::None,
        }
    }

    fn is_some(&self) -> bool {
        !matches!(self, CookieSource::None)
    }
}

/// Downloads a URL with yt-dlp into `dest/video.mp4`.
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    program: OsString,
    program_args: Vec<OsString>,
    ffmpeg: Option<PathBuf>,
    cookies: CookieSource,
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self {
            program: OsString::from("yt-dlp"),
            program_args: Vec::new(),
            ffmpeg: None,
            cookies: CookieSource::None,
        }
    }
}

impl YtDlpSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs yt-dlp as a module of the given interpreter (`python -m yt_dlp`).
    pub fn python_module(interpreter: impl Into<OsString>) -> Self {
        Self {
            program: interpreter.into(),
            program_args: vec![OsString::from("-m"), OsString::from("yt_dlp")],
            ..Self::default()
        }
    }

    pub fn with_program(mut self, program: impl Into<OsString>, args: Vec<OsString>) -> Self {
        self.program = program.into();
        self.program_args = args;
        self
    }

    pub fn with_ffmpeg(mut self, ffmpeg: Option<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    pub fn with_cookies(mut self, cookies: CookieSource) -> Self {
        self.cookies = cookies;
        self
    }

    fn player_client(&self) -> &'static str {
        // The ios client rejects cookies.
        if self.cookies.is_some() {
            "tv_embedded,web"
        } else {
            "ios,web"
        }
    }

    /// Full argument list passed after `program`.
    pub fn build_args(&self, url: &str, output: &Path) -> Vec<OsString> {
        let mut args = self.program_args.clone();
        if let Some(dir) = self.ffmpeg.as_deref().and_then(Path::parent) {
            args.push("--ffmpeg-location".into());
            args.push(dir.as_os_str().to_owned());
        }
        args.push("--extractor-args".into());
        args.push(format!("youtube:player_client={}", self.player_client()).into());
        args.push("-f".into());
        args.push(FORMAT_SELECTOR.into());
        args.push("--merge-output-format".into());
        args.push("mp4".into());
        args.push("-o".into());
        args.push(output.as_os_str().to_owned());
        match &self.cookies {
            CookieSource::File(path) => {
                args.push("--cookies".into());
                args.push(path.as_os_str().to_owned());
            }
            CookieSource::Browser(browser) => {
                args.push("--cookies-from-browser".into());
                args.push(browser.into());
            }
            CookieSource::None => {}
        }
        args.push(url.into());
        args
    }
}

impl VideoSource for YtDlpSource {
    async fn acquire(&self, locator: &str, dest: &Path) -> Result<PathBuf, VideoError> {
        let output = dest.join(VIDEO_FILE_NAME);
        log::info!("downloading video from {locator}");

        let status = Command::new(&self.program)
            .args(self.build_args(locator, &output))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => VideoError::ToolNotFound {
                    tool: "yt-dlp",
                    hint: format!(
                        "could not run {}; install it with `pip install yt-dlp`",
                        self.program.to_string_lossy()
                    ),
                },
                _ => VideoError::acquisition(locator, err.to_string()),
            })?;

        if !status.success() {
            return Err(VideoError::acquisition(
                locator,
                format!("yt-dlp exited with {status}"),
            ));
        }
        if !output.is_file() {
            return Err(VideoError::acquisition(
                locator,
                format!("yt-dlp reported success but {} is missing", output.display()),
            ));
        }

        log::info!("downloaded to {}", output.display());
        Ok(output)
    }
}
