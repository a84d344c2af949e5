use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use hardsub_text::DEFAULT_SIMILARITY_THRESHOLD;

pub const DEFAULT_OUTPUT: &str = "subtitles.txt";
pub const DEFAULT_INTERVAL: f64 = 0.5;
pub const DEFAULT_CROP_RATIO: f64 = 0.2;
pub const DEFAULT_OCR_LANGUAGE: &str = "chi_sim";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrBackend {
    /// ONNX model when one is configured, otherwise the external command
    Auto,
    Onnx,
    Command,
    Noop,
}

/// Which defaulted arguments were actually typed on the command line, so a
/// config file value only replaces a default.
#[derive(Debug, Default)]
pub struct CliSources {
    pub output_from_cli: bool,
    pub interval_from_cli: bool,
    pub crop_ratio_from_cli: bool,
    pub threshold_from_cli: bool,
    pub keep_frames_from_cli: bool,
    pub ocr_backend_from_cli: bool,
    pub ocr_language_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            output_from_cli: value_from_cli(matches, "output"),
            interval_from_cli: value_from_cli(matches, "interval"),
            crop_ratio_from_cli: value_from_cli(matches, "crop_ratio"),
            threshold_from_cli: value_from_cli(matches, "threshold"),
            keep_frames_from_cli: value_from_cli(matches, "keep_frames"),
            ocr_backend_from_cli: value_from_cli(matches, "ocr_backend"),
            ocr_language_from_cli: value_from_cli(matches, "ocr_language"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    split_matches(&matches).unwrap_or_else(|err| err.exit())
}

/// Same as [`parse_cli`] but over an explicit argument list.
pub fn try_parse_from<I, T>(args: I) -> Result<(CliArgs, CliSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(args)?;
    split_matches(&matches)
}

fn split_matches(matches: &ArgMatches) -> Result<(CliArgs, CliSources), clap::Error> {
    let args = CliArgs::from_arg_matches(matches)?;
    Ok((args, CliSources::from_matches(matches)))
}

#[derive(Debug, Parser)]
#[command(
    name = "hardsub",
    about = "Extract hardcoded subtitles from a video into a text file",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Video URL (downloaded with yt-dlp) or local video file
    pub source: String,

    /// Output text file
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Frame extraction interval in seconds
    #[arg(short = 'i', long = "interval", default_value_t = DEFAULT_INTERVAL)]
    pub interval: f64,

    /// Bottom portion of each frame to read subtitles from (0.2 = bottom 20%)
    #[arg(short = 'c', long = "crop-ratio", default_value_t = DEFAULT_CROP_RATIO)]
    pub crop_ratio: f64,

    /// Lines at least this similar to the previous kept line are dropped
    #[arg(short = 't', long = "threshold", default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    pub threshold: f64,

    /// Keep the temporary directory with the downloaded video and frames
    #[arg(long = "keep-frames")]
    pub keep_frames: bool,

    /// Browser to pull cookies from when the download is blocked (chrome, firefox, edge)
    #[arg(short = 'b', long = "browser", value_name = "BROWSER")]
    pub browser: Option<String>,

    /// cookies.txt file for authenticated downloads; wins over --browser
    #[arg(long = "cookies-file", value_name = "FILE")]
    pub cookies_file: Option<PathBuf>,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long = "ffmpeg", value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Downloader command line, e.g. "python -m yt_dlp"
    #[arg(long = "yt-dlp", value_name = "COMMAND")]
    pub yt_dlp: Option<String>,

    /// OCR engine to use
    #[arg(long = "ocr-backend", value_enum, default_value_t = OcrBackend::Auto)]
    pub ocr_backend: OcrBackend,

    /// ONNX text recognition model
    #[arg(long = "onnx-model", value_name = "FILE")]
    pub onnx_model: Option<PathBuf>,

    /// Character dictionary for the ONNX model, one symbol per line
    #[arg(long = "onnx-dict", value_name = "FILE")]
    pub onnx_dict: Option<PathBuf>,

    /// External OCR command; `{image}` is replaced with the crop's PNG path
    #[arg(long = "ocr-command", value_name = "COMMAND")]
    pub ocr_command: Option<String>,

    /// Language passed to tesseract when no OCR command is given
    #[arg(long = "ocr-language", value_name = "LANG", default_value = DEFAULT_OCR_LANGUAGE)]
    pub ocr_language: String,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
