use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::{BaseDirs, ProjectDirs};
use hardsub_types::validate_crop_ratio;
use hardsub_video::{CookieSource, Source};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::{CliArgs, CliSources, OcrBackend};

const PROJECT_CONFIG_FILE: &str = "hardsub.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    output: Option<String>,
    interval: Option<f64>,
    crop_ratio: Option<f64>,
    threshold: Option<f64>,
    keep_frames: Option<bool>,
    ffmpeg: Option<String>,
    download: Option<DownloadFileConfig>,
    ocr: Option<OcrFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct DownloadFileConfig {
    yt_dlp: Option<String>,
    browser: Option<String>,
    cookies_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct OcrFileConfig {
    backend: Option<String>,
    onnx_model: Option<String>,
    onnx_dict: Option<String>,
    command: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub source: Source,
    pub output: PathBuf,
    pub interval: f64,
    pub crop_ratio: f64,
    pub threshold: f64,
    pub keep_frames: bool,
    pub download: DownloadSettings,
    pub ocr: OcrSettings,
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub ffmpeg: Option<PathBuf>,
    /// Downloader program followed by its leading arguments.
    pub yt_dlp: Option<Vec<String>>,
    pub cookies: CookieSource,
}

#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub backend: OcrBackend,
    pub onnx_model: Option<PathBuf>,
    pub onnx_dict: Option<PathBuf>,
    /// External OCR program followed by its arguments.
    pub command: Option<Vec<String>>,
    pub language: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for '{field}'{}", location(.path))]
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    #[error("config file {} does not exist", path.display())]
    NotFound { path: PathBuf },
}

fn location(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config(&path)?;
        return Ok((config, Some(path)));
    }

    for candidate in [project_config_path(), default_config_path()]
        .into_iter()
        .flatten()
    {
        if candidate.exists() {
            let config = read_config(&candidate)?;
            log::debug!("loaded settings from {}", candidate.display());
            return Ok((config, Some(candidate)));
        }
    }
    Ok((FileConfig::default(), None))
}

fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(Path::to_path_buf));
    let config_dir = config_dir.as_deref();

    let FileConfig {
        output: file_output,
        interval: file_interval,
        crop_ratio: file_crop_ratio,
        threshold: file_threshold,
        keep_frames: file_keep_frames,
        ffmpeg: file_ffmpeg,
        download: file_download,
        ocr: file_ocr,
    } = file;
    let file_download = file_download.unwrap_or_default();
    let file_ocr = file_ocr.unwrap_or_default();

    let mut output = expand_pathbuf(cli.output.clone());
    if !sources.output_from_cli {
        if let Some(path) = file_output.and_then(|value| resolve_path_from_config(value, config_dir)) {
            output = path;
        }
    }

    let interval = match file_interval.filter(|_| !sources.interval_from_cli) {
        Some(value) => check_interval(value, config_path.as_ref())?,
        None => check_interval(cli.interval, None)?,
    };

    let crop_ratio = match file_crop_ratio.filter(|_| !sources.crop_ratio_from_cli) {
        Some(value) => check_crop_ratio(value, config_path.as_ref())?,
        None => check_crop_ratio(cli.crop_ratio, None)?,
    };

    let threshold = match file_threshold.filter(|_| !sources.threshold_from_cli) {
        Some(value) => check_threshold(value, config_path.as_ref())?,
        None => check_threshold(cli.threshold, None)?,
    };

    let mut keep_frames = cli.keep_frames;
    if !sources.keep_frames_from_cli {
        if let Some(value) = file_keep_frames {
            keep_frames = value;
        }
    }

    let ffmpeg = cli
        .ffmpeg
        .clone()
        .map(expand_pathbuf)
        .or_else(|| normalize_string(file_ffmpeg).and_then(|v| resolve_path_from_config(v, config_dir)));

    let yt_dlp = match normalize_string(cli.yt_dlp.clone()) {
        Some(value) => Some(split_command(&value, "yt_dlp", None)?),
        None => match normalize_string(file_download.yt_dlp) {
            Some(value) => Some(split_command(&value, "yt_dlp", config_path.as_ref())?),
            None => None,
        },
    };

    let cookies_file = cli.cookies_file.clone().map(expand_pathbuf).or_else(|| {
        normalize_string(file_download.cookies_file)
            .and_then(|value| resolve_path_from_config(value, config_dir))
    });
    let browser = normalize_string(cli.browser.clone()).or_else(|| normalize_string(file_download.browser));
    let cookies = CookieSource::from_options(cookies_file, browser);

    let mut backend = cli.ocr_backend;
    if !sources.ocr_backend_from_cli {
        if let Some(value) = normalize_string(file_ocr.backend) {
            backend = parse_ocr_backend(&value, config_path.as_ref())?;
        }
    }

    let onnx_model = cli.onnx_model.clone().map(expand_pathbuf).or_else(|| {
        normalize_string(file_ocr.onnx_model).and_then(|value| resolve_path_from_config(value, config_dir))
    });
    let onnx_dict = cli.onnx_dict.clone().map(expand_pathbuf).or_else(|| {
        normalize_string(file_ocr.onnx_dict).and_then(|value| resolve_path_from_config(value, config_dir))
    });

    let command = match normalize_string(cli.ocr_command.clone()) {
        Some(value) => Some(split_command(&value, "ocr_command", None)?),
        None => match normalize_string(file_ocr.command) {
            Some(value) => Some(split_command(&value, "ocr_command", config_path.as_ref())?),
            None => None,
        },
    };

    let mut language = cli.ocr_language.trim().to_string();
    if !sources.ocr_language_from_cli {
        if let Some(value) = normalize_string(file_ocr.language) {
            language = value;
        }
    }
    if language.is_empty() {
        return Err(ConfigError::InvalidValue {
            path: None,
            field: "ocr_language",
            value: language,
        });
    }

    Ok(EffectiveSettings {
        source: Source::parse(&cli.source),
        output,
        interval,
        crop_ratio,
        threshold,
        keep_frames,
        download: DownloadSettings {
            ffmpeg,
            yt_dlp,
            cookies,
        },
        ocr: OcrSettings {
            backend,
            onnx_model,
            onnx_dict,
            command,
            language,
        },
    })
}

fn check_interval(value: f64, path: Option<&PathBuf>) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(path, "interval", value))
    }
}

fn check_crop_ratio(value: f64, path: Option<&PathBuf>) -> Result<f64, ConfigError> {
    validate_crop_ratio(value)
        .map(|()| value)
        .map_err(|_| invalid(path, "crop_ratio", value))
}

fn check_threshold(value: f64, path: Option<&PathBuf>) -> Result<f64, ConfigError> {
    hardsub_text::validate_threshold(value).map_err(|_| invalid(path, "threshold", value))
}

fn invalid(path: Option<&PathBuf>, field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        path: path.cloned(),
        field,
        value: value.to_string(),
    }
}

fn split_command(
    value: &str,
    field: &'static str,
    path: Option<&PathBuf>,
) -> Result<Vec<String>, ConfigError> {
    let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        return Err(invalid(path, field, value));
    }
    Ok(parts)
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "hardsub", "hardsub").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir().ok().map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

fn parse_ocr_backend(value: &str, path: Option<&PathBuf>) -> Result<OcrBackend, ConfigError> {
    OcrBackend::from_str(value, true).map_err(|_| invalid(path, "ocr.backend", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::try_parse_from;

    fn settings_with(args: &[&str], toml_text: &str) -> Result<EffectiveSettings, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hardsub.toml");
        fs::write(&path, toml_text).unwrap();

        let mut argv = vec!["hardsub"];
        argv.extend_from_slice(args);
        argv.push("--config");
        let path_str = path.to_str().unwrap().to_string();
        argv.push(&path_str);
        let (cli, sources) = try_parse_from(argv).unwrap();
        resolve_settings(&cli, &sources)
    }

    #[test]
    fn file_values_replace_defaults() {
        let settings = settings_with(
            &["clip.mp4"],
            "interval = 2.0\ncrop_ratio = 0.3\nthreshold = 0.6\nkeep_frames = true\n\n[ocr]\nbackend = \"noop\"\nlanguage = \"eng\"\n",
        )
        .unwrap();
        assert_eq!(settings.interval, 2.0);
        assert_eq!(settings.crop_ratio, 0.3);
        assert_eq!(settings.threshold, 0.6);
        assert!(settings.keep_frames);
        assert_eq!(settings.ocr.backend, OcrBackend::Noop);
        assert_eq!(settings.ocr.language, "eng");
        assert_eq!(settings.source, Source::Url("clip.mp4".into()));
    }

    #[test]
    fn command_line_beats_file() {
        let settings = settings_with(
            &["https://youtu.be/x", "-i", "1.0", "--ocr-backend", "command"],
            "interval = 2.0\n[ocr]\nbackend = \"noop\"\n",
        )
        .unwrap();
        assert_eq!(settings.interval, 1.0);
        assert_eq!(settings.ocr.backend, OcrBackend::Command);
        assert!(matches!(settings.source, Source::Url(_)));
    }

    #[test]
    fn defaults_apply_without_file_values() {
        let settings = settings_with(&["clip.mp4"], "").unwrap();
        assert_eq!(settings.interval, 0.5);
        assert_eq!(settings.crop_ratio, 0.2);
        assert_eq!(settings.threshold, 0.8);
        assert!(!settings.keep_frames);
        assert_eq!(settings.download.cookies, CookieSource::None);
        assert_eq!(settings.ocr.language, "chi_sim");
    }

    #[test]
    fn relative_file_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hardsub.toml");
        fs::write(
            &path,
            "output = \"subs/out.txt\"\n[ocr]\nonnx_model = \"models/rec.onnx\"\n",
        )
        .unwrap();
        let (cli, sources) =
            try_parse_from(["hardsub", "clip.mp4", "--config", path.to_str().unwrap()]).unwrap();
        let settings = resolve_settings(&cli, &sources).unwrap();
        assert_eq!(settings.output, dir.path().join("subs/out.txt"));
        assert_eq!(settings.ocr.onnx_model, Some(dir.path().join("models/rec.onnx")));
    }

    #[test]
    fn cookies_file_wins_over_browser() {
        let settings = settings_with(
            &["https://youtu.be/x", "-b", "firefox", "--cookies-file", "/tmp/cookies.txt"],
            "",
        )
        .unwrap();
        assert_eq!(
            settings.download.cookies,
            CookieSource::File(PathBuf::from("/tmp/cookies.txt"))
        );
    }

    #[test]
    fn commands_are_split_on_whitespace() {
        let settings = settings_with(
            &["clip.mp4", "--ocr-command", "my-ocr --fast {image}"],
            "[download]\nyt_dlp = \"python3 -m yt_dlp\"\n",
        )
        .unwrap();
        assert_eq!(
            settings.ocr.command,
            Some(vec!["my-ocr".to_string(), "--fast".to_string(), "{image}".to_string()])
        );
        assert_eq!(
            settings.download.yt_dlp,
            Some(vec!["python3".to_string(), "-m".to_string(), "yt_dlp".to_string()])
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = settings_with(&["clip.mp4"], "interval = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "interval", path: Some(_), .. }));

        let err = settings_with(&["clip.mp4", "-c", "1.5"], "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "crop_ratio", path: None, .. }));

        let err = settings_with(&["clip.mp4"], "threshold = 1.2\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "threshold", .. }));

        let err = settings_with(&["clip.mp4"], "[ocr]\nbackend = \"vision\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "ocr.backend", .. }));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let (cli, sources) =
            try_parse_from(["hardsub", "clip.mp4", "--config", "/no/such/hardsub.toml"]).unwrap();
        assert!(matches!(
            resolve_settings(&cli, &sources),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let err = settings_with(&["clip.mp4"], "interval = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
