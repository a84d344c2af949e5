use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::VideoError;

#[cfg(windows)]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BINARY: &str = "ffmpeg";

const FFMPEG_INSTALL_HINT: &str =
    "install it from https://ffmpeg.org/download.html (or `winget install Gyan.FFmpeg`) and make sure it is on PATH";

/// Resolves the ffmpeg executable: an explicit override, then `PATH`, then the
/// WinGet package directory.
pub fn find_ffmpeg(override_path: Option<&Path>) -> Result<PathBuf, VideoError> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(VideoError::ToolNotFound {
            tool: "ffmpeg",
            hint: format!("configured path {} does not exist", path.display()),
        });
    }

    if let Some(path) = search_path(FFMPEG_BINARY) {
        log::debug!("found ffmpeg on PATH at {}", path.display());
        return Ok(path);
    }

    if let Some(path) = BaseDirs::new().and_then(|dirs| winget_ffmpeg(dirs.home_dir())) {
        log::debug!("found ffmpeg in WinGet packages at {}", path.display());
        return Ok(path);
    }

    Err(VideoError::ToolNotFound {
        tool: "ffmpeg",
        hint: FFMPEG_INSTALL_HINT.to_string(),
    })
}

fn search_path(binary: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// `~/AppData/Local/Microsoft/WinGet/Packages/Gyan.FFmpeg*/*/bin/ffmpeg.exe`
fn winget_ffmpeg(home: &Path) -> Option<PathBuf> {
    let packages = home.join("AppData/Local/Microsoft/WinGet/Packages");
    let mut package_dirs: Vec<PathBuf> = fs::read_dir(&packages)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("Gyan.FFmpeg"))
        .map(|entry| entry.path())
        .collect();
    package_dirs.sort();

    package_dirs.iter().find_map(|package| {
        let mut builds: Vec<PathBuf> = fs::read_dir(package)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path().join("bin").join("ffmpeg.exe"))
            .filter(|candidate| candidate.is_file())
            .collect();
        builds.sort();
        builds.into_iter().next()
    })
}
