use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::{GrayImage, ImageFormat};
use tempfile::{Builder as TempFileBuilder, TempDir};

use crate::plane::RegionPixels;
use crate::{OcrEngine, OcrError, OcrRequest, OcrResponse, OcrText};

/// Placeholder replaced by the path of the PNG handed to the OCR program.
pub const IMAGE_PLACEHOLDER: &str = "{image}";

/// Runs an external OCR program once per region.
///
/// Each region is written to a scratch PNG, the program is invoked with the
/// configured arguments (`{image}` expands to the PNG path, or the path is
/// appended when no argument mentions it) and every non-empty stdout line
/// becomes one text fragment.
#[derive(Debug)]
pub struct CommandOcrEngine {
    program: String,
    args: Vec<String>,
    scratch: TempDir,
    version_check: bool,
}

impl CommandOcrEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self, OcrError> {
        let scratch = TempFileBuilder::new().prefix("hardsub-ocr-").tempdir()?;
        Ok(Self {
            program: program.into(),
            args,
            scratch,
            version_check: false,
        })
    }

    /// `tesseract {image} stdout -l <languages> --psm 6`
    pub fn tesseract(languages: &str) -> Result<Self, OcrError> {
        let mut engine = Self::new(
            "tesseract",
            vec![
                IMAGE_PLACEHOLDER.to_string(),
                "stdout".to_string(),
                "-l".to_string(),
                languages.to_string(),
                "--psm".to_string(),
                "6".to_string(),
            ],
        )?;
        engine.version_check = true;
        Ok(engine)
    }

    fn expand_args(&self, image: &Path) -> Vec<String> {
        let image = image.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(IMAGE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(IMAGE_PLACEHOLDER, &image)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(image.into_owned());
        }
        args
    }

    fn recognize_pixels(
        &self,
        pixels: &RegionPixels,
        frame: Option<u64>,
    ) -> Result<Vec<String>, OcrError> {
        let image = GrayImage::from_raw(
            pixels.width as u32,
            pixels.height as u32,
            pixels.data.clone(),
        )
        .ok_or_else(|| OcrError::backend("region buffer does not match its dimensions"))?;

        let file = TempFileBuilder::new()
            .prefix("crop_")
            .suffix(".png")
            .tempfile_in(self.scratch.path())?;
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|err| OcrError::backend(format!("failed to encode OCR input: {err}")))?;

        let output = Command::new(&self.program)
            .args(self.expand_args(file.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProgramFailed {
                program: self.program.clone(),
                frame,
                detail: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(parse_lines(&String::from_utf8_lossy(&output.stdout)))
    }

    fn spawn_error(&self, err: io::Error) -> OcrError {
        if err.kind() == io::ErrorKind::NotFound {
            OcrError::ProgramNotFound {
                program: self.program.clone(),
            }
        } else {
            OcrError::backend(format!("failed to run OCR program '{}': {err}", self.program))
        }
    }
}

impl OcrEngine for CommandOcrEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    /// Only the tesseract preset is executed (`--version`); a user-supplied
    /// program is looked up but never run before the first frame.
    fn warm_up(&self) -> Result<(), OcrError> {
        if !self.version_check {
            let path = locate_program(&self.program).ok_or_else(|| OcrError::ProgramNotFound {
                program: self.program.clone(),
            })?;
            log::debug!("OCR program '{}' resolved to {}", self.program, path.display());
            return Ok(());
        }

        let status = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| self.spawn_error(err))?;
        if !status.success() {
            return Err(OcrError::ProgramFailed {
                program: self.program.clone(),
                frame: None,
                detail: format!("`--version` exited with {status}"),
            });
        }
        Ok(())
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let plane = request.plane();
        let mut texts = Vec::new();
        for region in request.regions() {
            let Some(pixels) = plane.region_pixels(region) else {
                continue;
            };
            for line in self.recognize_pixels(&pixels, request.frame_index())? {
                texts.push(OcrText::new(*region, line));
            }
        }
        Ok(OcrResponse::new(texts))
    }
}

/// Finds `program` the way a spawn would: paths are checked directly, bare
/// names are searched on `PATH`.
fn locate_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let direct = dir.join(program);
        if direct.is_file() {
            return Some(direct);
        }
        let exe = dir.join(format!("{program}{}", env::consts::EXE_SUFFIX));
        exe.is_file().then_some(exe)
    })
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
