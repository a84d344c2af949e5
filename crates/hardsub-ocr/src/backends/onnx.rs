use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array4, CowArray, IxDyn};
use ort::environment::Environment;
use ort::error::OrtError;
use ort::session::{Session, SessionBuilder};
use ort::value::Value;

use crate::plane::RegionPixels;
use crate::{OcrEngine, OcrError, OcrRequest, OcrResponse, OcrText};

/// Height every crop is scaled to before it reaches the recognizer.
const INPUT_HEIGHT: usize = 48;
const MIN_INPUT_WIDTH: usize = 320;
const MAX_INPUT_WIDTH: usize = 2048;

/// CTC text-line recognizer in the PP-OCR "rec" model format.
///
/// The model takes a `1x3x48xW` tensor normalised to `[-1, 1]` and emits
/// per-timestep class scores where class `0` is the CTC blank and class `i`
/// maps to line `i` of the character dictionary.
#[derive(Debug)]
pub struct OnnxOcrEngine {
    _environment: Arc<Environment>,
    session: Session,
    alphabet: Vec<char>,
    model_path: PathBuf,
}

impl OnnxOcrEngine {
    /// Loads `model_path`, reading symbols from `dictionary` (one per line).
    /// Without a dictionary a printable ASCII alphabet is used.
    pub fn new(model_path: PathBuf, dictionary: Option<&Path>) -> Result<Self, OcrError> {
        if !model_path.exists() {
            return Err(OcrError::backend(format!(
                "onnx model file '{}' does not exist",
                model_path.display()
            )));
        }
        let alphabet = match dictionary {
            Some(path) => load_dictionary(path)?,
            None => default_alphabet(),
        };

        let environment = Environment::builder()
            .with_name("hardsub-ocr")
            .build()
            .map_err(map_environment_error)?;
        let environment = Arc::new(environment);
        let session = SessionBuilder::new(&environment)
            .map_err(map_session_error)?
            .with_model_from_file(&model_path)
            .map_err(map_session_error)?;

        log::debug!(
            "loaded onnx recognizer {} with {} symbols",
            model_path.display(),
            alphabet.len()
        );
        Ok(Self {
            _environment: environment,
            session,
            alphabet,
            model_path,
        })
    }

    fn recognize_pixels(
        &self,
        pixels: &RegionPixels,
    ) -> Result<Option<(String, Option<f32>)>, OcrError> {
        let (normalized, input_width) = resize_for_model(pixels);
        let input = prepare_input_tensor(&normalized, input_width, INPUT_HEIGHT)?;
        let (data, shape) = self.run_model(&input)?;
        let (text, confidence) = decode_sequence(&data, &shape, &self.alphabet)?;
        let text = text.trim().to_string();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some((text, confidence)))
        }
    }

    fn run_model(&self, input: &Array4<f32>) -> Result<(Vec<f32>, Vec<usize>), OcrError> {
        let allocator = self.session.allocator();
        let input_dyn: CowArray<'_, f32, IxDyn> = CowArray::from(input.view().into_dyn());
        let tensor = Value::from_array(allocator, &input_dyn).map_err(map_input_error)?;
        let outputs = self.session.run(vec![tensor]).map_err(map_inference_error)?;
        let tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::backend("onnx model produced no output"))?
            .try_extract::<f32>()
            .map_err(map_inference_error)?;
        let view = tensor.view();
        let shape = view.shape().to_vec();
        let data = view.iter().copied().collect::<Vec<f32>>();
        Ok((data, shape))
    }
}

impl OcrEngine for OnnxOcrEngine {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn recognize(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let plane = request.plane();
        let mut texts = Vec::new();
        for region in request.regions() {
            let Some(pixels) = plane.region_pixels(region) else {
                continue;
            };
            if let Some((text, confidence)) = self.recognize_pixels(&pixels)? {
                let mut entry = OcrText::new(*region, text);
                if let Some(conf) = confidence {
                    entry = entry.with_confidence(conf);
                }
                texts.push(entry);
            }
        }
        if let Some(frame) = request.frame_index() {
            log::trace!(
                "{} read {} fragments from frame {frame}",
                self.model_path.display(),
                texts.len()
            );
        }
        Ok(OcrResponse::new(texts))
    }
}

fn map_environment_error(err: OrtError) -> OcrError {
    OcrError::backend(format!("failed to initialise ONNX runtime environment: {err}"))
}

fn map_session_error(err: OrtError) -> OcrError {
    OcrError::backend(format!("failed to load ONNX model: {err}"))
}

fn map_input_error(err: OrtError) -> OcrError {
    OcrError::backend(format!("failed to prepare ONNX input: {err}"))
}

fn map_inference_error(err: OrtError) -> OcrError {
    OcrError::backend(format!("ONNX inference failed: {err}"))
}

fn load_dictionary(path: &Path) -> Result<Vec<char>, OcrError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        OcrError::backend(format!(
            "failed to read OCR dictionary '{}': {err}",
            path.display()
        ))
    })?;
    let mut alphabet = parse_dictionary(&contents);
    if alphabet.is_empty() {
        return Err(OcrError::backend(format!(
            "OCR dictionary '{}' is empty",
            path.display()
        )));
    }
    // PP-OCR models reserve the final class for a space.
    if !alphabet.contains(&' ') {
        alphabet.push(' ');
    }
    Ok(alphabet)
}

fn parse_dictionary(contents: &str) -> Vec<char> {
    contents
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').chars().next())
        .collect()
}

/// Scales the crop to `INPUT_HEIGHT` keeping its aspect ratio, normalises to
/// `[-1, 1]`, and right-pads with zeros up to the model input width.
fn resize_for_model(pixels: &RegionPixels) -> (Vec<f32>, usize) {
    let scaled_width = ((INPUT_HEIGHT as f32 / pixels.height as f32) * pixels.width as f32)
        .round()
        .clamp(1.0, MAX_INPUT_WIDTH as f32) as usize;
    let input_width = scaled_width.max(MIN_INPUT_WIDTH);
    let resized = resize_bilinear(
        &pixels.data,
        pixels.width,
        pixels.height,
        scaled_width,
        INPUT_HEIGHT,
    );

    let mut canvas = vec![0.0f32; input_width * INPUT_HEIGHT];
    for row in 0..INPUT_HEIGHT {
        let src_row = &resized[row * scaled_width..(row + 1) * scaled_width];
        let dst_row = &mut canvas[row * input_width..row * input_width + scaled_width];
        for (dst, src) in dst_row.iter_mut().zip(src_row) {
            *dst = (src - 0.5) / 0.5;
        }
    }
    (canvas, input_width)
}

fn resize_bilinear(
    src: &[u8],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<f32> {
    let mut out = vec![0.0f32; dst_width * dst_height];
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return out;
    }
    let scale_x = if dst_width > 1 {
        (src_width - 1) as f32 / (dst_width - 1) as f32
    } else {
        0.0
    };
    let scale_y = if dst_height > 1 {
        (src_height - 1) as f32 / (dst_height - 1) as f32
    } else {
        0.0
    };

    for dy in 0..dst_height {
        let fy = scale_y * dy as f32;
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(src_height - 1);
        let wy = fy - y0 as f32;
        for dx in 0..dst_width {
            let fx = scale_x * dx as f32;
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let wx = fx - x0 as f32;

            let sample = |x: usize, y: usize| src[y * src_width + x] as f32;
            let top = sample(x0, y0) + (sample(x1, y0) - sample(x0, y0)) * wx;
            let bottom = sample(x0, y1) + (sample(x1, y1) - sample(x0, y1)) * wx;
            out[dy * dst_width + dx] = ((top + (bottom - top) * wy) / 255.0).clamp(0.0, 1.0);
        }
    }
    out
}

fn prepare_input_tensor(
    normalized: &[f32],
    width: usize,
    height: usize,
) -> Result<Array4<f32>, OcrError> {
    if normalized.len() != width * height {
        return Err(OcrError::backend(
            "normalized image has unexpected length for ONNX input",
        ));
    }
    // Grey input is replicated across the three colour channels.
    let mut data = Vec::with_capacity(normalized.len() * 3);
    for _ in 0..3 {
        data.extend_from_slice(normalized);
    }
    Array4::from_shape_vec((1, 3, height, width), data)
        .map_err(|err| OcrError::backend(format!("failed to build ONNX input tensor: {err}")))
}

#[derive(Clone, Copy)]
enum OutputLayout {
    SequenceMajor,
    ClassMajor,
}

fn decode_sequence(
    data: &[f32],
    shape: &[usize],
    alphabet: &[char],
) -> Result<(String, Option<f32>), OcrError> {
    let mut dims = shape.to_vec();
    while dims.len() > 2 && dims.first() == Some(&1) {
        dims.remove(0);
    }
    let classes = alphabet.len() + 1;
    let (sequence_len, layout) = match dims.as_slice() {
        [seq, class] if *class == classes => (*seq, OutputLayout::SequenceMajor),
        [class, seq] if *class == classes => (*seq, OutputLayout::ClassMajor),
        other => {
            return Err(OcrError::backend(format!(
                "unexpected ONNX output dimensions {other:?} for alphabet of size {classes}"
            )));
        }
    };
    if data.len() < sequence_len * classes {
        return Err(OcrError::backend("onnx output buffer shorter than expected"));
    }

    let logit = |step: usize, class: usize| match layout {
        OutputLayout::SequenceMajor => data[step * classes + class],
        OutputLayout::ClassMajor => data[class * sequence_len + step],
    };

    let mut result = String::new();
    let mut previous: Option<usize> = None;
    let mut confidence_sum = 0.0f32;
    let mut confidence_count = 0usize;

    for step in 0..sequence_len {
        let max_logit = (0..classes)
            .map(|class| logit(step, class))
            .fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0f32;
        let mut best_index = 0usize;
        let mut best = 0.0f32;
        for class in 0..classes {
            let exp = (logit(step, class) - max_logit).exp();
            sum += exp;
            if exp > best {
                best = exp;
                best_index = class;
            }
        }
        if sum <= 0.0 {
            continue;
        }
        // Collapse repeats; a blank separates genuine double letters.
        if best_index != 0 && previous != Some(best_index) {
            if let Some(character) = alphabet.get(best_index - 1) {
                result.push(*character);
                confidence_sum += best / sum;
                confidence_count += 1;
            }
        }
        previous = (best_index != 0).then_some(best_index);
    }

    let confidence = (confidence_count > 0).then(|| confidence_sum / confidence_count as f32);
    Ok((result, confidence))
}

fn default_alphabet() -> Vec<char> {
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[]^_`{|}~ "
        .chars()
        .collect()
}
