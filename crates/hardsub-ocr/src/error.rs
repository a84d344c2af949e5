use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR program '{program}' was not found")]
    ProgramNotFound { program: String },
    #[error("OCR program '{program}' failed{}: {detail}", on_frame(.frame))]
    ProgramFailed {
        program: String,
        frame: Option<u64>,
        detail: String,
    },
    #[error("backend error: {message}")]
    Backend { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

fn on_frame(frame: &Option<u64>) -> String {
    match frame {
        Some(index) => format!(" on frame {index}"),
        None => String::new(),
    }
}
