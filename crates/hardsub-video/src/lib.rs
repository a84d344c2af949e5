//! Everything between a video locator and cropped luma frames: fetching the
//! video, sampling stills with ffmpeg at a fixed cadence, and cutting the
//! subtitle band out of each still.

mod acquire;
mod crop;
mod error;
mod extract;
mod tools;

pub use acquire::{CookieSource, LocalFileSource, Source, VideoSource, YtDlpSource};
pub use crop::{crop_subtitle_band, load_cropped_frame};
pub use error::VideoError;
pub use extract::{FRAME_QUALITY, FfmpegExtractor, FrameExtractor, collect_frames};
pub use tools::find_ffmpeg;
