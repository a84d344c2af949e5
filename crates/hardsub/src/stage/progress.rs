use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Frames between "OCR processing frame" log lines.
pub const LOG_EVERY_FRAMES: u64 = 50;

/// Progress bar plus periodic log line for the OCR pass.
pub struct OcrProgress {
    bar: ProgressBar,
    total: u64,
    processed: u64,
    lines: u64,
    started: Instant,
    finished: bool,
}

impl OcrProgress {
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(total);
            bar.set_style(bar_style());
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix("ocr");

        Self {
            bar,
            total,
            processed: 0,
            lines: 0,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Called before a frame is read, with its 1-based position.
    pub fn starting(&self, position: u64) {
        if position == 1 || position % LOG_EVERY_FRAMES == 0 {
            let total = self.total;
            self.bar
                .suspend(|| log::info!("OCR processing frame {position}/{total}"));
        }
    }

    pub fn observe(&mut self, produced_line: bool) {
        self.processed = self.processed.saturating_add(1);
        if produced_line {
            self.lines = self.lines.saturating_add(1);
        }
        self.bar.set_position(self.processed);
        self.update_message();
    }

    fn update_message(&self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let rate = self.processed as f64 / elapsed;
            self.bar
                .set_message(format!("{rate:.1} fps • {} lines", self.lines));
        }
    }

    pub fn fail(&mut self, reason: &str) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.bar.abandon_with_message(format!(
            "failed after {} frames: {reason}",
            self.processed
        ));
    }

    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.bar.set_position(self.total);
        self.bar.finish_with_message(format!(
            "processed {}/{} frames, {} lines",
            self.processed, self.total, self.lines
        ));
    }
}

impl Drop for OcrProgress {
    fn drop(&mut self) {
        if !self.finished {
            self.bar.abandon();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.bold} {bar:40.cyan/blue} {percent:>3.bold}% {pos:>5}/{len:<5} [{elapsed_precise:.dim}<{eta_precise:.dim}] {msg:.yellow}",
    )
    .expect("invalid ocr bar template")
    .progress_chars("█▉▊▋▌▍▎▏ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_counts_frames() {
        let mut progress = OcrProgress::new(3, false);
        progress.starting(1);
        progress.observe(true);
        progress.observe(false);
        progress.observe(true);
        assert_eq!(progress.processed, 3);
        assert_eq!(progress.lines, 2);
        progress.finish();
        assert!(progress.finished);
    }
}
