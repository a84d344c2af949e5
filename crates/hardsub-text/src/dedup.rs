use crate::TextError;
use crate::similarity::similarity_chars;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

pub fn validate_threshold(value: f64) -> Result<f64, TextError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(TextError::InvalidThreshold { value })
    }
}

/// Push-based collapse of consecutive near-duplicate lines.
///
/// Each incoming line is compared only with the last line that was emitted.
/// Lines scoring below the threshold are emitted and replace the
/// representative; everything else is dropped. A dropped line never becomes
/// the comparison anchor, so `a, b, a` survives intact when `a` and `b` differ.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
    representative: Option<Vec<char>>,
    seen: u64,
    emitted: u64,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Result<Self, TextError> {
        validate_threshold(threshold).map(Self::unchecked)
    }

    fn unchecked(threshold: f64) -> Self {
        Self {
            threshold,
            representative: None,
            seen: 0,
            emitted: 0,
        }
    }

    /// Offers the next line; returns it back when it starts a new subtitle.
    pub fn push(&mut self, line: String) -> Option<String> {
        self.seen = self.seen.saturating_add(1);
        let chars: Vec<char> = line.chars().collect();

        if let Some(current) = &self.representative {
            let score = similarity_chars(&chars, current);
            if score >= self.threshold {
                log::trace!("dropping near-duplicate line (similarity {score:.3}): {line}");
                return None;
            }
        }

        self.representative = Some(chars);
        self.emitted = self.emitted.saturating_add(1);
        Some(line)
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// Batch form of [`Deduplicator`]: keeps the first line and every line that is
/// dissimilar (strictly below `threshold`) from the last kept one.
///
/// The threshold is not range-checked here: anything above `1.0` keeps every
/// line, anything at or below `0.0` keeps only the first one.
pub fn deduplicate<S: AsRef<str>>(lines: &[S], threshold: f64) -> Vec<String> {
    let mut dedup = Deduplicator::unchecked(threshold);
    lines
        .iter()
        .filter_map(|line| dedup.push(line.as_ref().to_owned()))
        .collect()
}
