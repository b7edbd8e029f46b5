extern crate alloc;
use alloc::vec::Vec;

use log::{debug, warn};

use super::RawSample;

/// Replayable, cyclic source of raw samples.
///
/// The feed is loaded once and then replayed forever: when the last sample
/// has been handed out, the next call starts again from the first one. This
/// stands in for live acquisition on a device without a real ADC.
#[derive(Debug, Clone, Default)]
pub struct SampleFeed {
    samples: Vec<RawSample>,
    cursor: usize,
}

impl SampleFeed {
    /// Create a feed from already-decoded samples, keeping at most `max`.
    pub fn new(mut samples: Vec<RawSample>, max: usize) -> Self {
        samples.truncate(max);
        Self { samples, cursor: 0 }
    }

    /// Build a feed from text lines holding one integer each.
    ///
    /// Parsing is best-effort and never fails: see [`parse_raw`]. Blank
    /// lines are skipped and anything after the first `max` samples is
    /// ignored.
    pub fn from_lines<'a, I>(lines: I, max: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut samples = Vec::new();
        let mut defaulted = 0usize;
        let mut ignored = 0usize;

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            if samples.len() >= max {
                ignored += 1;
                continue;
            }
            let (sample, clean) = parse_raw(line);
            if !clean {
                debug!("Sample line {:?} parsed as {}", line, sample.value());
                defaulted += 1;
            }
            samples.push(sample);
        }

        if defaulted > 0 {
            warn!("{} sample line(s) were not clean integers", defaulted);
        }
        if ignored > 0 {
            warn!("Ignored {} sample line(s) beyond the limit of {}", ignored, max);
        }

        Self { samples, cursor: 0 }
    }

    /// Next sample in the cycle, or `None` if the feed holds no samples.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<RawSample> {
        let sample = *self.samples.get(self.cursor)?;
        self.cursor = (self.cursor + 1) % self.samples.len();
        Some(sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the sample the next call to [`SampleFeed::next`] returns.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

/// Best-effort integer parse of one sample line.
///
/// Leading whitespace and an optional sign are accepted, then the leading
/// run of decimal digits is used. No digits means 0. The result is clamped
/// to the `u16` range. The flag is `false` when anything had to be
/// defaulted, clamped or discarded.
pub fn parse_raw(line: &str) -> (RawSample, bool) {
    let trimmed = line.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let number = &digits[..end];
    let clean_tail = digits[end..].trim().is_empty();

    if number.is_empty() {
        return (RawSample(0), false);
    }

    // Saturate instead of overflowing on absurdly long digit runs
    let magnitude = number.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    });

    if negative {
        return (RawSample(0), magnitude == 0 && clean_tail);
    }
    match u16::try_from(magnitude) {
        Ok(value) => (RawSample(value), clean_tail),
        Err(_) => (RawSample(u16::MAX), false),
    }
}
