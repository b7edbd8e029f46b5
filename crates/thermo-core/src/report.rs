//! Finalized window statistics and their wire rendering.
//!
//! A [`Report`] is the immutable snapshot taken when the accumulator is
//! drained. [`Report::render`] produces the payload posted to the collector:
//!
//! ```text
//! {"time":{"start":"2024-01-01T00:00:00","end":"2024-01-01T00:02:00"},"min":-1.20,"max":1.24,"avg":0.00}
//! ```
//!
//! Field order is fixed and every number carries exactly two decimals, so
//! identical windows always render to identical bytes.

extern crate alloc;
use alloc::string::String;
use core::fmt::{self, Write};

use crate::time::WallTime;

/// Statistics for one closed aggregation window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    /// Time of the first sample in the window
    pub window_start: WallTime,
    /// Time the window was drained
    pub window_end: WallTime,
    /// Minimum engineering value
    pub min: f32,
    /// Maximum engineering value
    pub max: f32,
    /// Arithmetic mean of the engineering values
    pub average: f32,
    /// Number of samples in the window
    pub sample_count: u32,
}

impl Report {
    /// Render the report as its JSON payload.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(112);
        // Writing into a String cannot fail
        let _ = self.write_json(&mut out);
        out
    }

    /// Write the JSON payload into any formatter sink.
    pub fn write_json<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "{{\"time\":{{\"start\":\"{}\",\"end\":\"{}\"}},\"min\":{},\"max\":{},\"avg\":{}}}",
            self.window_start,
            self.window_end,
            Fixed2(self.min),
            Fixed2(self.max),
            Fixed2(self.average),
        )
    }
}

/// Two-decimal rendering that never emits `NaN`/`inf`, which JSON cannot carry.
struct Fixed2(f32);

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() {
            write!(f, "{:.2}", self.0)
        } else {
            f.write_str("0.00")
        }
    }
}
