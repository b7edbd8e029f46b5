//! Simulated acquisition: raw samples, calibration and the cyclic feed

mod calibration;
mod feed;

pub use calibration::Calibration;
pub use feed::{SampleFeed, parse_raw};

/// Maximum number of samples loaded into a feed by default.
pub const DEFAULT_MAX_SAMPLES: usize = 766;

/// One raw 16-bit acquisition, as an ADC would report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RawSample(pub u16);

impl RawSample {
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl From<u16> for RawSample {
    fn from(value: u16) -> Self {
        Self(value)
    }
}
