use super::RawSample;

/// Linear conversion from raw counts to engineering units:
/// `value = raw * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub scale: f32,
    pub offset: f32,
}

impl Calibration {
    /// Reference transform for the simulated probe (degrees).
    pub const REFERENCE: Self = Self {
        scale: 0.0244,
        offset: -50.0,
    };

    pub const fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }

    /// Convert a raw sample to its engineering value
    #[inline]
    pub fn convert(&self, raw: RawSample) -> f32 {
        raw.value() as f32 * self.scale + self.offset
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::REFERENCE
    }
}
