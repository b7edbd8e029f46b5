extern crate alloc;
use alloc::string::String;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::delivery::Endpoint;
use crate::sensors::DEFAULT_MAX_SAMPLES;

/// Longest accepted sample or report interval (one week)
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// The derived first-report threshold is lowered by 1/20 of itself (at least
/// one sample) so a tick landing together with the last sample still reports.
const MIN_COUNT_SLACK_DIVISOR: u64 = 20;

/// Timing, sizing and collector settings for the sampling pipeline.
///
/// Every field has a default, so a partial config file only needs to name
/// what it changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Delay between two samples
    pub sample_interval_ms: u64,
    /// Delay between two report attempts
    pub report_interval_secs: u64,
    /// Samples required before the first report; derived when absent
    pub min_count: Option<u32>,
    /// Upper bound on samples loaded into the feed
    pub max_samples: usize,
    pub collector: CollectorConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CollectorConfig {
    pub primary_url: String,
    pub fallback_url: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sample_interval_ms must be greater than zero")]
    ZeroSampleInterval,
    #[error("report_interval_secs must be greater than zero")]
    ZeroReportInterval,
    #[error("sample_interval_ms must not exceed {max}")]
    SampleIntervalTooLong { max: u64 },
    #[error("report_interval_secs must not exceed {max}")]
    ReportIntervalTooLong { max: u64 },
    #[error("max_samples must be greater than zero")]
    ZeroMaxSamples,
    #[error("collector {0} URL is empty")]
    MissingUrl(&'static str),
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            report_interval_secs: 120,
            min_count: None,
            max_samples: DEFAULT_MAX_SAMPLES,
            collector: CollectorConfig::default(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            primary_url: "http://127.0.0.1:8080/temperature".into(),
            fallback_url: "http://127.0.0.1:8080/temperature/missing".into(),
        }
    }
}

impl CollectorConfig {
    pub fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Primary => &self.primary_url,
            Endpoint::Fallback => &self.fallback_url,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.sample_interval_ms > MAX_INTERVAL_SECS * 1000 {
            return Err(ConfigError::SampleIntervalTooLong {
                max: MAX_INTERVAL_SECS * 1000,
            });
        }
        if self.report_interval_secs == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }
        if self.report_interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::ReportIntervalTooLong {
                max: MAX_INTERVAL_SECS,
            });
        }
        if self.max_samples == 0 {
            return Err(ConfigError::ZeroMaxSamples);
        }
        if self.collector.primary_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl("primary"));
        }
        if self.collector.fallback_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl("fallback"));
        }
        Ok(())
    }

    /// Sampling period, capped at [`MAX_INTERVAL_SECS`]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.min(MAX_INTERVAL_SECS * 1000))
    }

    /// Reporting period, capped at [`MAX_INTERVAL_SECS`]
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.min(MAX_INTERVAL_SECS))
    }

    /// Samples the window must hold before the first report is drained.
    ///
    /// Defaults to one reporting interval worth of samples, minus a small
    /// slack for the sample that coincides with the report tick. An explicit
    /// `min_count` is used as given.
    pub fn first_report_min_count(&self) -> u32 {
        self.min_count
            .unwrap_or_else(|| {
                let per_interval = self.report_interval_secs.saturating_mul(1000)
                    / self.sample_interval_ms.max(1);
                let slack = (per_interval / MIN_COUNT_SLACK_DIVISOR).max(1);
                u32::try_from(per_interval.saturating_sub(slack)).unwrap_or(u32::MAX)
            })
            .max(1)
    }
}
