use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thermo_core::config::PipelineConfig;

use crate::error::AppError;

/// Simulator settings: where samples come from, how long to run, and the
/// pipeline settings shared with the core.
///
/// ```json
/// {
///   "sample_source": "temperature.txt",
///   "run_for_secs": 600,
///   "report_interval_secs": 30,
///   "collector": { "primary_url": "http://127.0.0.1:8080/temperature" }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub sample_source: PathBuf,
    /// Stop cleanly after this many seconds; run until killed when absent
    pub run_for_secs: Option<u64>,
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sample_source: PathBuf::from("temperature.txt"),
            run_for_secs: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load from a JSON file, or use the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| AppError::ConfigFile {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_json(&text).map_err(|source| AppError::ConfigParse {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => {
                info!("No configuration file given, using defaults");
                Self::default()
            }
        };

        config.pipeline.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
