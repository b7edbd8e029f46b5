//! Startup errors for the simulator

use std::io;
use std::path::PathBuf;

use thermo_core::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot read config file {path}: {source}")]
    ConfigFile { path: PathBuf, source: io::Error },
    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot read sample source {path}: {source}")]
    SampleSource { path: PathBuf, source: io::Error },
    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("cannot spawn delivery worker: {0}")]
    Worker(#[source] io::Error),
}
