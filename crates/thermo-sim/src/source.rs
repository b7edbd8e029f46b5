//! Sample source loading
//!
//! The simulated ADC replays a text file with one raw reading per line. A
//! missing or unreadable file is not fatal: it is logged and the feed starts
//! empty.

use std::fs;
use std::path::Path;

use log::{error, info};
use thermo_core::sensors::SampleFeed;

use crate::error::AppError;

/// Load up to `max` samples from `path`, falling back to an empty feed
pub fn load_feed(path: &Path, max: usize) -> SampleFeed {
    match read_source(path) {
        Ok(text) => {
            let feed = SampleFeed::from_lines(text.lines(), max);
            info!("Loaded {} sample(s) from {}", feed.len(), path.display());
            feed
        }
        Err(e) => {
            error!("{}", e);
            SampleFeed::default()
        }
    }
}

fn read_source(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path).map_err(|source| AppError::SampleSource {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
