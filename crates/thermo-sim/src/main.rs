//! Host simulator for the thermo-rs temperature sampling device.
//!
//! Replays raw ADC readings from a text file at the configured sampling
//! rate, aggregates them into report windows and POSTs each window summary
//! to the collector. Summaries rejected with a 5xx status are kept in a
//! bounded ledger and sent as one combined payload to the fallback endpoint
//! once the ledger fills up.
//!
//! # Usage
//!
//! ```text
//! thermo-sim [CONFIG.json]
//! ```
//!
//! Without a config file the defaults apply: `temperature.txt` in the
//! working directory, one sample every 100 ms, one report every 120 s, and
//! the collector on `http://127.0.0.1:8080`. Set `RUST_LOG` to change the
//! log level.

use std::path::PathBuf;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use log::{error, info};
use static_cell::StaticCell;

use thermo_core::reporter::Reporter;
use thermo_core::sensors::{Calibration, SampleFeed};
use thermo_core::storage::Accumulator;
use thermo_core::tasks::{self, ReadySignal, Shutdown};

mod clock;
mod config;
mod error;
mod http;
mod source;

use clock::LocalClock;
use config::SimConfig;
use error::AppError;
use http::HttpTransport;

/// Largest run time that still fits in embassy ticks
const MAX_RUN_SECS: u64 = u64::MAX / embassy_time::TICK_HZ;

type SimAccumulator = Accumulator<LocalClock>;

static ACCUMULATOR: StaticCell<SimAccumulator> = StaticCell::new();
static READY: ReadySignal = ReadySignal::new();
static SHUTDOWN: Shutdown = Shutdown::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[embassy_executor::task]
async fn sampler_task(
    mut feed: SampleFeed,
    accumulator: &'static SimAccumulator,
    interval: Duration,
) {
    tasks::sample_loop(&mut feed, accumulator, interval, &SHUTDOWN).await;
}

#[embassy_executor::task]
async fn report_timer_task(interval: Duration) {
    tasks::report_timer_loop(&READY, interval, &SHUTDOWN).await;
}

#[embassy_executor::task]
async fn stop_after_task(run_for: Duration) {
    Timer::after(run_for).await;
    info!("Run time of {}s elapsed, shutting down", run_for.as_secs());
    SHUTDOWN.request();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let (config, transport) = match startup(config_path) {
        Ok(parts) => parts,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let pipeline = &config.pipeline;
    info!(
        "Sampling every {} ms, reporting every {} s to {}",
        pipeline.sample_interval_ms,
        pipeline.report_interval_secs,
        pipeline.collector.primary_url
    );

    let feed = source::load_feed(&config.sample_source, pipeline.max_samples);
    let accumulator: &'static SimAccumulator =
        ACCUMULATOR.init(Accumulator::new(LocalClock, Calibration::REFERENCE));

    let mut reporter: Reporter<'_, _, _> = Reporter::new(
        accumulator,
        transport,
        pipeline.collector.clone(),
        pipeline.first_report_min_count(),
    );

    spawner
        .spawn(sampler_task(feed, accumulator, pipeline.sample_interval()))
        .expect("sampler task");
    spawner
        .spawn(report_timer_task(pipeline.report_interval()))
        .expect("report timer task");
    if let Some(secs) = config.run_for_secs {
        spawner
            .spawn(stop_after_task(Duration::from_secs(secs.min(MAX_RUN_SECS))))
            .expect("stop task");
    }

    tasks::report_loop(&mut reporter, &READY, &SHUTDOWN).await;

    info!("Simulator stopped");
    std::process::exit(0);
}

fn startup(config_path: Option<PathBuf>) -> Result<(SimConfig, HttpTransport), AppError> {
    let config = SimConfig::load(config_path.as_deref())?;
    let transport = HttpTransport::spawn()?;
    Ok((config, transport))
}
