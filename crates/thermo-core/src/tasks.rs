//! Long-running loops of the pipeline
//!
//! These are plain async functions over borrowed state. The binary wraps
//! each of them in an executor task with concrete types; tests can drive
//! them directly.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use log::{info, warn};

use crate::delivery::Transport;
use crate::reporter::Reporter;
use crate::sensors::SampleFeed;
use crate::storage::Accumulator;
use crate::time::Clock;

/// Raised by the report timer, consumed by the reporting loop.
///
/// Raising it again before it is consumed collapses into one pending
/// signal, and waiting on it clears it.
pub type ReadySignal = Signal<CriticalSectionRawMutex, ()>;

/// Cooperative stop request shared by all pipeline loops
///
/// The sampling and timer loops check the flag each time they wake up. The
/// reporting loop is woken immediately so it can run its final flush.
pub struct Shutdown {
    requested: AtomicBool,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl Shutdown {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            signal: Signal::new(),
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.signal.signal(());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolves once a stop has been requested. Only one waiter is supported.
    pub async fn wait(&self) {
        if !self.is_requested() {
            self.signal.wait().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull one sample per `interval` from the feed into the accumulator
///
/// Ticks are scheduled on a fixed grid, so processing time never delays
/// later samples.
pub async fn sample_loop<C: Clock>(
    feed: &mut SampleFeed,
    accumulator: &Accumulator<C>,
    interval: Duration,
    shutdown: &Shutdown,
) {
    if feed.is_empty() {
        warn!("Sample feed is empty, no samples will be ingested");
    }

    let mut ticker = Ticker::every(interval);
    while !shutdown.is_requested() {
        ticker.next().await;
        if let Some(sample) = feed.next() {
            accumulator.ingest(sample);
        }
    }
    info!("Sampling stopped");
}

/// Raise `ready` once per `interval`
pub async fn report_timer_loop(ready: &ReadySignal, interval: Duration, shutdown: &Shutdown) {
    let mut ticker = Ticker::every(interval);
    while !shutdown.is_requested() {
        ticker.next().await;
        ready.signal(());
    }
    info!("Report timer stopped");
}

/// Run one report cycle per ready signal until shutdown, then flush
pub async fn report_loop<C, T, const N: usize>(
    reporter: &mut Reporter<'_, C, T, N>,
    ready: &ReadySignal,
    shutdown: &Shutdown,
) where
    C: Clock,
    T: Transport,
{
    loop {
        match select(ready.wait(), shutdown.wait()).await {
            Either::First(()) => {
                reporter.on_ready().await;
            }
            Either::Second(()) => break,
        }
    }
    reporter.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectorConfig, PipelineConfig};
    use crate::delivery::DeliveryError;
    use crate::sensors::{Calibration, RawSample};
    use crate::time::{ManualClock, WallTime};
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use embassy_futures::block_on;
    use embassy_futures::join::{join, join3};
    use embassy_time::Timer;

    use crate::reporter::CycleOutcome;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<String>,
    }

    impl Transport for RecordingTransport {
        async fn deliver(&mut self, _url: &str, payload: &str) -> Result<(), DeliveryError> {
            self.sent.push(payload.to_string());
            Ok(())
        }
    }

    fn accumulator() -> Accumulator<ManualClock> {
        Accumulator::new(
            ManualClock::new(WallTime::new(2024, 1, 1, 0, 0, 0)),
            Calibration::REFERENCE,
        )
    }

    #[test]
    fn test_sample_loop_ingests_until_shutdown() {
        let acc = accumulator();
        let shutdown = Shutdown::new();
        let mut feed = SampleFeed::new(vec![RawSample(2048), RawSample(2100)], 766);

        block_on(join(
            sample_loop(&mut feed, &acc, Duration::from_millis(2), &shutdown),
            async {
                Timer::after_millis(40).await;
                shutdown.request();
            },
        ));

        assert!(acc.pending_count() >= 1);
        assert!(acc.last_raw().is_some());
    }

    #[test]
    fn test_sample_loop_with_empty_feed_ingests_nothing() {
        let acc = accumulator();
        let shutdown = Shutdown::new();
        let mut feed = SampleFeed::default();

        block_on(join(
            sample_loop(&mut feed, &acc, Duration::from_millis(1), &shutdown),
            async {
                Timer::after_millis(10).await;
                shutdown.request();
            },
        ));

        assert_eq!(acc.pending_count(), 0);
    }

    #[test]
    fn test_ready_signal_collapses_and_clears() {
        let ready = ReadySignal::new();
        ready.signal(());
        ready.signal(());
        assert!(ready.signaled());

        block_on(ready.wait());
        assert!(!ready.signaled());
    }

    #[test]
    fn test_report_loop_flushes_on_shutdown() {
        let acc = accumulator();
        let ready = ReadySignal::new();
        let shutdown = Shutdown::new();
        let mut reporter: Reporter<'_, _, _> =
            Reporter::new(&acc, RecordingTransport::default(), CollectorConfig::default(), 1);

        acc.ingest(RawSample(2048));
        ready.signal(());

        block_on(join(report_loop(&mut reporter, &ready, &shutdown), async {
            Timer::after_millis(5).await;
            acc.ingest(RawSample(2100));
            shutdown.request();
        }));

        // One report from the ready signal, one from the final flush
        assert_eq!(reporter.transport().sent.len(), 2);
        assert_eq!(acc.pending_count(), 0);
    }

    /// Counts delivery attempts through a shared cell so tests can look while
    /// the reporter is still borrowed by the loop
    struct CountingTransport<'a> {
        attempts: &'a Cell<usize>,
    }

    impl Transport for CountingTransport<'_> {
        async fn deliver(&mut self, _url: &str, _payload: &str) -> Result<(), DeliveryError> {
            self.attempts.set(self.attempts.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_report_loop_skips_early_tick_until_next_one() {
        let acc = accumulator();
        let ready = ReadySignal::new();
        let shutdown = Shutdown::new();
        let attempts = Cell::new(0);
        let transport = CountingTransport {
            attempts: &attempts,
        };
        let mut reporter: Reporter<'_, _, _> =
            Reporter::new(&acc, transport, CollectorConfig::default(), 5);

        for raw in [2048, 2100, 2000] {
            acc.ingest(RawSample(raw));
        }
        ready.signal(());

        block_on(join(report_loop(&mut reporter, &ready, &shutdown), async {
            Timer::after_millis(10).await;
            // Early tick consumed without a delivery and without re-arming
            assert!(!ready.signaled());
            assert_eq!(attempts.get(), 0);
            assert_eq!(acc.pending_count(), 3);

            acc.ingest(RawSample(2048));
            acc.ingest(RawSample(2048));
            Timer::after_millis(10).await;
            assert_eq!(attempts.get(), 0);

            ready.signal(());
            Timer::after_millis(10).await;
            assert_eq!(attempts.get(), 1);
            assert_eq!(acc.pending_count(), 0);

            shutdown.request();
        }));

        let stats = reporter.stats();
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.delivered, 1);
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_first_tick_reports_with_derived_min_count() {
        let config = PipelineConfig {
            sample_interval_ms: 10,
            report_interval_secs: 1,
            ..PipelineConfig::default()
        };
        let acc = accumulator();
        let ready = ReadySignal::new();
        let shutdown = Shutdown::new();
        let mut feed = SampleFeed::new(vec![RawSample(2048), RawSample(2100)], 766);
        let mut reporter: Reporter<'_, _, _> = Reporter::new(
            &acc,
            RecordingTransport::default(),
            config.collector.clone(),
            config.first_report_min_count(),
        );

        let mut first = None;
        block_on(join3(
            sample_loop(&mut feed, &acc, config.sample_interval(), &shutdown),
            report_timer_loop(&ready, config.report_interval(), &shutdown),
            async {
                ready.wait().await;
                first = Some(reporter.on_ready().await);
                shutdown.request();
            },
        ));

        assert_eq!(first, Some(CycleOutcome::Delivered));
        assert_eq!(reporter.transport().sent.len(), 1);
    }

    #[test]
    fn test_report_timer_raises_ready() {
        let ready = ReadySignal::new();
        let shutdown = Shutdown::new();

        block_on(join(
            report_timer_loop(&ready, Duration::from_millis(2), &shutdown),
            async {
                ready.wait().await;
                shutdown.request();
            },
        ));

        assert!(shutdown.is_requested());
    }
}
