//! Report cycle: drain, render, deliver, and fall back on server errors.
//!
//! Each ready signal from the report timer runs one cycle:
//!
//! ```text
//! Idle --ready--> WindowReady --window drained--> Delivering --> Idle
//!                      |
//!                      +--too few samples--> Idle (skipped)
//! ```
//!
//! A 5xx answer from the primary endpoint parks the payload in the
//! [`FailureLedger`]. When that fills the ledger, its whole content is sent to
//! the fallback endpoint in one request and the ledger starts over. Any other
//! failure is logged and the report is dropped.

extern crate alloc;
use alloc::string::String;

use log::{debug, error, info, warn};

use crate::config::CollectorConfig;
use crate::delivery::{DeliveryError, Endpoint, Transport};
use crate::storage::{Accumulator, FailureLedger, LEDGER_CAPACITY};
use crate::time::Clock;

/// Where the reporter is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Idle,
    WindowReady,
    Delivering,
}

/// What one report cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The window did not hold enough samples; nothing was sent
    Skipped,
    /// The primary endpoint accepted the report
    Delivered,
    /// Non-server failure; the report was logged and dropped
    Dropped(DeliveryError),
    /// Server failure; the payload waits in the ledger
    Recorded { pending: usize },
    /// Server failure filled the ledger and the combined blob reached the fallback
    FallbackSent { entries: usize },
    /// Server failure filled the ledger and the fallback send failed too
    FallbackFailed {
        entries: usize,
        error: DeliveryError,
    },
}

/// Running totals, logged on shutdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterStats {
    pub delivered: u32,
    pub skipped: u32,
    pub dropped: u32,
    pub recorded: u32,
    pub fallback_sent: u32,
    pub fallback_failed: u32,
}

/// Drives the report cycle against one accumulator and one transport
///
/// The reporter exclusively owns the failure ledger; only the accumulator is
/// shared with the sampling task.
pub struct Reporter<'a, C, T, const N: usize = LEDGER_CAPACITY> {
    accumulator: &'a Accumulator<C>,
    transport: T,
    collector: CollectorConfig,
    ledger: FailureLedger<N>,
    first_min_count: u32,
    first_report_done: bool,
    state: ReporterState,
    stats: ReporterStats,
}

impl<'a, C, T, const N: usize> Reporter<'a, C, T, N>
where
    C: Clock,
    T: Transport,
{
    /// `first_min_count` gates only the first report after startup; later
    /// windows are reported as soon as they hold any sample.
    pub fn new(
        accumulator: &'a Accumulator<C>,
        transport: T,
        collector: CollectorConfig,
        first_min_count: u32,
    ) -> Self {
        Self {
            accumulator,
            transport,
            collector,
            ledger: FailureLedger::new(),
            first_min_count,
            first_report_done: false,
            state: ReporterState::Idle,
            stats: ReporterStats::default(),
        }
    }

    /// Run one cycle in response to a ready signal
    pub async fn on_ready(&mut self) -> CycleOutcome {
        self.state = ReporterState::WindowReady;
        let outcome = self.run_cycle().await;
        self.state = ReporterState::Idle;
        outcome
    }

    async fn run_cycle(&mut self) -> CycleOutcome {
        let Some(report) = self.accumulator.try_drain(self.threshold()) else {
            debug!(
                "Report skipped: {} sample(s) in window, need {}",
                self.accumulator.pending_count(),
                self.threshold()
            );
            self.stats.skipped += 1;
            return CycleOutcome::Skipped;
        };
        self.first_report_done = true;

        let payload = report.render();
        debug!("Report payload: {}", payload);

        self.state = ReporterState::Delivering;
        match self
            .transport
            .deliver(self.collector.url(Endpoint::Primary), &payload)
            .await
        {
            Ok(()) => {
                info!(
                    "Delivered report {} -> {} ({} samples)",
                    report.window_start, report.window_end, report.sample_count
                );
                self.stats.delivered += 1;
                CycleOutcome::Delivered
            }
            Err(e) if e.is_server_error() => self.record_failure(payload, e).await,
            Err(e) => {
                warn!("Report delivery failed, dropping it: {}", e);
                self.stats.dropped += 1;
                CycleOutcome::Dropped(e)
            }
        }
    }

    async fn record_failure(&mut self, payload: String, e: DeliveryError) -> CycleOutcome {
        self.stats.recorded += 1;
        // Never evicts: a full ledger is flushed below before the next record
        self.ledger.record(payload);
        warn!(
            "Report delivery failed ({}), {} of {} payload(s) pending",
            e,
            self.ledger.len(),
            self.ledger.capacity()
        );

        if !self.ledger.is_full() {
            return CycleOutcome::Recorded {
                pending: self.ledger.len(),
            };
        }

        match self.flush_ledger().await {
            Some((entries, Ok(()))) => CycleOutcome::FallbackSent { entries },
            Some((entries, Err(error))) => CycleOutcome::FallbackFailed { entries, error },
            None => CycleOutcome::Recorded { pending: 0 },
        }
    }

    /// Send every pending payload to the fallback endpoint as one blob.
    ///
    /// The ledger is emptied whatever the result; a failed fallback send is
    /// logged and not retried.
    async fn flush_ledger(&mut self) -> Option<(usize, Result<(), DeliveryError>)> {
        if self.ledger.is_empty() {
            return None;
        }
        let entries = self.ledger.len();
        let blob = self.ledger.drain_combined();

        let result = self
            .transport
            .deliver(self.collector.url(Endpoint::Fallback), &blob)
            .await;
        match &result {
            Ok(()) => {
                info!("Sent {} pending report(s) to the fallback endpoint", entries);
                self.stats.fallback_sent += 1;
            }
            Err(e) => {
                error!(
                    "Fallback delivery of {} report(s) failed, dropping them: {}",
                    entries, e
                );
                self.stats.fallback_failed += 1;
            }
        }
        Some((entries, result))
    }

    /// Final pass before the process exits
    ///
    /// Reports whatever the open window holds and hands any pending ledger
    /// entries to the fallback endpoint. Best-effort, nothing is retried.
    pub async fn shutdown(&mut self) {
        info!("Reporter shutting down");
        self.first_report_done = true;
        let outcome = self.on_ready().await;
        debug!("Final report cycle: {:?}", outcome);

        self.state = ReporterState::Delivering;
        self.flush_ledger().await;
        self.state = ReporterState::Idle;

        info!("Reporter stats: {:?}", self.stats);
    }

    fn threshold(&self) -> u32 {
        if self.first_report_done {
            1
        } else {
            self.first_min_count
        }
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    pub fn stats(&self) -> ReporterStats {
        self.stats
    }

    pub fn ledger(&self) -> &FailureLedger<N> {
        &self.ledger
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
