use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::report::Report;
use crate::sensors::{Calibration, RawSample};
use crate::time::{Clock, WallTime};

/// Running statistics for the window currently being filled.
///
/// `min`, `max`, `sum` and `window_start` are only meaningful while
/// `count > 0`. A drain sets `count` back to zero and the next ingest
/// reseeds everything from its single value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregationWindow {
    pub count: u32,
    pub sum: f32,
    pub min: f32,
    pub max: f32,
    pub window_start: WallTime,
}

impl AggregationWindow {
    fn seed(&mut self, value: f32, now: WallTime) {
        self.count = 1;
        self.sum = value;
        self.min = value;
        self.max = value;
        self.window_start = now;
    }

    fn update(&mut self, value: f32) {
        self.count += 1;
        self.sum += value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

#[derive(Debug, Default)]
struct AccumulatorState {
    window: AggregationWindow,
    last_raw: Option<RawSample>,
}

/// Aggregation window shared between the sampling task and the reporter
///
/// Both operations run inside one critical-section mutex, so a drain can
/// never observe a half-applied ingest and an ingest can never land between
/// the snapshot and the reset of a drain.
///
/// ## Usage
///
/// ```rust,ignore
/// static ACCUMULATOR: StaticCell<Accumulator<LocalClock>> = StaticCell::new();
/// let accumulator = ACCUMULATOR.init(Accumulator::new(LocalClock, Calibration::REFERENCE));
///
/// // Sampling task, every 100 ms
/// accumulator.ingest(sample);
///
/// // Reporting task, on every timer tick
/// if let Some(report) = accumulator.try_drain(min_count) { /* deliver */ }
/// ```
pub struct Accumulator<C> {
    state: Mutex<CriticalSectionRawMutex, RefCell<AccumulatorState>>,
    calibration: Calibration,
    clock: C,
}

impl<C: Clock> Accumulator<C> {
    pub fn new(clock: C, calibration: Calibration) -> Self {
        Self {
            state: Mutex::new(RefCell::new(AccumulatorState::default())),
            calibration,
            clock,
        }
    }

    /// Convert one raw sample and fold it into the current window
    pub fn ingest(&self, raw: RawSample) {
        let value = self.calibration.convert(raw);

        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.last_raw = Some(raw);
            if state.window.count == 0 {
                state.window.seed(value, self.clock.now());
            } else {
                state.window.update(value);
            }
        });
    }

    /// Close the window if it holds at least `min_count` samples
    ///
    /// Returns the finalized [`Report`] and resets the window. An empty
    /// window never drains, whatever `min_count` is. When the threshold is
    /// not met nothing is modified.
    pub fn try_drain(&self, min_count: u32) -> Option<Report> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let window = &mut state.window;
            if window.count == 0 || window.count < min_count {
                return None;
            }

            let report = Report {
                window_start: window.window_start,
                window_end: self.clock.now(),
                min: window.min,
                max: window.max,
                average: window.sum / window.count as f32,
                sample_count: window.count,
            };
            window.count = 0;
            Some(report)
        })
    }

    /// Number of samples in the open window
    pub fn pending_count(&self) -> u32 {
        self.state.lock(|state| state.borrow().window.count)
    }

    /// Most recently ingested raw sample, if any
    pub fn last_raw(&self) -> Option<RawSample> {
        self.state.lock(|state| state.borrow().last_raw)
    }

    /// Copy of the open window, for diagnostics
    pub fn window(&self) -> AggregationWindow {
        self.state.lock(|state| state.borrow().window)
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }
}
