//! Wall-clock abstraction for report timestamps
//!
//! Window boundaries are stamped with local calendar time at second
//! resolution. The [`Clock`] trait keeps the core free of any particular time
//! source: the simulator reads the host clock, tests use a [`ManualClock`].

use core::cell::Cell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Local calendar time with second resolution.
///
/// Renders as `YYYY-MM-DDTHH:MM:SS`, without fractional seconds or a
/// timezone suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WallTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallTime {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> WallTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> WallTime {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Safe to share between tasks; the current value sits behind the same kind
/// of critical-section mutex as the accumulator state.
pub struct ManualClock {
    now: Mutex<CriticalSectionRawMutex, Cell<WallTime>>,
}

impl ManualClock {
    pub const fn new(start: WallTime) -> Self {
        Self {
            now: Mutex::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: WallTime) {
        self.now.lock(|cell| cell.set(now));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> WallTime {
        self.now.lock(|cell| cell.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_wall_time_format_is_zero_padded() {
        let t = WallTime::new(2024, 3, 7, 9, 5, 1);
        assert_eq!(t.to_string(), "2024-03-07T09:05:01");
    }

    #[test]
    fn test_manual_clock_returns_last_set_value() {
        let clock = ManualClock::new(WallTime::new(2024, 1, 1, 0, 0, 0));
        assert_eq!(clock.now(), WallTime::new(2024, 1, 1, 0, 0, 0));

        clock.set(WallTime::new(2024, 1, 1, 0, 2, 0));
        assert_eq!(clock.now().to_string(), "2024-01-01T00:02:00");
    }
}
