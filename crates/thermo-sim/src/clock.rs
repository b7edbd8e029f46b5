use chrono::{Datelike, Local, Timelike};
use thermo_core::time::{Clock, WallTime};

/// Host local time, truncated to whole seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> WallTime {
        let now = Local::now();
        WallTime::new(
            u16::try_from(now.year()).unwrap_or_default(),
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        )
    }
}
