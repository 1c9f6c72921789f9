use crate::config::RotationConfig;
use chrono::{Local, NaiveDate};
use std::fmt;

/// Source of "today" for daily rotation and backup dates.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

impl<F> Clock for F
where
    F: Fn() -> NaiveDate + Send + Sync,
{
    fn today(&self) -> NaiveDate {
        self()
    }
}

/// Running counters of the active file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileCounters {
    pub lines: u64,
    pub bytes: u64,
    pub opened_on: NaiveDate,
}

impl FileCounters {
    pub fn fresh(opened_on: NaiveDate) -> Self {
        Self {
            lines: 0,
            bytes: 0,
            opened_on,
        }
    }
}

/// Why a rotation happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationTrigger {
    Lines,
    Size,
    Daily,
    Requested,
}

impl fmt::Display for RotationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotationTrigger::Lines => "lines",
            RotationTrigger::Size => "size",
            RotationTrigger::Daily => "daily",
            RotationTrigger::Requested => "requested",
        };
        f.write_str(name)
    }
}

/// Decide whether the active file must be rotated before the next record
/// observed on `today` is written.
///
/// Returns the first trigger that fires, checked in the order lines, size,
/// day. `None` means the record goes into the current file.
pub fn rotation_due(
    counters: &FileCounters,
    today: NaiveDate,
    config: &RotationConfig,
) -> Option<RotationTrigger> {
    if config.max_lines > 0 && counters.lines >= config.max_lines {
        return Some(RotationTrigger::Lines);
    }
    if config.max_size_bytes > 0 && counters.bytes >= config.max_size_bytes {
        return Some(RotationTrigger::Size);
    }
    if day_changed(counters, today, config) {
        return Some(RotationTrigger::Daily);
    }
    None
}

/// Daily rotation is on and `today` is not the day the file was opened.
pub fn day_changed(counters: &FileCounters, today: NaiveDate, config: &RotationConfig) -> bool {
    config.rotate_daily && today != counters.opened_on
}
