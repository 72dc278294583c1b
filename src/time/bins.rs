//! Time Bins & Temporal Flags
//!
//! `time_bin = floor((hour * 60 + minute) / bin_minutes)` on the
//! timezone-naive local timestamp.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in a day
pub const MINUTES_PER_DAY: u32 = 1440;

/// Static flags of a time bin, derived from the hour the bin starts in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFlags {
    /// Starts between 07:00 and 09:59
    pub is_morning_commute: bool,
    /// Starts between 16:00 and 18:59
    pub is_evening_commute: bool,
    /// Starts at or before 05:59
    pub is_late_night: bool,
}

/// Maps timestamps to fixed-width time-of-day bins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBinner {
    minutes: u32,
}

impl TimeBinner {
    /// Create a binner; the width is clamped to `[1, 1440]` minutes
    pub fn new(minutes: u32) -> Self {
        Self {
            minutes: minutes.clamp(1, MINUTES_PER_DAY),
        }
    }

    /// Bin width in minutes
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Number of bins covering a day
    pub fn bins_per_day(&self) -> u16 {
        MINUTES_PER_DAY.div_ceil(self.minutes) as u16
    }

    /// Whether `bin` is a valid index for this width
    pub fn contains(&self, bin: u16) -> bool {
        bin < self.bins_per_day()
    }

    /// Bin index of a timestamp
    pub fn bin_of(&self, timestamp: &NaiveDateTime) -> u16 {
        let minute_of_day = timestamp.hour() * 60 + timestamp.minute();
        (minute_of_day / self.minutes) as u16
    }

    /// Hour of day (0-23) in which `bin` starts
    pub fn start_hour(&self, bin: u16) -> u32 {
        (bin as u32 * self.minutes) / 60
    }

    /// Temporal flags for `bin`
    pub fn flags(&self, bin: u16) -> TemporalFlags {
        let hour = self.start_hour(bin);
        TemporalFlags {
            is_morning_commute: (7..=9).contains(&hour),
            is_evening_commute: (16..=18).contains(&hour),
            is_late_night: hour <= 5,
        }
    }
}

impl Default for TimeBinner {
    fn default() -> Self {
        Self::new(60)
    }
}
