use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::config::{RosterConfig, SLOTS_PER_BLOCK, SLOT_MINUTES};
use super::types::{HourBlock, TimeSlot};

/// Formats a block or slot timestamp for display and export (YYYY-MM-DD HH:MM:SS)
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Business days between `first` and `last`, both inclusive
pub fn business_dates(first: NaiveDate, last: NaiveDate, config: &RosterConfig) -> Vec<NaiveDate> {
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| config.is_business_day(d.weekday()))
        .collect()
}

/// Candidate block starts for one date, one per business hour
pub fn block_starts(date: NaiveDate, config: &RosterConfig) -> Vec<HourBlock> {
    config
        .hours
        .block_start_hours()
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .collect()
}

/// The four quarter-hour slots that make up a block
pub fn block_slots(block: HourBlock) -> [TimeSlot; SLOTS_PER_BLOCK] {
    let step = Duration::minutes(SLOT_MINUTES);
    [block, block + step, block + step * 2, block + step * 3]
}
