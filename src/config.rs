//! Roster configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields the standard desk-coverage rules:
//!
//! ```toml
//! max_schedules = 50
//! deprioritized_persons = ["Newcomer"]
//!
//! [caps]
//! total_blocks = 4
//! blocks_per_day = 2
//! consecutive_blocks = 2
//!
//! [hours]
//! first_start_hour = 10
//! end_hour = 19
//!
//! [input]
//! time_column = "time"
//! normalize_clock = true
//! anchor_hour = 10
//! ```

use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};
use crate::schedule::types::Person;

/// Length of one availability slot. Only quarter-hour polls are supported.
pub const SLOT_MINUTES: i64 = 15;

/// Number of slots that make up one hour block.
pub const SLOTS_PER_BLOCK: usize = 4;

/// Per-person workload limits enforced during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadCaps {
    /// Maximum blocks per person across the whole schedule
    pub total_blocks: u32,
    /// Maximum blocks per person on a single calendar day
    pub blocks_per_day: u32,
    /// Maximum run of adjacent blocks held by the same person
    pub consecutive_blocks: u32,
}

impl Default for WorkloadCaps {
    fn default() -> Self {
        Self {
            total_blocks: 4,
            blocks_per_day: 2,
            consecutive_blocks: 2,
        }
    }
}

/// Daily window in which hour blocks may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    /// Hour of the first block of the day
    pub first_start_hour: u32,
    /// Hour at which the last block ends (exclusive bound on start hours)
    pub end_hour: u32,
}

impl BusinessHours {
    /// Start hours of every block in a business day.
    pub fn block_start_hours(&self) -> std::ops::Range<u32> {
        self.first_start_hour..self.end_hour
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            first_start_hour: 10,
            end_hour: 19,
        }
    }
}

/// How the raw availability table is read and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Header of the timestamp column; every other column is a person
    pub time_column: String,
    /// Shift timestamps so the earliest hour of day lands on `anchor_hour`
    pub normalize_clock: bool,
    pub anchor_hour: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            time_column: "time".to_string(),
            normalize_clock: true,
            anchor_hour: 10,
        }
    }
}

fn default_business_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}

/// Top-level configuration for a roster run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Number of complete schedules recorded before the search stops
    pub max_schedules: usize,
    /// People pushed to the back of every block's candidate list
    pub deprioritized_persons: Vec<Person>,
    pub caps: WorkloadCaps,
    pub hours: BusinessHours,
    pub business_days: Vec<Weekday>,
    pub input: InputConfig,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            max_schedules: 50,
            deprioritized_persons: Vec::new(),
            caps: WorkloadCaps::default(),
            hours: BusinessHours::default(),
            business_days: default_business_days(),
            input: InputConfig::default(),
        }
    }
}

impl RosterConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RosterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn is_deprioritized(&self, person: &str) -> bool {
        self.deprioritized_persons.iter().any(|p| p == person)
    }

    pub fn is_business_day(&self, day: Weekday) -> bool {
        self.business_days.contains(&day)
    }

    /// Checks that every value is within a range the search can work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_schedules == 0 {
            return Err(RosterError::InvalidConfig(
                "max_schedules must be at least 1".to_string(),
            ));
        }

        let caps = &self.caps;
        if caps.total_blocks == 0 || caps.blocks_per_day == 0 || caps.consecutive_blocks == 0 {
            return Err(RosterError::InvalidConfig(
                "workload caps must be at least 1".to_string(),
            ));
        }

        let hours = &self.hours;
        if hours.first_start_hour >= hours.end_hour || hours.end_hour > 24 {
            return Err(RosterError::InvalidConfig(format!(
                "business hours {}:00-{}:00 are not a valid daily window",
                hours.first_start_hour, hours.end_hour
            )));
        }

        if self.business_days.is_empty() {
            return Err(RosterError::InvalidConfig(
                "at least one business day is required".to_string(),
            ));
        }

        if self.input.anchor_hour >= 24 {
            return Err(RosterError::InvalidConfig(format!(
                "anchor_hour {} is not an hour of the day",
                self.input.anchor_hour
            )));
        }

        if self.input.time_column.trim().is_empty() {
            return Err(RosterError::InvalidConfig(
                "time_column must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
