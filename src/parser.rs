use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDateTime, Timelike};
use csv::{Reader, ReaderBuilder};
use tracing::{debug, warn};

use crate::config::InputConfig;
use crate::error::{Result, RosterError};
use crate::schedule::{Person, SlotAvailability, TimeSlot};

/// Timestamp layouts accepted in the time column, tried in order
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
];

/// One row of the poll export: a slot and who marked it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRow {
    pub time: TimeSlot,
    pub available: Vec<Person>,
}

/// The poll export after parsing, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityTable {
    /// Person columns in header order
    pub people: Vec<Person>,
    pub rows: Vec<AvailabilityRow>,
    /// Rows whose timestamp could not be parsed
    pub dropped_rows: usize,
    /// People with a mark on any row, dropped rows included
    pub marked: BTreeSet<Person>,
}

impl AvailabilityTable {
    /// People with at least one available cell anywhere in the file, in column order
    pub fn active_people(&self) -> Vec<Person> {
        self.people
            .iter()
            .filter(|p| self.marked.contains(*p))
            .cloned()
            .collect()
    }

    /// Slot-to-people map handed to the block compiler
    ///
    /// A timestamp repeated later in the file replaces the earlier row.
    pub fn slot_availability(&self) -> SlotAvailability {
        let mut availability = SlotAvailability::new();
        for row in &self.rows {
            availability.insert(row.time, row.available.iter().cloned());
        }
        availability
    }

    /// Shifts every timestamp so the earliest hour of day becomes `anchor_hour`
    ///
    /// Poll exports are stored in UTC; the desk's first business hour is the
    /// earliest hour anyone can be offered, so it anchors the correction.
    pub fn normalize_clock(&mut self, anchor_hour: u32) {
        let Some(min_hour) = self.rows.iter().map(|row| row.time.hour()).min() else {
            return;
        };

        let offset = (anchor_hour as i64 - min_hour as i64).rem_euclid(24);
        if offset == 0 {
            return;
        }

        debug!("Shifting availability timestamps by {} hours", offset);
        let shift = Duration::hours(offset);
        for row in &mut self.rows {
            row.time += shift;
        }
    }
}

/// Parses a timestamp cell, returning None for anything unrecognized
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Reads a poll export from any reader (file contents, upload body)
pub fn read_availability<R: Read>(source: R, input: &InputConfig) -> Result<AvailabilityTable> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    parse_records(&mut reader, input)
}

/// Loads a poll export CSV from disk
pub fn load_availability<P: AsRef<Path>>(csv_path: P, input: &InputConfig) -> Result<AvailabilityTable> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(csv_path)?;
    parse_records(&mut reader, input)
}

fn parse_records<R: Read>(reader: &mut Reader<R>, input: &InputConfig) -> Result<AvailabilityTable> {
    let headers = reader.headers()?.clone();

    let time_col = headers
        .iter()
        .position(|h| h.trim() == input.time_column)
        .ok_or_else(|| RosterError::MissingTimeColumn(input.time_column.clone()))?;

    // Every other column is a person
    let person_cols: Vec<(usize, Person)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_col)
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut table = AvailabilityTable {
        people: person_cols.iter().map(|(_, p)| p.clone()).collect(),
        ..AvailabilityTable::default()
    };

    for result in reader.records() {
        let record = result?;

        let available: Vec<Person> = person_cols
            .iter()
            .filter(|(i, _)| record.get(*i).map(|cell| !cell.trim().is_empty()).unwrap_or(false))
            .map(|(_, p)| p.clone())
            .collect();
        table.marked.extend(available.iter().cloned());

        let Some(time) = record.get(time_col).and_then(parse_timestamp) else {
            table.dropped_rows += 1;
            continue;
        };

        table.rows.push(AvailabilityRow { time, available });
    }

    if table.dropped_rows > 0 {
        warn!(
            "Dropped {} rows with unparseable timestamps",
            table.dropped_rows
        );
    }

    if input.normalize_clock {
        table.normalize_clock(input.anchor_hour);
    }

    debug!(
        "Loaded {} availability rows for {} people",
        table.rows.len(),
        table.people.len()
    );

    Ok(table)
}
