use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::{format_timestamp, Person, Schedule, SearchOutcome};

/// One exported line of a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub time: String,
    pub person: Person,
}

/// Coverage of a schedule against everyone who answered the poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub scheduled: usize,
    pub active: usize,
    /// Active people with no block, sorted by name
    pub unscheduled: Vec<Person>,
}

/// Rows of a schedule sorted by block start
pub fn schedule_rows(schedule: &Schedule) -> Vec<ScheduleRow> {
    schedule
        .assignments
        .iter()
        .map(|(block, person)| ScheduleRow {
            time: format_timestamp(block),
            person: person.clone(),
        })
        .collect()
}

/// Summarizes who made it onto a schedule
pub fn summarize(schedule: &Schedule, active_people: &[Person]) -> ScheduleSummary {
    let active: BTreeSet<&str> = active_people.iter().map(String::as_str).collect();
    let scheduled = schedule.people();
    let unscheduled = active
        .difference(&scheduled)
        .map(|p| p.to_string())
        .collect();

    ScheduleSummary {
        scheduled: scheduled.len(),
        active: active.len(),
        unscheduled,
    }
}

/// File name for the i-th schedule (1-based): `<base>_schedule_<i>.csv`
pub fn schedule_file_name(base: &str, index: usize) -> String {
    format!("{}_schedule_{}.csv", base, index)
}

/// Writes a schedule as `time,person` rows
pub fn write_schedule_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    for row in schedule_rows(schedule) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes every schedule of an outcome into `dir`, returning the paths written
pub fn write_outcome(outcome: &SearchOutcome, dir: &Path, base: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (i, ranked) in outcome.schedules().iter().enumerate() {
        let path = dir.join(schedule_file_name(base, i + 1));
        write_schedule_csv(&ranked.schedule, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Coverage lines of a schedule
fn schedule_stats_lines(summary: &ScheduleSummary) -> Vec<String> {
    let unscheduled = if summary.unscheduled.is_empty() {
        "None".to_string()
    } else {
        summary.unscheduled.join(", ")
    };
    vec![
        "-".repeat(50),
        format!("Scheduled {} / {} people", summary.scheduled, summary.active),
        format!("Unscheduled: {}", unscheduled),
    ]
}

/// Run report: block count, schedule count and per-schedule coverage
pub fn format_outcome(outcome: &SearchOutcome, active_people: &[Person]) -> String {
    let SearchOutcome::Generated {
        schedules,
        block_count,
        max_schedules,
        capped,
    } = outcome
    else {
        return "No valid hour blocks found.".to_string();
    };

    let mut lines = vec![
        format!("Found {} hour blocks.", block_count),
        format!("Generated {} schedules (max {}).", schedules.len(), max_schedules),
    ];
    if *capped {
        lines.push(format!(
            "Capped at {} schedules; more valid schedules may exist.",
            max_schedules
        ));
    }

    for (i, ranked) in schedules.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("Schedule #{} (score {:.3})", i + 1, ranked.score));
        lines.extend(schedule_stats_lines(&summarize(&ranked.schedule, active_people)));
    }

    lines.join("\n")
}

pub fn print_outcome(outcome: &SearchOutcome, active_people: &[Person]) {
    println!("{}", format_outcome(outcome, active_people));
}
