use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::{RosterConfig, WorkloadCaps};
use super::types::{BlockAvailability, HourBlock, Schedule};

/// Depth-first search over block assignments, one block per recursion level
///
/// Counters are shared across sibling branches: every assignment made while
/// descending is undone before the next candidate is tried.
struct Backtracker<'a> {
    blocks: &'a [HourBlock],
    availability: &'a BlockAvailability,
    caps: WorkloadCaps,
    max_schedules: usize,
    current: Schedule,
    total_blocks: HashMap<&'a str, u32>,
    daily_blocks: HashMap<(&'a str, NaiveDate), u32>,
    found: Vec<Schedule>,
}

impl<'a> Backtracker<'a> {
    fn new(availability: &'a BlockAvailability, config: &RosterConfig) -> Self {
        Self {
            blocks: &availability.blocks,
            availability,
            caps: config.caps,
            max_schedules: config.max_schedules,
            current: Schedule::default(),
            total_blocks: HashMap::new(),
            daily_blocks: HashMap::new(),
            found: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.found.len() >= self.max_schedules
    }

    fn can_take(&self, person: &'a str, day: NaiveDate, last: Option<&'a str>, consecutive: u32) -> bool {
        if self.total_blocks.get(person).copied().unwrap_or(0) >= self.caps.total_blocks {
            return false;
        }
        if self.daily_blocks.get(&(person, day)).copied().unwrap_or(0) >= self.caps.blocks_per_day {
            return false;
        }
        if last == Some(person) && consecutive >= self.caps.consecutive_blocks {
            return false;
        }
        true
    }

    fn assign(&mut self, block: HourBlock, person: &'a str) {
        self.current.assignments.insert(block, person.to_string());
        *self.total_blocks.entry(person).or_insert(0) += 1;
        *self.daily_blocks.entry((person, block.date())).or_insert(0) += 1;
    }

    fn unassign(&mut self, block: HourBlock, person: &'a str) {
        self.current.assignments.remove(&block);
        if let Some(count) = self.total_blocks.get_mut(person) {
            *count -= 1;
        }
        let key = (person, block.date());
        if let Some(count) = self.daily_blocks.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.daily_blocks.remove(&key);
            }
        }
    }

    /// `last` is whoever holds the previous block (None if it went unassigned);
    /// `consecutive` is how many adjacent blocks they hold up to this point.
    fn backtrack(&mut self, index: usize, last: Option<&'a str>, consecutive: u32) {
        if self.is_full() {
            return;
        }

        if index == self.blocks.len() {
            self.found.push(self.current.clone());
            return;
        }

        let block = self.blocks[index];
        let day = block.date();
        let availability = self.availability;
        let mut assigned_any = false;

        for person in availability.candidates(&block) {
            let person = person.as_str();
            if !self.can_take(person, day, last, consecutive) {
                continue;
            }
            assigned_any = true;

            self.assign(block, person);
            let run = if last == Some(person) { consecutive + 1 } else { 1 };
            self.backtrack(index + 1, Some(person), run);
            self.unassign(block, person);

            if self.is_full() {
                return;
            }
        }

        // Nobody can take this block on this path: leave it open and move on
        if !assigned_any {
            self.backtrack(index + 1, None, 0);
        }
    }
}

/// Finds up to `config.max_schedules` schedules in discovery order
///
/// Every schedule honors the workload caps. Blocks whose candidates are all
/// capped out on a path stay unassigned on that path. Adjacency for the
/// consecutive cap follows the flat block order, so the last block of one
/// day and the first block of the next count as consecutive.
pub fn search_schedules(availability: &BlockAvailability, config: &RosterConfig) -> Vec<Schedule> {
    if availability.is_empty() {
        return Vec::new();
    }

    let mut search = Backtracker::new(availability, config);
    search.backtrack(0, None, 0);

    if search.is_full() {
        info!(
            "Search stopped after {} schedules (cap reached)",
            search.found.len()
        );
    } else {
        debug!("Search space exhausted with {} schedules", search.found.len());
    }

    search.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn blocks(entries: Vec<(NaiveDateTime, Vec<&str>)>) -> BlockAvailability {
        let mut availability = BlockAvailability::default();
        for (block, people) in entries {
            availability.blocks.push(block);
            availability
                .eligible
                .insert(block, people.iter().map(|p| p.to_string()).collect());
        }
        availability.blocks.sort();
        availability
    }

    fn config(max_schedules: usize) -> RosterConfig {
        RosterConfig {
            max_schedules,
            ..RosterConfig::default()
        }
    }

    #[test]
    fn test_single_block_discovery_order() {
        let availability = blocks(vec![(at(4, 10), vec!["A", "B", "C"])]);
        let found = search_schedules(&availability, &config(10));

        let assignees: Vec<_> = found
            .iter()
            .map(|s| s.person_at(&at(4, 10)).unwrap().to_string())
            .collect();
        assert_eq!(assignees, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_no_blocks_means_no_search() {
        let found = search_schedules(&BlockAvailability::default(), &config(10));
        assert!(found.is_empty());
    }

    #[test]
    fn test_cap_stops_search() {
        let availability = blocks(vec![
            (at(4, 10), vec!["A", "B", "C"]),
            (at(4, 11), vec!["A", "B", "C"]),
        ]);
        let found = search_schedules(&availability, &config(4));
        assert_eq!(found.len(), 4);

        // First branch A-A, then A-B, A-C, B-A
        assert_eq!(found[0].person_at(&at(4, 11)), Some("A"));
        assert_eq!(found[3].person_at(&at(4, 10)), Some("B"));
    }

    #[test]
    fn test_lone_person_hands_off_after_two_blocks() {
        // One person, six adjacent blocks on one day
        let availability = blocks((10..16).map(|h| (at(4, h), vec!["Solo"])).collect());
        let found = search_schedules(&availability, &config(10));

        assert_eq!(found.len(), 1);
        let schedule = &found[0];
        // Daily cap of 2 allows only the first two blocks
        assert_eq!(schedule.assignments.len(), 2);
        assert_eq!(schedule.person_at(&at(4, 10)), Some("Solo"));
        assert_eq!(schedule.person_at(&at(4, 11)), Some("Solo"));
        assert_eq!(schedule.person_at(&at(4, 12)), None);
    }

    #[test]
    fn test_consecutive_cap_leaves_third_block_open() {
        let mut cfg = config(10);
        cfg.caps.blocks_per_day = 4;
        let availability = blocks((10..13).map(|h| (at(4, h), vec!["Solo"])).collect());

        let found = search_schedules(&availability, &cfg);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].person_at(&at(4, 11)), Some("Solo"));
        assert_eq!(found[0].person_at(&at(4, 12)), None);
    }

    #[test]
    fn test_gap_resets_consecutive_run() {
        let mut cfg = config(10);
        cfg.caps.blocks_per_day = 4;
        let availability = blocks((10..14).map(|h| (at(4, h), vec!["Solo"])).collect());

        let found = search_schedules(&availability, &cfg);
        // Solo, Solo, (open), Solo
        assert_eq!(found[0].assignments.len(), 3);
        assert_eq!(found[0].person_at(&at(4, 13)), Some("Solo"));
    }

    #[test]
    fn test_consecutive_run_spans_day_boundary() {
        // Monday's last block and Tuesday's first block are adjacent in block order
        let mut cfg = config(10);
        cfg.caps.blocks_per_day = 4;
        let availability = blocks(vec![
            (at(4, 17), vec!["A"]),
            (at(4, 18), vec!["A"]),
            (at(5, 10), vec!["A", "B"]),
        ]);

        let found = search_schedules(&availability, &cfg);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].person_at(&at(5, 10)), Some("B"));
    }

    #[test]
    fn test_total_cap_across_days() {
        let mut cfg = config(1);
        cfg.caps.total_blocks = 3;
        cfg.caps.consecutive_blocks = 4;
        let availability = blocks(vec![
            (at(4, 10), vec!["A"]),
            (at(5, 10), vec!["A"]),
            (at(6, 10), vec!["A"]),
            (at(7, 10), vec!["A", "B"]),
        ]);

        let found = search_schedules(&availability, &cfg);
        assert_eq!(found[0].counts().get("A"), Some(&3));
        assert_eq!(found[0].person_at(&at(7, 10)), Some("B"));
    }

    #[test]
    fn test_counters_restored_between_branches() {
        // Branch A takes 10:00; the B branch must see A's counters reset
        let mut cfg = config(10);
        cfg.caps.total_blocks = 1;
        let availability = blocks(vec![(at(4, 10), vec!["A", "B"]), (at(4, 11), vec!["A", "B"])]);

        let found = search_schedules(&availability, &cfg);
        let pairs: Vec<(Option<&str>, Option<&str>)> = found
            .iter()
            .map(|s| (s.person_at(&at(4, 10)), s.person_at(&at(4, 11))))
            .collect();
        assert_eq!(pairs, vec![(Some("A"), Some("B")), (Some("B"), Some("A"))]);
    }
}
