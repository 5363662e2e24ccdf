use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A person is identified by the name used in the availability poll
pub type Person = String;

/// Start of a 15-minute availability slot
pub type TimeSlot = NaiveDateTime;

/// Start of an assignable 60-minute block
pub type HourBlock = NaiveDateTime;

/// Who is available at each quarter-hour slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotAvailability {
    pub slots: BTreeMap<TimeSlot, BTreeSet<Person>>,
}

impl SlotAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the people available at `slot`, replacing any earlier entry.
    pub fn insert<I, S>(&mut self, slot: TimeSlot, people: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Person>,
    {
        self.slots
            .insert(slot, people.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, slot: &TimeSlot) -> Option<&BTreeSet<Person>> {
        self.slots.get(slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Earliest and latest slot, if any
    pub fn span(&self) -> Option<(TimeSlot, TimeSlot)> {
        let first = self.slots.keys().next()?;
        let last = self.slots.keys().next_back()?;
        Some((*first, *last))
    }
}

/// Valid hour blocks in ascending order, each with its ordered candidate list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAvailability {
    pub blocks: Vec<HourBlock>,
    pub eligible: HashMap<HourBlock, Vec<Person>>,
}

impl BlockAvailability {
    /// Candidates for `block` in search order (deprioritized people last)
    pub fn candidates(&self, block: &HourBlock) -> &[Person] {
        self.eligible.get(block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Every person eligible for at least one block, sorted by name
    pub fn people(&self) -> BTreeSet<Person> {
        self.eligible.values().flatten().cloned().collect()
    }
}

/// One candidate assignment: each covered block maps to exactly one person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub assignments: BTreeMap<HourBlock, Person>,
}

impl Schedule {
    /// Number of blocks held by each person in this schedule
    pub fn counts(&self) -> BTreeMap<&str, u32> {
        let mut counts = BTreeMap::new();
        for person in self.assignments.values() {
            *counts.entry(person.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct people appearing as assignees
    pub fn people(&self) -> BTreeSet<&str> {
        self.assignments.values().map(String::as_str).collect()
    }

    pub fn person_at(&self, block: &HourBlock) -> Option<&str> {
        self.assignments.get(block).map(String::as_str)
    }
}

/// A schedule with its ranking score (higher is better)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSchedule {
    pub schedule: Schedule,
    pub score: f64,
}

/// Result of one roster run
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The availability produced no assignable hour block
    NoBlocks,
    Generated {
        /// Best first; ties keep discovery order
        schedules: Vec<RankedSchedule>,
        block_count: usize,
        max_schedules: usize,
        /// The search stopped at `max_schedules`, so more schedules may exist
        capped: bool,
    },
}

impl SearchOutcome {
    pub fn schedules(&self) -> &[RankedSchedule] {
        match self {
            SearchOutcome::NoBlocks => &[],
            SearchOutcome::Generated { schedules, .. } => schedules,
        }
    }

    pub fn is_capped(&self) -> bool {
        matches!(self, SearchOutcome::Generated { capped: true, .. })
    }
}
