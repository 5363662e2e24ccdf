use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::config::RosterConfig;
use super::slot_utils::{block_slots, block_starts, business_dates};
use super::types::{BlockAvailability, HourBlock, Person, SlotAvailability};

/// Compiles quarter-hour availability into assignable hour blocks
///
/// A block is kept only when all four of its slots are present and at least
/// one person is available in every one of them. Candidates are sorted by
/// name, then deprioritized people are moved behind everyone else.
pub fn compile_blocks(availability: &SlotAvailability, config: &RosterConfig) -> BlockAvailability {
    let Some((first, last)) = availability.span() else {
        return BlockAvailability::default();
    };

    let mut blocks = Vec::new();
    let mut eligible: HashMap<HourBlock, Vec<Person>> = HashMap::new();

    for date in business_dates(first.date(), last.date(), config) {
        for block in block_starts(date, config) {
            let Some(common) = common_availability(availability, block) else {
                continue;
            };
            if common.is_empty() {
                continue;
            }

            blocks.push(block);
            eligible.insert(block, order_candidates(common, config));
        }
    }

    debug!(
        "Compiled {} hour blocks from {} slots",
        blocks.len(),
        availability.slots.len()
    );

    BlockAvailability { blocks, eligible }
}

/// People available in all four slots of `block`; None if any slot is missing
fn common_availability(availability: &SlotAvailability, block: HourBlock) -> Option<BTreeSet<Person>> {
    let mut common: Option<BTreeSet<Person>> = None;

    for slot in block_slots(block) {
        let present = availability.get(&slot)?;
        common = Some(match common {
            None => present.clone(),
            Some(acc) => acc.intersection(present).cloned().collect(),
        });
    }

    common
}

/// Name order with deprioritized people last (stable within each group)
fn order_candidates(people: BTreeSet<Person>, config: &RosterConfig) -> Vec<Person> {
    let mut ordered: Vec<Person> = people.into_iter().collect();
    ordered.sort_by_key(|p| config.is_deprioritized(p));
    ordered
}
