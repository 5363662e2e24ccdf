pub mod types;
pub mod slot_utils;
pub mod blocks;
pub mod search;
pub mod scoring;

use tracing::info;

use crate::config::RosterConfig;

pub use types::{
    BlockAvailability, HourBlock, Person, RankedSchedule, Schedule, SearchOutcome,
    SlotAvailability, TimeSlot,
};
pub use slot_utils::format_timestamp;
pub use blocks::compile_blocks;
pub use search::search_schedules;
pub use scoring::{rank_schedules, score_schedule};

/// Runs the full pipeline: compile hour blocks, search, then rank
pub fn generate_schedules(availability: &SlotAvailability, config: &RosterConfig) -> SearchOutcome {
    let blocks = compile_blocks(availability, config);
    if blocks.is_empty() {
        info!("No valid hour blocks in availability");
        return SearchOutcome::NoBlocks;
    }

    info!("Found {} hour blocks", blocks.len());

    let found = search_schedules(&blocks, config);
    let capped = found.len() >= config.max_schedules;
    let schedules = rank_schedules(found);

    SearchOutcome::Generated {
        schedules,
        block_count: blocks.len(),
        max_schedules: config.max_schedules,
        capped,
    }
}
