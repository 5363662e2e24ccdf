//! Shift roster generation from a quarter-hour availability poll.
//!
//! The pipeline reads a poll export ([`parser`]), compiles it into weekday
//! business-hour blocks, searches for assignments that respect the workload
//! caps, and ranks them by how widely they spread the work ([`schedule`]).

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod schedule;
pub mod web;

pub use config::RosterConfig;
pub use error::{Result, RosterError};
pub use schedule::{generate_schedules, SearchOutcome};
