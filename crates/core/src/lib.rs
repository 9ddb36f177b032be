//! # Classbook core
//!
//! Domain types and the pure parts of the scheduling engine: weekday
//! numbering, recurrence expansion, interval overlap and partial-update
//! merging. Nothing in this crate performs I/O.

pub mod errors;
pub mod events;
pub mod models;
pub mod overlap;
pub mod recurrence;
pub mod weekday;
