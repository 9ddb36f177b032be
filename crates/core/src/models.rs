pub mod schedule;
pub mod tenant;
