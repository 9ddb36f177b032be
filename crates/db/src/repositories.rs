pub mod assistant;
pub mod occurrence;
pub mod teacher;
