pub mod error_handling;
pub mod extract;
pub mod tenant;
