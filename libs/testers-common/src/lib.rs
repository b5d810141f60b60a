pub mod report;
pub mod suite;
pub mod types;
