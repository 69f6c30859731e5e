//! Flight table construction and ranked operational reports.
//!
//! [`rows`] turns cleaned flights into complete table rows and destination
//! counts, [`rank`] holds the counting primitives, and [`reports`] builds the
//! ranked airline, destination and facility reports on top of them.

pub mod rank;
pub mod reports;
pub mod rows;
pub mod types;
