//! Collaborator seams the pipeline depends on.

pub mod flight_api;
pub mod lookup;
pub mod sinks;
