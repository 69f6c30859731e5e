pub mod analyzers;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flights;
pub mod infra;
pub mod output;
pub mod pipeline;
pub mod services;

pub use pipeline::{Pipeline, RunReport, Stage, run_etl};
