//! Error taxonomy for the ETL pipeline.
//!
//! Variants map onto how the pipeline treats them: [`EtlError::CredentialMissing`],
//! [`EtlError::SchemaVersionMismatch`] and [`EtlError::Upload`] are fatal for a run,
//! [`EtlError::Network`] and [`EtlError::StorageWrite`] are absorbed where they occur.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("missing required credential: {0}")]
    CredentialMissing(&'static str),

    #[error("schema version of the flight API has changed from {expected} to {found}")]
    SchemaVersionMismatch { expected: String, found: String },

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("flight API returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to write table {table}: {message}")]
    StorageWrite { table: String, message: String },

    #[error("failed to upload {key}: {message}")]
    Upload { key: String, message: String },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header {0}")]
    InvalidHeader(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// Returns `true` for errors that end a pipeline run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EtlError::CredentialMissing(_)
                | EtlError::SchemaVersionMismatch { .. }
                | EtlError::Upload { .. }
                | EtlError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
