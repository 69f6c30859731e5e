//! Destinations for pipeline output: a relational table sink and an object
//! store.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::output::Table;

/// Relational storage with replace semantics.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Creates the destination schema if it does not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Overwrites the table called `name` with the contents of `table`.
    async fn replace_table(&self, name: &str, table: &Table) -> Result<()>;
}

/// Key/value blob storage for CSV reports.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;
}
