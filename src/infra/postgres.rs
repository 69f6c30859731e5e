//! PostgreSQL [`TableSink`]: one lazily opened connection, drop-and-recreate
//! per table.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

use crate::config::{DatabaseConfig, DatabaseConnection};
use crate::error::{EtlError, Result};
use crate::output::{ColumnKind, Table};
use crate::services::sinks::TableSink;

pub struct PostgresSink {
    config: DatabaseConfig,
    client: Mutex<Option<Client>>,
}

impl PostgresSink {
    /// No I/O happens, and no parameter is checked, until the first call on
    /// the sink.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    async fn connect(&self, unit: &str) -> Result<Client> {
        let c: DatabaseConnection = self.config.connection()?;
        let mut pg = tokio_postgres::Config::new();
        pg.host(&c.host)
            .port(c.port)
            .user(&c.user)
            .password(&c.password)
            .dbname(&c.name);

        let connected = pg.connect(NoTls).await;
        let (client, connection) = connected.map_err(|e| EtlError::StorageWrite {
            table: unit.to_string(),
            message: e.to_string(),
        })?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        info!(host = %c.host, port = c.port, database = %c.name, "Connected to PostgreSQL");
        Ok(client)
    }

    fn qualified(&self, table: &str) -> String {
        format!("{}.{}", quote_ident(&self.config.schema), quote_ident(table))
    }
}

#[async_trait]
impl TableSink for PostgresSink {
    async fn ensure_schema(&self) -> Result<()> {
        let schema = &self.config.schema;
        let failed = |e: tokio_postgres::Error| EtlError::StorageWrite {
            table: schema.clone(),
            message: e.to_string(),
        };

        let mut guard = self.client.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect(schema).await?);
        }
        if let Some(client) = guard.as_ref() {
            client
                .batch_execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
                .await
                .map_err(failed)?;
        }
        debug!(schema = %schema, "Schema ensured");
        Ok(())
    }

    async fn replace_table(&self, name: &str, table: &Table) -> Result<()> {
        let failed = |e: tokio_postgres::Error| EtlError::StorageWrite {
            table: name.to_string(),
            message: e.to_string(),
        };
        let qualified = self.qualified(name);

        let mut guard = self.client.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect(name).await?);
        }
        let Some(client) = guard.as_mut() else {
            return Err(EtlError::StorageWrite {
                table: name.to_string(),
                message: "no database connection".to_string(),
            });
        };

        let tx = client.transaction().await.map_err(failed)?;
        tx.batch_execute(&format!("DROP TABLE IF EXISTS {qualified}"))
            .await
            .map_err(failed)?;
        tx.batch_execute(&create_table_sql(&qualified, table))
            .await
            .map_err(failed)?;

        if !table.columns.is_empty() && !table.rows.is_empty() {
            let stmt = tx
                .prepare(&insert_sql(&qualified, table))
                .await
                .map_err(failed)?;
            for row in &table.rows {
                let params: Vec<&(dyn ToSql + Sync)> =
                    row.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
                tx.execute(&stmt, &params).await.map_err(failed)?;
            }
        }

        tx.commit().await.map_err(failed)?;
        debug!(table = %qualified, rows = table.len(), "Table replaced");
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn pg_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "TEXT",
        ColumnKind::Integer => "BIGINT",
    }
}

fn create_table_sql(qualified: &str, table: &Table) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), pg_type(c.kind)))
        .collect();
    format!("CREATE TABLE {qualified} ({})", columns.join(", "))
}

/// Every parameter is bound as text; integer columns are cast server-side.
fn insert_sql(qualified: &str, table: &Table) -> String {
    let columns: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
    let placeholders: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| match c.kind {
            ColumnKind::Text => format!("${}", i + 1),
            ColumnKind::Integer => format!("${}::text::bigint", i + 1),
        })
        .collect();
    format!(
        "INSERT INTO {qualified} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    )
}
