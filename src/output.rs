//! Tabular output shape shared by the database sink and CSV uploads.

use tracing::debug;

use crate::error::Result;
use csv::WriterBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Text,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Integer,
        }
    }
}

/// Named, typed columns with string cells. Every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width must match columns");
        self.rows.push(row);
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Anything that can be rendered as a [`Table`].
pub trait ToTable {
    fn to_table(&self) -> Table;
}

/// Encodes a table as CSV. The header row is written even when there are no
/// data rows, so empty reports keep their shape.
pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if !table.columns.is_empty() {
        writer.write_record(table.column_names())?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    debug!(rows = table.len(), bytes = bytes.len(), "Table encoded as CSV");
    Ok(bytes)
}
