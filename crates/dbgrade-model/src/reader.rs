//! Metadata source contract and schema construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ModelError, Result};
use crate::schema::{ColumnDescriptor, ForeignKeyDescriptor, Schema, TableDescriptor, table_key};

/// One `(table, column, type)` row from a metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub table: String,
    pub column: String,
    #[serde(rename = "type")]
    pub sql_type: String,
}

impl ColumnRow {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        sql_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Supplies raw structural metadata for one database.
///
/// Implementations wrap whatever holds the restored database: a live connection,
/// an exported snapshot file, or an in-memory fixture.
pub trait SchemaReader {
    /// Column rows in ordinal order within each table.
    fn tables(&self) -> Result<Vec<ColumnRow>>;

    /// Primary-key columns per source table name.
    fn primary_keys(&self) -> Result<BTreeMap<String, Vec<String>>>;

    fn foreign_keys(&self) -> Result<Vec<ForeignKeyDescriptor>>;
}

impl Schema {
    /// Reads all metadata from `reader` and builds a schema.
    pub fn from_reader(reader: &dyn SchemaReader) -> Result<Self> {
        let mut builder = SchemaBuilder::new();
        for row in reader.tables()? {
            builder.add_column(row)?;
        }
        for (table, columns) in reader.primary_keys()? {
            builder.set_primary_key(&table, columns);
        }
        for foreign_key in reader.foreign_keys()? {
            builder.add_foreign_key(foreign_key)?;
        }
        Ok(builder.build())
    }
}

/// Incrementally assembles a [`Schema`] from raw metadata rows.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, creating its table on first sight.
    ///
    /// Source names that clean to an existing key merge into that table; the first
    /// original name wins.
    pub fn add_column(&mut self, row: ColumnRow) -> Result<()> {
        let table_name = row.table.trim();
        if table_name.is_empty() {
            return Err(ModelError::BlankName("table"));
        }
        let column_name = row.column.trim();
        if column_name.is_empty() {
            return Err(ModelError::BlankName("column"));
        }
        let key = table_key(table_name);
        if self.schema.get(&key).is_none() {
            self.schema.insert(TableDescriptor::new(table_name));
        }
        let Some(table) = self.schema.get_mut(&key) else {
            return Ok(());
        };
        if table.original_name != table_name {
            warn!(
                table = %table_name,
                merged_into = %table.original_name,
                "table name collides with an existing table after cleaning"
            );
        }
        let column = ColumnDescriptor::new(column_name, row.sql_type.trim());
        if !table.push_column(column) {
            debug!(table = %table_name, column = %column_name, "duplicate column ignored");
        }
        Ok(())
    }

    /// Sets the primary key of a known table; unknown tables are logged and skipped.
    pub fn set_primary_key(&mut self, table: &str, columns: Vec<String>) {
        let key = table_key(table);
        match self.schema.get_mut(&key) {
            Some(descriptor) => {
                descriptor.primary_key = columns
                    .into_iter()
                    .map(|column| column.trim().to_string())
                    .collect();
            }
            None => warn!(table = %table, "primary key for unknown table skipped"),
        }
    }

    /// Attaches a validated foreign key to its parent table.
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKeyDescriptor) -> Result<()> {
        foreign_key.validate()?;
        let key = table_key(&foreign_key.parent_table);
        match self.schema.get_mut(&key) {
            Some(descriptor) => descriptor.foreign_keys.push(foreign_key),
            None => warn!(
                constraint = %foreign_key.constraint_name,
                table = %foreign_key.parent_table,
                "foreign key for unknown table skipped"
            ),
        }
        Ok(())
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}
