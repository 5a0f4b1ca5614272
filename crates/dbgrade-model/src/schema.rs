//! Structural description of one database snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A column as read from the source, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// A foreign-key constraint.
///
/// Parent and referenced columns are positional: `parent_columns[i]` references
/// `referenced_columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub constraint_name: String,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyDescriptor {
    /// Creates a foreign key, rejecting empty or unequal column lists.
    pub fn new(
        constraint_name: impl Into<String>,
        parent_table: impl Into<String>,
        parent_columns: Vec<String>,
        referenced_table: impl Into<String>,
        referenced_columns: Vec<String>,
    ) -> Result<Self> {
        let fk = Self {
            constraint_name: constraint_name.into(),
            parent_table: parent_table.into(),
            parent_columns,
            referenced_table: referenced_table.into(),
            referenced_columns,
        };
        fk.validate()?;
        Ok(fk)
    }

    /// Checks the column-list invariant. Deserialized values skip `new`, so readers call this.
    pub fn validate(&self) -> Result<()> {
        if self.parent_columns.is_empty() && self.referenced_columns.is_empty() {
            return Err(ModelError::EmptyForeignKey(self.constraint_name.clone()));
        }
        if self.parent_columns.len() != self.referenced_columns.len() {
            return Err(ModelError::ForeignKeyArity {
                constraint: self.constraint_name.clone(),
                parent: self.parent_columns.len(),
                referenced: self.referenced_columns.len(),
            });
        }
        Ok(())
    }
}

/// One table of a schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Name exactly as read from the source.
    pub original_name: String,
    /// Columns in source ordinal order.
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: BTreeSet<String>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    pub fn new(original_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            columns: Vec::new(),
            primary_key: BTreeSet::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Appends a column unless one with the same name already exists.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.push_column(ColumnDescriptor::new(name, sql_type));
        self
    }

    #[must_use]
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Appends a column; returns false when the name was already present.
    pub fn push_column(&mut self, column: ColumnDescriptor) -> bool {
        if self.column(&column.name).is_some() {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Tables of one snapshot keyed by [`table_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: BTreeMap<String, TableDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table under the key derived from its original name, replacing any previous one.
    #[must_use]
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.insert(table);
        self
    }

    /// Inserts a table and returns its key.
    pub fn insert(&mut self, table: TableDescriptor) -> String {
        let key = table_key(&table.original_name);
        self.tables.insert(key.clone(), table);
        key
    }

    pub fn get(&self, key: &str) -> Option<&TableDescriptor> {
        self.tables.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut TableDescriptor> {
        self.tables.get_mut(key)
    }

    /// Tables in key order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableDescriptor)> {
        self.tables.iter().map(|(key, table)| (key.as_str(), table))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.values().map(|table| table.columns.len()).sum()
    }

    /// Resolves a table reference (key, original name or raw source name) to its key.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.tables.get_key_value(name) {
            return Some(key.as_str());
        }
        if let Some((key, _)) = self
            .tables
            .iter()
            .find(|(_, table)| table.original_name == name)
        {
            return Some(key.as_str());
        }
        let key = table_key(name);
        self.tables.get_key_value(&key).map(|(key, _)| key.as_str())
    }
}

/// Derives the schema key for a source table name: [`clean_table_name`], uppercased.
pub fn table_key(name: &str) -> String {
    clean_table_name(name).to_uppercase()
}

/// Strips a leading numeric stage prefix such as `08.`, `08_` or `08 -` and trims.
///
/// A name that is nothing but a prefix keeps its digits.
pub fn clean_table_name(name: &str) -> &str {
    let trimmed = name.trim();
    let rest = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == trimmed.len() {
        return trimmed;
    }
    let after = rest
        .trim_start_matches(|c: char| matches!(c, '.' | '_' | '-') || c.is_whitespace());
    if after.len() < rest.len() && !after.is_empty() {
        after.trim()
    } else {
        trimmed
    }
}
