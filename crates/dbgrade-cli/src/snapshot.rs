//! JSON schema snapshots exported from restored databases.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dbgrade_model::{ColumnRow, ForeignKeyDescriptor, Schema, SchemaReader};

/// Structural metadata of one database, as written by the export step.
///
/// ```json
/// {
///   "database": "QLBH_2311001",
///   "columns": [{ "table": "KhachHang", "column": "MaKH", "type": "varchar(10)" }],
///   "primary_keys": { "KhachHang": ["MaKH"] },
///   "foreign_keys": []
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonSnapshot {
    pub database: Option<String>,
    pub columns: Vec<ColumnRow>,
    pub primary_keys: BTreeMap<String, Vec<String>>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl JsonSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read snapshot {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse snapshot {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The database name, or the file stem when the snapshot carries none.
    pub fn identifier(&self, path: &Path) -> String {
        self.database
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path))
    }

    pub fn to_schema(&self) -> Result<Schema> {
        Ok(Schema::from_reader(self)?)
    }
}

impl SchemaReader for JsonSnapshot {
    fn tables(&self) -> dbgrade_model::Result<Vec<ColumnRow>> {
        Ok(self.columns.clone())
    }

    fn primary_keys(&self) -> dbgrade_model::Result<BTreeMap<String, Vec<String>>> {
        Ok(self.primary_keys.clone())
    }

    fn foreign_keys(&self) -> dbgrade_model::Result<Vec<ForeignKeyDescriptor>> {
        Ok(self.foreign_keys.clone())
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
