//! Schema data model shared by the grading engine and its collaborators.
//!
//! - **Schema** (`schema`): tables, columns, primary and foreign keys of one database snapshot
//! - **Reader** (`reader`): the metadata source contract and the schema builder
//! - **Matching** (`matching`): match records and per-table verdicts produced by a grading pass

#![deny(unsafe_code)]

pub mod error;
pub mod matching;
pub mod reader;
pub mod schema;

pub use error::{ModelError, Result};
pub use matching::{
    ColumnMatch, ForeignKeyMatch, SchemaGrade, TableMatch, TableVerdict, UNMATCHED_PLACEHOLDER,
};
pub use reader::{ColumnRow, SchemaBuilder, SchemaReader};
pub use schema::{
    ColumnDescriptor, ForeignKeyDescriptor, Schema, TableDescriptor, clean_table_name,
    table_key,
};
