//! Records produced by one grading pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::ColumnDescriptor;

/// Rendered in place of the student side of an unmatched column.
pub const UNMATCHED_PLACEHOLDER: &str = "—";

/// Assignment of one answer table to at most one student table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMatch {
    /// Answer table key.
    pub answer_table: String,
    /// Student table key, `None` when no pairing was accepted.
    pub student_table: Option<String>,
    /// Descriptor embedding similarity in `[0, 1]`; 0 when unmatched.
    pub similarity_score: f64,
    /// Greedy column-overlap count of the assigned pair; 0 when unmatched.
    pub column_overlap: usize,
}

impl TableMatch {
    pub fn unmatched(answer_table: impl Into<String>) -> Self {
        Self {
            answer_table: answer_table.into(),
            student_table: None,
            similarity_score: 0.0,
            column_overlap: 0,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.student_table.is_some()
    }
}

/// Outcome for one answer column within a table pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMatch {
    pub answer_table: String,
    pub answer_col: String,
    pub answer_type: String,
    pub student_table: Option<String>,
    pub student_col: Option<String>,
    pub student_type: Option<String>,
    /// Similarity in `[0, 1]`; 1.0 for exact name matches.
    pub similarity_score: f64,
    pub type_compatible: bool,
}

impl ColumnMatch {
    /// A zero-score record with an empty student side.
    pub fn unmatched(answer_table: impl Into<String>, column: &ColumnDescriptor) -> Self {
        Self {
            answer_table: answer_table.into(),
            answer_col: column.name.clone(),
            answer_type: column.sql_type.clone(),
            student_table: None,
            student_col: None,
            student_type: None,
            similarity_score: 0.0,
            type_compatible: false,
        }
    }

    /// True when a student column is bound and the types are compatible.
    pub fn is_matched(&self) -> bool {
        self.student_col.is_some() && self.type_compatible
    }

    pub fn student_table_label(&self) -> &str {
        self.student_table.as_deref().unwrap_or(UNMATCHED_PLACEHOLDER)
    }

    pub fn student_col_label(&self) -> &str {
        self.student_col.as_deref().unwrap_or(UNMATCHED_PLACEHOLDER)
    }

    pub fn student_type_label(&self) -> &str {
        self.student_type.as_deref().unwrap_or(UNMATCHED_PLACEHOLDER)
    }
}

/// Hit/miss diagnostics for one answer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableVerdict {
    pub answer_table: String,
    pub student_table: Option<String>,
    pub answer_columns: usize,
    pub matched_columns: usize,
    pub column_ratio: f64,
    pub enough_columns: bool,
    pub primary_key_ok: bool,
    pub foreign_keys_ok: bool,
    /// All checks passed and the table earns points.
    pub hit: bool,
}

/// One answer foreign key paired with the student key that matches it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMatch {
    /// Canonical description, `parent(cols) -> referenced(cols)`.
    pub answer: String,
    pub student: Option<String>,
    pub matched: bool,
}

/// Everything one grading pass produces for a student schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGrade {
    /// One entry per answer table, in answer key order.
    pub tables: Vec<TableMatch>,
    /// One entry per answer column, grouped by answer table.
    pub columns: Vec<ColumnMatch>,
    pub verdicts: Vec<TableVerdict>,
    pub foreign_keys: Vec<ForeignKeyMatch>,
    pub schema_score: f64,
    pub tables_hit: usize,
    /// Matched answer columns over all answer columns. Diagnostic only.
    pub matched_column_ratio: f64,
    pub foreign_key_ratio: f64,
}

impl SchemaGrade {
    /// Answer table key to accepted student table key.
    pub fn mapping(&self) -> BTreeMap<&str, Option<&str>> {
        self.tables
            .iter()
            .map(|m| (m.answer_table.as_str(), m.student_table.as_deref()))
            .collect()
    }

    pub fn table_match(&self, answer_table: &str) -> Option<&TableMatch> {
        self.tables.iter().find(|m| m.answer_table == answer_table)
    }

    pub fn columns_for<'a>(
        &'a self,
        answer_table: &'a str,
    ) -> impl Iterator<Item = &'a ColumnMatch> {
        self.columns
            .iter()
            .filter(move |m| m.answer_table == answer_table)
    }

    pub fn verdict(&self, answer_table: &str) -> Option<&TableVerdict> {
        self.verdicts.iter().find(|v| v.answer_table == answer_table)
    }
}
