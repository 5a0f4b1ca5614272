//! Per-table verdicts and the schema score.
//!
//! An answer table is a hit when its accepted student table carries enough matched
//! columns, the same primary key and the same foreign keys. Each hit earns
//! [`MatchConfig::points_per_table`](crate::config::MatchConfig::points_per_table).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use dbgrade_model::{ColumnMatch, Schema, TableDescriptor, TableMatch, TableVerdict};

use crate::matcher::SchemaMatcher;

/// Outcome of [`SchemaMatcher::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub verdicts: Vec<TableVerdict>,
    pub schema_score: f64,
    pub tables_hit: usize,
    pub matched_column_ratio: f64,
}

impl SchemaMatcher<'_> {
    /// Runs the table and column matchers, then aggregates.
    pub fn score(&self, answer: &Schema, student: &Schema) -> ScoreSummary {
        let tables = self.match_tables(answer, student);
        let columns = self.match_all_columns(&tables, answer, student);
        self.aggregate(answer, student, &tables, &columns)
    }

    /// Column matches for every answer table, grouped by table in answer key order.
    pub fn match_all_columns(
        &self,
        tables: &[TableMatch],
        answer: &Schema,
        student: &Schema,
    ) -> Vec<ColumnMatch> {
        tables
            .iter()
            .flat_map(|table| {
                self.match_columns(
                    &table.answer_table,
                    table.student_table.as_deref(),
                    answer,
                    student,
                )
            })
            .collect()
    }

    /// Builds verdicts from table and column matches.
    ///
    /// `tables` is the accepted mapping; pairs it leaves out score nothing.
    pub fn aggregate(
        &self,
        answer: &Schema,
        student: &Schema,
        tables: &[TableMatch],
        columns: &[ColumnMatch],
    ) -> ScoreSummary {
        let mapping: BTreeMap<&str, Option<&str>> = tables
            .iter()
            .map(|m| (m.answer_table.as_str(), m.student_table.as_deref()))
            .collect();

        let mut verdicts = Vec::with_capacity(answer.len());
        for (answer_key, answer_desc) in answer.tables() {
            let table_match = tables.iter().find(|m| m.answer_table == answer_key);
            let answer_columns = answer_desc.columns.len();
            let matched_columns = columns
                .iter()
                .filter(|m| m.answer_table == answer_key && m.is_matched())
                .count();
            let column_ratio = if answer_columns == 0 {
                0.0
            } else {
                matched_columns as f64 / answer_columns as f64
            };

            let student_pair = table_match
                .filter(|m| {
                    !self.config.require_table_similarity
                        || m.similarity_score >= self.config.table_threshold
                })
                .and_then(|m| m.student_table.as_deref())
                .and_then(|key| student.get(key).map(|desc| (key, desc)));

            let verdict = match student_pair {
                Some((student_key, student_desc)) => {
                    let enough_columns =
                        answer_columns > 0 && column_ratio >= self.config.min_column_ratio;
                    let primary_key_ok = self.primary_keys_equal(answer_desc, student_desc);
                    let foreign_keys_ok = self.foreign_keys_equal(
                        answer_desc,
                        student_desc,
                        &mapping,
                        answer,
                        student,
                    );
                    TableVerdict {
                        answer_table: answer_key.to_string(),
                        student_table: Some(student_key.to_string()),
                        answer_columns,
                        matched_columns,
                        column_ratio,
                        enough_columns,
                        primary_key_ok,
                        foreign_keys_ok,
                        hit: enough_columns && primary_key_ok && foreign_keys_ok,
                    }
                }
                None => TableVerdict {
                    answer_table: answer_key.to_string(),
                    student_table: None,
                    answer_columns,
                    matched_columns,
                    column_ratio,
                    enough_columns: false,
                    primary_key_ok: false,
                    foreign_keys_ok: false,
                    hit: false,
                },
            };
            debug!(
                table = answer_key,
                hit = verdict.hit,
                columns = verdict.column_ratio,
                primary_key = verdict.primary_key_ok,
                foreign_keys = verdict.foreign_keys_ok,
                "table verdict"
            );
            verdicts.push(verdict);
        }

        let tables_hit = verdicts.iter().filter(|v| v.hit).count();
        let total_columns = answer.column_count();
        let matched_total = columns.iter().filter(|m| m.is_matched()).count();
        ScoreSummary {
            verdicts,
            schema_score: tables_hit as f64 * self.config.points_per_table,
            tables_hit,
            matched_column_ratio: if total_columns == 0 {
                0.0
            } else {
                matched_total as f64 / total_columns as f64
            },
        }
    }

    fn column_set<'c>(&self, columns: impl IntoIterator<Item = &'c String>) -> BTreeSet<String> {
        columns
            .into_iter()
            .map(|column| self.normalizer.compact(column))
            .collect()
    }

    fn primary_keys_equal(&self, answer: &TableDescriptor, student: &TableDescriptor) -> bool {
        self.column_set(&answer.primary_key) == self.column_set(&student.primary_key)
    }

    /// Every answer foreign key needs a student key on the paired table with the same
    /// canonical column sets, referencing the student table mapped to the answer's
    /// referenced table. An unmapped referenced table fails the check.
    fn foreign_keys_equal(
        &self,
        answer_desc: &TableDescriptor,
        student_desc: &TableDescriptor,
        mapping: &BTreeMap<&str, Option<&str>>,
        answer: &Schema,
        student: &Schema,
    ) -> bool {
        answer_desc.foreign_keys.iter().all(|fk| {
            let mapped = answer
                .resolve(&fk.referenced_table)
                .and_then(|key| mapping.get(key).copied().flatten());
            let Some(mapped) = mapped else {
                return false;
            };
            let parent = self.column_set(&fk.parent_columns);
            let referenced = self.column_set(&fk.referenced_columns);
            student_desc.foreign_keys.iter().any(|candidate| {
                student.resolve(&candidate.referenced_table) == Some(mapped)
                    && self.column_set(&candidate.parent_columns) == parent
                    && self.column_set(&candidate.referenced_columns) == referenced
            })
        })
    }
}
