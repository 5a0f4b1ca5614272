//! Column matching within one accepted table pair.
//!
//! Exact names bind first. The remaining columns are paired by embedding similarity
//! through a maximum-weight assignment, with a secondary check for pairs whose
//! similarity falls in the ambiguous band.

use tracing::{debug, trace};

use dbgrade_model::{ColumnDescriptor, ColumnMatch, Schema, TableDescriptor, clean_table_name};

use crate::assignment::maximize_assignment;
use crate::fuzzy::best_score;
use crate::matcher::SchemaMatcher;
use crate::types::same_type;

/// Text embedded for a column: `<table>.<column> (<type>)`.
pub fn column_text(table: &TableDescriptor, column: &ColumnDescriptor) -> String {
    format!(
        "{}.{} ({})",
        clean_table_name(&table.original_name),
        column.name,
        column.sql_type
    )
}

impl SchemaMatcher<'_> {
    /// Matches the columns of `answer_table` against `student_table`.
    ///
    /// Returns one record per answer column in declaration order, or nothing when the
    /// answer table is unknown. Every student column is bound at most once.
    pub fn match_columns(
        &self,
        answer_table: &str,
        student_table: Option<&str>,
        answer: &Schema,
        student: &Schema,
    ) -> Vec<ColumnMatch> {
        let Some(answer_desc) = answer.get(answer_table) else {
            return Vec::new();
        };
        let student_desc = student_table.and_then(|key| student.get(key).map(|desc| (key, desc)));
        let Some((student_key, student_desc)) = student_desc else {
            return unmatched(answer_table, answer_desc);
        };
        if answer_desc.is_empty() || student_desc.is_empty() {
            return unmatched(answer_table, answer_desc);
        }

        let mut bound: Vec<Option<ColumnMatch>> = vec![None; answer_desc.columns.len()];
        let mut student_free = vec![true; student_desc.columns.len()];

        for (i, column) in answer_desc.columns.iter().enumerate() {
            let exact = student_desc
                .columns
                .iter()
                .enumerate()
                .find(|(j, candidate)| {
                    student_free[*j] && self.normalizer.names_equivalent(&column.name, &candidate.name)
                });
            if let Some((j, candidate)) = exact {
                let compatible = same_type(
                    &column.sql_type,
                    &candidate.sql_type,
                    &column.name,
                    &candidate.name,
                );
                trace!(answer = %column.name, student = %candidate.name, compatible, "exact column");
                bound[i] = Some(pair(answer_table, column, student_key, candidate, 1.0, compatible));
                student_free[j] = false;
            }
        }

        let open_answer: Vec<usize> = (0..bound.len()).filter(|&i| bound[i].is_none()).collect();
        let open_student: Vec<usize> =
            (0..student_free.len()).filter(|&j| student_free[j]).collect();
        if !open_answer.is_empty() && !open_student.is_empty() {
            let answer_texts: Vec<String> = open_answer
                .iter()
                .map(|&i| column_text(answer_desc, &answer_desc.columns[i]))
                .collect();
            let student_texts: Vec<String> = open_student
                .iter()
                .map(|&j| column_text(student_desc, &student_desc.columns[j]))
                .collect();
            let similarity = self.embeddings.similarity_matrix(&answer_texts, &student_texts);

            for (row, assigned) in maximize_assignment(&similarity).into_iter().enumerate() {
                let Some(col) = assigned else {
                    continue;
                };
                let primary = similarity[row][col];
                if primary <= 0.0 {
                    continue;
                }
                let column = &answer_desc.columns[open_answer[row]];
                let candidate = &student_desc.columns[open_student[col]];

                let mut score = primary;
                if self.config.in_ambiguous_band(primary) {
                    score = score.max(self.secondary_score(&column.name, &candidate.name));
                }
                let compatible = same_type(
                    &column.sql_type,
                    &candidate.sql_type,
                    &column.name,
                    &candidate.name,
                );
                if score >= self.config.column_threshold && compatible {
                    bound[open_answer[row]] =
                        Some(pair(answer_table, column, student_key, candidate, score, true));
                } else {
                    debug!(
                        answer = %column.name,
                        student = %candidate.name,
                        score,
                        compatible,
                        "column pair rejected"
                    );
                }
            }
        }

        bound
            .into_iter()
            .zip(&answer_desc.columns)
            .map(|(record, column)| {
                record.unwrap_or_else(|| ColumnMatch::unmatched(answer_table, column))
            })
            .collect()
    }

    /// Second opinion for ambiguous pairs: the better of canonical-name embedding
    /// similarity and fuzzy score, both on a 0-1 scale.
    pub fn secondary_score(&self, answer_col: &str, student_col: &str) -> f64 {
        let canonical_a = self.normalizer.canonical(answer_col);
        let canonical_b = self.normalizer.canonical(student_col);
        let fuzzy = best_score(&canonical_a, &canonical_b) / 100.0;
        let semantic = self
            .embeddings
            .embed(&canonical_a)
            .cosine(&self.embeddings.embed(&canonical_b));
        fuzzy.max(semantic).clamp(0.0, 1.0)
    }
}

fn unmatched(answer_table: &str, table: &TableDescriptor) -> Vec<ColumnMatch> {
    table
        .columns
        .iter()
        .map(|column| ColumnMatch::unmatched(answer_table, column))
        .collect()
}

fn pair(
    answer_table: &str,
    column: &ColumnDescriptor,
    student_table: &str,
    candidate: &ColumnDescriptor,
    score: f64,
    type_compatible: bool,
) -> ColumnMatch {
    ColumnMatch {
        answer_table: answer_table.to_string(),
        answer_col: column.name.clone(),
        answer_type: column.sql_type.clone(),
        student_table: Some(student_table.to_string()),
        student_col: Some(candidate.name.clone()),
        student_type: Some(candidate.sql_type.clone()),
        similarity_score: score.clamp(0.0, 1.0),
        type_compatible,
    }
}
