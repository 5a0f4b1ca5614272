//! Schema-wide foreign key comparison.
//!
//! Both sides are rendered as canonical `parent(cols) -> referenced(cols)` strings.
//! Student table names are first translated back to the answer table they were matched
//! with, so a renamed table still compares equal.

use std::collections::BTreeMap;

use serde::Serialize;

use dbgrade_model::{ForeignKeyDescriptor, ForeignKeyMatch, Schema, TableMatch, clean_table_name};

use crate::matcher::SchemaMatcher;

/// Outcome of [`SchemaMatcher::compare_foreign_keys`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyReport {
    /// One entry per answer foreign key, in answer table order.
    pub matches: Vec<ForeignKeyMatch>,
    /// Matched answer keys over all answer keys; 0 when the answer has none.
    pub ratio: f64,
}

impl SchemaMatcher<'_> {
    /// Pairs every answer foreign key with an unused, identically described student key.
    pub fn compare_foreign_keys(
        &self,
        answer: &Schema,
        student: &Schema,
        tables: &[TableMatch],
    ) -> ForeignKeyReport {
        let inverse: BTreeMap<&str, &str> = tables
            .iter()
            .filter_map(|m| Some((m.student_table.as_deref()?, m.answer_table.as_str())))
            .collect();

        let answer_name = |name: &str| -> String {
            answer
                .resolve(name)
                .and_then(|key| answer.get(key))
                .map_or_else(
                    || clean_table_name(name).to_string(),
                    |table| clean_table_name(&table.original_name).to_string(),
                )
        };
        let student_name = |name: &str| -> String {
            let Some(key) = student.resolve(name) else {
                return clean_table_name(name).to_string();
            };
            if let Some(answer_key) = inverse.get(key) {
                return answer_name(*answer_key);
            }
            student.get(key).map_or_else(
                || clean_table_name(name).to_string(),
                |table| clean_table_name(&table.original_name).to_string(),
            )
        };

        let answer_keys: Vec<String> = answer
            .tables()
            .flat_map(|(_, table)| &table.foreign_keys)
            .map(|fk| {
                self.describe_foreign_key(
                    &answer_name(&fk.parent_table),
                    fk,
                    &answer_name(&fk.referenced_table),
                )
            })
            .collect();
        let student_keys: Vec<String> = student
            .tables()
            .flat_map(|(_, table)| &table.foreign_keys)
            .map(|fk| {
                self.describe_foreign_key(
                    &student_name(&fk.parent_table),
                    fk,
                    &student_name(&fk.referenced_table),
                )
            })
            .collect();

        let mut used = vec![false; student_keys.len()];
        let matches: Vec<ForeignKeyMatch> = answer_keys
            .into_iter()
            .map(|description| {
                let hit = (0..student_keys.len())
                    .find(|&j| !used[j] && student_keys[j] == description);
                match hit {
                    Some(j) => {
                        used[j] = true;
                        ForeignKeyMatch {
                            answer: description,
                            student: Some(student_keys[j].clone()),
                            matched: true,
                        }
                    }
                    None => ForeignKeyMatch {
                        answer: description,
                        student: None,
                        matched: false,
                    },
                }
            })
            .collect();

        let matched = matches.iter().filter(|m| m.matched).count();
        let ratio = if matches.is_empty() {
            0.0
        } else {
            matched as f64 / matches.len() as f64
        };
        ForeignKeyReport { matches, ratio }
    }

    /// Canonical `parent(cols) -> referenced(cols)` rendering.
    ///
    /// Column pairs are sorted by parent column so declaration order does not matter.
    pub fn describe_foreign_key(
        &self,
        parent_table: &str,
        fk: &ForeignKeyDescriptor,
        referenced_table: &str,
    ) -> String {
        let mut pairs: Vec<(String, String)> = fk
            .parent_columns
            .iter()
            .zip(&fk.referenced_columns)
            .map(|(parent, referenced)| {
                (
                    self.normalizer.canonical(parent),
                    self.normalizer.canonical(referenced),
                )
            })
            .collect();
        pairs.sort();
        let (parents, referenced): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        format!(
            "{}({}) -> {}({})",
            self.normalizer.canonical(parent_table),
            parents.join(","),
            self.normalizer.canonical(referenced_table),
            referenced.join(",")
        )
    }
}
