//! CSV reports for graded students.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use dbgrade_model::{SchemaGrade, UNMATCHED_PLACEHOLDER};

use crate::types::BatchResult;

/// File written by `batch` into the output directory.
pub const BATCH_RESULTS_FILE: &str = "schema_grading_results.csv";

const PAIR_HEADER: [&str; 9] = [
    "answer_table",
    "answer_column",
    "answer_type",
    "student_table",
    "student_column",
    "student_type",
    "similarity",
    "type_compatible",
    "matched",
];

const TABLE_HEADER: [&str; 11] = [
    "answer_table",
    "student_table",
    "similarity",
    "column_overlap",
    "answer_columns",
    "matched_columns",
    "column_ratio",
    "enough_columns",
    "primary_key_ok",
    "foreign_keys_ok",
    "hit",
];

const FOREIGN_KEY_HEADER: [&str; 3] = ["answer_foreign_key", "student_foreign_key", "matched"];

const BATCH_HEADER: [&str; 7] = [
    "identifier",
    "status",
    "schema_score",
    "tables_hit",
    "matched_column_ratio",
    "foreign_key_ratio",
    "error",
];

fn score(value: f64) -> String {
    format!("{value:.4}")
}

fn flag(value: bool) -> String {
    value.to_string()
}

/// One row per answer column.
pub fn write_pairs<W: Write>(writer: W, grade: &SchemaGrade) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    writer.write_record(PAIR_HEADER)?;
    for column in &grade.columns {
        writer.write_record([
            column.answer_table.clone(),
            column.answer_col.clone(),
            column.answer_type.clone(),
            column.student_table_label().to_string(),
            column.student_col_label().to_string(),
            column.student_type_label().to_string(),
            score(column.similarity_score),
            flag(column.type_compatible),
            flag(column.is_matched()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per answer table, joining the table match and its verdict.
pub fn write_tables<W: Write>(writer: W, grade: &SchemaGrade) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    writer.write_record(TABLE_HEADER)?;
    for table in &grade.tables {
        let verdict = grade.verdict(&table.answer_table);
        writer.write_record([
            table.answer_table.clone(),
            table
                .student_table
                .as_deref()
                .unwrap_or(UNMATCHED_PLACEHOLDER)
                .to_string(),
            score(table.similarity_score),
            table.column_overlap.to_string(),
            verdict.map_or(0, |v| v.answer_columns).to_string(),
            verdict.map_or(0, |v| v.matched_columns).to_string(),
            score(verdict.map_or(0.0, |v| v.column_ratio)),
            flag(verdict.is_some_and(|v| v.enough_columns)),
            flag(verdict.is_some_and(|v| v.primary_key_ok)),
            flag(verdict.is_some_and(|v| v.foreign_keys_ok)),
            flag(verdict.is_some_and(|v| v.hit)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_foreign_keys<W: Write>(writer: W, grade: &SchemaGrade) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    writer.write_record(FOREIGN_KEY_HEADER)?;
    for foreign_key in &grade.foreign_keys {
        writer.write_record([
            foreign_key.answer.clone(),
            foreign_key
                .student
                .clone()
                .unwrap_or_else(|| UNMATCHED_PLACEHOLDER.to_string()),
            flag(foreign_key.matched),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per student; failed students carry their error and empty score fields.
pub fn write_batch<W: Write>(writer: W, result: &BatchResult) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    writer.write_record(BATCH_HEADER)?;
    for entry in &result.entries {
        let record = match &entry.outcome {
            Ok(grade) => [
                entry.identifier.clone(),
                "graded".to_string(),
                score(grade.schema_score),
                grade.tables_hit.to_string(),
                score(grade.matched_column_ratio),
                score(grade.foreign_key_ratio),
                String::new(),
            ],
            Err(error) => [
                entry.identifier.clone(),
                "failed".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                error.clone(),
            ],
        };
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes `<student>_pairs.csv`, `<student>_tables.csv` and `<student>_fk.csv`.
pub fn export_grade(dir: &Path, student: &str, grade: &SchemaGrade) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let pairs = dir.join(format!("{student}_pairs.csv"));
    write_pairs(create(&pairs)?, grade).with_context(|| format!("write {}", pairs.display()))?;

    let tables = dir.join(format!("{student}_tables.csv"));
    write_tables(create(&tables)?, grade)
        .with_context(|| format!("write {}", tables.display()))?;

    let foreign_keys = dir.join(format!("{student}_fk.csv"));
    write_foreign_keys(create(&foreign_keys)?, grade)
        .with_context(|| format!("write {}", foreign_keys.display()))?;

    Ok(vec![pairs, tables, foreign_keys])
}

/// Writes [`BATCH_RESULTS_FILE`] into `dir`.
pub fn export_batch(dir: &Path, result: &BatchResult) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(BATCH_RESULTS_FILE);
    write_batch(create(&path)?, result).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
