//! Single-student and batch grading.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, info_span};

use dbgrade_match::GradingEngine;
use dbgrade_model::{Schema, SchemaGrade};

use crate::snapshot::{JsonSnapshot, file_stem};
use crate::types::{BatchEntry, BatchResult};

/// A loaded snapshot and the schema built from it.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    pub identifier: String,
    pub schema: Schema,
}

pub fn load_schema(path: &Path) -> Result<LoadedSchema> {
    let snapshot = JsonSnapshot::load(path)?;
    let schema = snapshot
        .to_schema()
        .with_context(|| format!("build schema from {}", path.display()))?;
    Ok(LoadedSchema {
        identifier: snapshot.identifier(path),
        schema,
    })
}

/// Returns the student identifier with the grade.
pub fn grade_student(
    engine: &GradingEngine,
    answer: &Schema,
    path: &Path,
) -> Result<(String, SchemaGrade)> {
    let student = load_schema(path)?;
    let grade = engine.grade(answer, &student.schema);
    Ok((student.identifier, grade))
}

/// Student snapshots in `dir`: `*.json` files in name order, minus the answer file.
pub fn discover_students(dir: &Path, answer: &Path) -> Result<Vec<PathBuf>> {
    let answer = answer.canonicalize().ok();
    let mut paths = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("read directory {}", dir.display()))?
            .path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json || !path.is_file() {
            continue;
        }
        if answer.is_some() && path.canonicalize().ok() == answer {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Grades every student snapshot; a failing student is recorded and the batch continues.
pub fn run_batch(engine: &GradingEngine, answer: &Schema, students: &[PathBuf]) -> BatchResult {
    let span = info_span!("batch", students = students.len());
    let _guard = span.enter();
    let start = Instant::now();

    let entries: Vec<BatchEntry> = students
        .iter()
        .map(|path| match grade_student(engine, answer, path) {
            Ok((identifier, grade)) => BatchEntry {
                identifier,
                path: path.clone(),
                outcome: Ok(grade),
            },
            Err(err) => {
                let identifier = file_stem(path);
                let message = format!("{err:#}");
                error!(student = %identifier, error = %message, "student failed");
                BatchEntry {
                    identifier,
                    path: path.clone(),
                    outcome: Err(message),
                }
            }
        })
        .collect();

    let result = BatchResult { entries };
    info!(
        graded = result.graded(),
        failed = result.failed(),
        duration_ms = start.elapsed().as_millis(),
        "batch complete"
    );
    result
}
