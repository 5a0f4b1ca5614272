use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use dbgrade_cli::config::GraderConfig;
use dbgrade_cli::grading::{discover_students, load_schema, run_batch as grade_all};
use dbgrade_cli::report::{export_batch, export_grade};
use dbgrade_cli::types::BatchResult;
use dbgrade_match::{GradingEngine, Normalizer, normalize};
use dbgrade_model::SchemaGrade;

use crate::cli::{BatchArgs, CanonicalArgs, GradeArgs};
use crate::summary::apply_table_style;

/// One graded student and the report files written for it.
pub struct GradeRun {
    pub identifier: String,
    pub grade: SchemaGrade,
    pub exports: Vec<PathBuf>,
}

pub struct BatchRun {
    pub result: BatchResult,
    pub results_file: PathBuf,
}

pub fn load_config(path: Option<&Path>, offline: bool) -> Result<GraderConfig> {
    let config = GraderConfig::load_or_default(path)?;
    Ok(if offline { config.offline() } else { config })
}

fn build_engine(config: &GraderConfig) -> Result<GradingEngine> {
    let engine = config.build_engine()?;
    info!(
        backend = engine.embeddings().has_backend(),
        dimension = engine.embeddings().dimension(),
        "grading engine ready"
    );
    Ok(engine)
}

pub fn run_grade(config: &GraderConfig, args: &GradeArgs) -> Result<GradeRun> {
    let engine = build_engine(config)?;
    let answer = load_schema(&args.answer).context("load answer schema")?;
    let student = load_schema(&args.student).context("load student schema")?;

    let span = info_span!("student", student = %student.identifier);
    let _guard = span.enter();
    let grade = engine.grade(&answer.schema, &student.schema);

    let exports = match &args.output_dir {
        Some(dir) => export_grade(dir, &student.identifier, &grade)?,
        None => Vec::new(),
    };
    Ok(GradeRun {
        identifier: student.identifier,
        grade,
        exports,
    })
}

pub fn run_batch(config: &GraderConfig, args: &BatchArgs) -> Result<BatchRun> {
    let start = Instant::now();
    let engine = build_engine(config)?;
    let answer = load_schema(&args.answer).context("load answer schema")?;
    let students = discover_students(&args.students_dir, &args.answer)?;
    info!(
        answer = %answer.identifier,
        students = students.len(),
        "grading batch"
    );

    let result = grade_all(&engine, &answer.schema, &students);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.students_dir.clone());
    let results_file = export_batch(&output_dir, &result)?;
    info!(
        path = %results_file.display(),
        duration_ms = start.elapsed().as_millis(),
        "batch results written"
    );
    Ok(BatchRun {
        result,
        results_file,
    })
}

pub fn run_canonical(config: &GraderConfig, args: &CanonicalArgs) -> Result<()> {
    let normalizer = Normalizer::new(config.lexicon()?, config.matching.canonical_cache_capacity);
    let mut table = Table::new();
    table.set_header(vec!["Input", "Normalized", "Canonical"]);
    apply_table_style(&mut table);
    for text in &args.texts {
        table.add_row(vec![
            text.clone(),
            normalize(text),
            normalizer.canonical(text),
        ]);
    }
    println!("{table}");
    Ok(())
}
