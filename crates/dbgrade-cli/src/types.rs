//! Result types for batch grading.

use std::path::PathBuf;

use dbgrade_model::SchemaGrade;

/// Outcome for one student snapshot.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// Database name, or the snapshot file stem when it could not be read.
    pub identifier: String,
    pub path: PathBuf,
    /// The grade, or the rendered error chain.
    pub outcome: Result<SchemaGrade, String>,
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn grade(&self) -> Option<&SchemaGrade> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn graded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.graded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Mean schema score over graded students, 0 when none were graded.
    pub fn mean_score(&self) -> f64 {
        let scores: Vec<f64> = self
            .entries
            .iter()
            .filter_map(BatchEntry::grade)
            .map(|grade| grade.schema_score)
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
