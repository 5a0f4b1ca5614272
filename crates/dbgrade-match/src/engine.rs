//! Grading engine: one configured matcher shared across student schemas.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use dbgrade_lexicon::Lexicon;
use dbgrade_model::{Schema, SchemaGrade};

use crate::config::MatchConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::ConfigError;
use crate::matcher::SchemaMatcher;
use crate::normalize::Normalizer;

/// Owns the configuration, normalizer and embedding provider for a grading session.
///
/// Grading takes `&self`, so one engine can grade many students, from several threads
/// if needed; the normalizer memo and embedding cache are shared between them.
#[derive(Debug)]
pub struct GradingEngine {
    config: MatchConfig,
    normalizer: Normalizer,
    embeddings: EmbeddingProvider,
}

impl GradingEngine {
    /// Validates `config` and builds an engine around an injected lexicon and provider.
    pub fn new(
        config: MatchConfig,
        lexicon: Arc<Lexicon>,
        embeddings: EmbeddingProvider,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let normalizer = Normalizer::new(lexicon, config.canonical_cache_capacity);
        Ok(Self {
            config,
            normalizer,
            embeddings,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn embeddings(&self) -> &EmbeddingProvider {
        &self.embeddings
    }

    pub fn matcher(&self) -> SchemaMatcher<'_> {
        SchemaMatcher::new(&self.config, &self.normalizer, &self.embeddings)
    }

    /// Grades `student` against `answer`.
    ///
    /// Never fails: embedding problems degrade to fallback vectors and empty schemas
    /// grade as zero.
    pub fn grade(&self, answer: &Schema, student: &Schema) -> SchemaGrade {
        let span = info_span!(
            "grade",
            answer_tables = answer.len(),
            student_tables = student.len()
        );
        let _guard = span.enter();
        let start = Instant::now();
        let matcher = self.matcher();

        let tables = info_span!("tables").in_scope(|| {
            let start = Instant::now();
            let tables = matcher.match_tables(answer, student);
            debug!(
                matched = tables.iter().filter(|m| m.is_matched()).count(),
                duration_ms = start.elapsed().as_millis(),
                "table matching complete"
            );
            tables
        });
        let columns = info_span!("columns").in_scope(|| {
            let start = Instant::now();
            let columns = matcher.match_all_columns(&tables, answer, student);
            debug!(
                matched = columns.iter().filter(|m| m.is_matched()).count(),
                duration_ms = start.elapsed().as_millis(),
                "column matching complete"
            );
            columns
        });
        let summary = matcher.aggregate(answer, student, &tables, &columns);
        let foreign_keys = matcher.compare_foreign_keys(answer, student, &tables);

        if let Err(error) = self.embeddings.flush() {
            warn!(%error, "failed to persist embedding cache");
        }
        let stats = self.embeddings.stats();
        info!(
            schema_score = summary.schema_score,
            tables_hit = summary.tables_hit,
            matched_column_ratio = summary.matched_column_ratio,
            foreign_key_ratio = foreign_keys.ratio,
            fallbacks = stats.fallbacks,
            duration_ms = start.elapsed().as_millis(),
            "grading complete"
        );

        SchemaGrade {
            tables,
            columns,
            verdicts: summary.verdicts,
            foreign_keys: foreign_keys.matches,
            schema_score: summary.schema_score,
            tables_hit: summary.tables_hit,
            matched_column_ratio: summary.matched_column_ratio,
            foreign_key_ratio: foreign_keys.ratio,
        }
    }
}
