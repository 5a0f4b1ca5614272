//! Grader configuration file.
//!
//! ```toml
//! [matching]
//! column_threshold = 0.75
//! points_per_table = 0.5
//!
//! [embedding]
//! enabled = true
//! cache_path = "embedding-cache.json"
//!
//! [lexicon]
//! path = "lexicon.toml"
//! ```
//!
//! Every section and field is optional.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use dbgrade_lexicon::Lexicon;
use dbgrade_match::{EmbeddingProvider, EmbeddingSettings, GradingEngine, MatchConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraderConfig {
    pub matching: MatchConfig,
    pub embedding: EmbeddingSettings,
    pub lexicon: LexiconSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LexiconSettings {
    /// Dictionary file replacing the built-in one.
    pub path: Option<PathBuf>,
}

impl GraderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Disables the remote embedding backend.
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.embedding.enabled = false;
        self
    }

    pub fn lexicon(&self) -> Result<Arc<Lexicon>> {
        let lexicon = match &self.lexicon.path {
            Some(path) => Lexicon::load(path)
                .with_context(|| format!("load lexicon {}", path.display()))?,
            None => Lexicon::embedded().context("load built-in lexicon")?,
        };
        debug!(
            entries = lexicon.len(),
            fingerprint = %lexicon.fingerprint(),
            "lexicon loaded"
        );
        Ok(Arc::new(lexicon))
    }

    pub fn build_engine(&self) -> Result<GradingEngine> {
        let lexicon = self.lexicon()?;
        let embeddings = EmbeddingProvider::from_settings(&self.embedding, Arc::clone(&lexicon));
        GradingEngine::new(self.matching.clone(), lexicon, embeddings)
            .context("invalid matching configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = GraderConfig::from_toml_str(
            "[matching]\npoints_per_table = 1.0\n\n[embedding]\nenabled = false\n",
        )
        .unwrap();
        assert_eq!(config.matching.points_per_table, 1.0);
        assert_eq!(config.matching.column_threshold, 0.75);
        assert!(!config.embedding.enabled);
        assert_eq!(config.embedding.dimension, 768);
        assert!(config.lexicon.path.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(GraderConfig::from_toml_str("[matching]\ncolum_threshold = 0.5\n").is_err());
        assert!(GraderConfig::from_toml_str("[extra]\n").is_err());
    }

    #[test]
    fn invalid_thresholds_fail_engine_construction() {
        let mut config = GraderConfig::default().offline();
        config.matching.column_threshold = 2.0;
        let error = config.build_engine().unwrap_err();
        assert!(format!("{error:#}").contains("column_threshold"));
    }

    #[test]
    fn offline_engine_has_no_backend() {
        let engine = GraderConfig::default().offline().build_engine().unwrap();
        assert!(!engine.embeddings().has_backend());
    }

    #[test]
    fn missing_lexicon_file_is_reported() {
        let config = GraderConfig {
            lexicon: LexiconSettings {
                path: Some(PathBuf::from("/nonexistent/lexicon.toml")),
            },
            ..GraderConfig::default()
        };
        let error = config.lexicon().unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/lexicon.toml"));
    }
}
