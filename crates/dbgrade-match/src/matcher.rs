//! Shared context for the table matcher, column matcher and aggregator.

use crate::config::MatchConfig;
use crate::embedding::EmbeddingProvider;
use crate::normalize::Normalizer;

/// Borrowed view of everything a matching pass needs.
///
/// The matchers are stateless apart from the normalizer memo and the embedding cache,
/// so one engine can hand out any number of these concurrently.
#[derive(Debug, Clone, Copy)]
pub struct SchemaMatcher<'a> {
    pub(crate) config: &'a MatchConfig,
    pub(crate) normalizer: &'a Normalizer,
    pub(crate) embeddings: &'a EmbeddingProvider,
}

impl<'a> SchemaMatcher<'a> {
    pub fn new(
        config: &'a MatchConfig,
        normalizer: &'a Normalizer,
        embeddings: &'a EmbeddingProvider,
    ) -> Self {
        Self {
            config,
            normalizer,
            embeddings,
        }
    }

    pub fn config(&self) -> &'a MatchConfig {
        self.config
    }

    pub fn normalizer(&self) -> &'a Normalizer {
        self.normalizer
    }

    pub fn embeddings(&self) -> &'a EmbeddingProvider {
        self.embeddings
    }
}
