//! Table and column matching between an answer schema and a student schema.
//!
//! - **Normalization** (`normalize`, `fuzzy`, `types`): canonical identifier forms,
//!   fuzzy name scores and SQL type compatibility
//! - **Embeddings** (`embedding`): backend, cache and deterministic fallback vectors
//! - **Assignment** (`assignment`): minimum-cost bipartite matching
//! - **Matchers** (`tables`, `columns`, `foreign_keys`): one-to-one table and column
//!   pairing and the foreign key report
//! - **Scoring** (`score`, `engine`): per-table verdicts and the schema score
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use dbgrade_lexicon::Lexicon;
//! use dbgrade_match::{EmbeddingProvider, GradingEngine, MatchConfig};
//!
//! let lexicon = Arc::new(Lexicon::embedded()?);
//! let embeddings = EmbeddingProvider::offline(Arc::clone(&lexicon), 768);
//! let engine = GradingEngine::new(MatchConfig::default(), lexicon, embeddings)?;
//! let grade = engine.grade(&answer, &student);
//! println!("{} tables hit, score {}", grade.tables_hit, grade.schema_score);
//! ```

#![deny(unsafe_code)]

pub mod assignment;
pub mod columns;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod foreign_keys;
pub mod fuzzy;
pub mod matcher;
pub mod normalize;
pub mod score;
pub mod tables;
pub mod types;

pub use assignment::{maximize_assignment, solve_assignment};
pub use config::MatchConfig;
pub use embedding::{
    Embedding, EmbeddingBackend, EmbeddingCache, EmbeddingProvider, EmbeddingSettings,
    EmbeddingStats, HttpEmbeddingBackend, Provenance,
};
pub use engine::GradingEngine;
pub use error::{CacheError, ConfigError, EmbeddingError};
pub use foreign_keys::ForeignKeyReport;
pub use fuzzy::{FuzzyMatch, best_score, fuzzy_eq, token_score};
pub use matcher::SchemaMatcher;
pub use normalize::{Normalizer, normalize};
pub use score::ScoreSummary;
pub use tables::FORBIDDEN_COST;
pub use types::{TypeFamily, same_type};
