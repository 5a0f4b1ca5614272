//! Text embeddings for semantic similarity.
//!
//! The provider asks a backend for a vector and falls back to a deterministic hash
//! embedding whenever the backend is absent or fails. Each [`Embedding`] records which
//! path produced it. Results are cached by content hash, so repeated texts return
//! bit-identical vectors.

mod cache;
mod fallback;
mod http;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dbgrade_lexicon::{Lexicon, sha256_hex};

pub use cache::EmbeddingCache;
pub use fallback::fallback_embedding;
pub use http::{API_KEY_ENV_VARS, DEFAULT_ENDPOINT, DEFAULT_MODEL, HttpEmbeddingBackend};

use crate::error::{CacheError, EmbeddingError};
use crate::normalize::normalize;
use fallback::l2_normalize;

/// Which path produced an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Backend,
    Fallback,
}

/// A unit-length vector and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub provenance: Provenance,
}

impl Embedding {
    /// Cosine similarity clamped to `[0, 1]`. Vectors of different length compare as 0.
    pub fn cosine(&self, other: &Embedding) -> f64 {
        if self.vector.len() != other.vector.len() || self.vector.is_empty() {
            return 0.0;
        }
        let mut dot = 0.0_f64;
        let mut norm_a = 0.0_f64;
        let mut norm_b = 0.0_f64;
        for (a, b) in self.vector.iter().zip(&other.vector) {
            let (a, b) = (f64::from(*a), f64::from(*b));
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        let denominator = norm_a.sqrt() * norm_b.sqrt();
        if denominator == 0.0 || !denominator.is_finite() {
            return 0.0;
        }
        (dot / denominator).clamp(0.0, 1.0)
    }
}

/// A remote or local model that turns text into a vector.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    fn embed(&self, prompt: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Counters describing how embeddings were produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmbeddingStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub backend_calls: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    backend_calls: AtomicU64,
    fallbacks: AtomicU64,
}

/// Embedding configuration as read from the grader config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSettings {
    /// Use the remote backend when an API key is available (default: true).
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// API key; falls back to [`API_KEY_ENV_VARS`] when unset.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (default: 10).
    pub timeout_secs: u64,
    /// Persistent cache file; in-memory only when unset.
    pub cache_path: Option<PathBuf>,
    /// Maximum cached vectors (default: 10000).
    pub cache_capacity: usize,
    /// Dimension of fallback vectors (default: 768, matching the default model).
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 10,
            cache_path: None,
            cache_capacity: 10_000,
            dimension: 768,
        }
    }
}

impl EmbeddingSettings {
    /// Settings that never contact a backend.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Produces embeddings through a backend, a content-addressed cache and a fallback.
pub struct EmbeddingProvider {
    backend: Option<Box<dyn EmbeddingBackend>>,
    cache: EmbeddingCache,
    lexicon: Arc<Lexicon>,
    dimension: usize,
    counters: Counters,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("cache", &self.cache)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl EmbeddingProvider {
    pub fn new(
        backend: Option<Box<dyn EmbeddingBackend>>,
        cache: EmbeddingCache,
        lexicon: Arc<Lexicon>,
        dimension: usize,
    ) -> Self {
        Self {
            backend,
            cache,
            lexicon,
            dimension: dimension.max(1),
            counters: Counters::default(),
        }
    }

    /// A provider that only uses fallback embeddings and an in-memory cache.
    pub fn offline(lexicon: Arc<Lexicon>, dimension: usize) -> Self {
        let capacity = EmbeddingSettings::default().cache_capacity;
        Self::new(None, EmbeddingCache::in_memory(capacity), lexicon, dimension)
    }

    /// Builds a provider from settings.
    ///
    /// Missing API keys, client construction failures and unreadable cache files are
    /// logged and degrade to the offline path.
    pub fn from_settings(settings: &EmbeddingSettings, lexicon: Arc<Lexicon>) -> Self {
        let backend: Option<Box<dyn EmbeddingBackend>> = if settings.enabled {
            let api_key = settings
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .or_else(HttpEmbeddingBackend::api_key_from_env);
            match api_key {
                Some(api_key) => match HttpEmbeddingBackend::new(
                    settings.endpoint.as_str(),
                    settings.model.as_str(),
                    api_key,
                    Duration::from_secs(settings.timeout_secs.max(1)),
                ) {
                    Ok(backend) => Some(Box::new(backend)),
                    Err(error) => {
                        warn!(%error, "embedding backend unavailable; using fallback embeddings");
                        None
                    }
                },
                None => {
                    warn!("no embedding API key found; using fallback embeddings");
                    None
                }
            }
        } else {
            None
        };

        let cache = match &settings.cache_path {
            Some(path) => EmbeddingCache::open(path, &settings.model, settings.cache_capacity)
                .unwrap_or_else(|error| {
                    warn!(%error, "embedding cache unreadable; using an in-memory cache");
                    EmbeddingCache::in_memory(settings.cache_capacity)
                }),
            None => EmbeddingCache::in_memory(settings.cache_capacity),
        };

        Self::new(backend, cache, lexicon, settings.dimension)
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Text sent to the backend: the input followed by equivalence hints for known terms.
    pub fn prompt(&self, text: &str) -> String {
        let normalized = normalize(text);
        let hints: Vec<String> = self
            .lexicon
            .context_for(&normalized)
            .map(|group| format!("- {}", group.hint()))
            .collect();
        if hints.is_empty() {
            return text.to_string();
        }
        format!("{text}\nEquivalent terms:\n{}", hints.join("\n"))
    }

    /// Embeds `text`. Never fails; backend errors produce a fallback embedding.
    pub fn embed(&self, text: &str) -> Embedding {
        let key = sha256_hex(text.as_bytes());
        if let Some(hit) = self.cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let embedding = self
            .embed_with_backend(text)
            .unwrap_or_else(|| self.embed_fallback(text));
        self.cache.insert(key, embedding.clone());
        embedding
    }

    fn embed_with_backend(&self, text: &str) -> Option<Embedding> {
        let backend = self.backend.as_ref()?;
        self.counters.backend_calls.fetch_add(1, Ordering::Relaxed);
        let result = backend.embed(&self.prompt(text)).and_then(|mut vector| {
            if l2_normalize(&mut vector) {
                Ok(vector)
            } else {
                Err(EmbeddingError::EmptyVector)
            }
        });
        match result {
            Ok(vector) => Some(Embedding {
                vector,
                provenance: Provenance::Backend,
            }),
            Err(error) => {
                warn!(
                    backend = backend.name(),
                    %error,
                    retryable = error.is_retryable(),
                    "embedding backend failed; using fallback"
                );
                None
            }
        }
    }

    fn embed_fallback(&self, text: &str) -> Embedding {
        self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
        debug!(chars = text.len(), "fallback embedding");
        Embedding {
            vector: fallback_embedding(text, self.dimension),
            provenance: Provenance::Fallback,
        }
    }

    /// Cosine similarity matrix, `rows[i][j] = cos(embed(rows[i]), embed(columns[j]))`.
    pub fn similarity_matrix(&self, rows: &[String], columns: &[String]) -> Vec<Vec<f64>> {
        let row_vectors: Vec<Embedding> = rows.iter().map(|text| self.embed(text)).collect();
        let column_vectors: Vec<Embedding> =
            columns.iter().map(|text| self.embed(text)).collect();
        row_vectors
            .iter()
            .map(|row| column_vectors.iter().map(|column| row.cosine(column)).collect())
            .collect()
    }

    pub fn stats(&self) -> EmbeddingStats {
        EmbeddingStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            backend_calls: self.counters.backend_calls.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Writes new backend vectors to the persistent cache, if any.
    pub fn flush(&self) -> Result<(), CacheError> {
        self.cache.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FixedBackend {
        calls: Mutex<Vec<String>>,
    }

    impl EmbeddingBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        fn embed(&self, prompt: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            Ok(vec![3.0, 4.0])
        }
    }

    struct FailingBackend;

    impl EmbeddingBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn embed(&self, _prompt: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Status {
                status: 503,
                message: "quota".to_string(),
            })
        }
    }

    fn lexicon() -> Arc<Lexicon> {
        Arc::new(Lexicon::embedded().unwrap())
    }

    #[test]
    fn second_call_is_a_bit_identical_cache_hit() {
        let provider = EmbeddingProvider::offline(lexicon(), 64);
        let first = provider.embed("ChiTietMuaHang.MaHangHoa (varchar)");
        let second = provider.embed("ChiTietMuaHang.MaHangHoa (varchar)");

        assert_eq!(first, second);
        assert_eq!(first.provenance, Provenance::Fallback);
        let stats = provider.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.fallbacks, 1);
    }

    #[test]
    fn backend_vectors_are_normalized() {
        let backend = FixedBackend {
            calls: Mutex::new(Vec::new()),
        };
        let provider = EmbeddingProvider::new(
            Some(Box::new(backend)),
            EmbeddingCache::in_memory(8),
            lexicon(),
            2,
        );
        let embedding = provider.embed("MuaHang");
        assert_eq!(embedding.provenance, Provenance::Backend);
        assert!((embedding.vector[0] - 0.6).abs() < 1e-6);
        assert!((embedding.vector[1] - 0.8).abs() < 1e-6);
        assert_eq!(provider.stats().backend_calls, 1);
    }

    #[test]
    fn failing_backend_degrades_to_fallback() {
        let provider = EmbeddingProvider::new(
            Some(Box::new(FailingBackend)),
            EmbeddingCache::in_memory(8),
            lexicon(),
            16,
        );
        let embedding = provider.embed("PhieuChi");
        assert_eq!(embedding.provenance, Provenance::Fallback);
        assert_eq!(embedding.vector, fallback_embedding("PhieuChi", 16));
        let stats = provider.stats();
        assert_eq!(stats.backend_calls, 1);
        assert_eq!(stats.fallbacks, 1);
    }

    #[test]
    fn prompt_appends_context_hints() {
        let provider = EmbeddingProvider::offline(lexicon(), 8);
        let prompt = provider.prompt("TABLE NhaCungCap: MaNCC, TenNCC");
        assert!(prompt.starts_with("TABLE NhaCungCap: MaNCC, TenNCC\n"));
        assert!(prompt.contains("- nha cung cap = ncc = supplier = vendor"));
        assert!(prompt.contains("- ma = id = so"));
        assert_eq!(provider.prompt("Quux"), "Quux");
    }

    #[test]
    fn cosine_handles_mismatched_and_zero_vectors() {
        let a = Embedding {
            vector: vec![1.0, 0.0],
            provenance: Provenance::Backend,
        };
        let b = Embedding {
            vector: vec![1.0, 0.0, 0.0],
            provenance: Provenance::Fallback,
        };
        let zero = Embedding {
            vector: vec![0.0, 0.0],
            provenance: Provenance::Fallback,
        };
        assert_eq!(a.cosine(&a), 1.0);
        assert_eq!(a.cosine(&b), 0.0);
        assert_eq!(a.cosine(&zero), 0.0);
    }

    #[test]
    fn offline_settings_skip_the_backend() {
        let provider = EmbeddingProvider::from_settings(&EmbeddingSettings::offline(), lexicon());
        assert!(!provider.has_backend());
        assert_eq!(provider.dimension(), 768);
    }
}
