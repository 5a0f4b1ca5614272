//! Content-addressed embedding cache with optional JSON persistence.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Embedding, Provenance};
use crate::error::CacheError;

const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    model: String,
    entries: BTreeMap<String, Vec<f32>>,
}

#[derive(Debug)]
struct CacheStore {
    path: PathBuf,
    model: String,
}

/// Bounded LRU of embeddings keyed by the sha256 of the input text.
///
/// Only backend vectors are written to disk; fallback vectors live in memory so an
/// outage does not leave degraded entries behind for later runs. Inserts only mark the
/// cache dirty; [`EmbeddingCache::flush`] and drop write the file.
#[derive(Debug)]
pub struct EmbeddingCache {
    entries: Mutex<LruCache<String, Embedding>>,
    store: Option<CacheStore>,
    dirty: AtomicBool,
}

impl EmbeddingCache {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity_of(capacity))),
            store: None,
            dirty: AtomicBool::new(false),
        }
    }

    /// Opens a persistent cache, loading existing entries for the same `model`.
    ///
    /// A missing file starts empty. A file written for another model is ignored.
    pub fn open(path: &Path, model: &str, capacity: usize) -> Result<Self, CacheError> {
        let mut cache = LruCache::new(capacity_of(capacity));
        if path.exists() {
            let text = fs::read_to_string(path).map_err(|source| CacheError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source,
            })?;
            let file: CacheFile =
                serde_json::from_str(&text).map_err(|source| CacheError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
            if file.version == CACHE_FORMAT_VERSION && file.model == model {
                for (key, vector) in file.entries {
                    cache.put(
                        key,
                        Embedding {
                            vector,
                            provenance: Provenance::Backend,
                        },
                    );
                }
                debug!(path = %path.display(), entries = cache.len(), "loaded embedding cache");
            } else {
                warn!(
                    path = %path.display(),
                    cached_model = %file.model,
                    model,
                    "embedding cache belongs to another model; starting empty"
                );
            }
        }
        Ok(Self {
            entries: Mutex::new(cache),
            store: Some(CacheStore {
                path: path.to_path_buf(),
                model: model.to_string(),
            }),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn get(&self, key: &str) -> Option<Embedding> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: String, embedding: Embedding) {
        let persistent = embedding.provenance == Provenance::Backend && self.store.is_some();
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, embedding);
            if persistent {
                self.dirty.store(true, Ordering::Release);
            }
        }
    }

    /// True when backend entries were added since the last successful write.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Writes the cache file if backend entries were added since the last write.
    pub fn flush(&self) -> Result<(), CacheError> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.persist().inspect_err(|_| self.dirty.store(true, Ordering::Release))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.store.as_ref().map(|store| store.path.as_path())
    }

    /// Writes backend entries to the cache file via temp file and rename.
    pub fn persist(&self) -> Result<(), CacheError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let entries: BTreeMap<String, Vec<f32>> = match self.entries.lock() {
            Ok(entries) => entries
                .iter()
                .filter(|(_, embedding)| embedding.provenance == Provenance::Backend)
                .map(|(key, embedding)| (key.clone(), embedding.vector.clone()))
                .collect(),
            Err(_) => return Ok(()),
        };
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            model: store.model.clone(),
            entries,
        };
        let bytes = serde_json::to_vec(&file).map_err(|source| CacheError::Json {
            path: store.path.clone(),
            source,
        })?;
        write_atomic(&store.path, &bytes)
    }
}

impl Drop for EmbeddingCache {
    fn drop(&mut self) {
        if let Err(error) = self.flush() {
            warn!(%error, "failed to persist embedding cache");
        }
    }
}

fn capacity_of(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> CacheError {
    let path = path.to_path_buf();
    move |source| CacheError::Io {
        operation,
        path,
        source,
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error("create directory", parent))?;
    }
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(io_error("create", &temp_path))?;
    file.write_all(bytes).map_err(io_error("write", &temp_path))?;
    file.sync_all().map_err(io_error("sync", &temp_path))?;
    fs::rename(&temp_path, path).map_err(io_error("rename", path))?;
    Ok(())
}
