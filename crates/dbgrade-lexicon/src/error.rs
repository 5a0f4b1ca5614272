use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LexiconError {
    #[error("failed to read lexicon {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lexicon {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("[{section}] entry {key:?} is empty after normalization")]
    EmptyEntry { section: &'static str, key: String },

    #[error("[{section}] key {key:?} must be a single word")]
    MultiWordKey { section: &'static str, key: String },

    #[error("[{section}] value {value:?} for {key:?} contains the key {conflict:?}")]
    UnstableEntry {
        section: &'static str,
        key: String,
        value: String,
        conflict: String,
    },
}

impl LexiconError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LexiconError>;
