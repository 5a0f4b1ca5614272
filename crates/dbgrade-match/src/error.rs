//! Error types for the matching engine.
//!
//! None of these escape a grading pass: embedding and cache failures degrade to the
//! fallback path, and configuration errors are reported before grading starts.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid matching configuration.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A threshold or ratio lies outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    /// The fuzzy threshold lies outside `[0, 100]`.
    #[error("fuzzy_threshold must be within [0, 100], got {0}")]
    FuzzyThreshold(f64),

    /// The ambiguous band's lower bound exceeds its upper bound.
    #[error("ambiguous_band lower bound {low} exceeds upper bound {high}")]
    InvertedBand { low: f64, high: f64 },

    /// A weight or point value is not strictly positive.
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// Failure of an embedding backend call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmbeddingError {
    /// Transport-level failure, including timeouts.
    #[error("embedding request failed: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("embedding backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// No API key was configured or found in the environment.
    #[error("no API key configured for the embedding backend")]
    MissingApiKey,

    /// The response body did not have the expected shape.
    #[error("malformed embedding response: {0}")]
    Malformed(String),

    /// The backend returned an empty or all-zero vector.
    #[error("embedding backend returned an empty vector")]
    EmptyVector,
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Malformed(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

impl EmbeddingError {
    /// Returns whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey | Self::Malformed(_) | Self::EmptyVector => false,
        }
    }
}

/// Failure reading or writing the persistent embedding cache.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid embedding cache {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
