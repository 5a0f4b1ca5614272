//! HTTP embedding backend speaking the Gemini `embedContent` protocol.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingBackend;
use crate::error::EmbeddingError;

/// Environment variables consulted for an API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "models/text-embedding-004";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Blocking client for a remote embedding model.
///
/// Every request carries a timeout; a slow backend surfaces as an error and the
/// provider falls back instead of blocking the grading pass.
#[derive(Debug)]
pub struct HttpEmbeddingBackend {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpEmbeddingBackend {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::MissingApiKey);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// First non-empty key from [`API_KEY_ENV_VARS`].
    pub fn api_key_from_env() -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
    }

    fn url(&self) -> String {
        format!("{}/{}:embedContent", self.endpoint, self.model)
    }
}

impl EmbeddingBackend for HttpEmbeddingBackend {
    fn name(&self) -> &str {
        &self.model
    }

    fn embed(&self, prompt: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbedRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text: prompt }],
            },
            task_type: "SEMANTIC_SIMILARITY",
        };
        debug!(model = %self.model, chars = prompt.len(), "requesting embedding");
        let response = self
            .client
            .post(self.url())
            .header(CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EmbeddingError::Status { status, message });
        }

        let body: EmbedResponse = response.json()?;
        let values = body
            .embedding
            .ok_or_else(|| EmbeddingError::Malformed("missing embedding field".to_string()))?
            .values;
        if values.is_empty() {
            return Err(EmbeddingError::EmptyVector);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_api_key() {
        let result = HttpEmbeddingBackend::new(
            DEFAULT_ENDPOINT,
            DEFAULT_MODEL,
            "  ",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(EmbeddingError::MissingApiKey)));
    }

    #[test]
    fn builds_model_url() {
        let backend = HttpEmbeddingBackend::new(
            "http://localhost:9/v1beta/",
            DEFAULT_MODEL,
            "key",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            backend.url(),
            "http://localhost:9/v1beta/models/text-embedding-004:embedContent"
        );
        assert_eq!(backend.name(), DEFAULT_MODEL);
    }

    #[test]
    fn unreachable_backend_is_an_error() {
        let backend = HttpEmbeddingBackend::new(
            "http://127.0.0.1:9",
            DEFAULT_MODEL,
            "key",
            Duration::from_millis(200),
        )
        .unwrap();
        let error = backend.embed("MaHangHoa").unwrap_err();
        assert!(error.is_retryable());
    }
}
