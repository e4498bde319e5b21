//! HTTP client for the embedding service

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{AgentError, Result};

/// Client for the embedding service.
///
/// The service is a black-box text -> fixed-length-vector function,
/// assumed deterministic for identical input and model version. All
/// vector namespaces must be populated with the same model, or
/// cross-namespace ranking is undefined.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Default client pointing to localhost
    pub fn default_local() -> Self {
        Self::new("http://localhost:8100")
    }

    /// Generate embeddings for texts
    #[instrument(skip(self, texts))]
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embed", self.base_url);

        let request = EmbedRequest { texts };

        debug!("Requesting embeddings for {} texts", request.texts.len());

        let response: EmbedResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_err)?
            .json()
            .await?;

        debug!("Received {} embeddings", response.embeddings.len());

        Ok(response.embeddings)
    }

    /// Generate embedding for a single text
    pub async fn embed_one(&self, text: impl Into<String>) -> Result<Vec<f32>> {
        let embeddings = self.embed(vec![text.into()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Embedding("No embedding returned".into()))
    }

    /// Health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_err)?;

        Ok(response.status().is_success())
    }
}

/// Connection-level failures become `Unavailable` so callers can
/// tell "down" apart from other HTTP errors.
pub(crate) fn map_transport_err(e: reqwest::Error) -> AgentError {
    if e.is_connect() {
        AgentError::Unavailable(e.to_string())
    } else {
        AgentError::Http(e)
    }
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Debug, Serialize)]
struct EmbedRequest {
    texts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EmbeddingClient::new("http://localhost:8100");
        assert_eq!(client.base_url, "http://localhost:8100");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        // Nothing listens on this port
        let client = EmbeddingClient::new("http://127.0.0.1:1");
        let err = client.embed_one("probe").await.unwrap_err();
        assert!(matches!(err, AgentError::Unavailable(_)));
    }
}
