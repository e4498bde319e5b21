//! Vector store collaborator - per-namespace similarity retrieval

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use commgraph_core::ScoredMatch;

use crate::embed::map_transport_err;
use crate::Result;

/// Per-namespace approximate nearest-neighbor retrieval.
///
/// Implementations return up to `top_k` matches local to the given
/// namespace, already ranked descending by score; global ranking
/// across namespaces is the aggregator's job.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn query(
        &self,
        vector: &[f32],
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredMatch>>;
}

/// HTTP client for a remote vector index
#[derive(Clone)]
pub struct VectorStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl VectorStoreClient {
    /// Create a new vector store client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Default client pointing to localhost
    pub fn default_local() -> Self {
        Self::new("http://localhost:8200")
    }
}

#[async_trait]
impl VectorSearch for VectorStoreClient {
    #[instrument(skip(self, vector))]
    async fn query(
        &self,
        vector: &[f32],
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredMatch>> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            vector: vector.to_vec(),
            namespace: namespace.to_string(),
            top_k,
            include_metadata: true,
        };

        let response: QueryResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_err)?
            .json()
            .await?;

        debug!(
            "Namespace {} returned {} matches",
            namespace,
            response.matches.len()
        );

        Ok(response.matches)
    }
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Debug, Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    namespace: String,
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<ScoredMatch>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AgentError;

    #[test]
    fn test_client_creation() {
        let client = VectorStoreClient::new("http://localhost:8200");
        assert_eq!(client.base_url, "http://localhost:8200");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let client = VectorStoreClient::new("http://127.0.0.1:1");
        let err = client.query(&[0.1, 0.2], "emails", 5).await.unwrap_err();
        assert!(matches!(err, AgentError::Unavailable(_)));
    }
}
