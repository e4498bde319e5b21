//! Retrieval hit types for semantic search

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single match returned by one vector namespace, before the
/// cross-namespace merge. Local rank is implied by position in the
/// returned sequence (descending by score).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    /// Similarity score, higher is more relevant
    pub score: f32,

    /// Metadata stored alongside the vector
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A globally ranked search hit.
///
/// Scores are assumed comparable across namespaces: every namespace
/// must be populated with the same embedding model and similarity
/// metric. If a namespace ever uses an incompatible metric, the
/// cross-namespace ranking is undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Similarity score, higher is more relevant
    pub score: f32,

    /// The namespace this hit came from
    pub namespace: String,

    /// Metadata stored alongside the vector
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RetrievalHit {
    /// Attach a namespace to a per-namespace match
    pub fn from_match(m: ScoredMatch, namespace: impl Into<String>) -> Self {
        Self {
            score: m.score,
            namespace: namespace.into(),
            metadata: m.metadata,
        }
    }
}
