//! Cross-namespace relevance aggregation
//!
//! Each namespace is retrieved and ranked independently, then the
//! pools are merged under one global top-k budget. This trades a
//! little optimality for parallelizability: a namespace can
//! contribute more than its fair share, and a hit ranked below a
//! namespace's local top-k is invisible to the merge. Callers who
//! need deeper coverage must raise `top_k` themselves; the
//! aggregator never over-fetches silently.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use commgraph_core::RetrievalHit;

use crate::{AgentError, EmbeddingClient, Result, VectorSearch};

/// Default per-namespace retrieval deadline
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// One namespace that could not be retrieved during aggregation
#[derive(Debug)]
pub struct NamespaceFailure {
    pub namespace: String,
    pub error: AgentError,
}

/// The merged result of one aggregation call.
///
/// `hits` is sorted by score descending, ties broken by namespace
/// ascending then local rank, and never exceeds the top-k budget.
#[derive(Debug, Default)]
pub struct AggregateOutcome {
    pub hits: Vec<RetrievalHit>,
    /// Namespaces skipped because retrieval failed or timed out
    pub failures: Vec<NamespaceFailure>,
    /// True if cancellation stopped the call before every namespace ran
    pub cancelled: bool,
}

impl AggregateOutcome {
    /// Whether some namespaces are missing from the merge
    pub fn is_partial(&self) -> bool {
        self.cancelled || !self.failures.is_empty()
    }
}

/// Merges top-k results from disjoint vector namespaces into one
/// globally ranked result set.
pub struct RelevanceAggregator<S> {
    store: S,
    timeout: Duration,
}

impl<S: VectorSearch> RelevanceAggregator<S> {
    /// Create an aggregator over a vector store collaborator
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
        }
    }

    /// Set the per-namespace retrieval deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Aggregate without cancellation
    pub async fn aggregate(
        &self,
        vector: &[f32],
        namespaces: &[String],
        top_k: usize,
    ) -> Result<AggregateOutcome> {
        self.aggregate_with_cancellation(vector, namespaces, top_k, &CancellationToken::new())
            .await
    }

    /// Aggregate top-k hits across namespaces.
    ///
    /// A namespace whose retrieval fails or times out is skipped and
    /// reported in the outcome; the call itself only fails on empty
    /// required input. Cancellation takes effect between namespaces,
    /// and whatever completed beforehand is still merged, marked
    /// partial.
    #[instrument(skip(self, vector, cancel))]
    pub async fn aggregate_with_cancellation(
        &self,
        vector: &[f32],
        namespaces: &[String],
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome> {
        if namespaces.is_empty() {
            return Err(AgentError::InvalidInput("no namespaces given".into()));
        }
        if top_k == 0 {
            return Err(AgentError::InvalidInput("top_k must be positive".into()));
        }

        let mut pool: Vec<(RetrievalHit, usize)> = Vec::new();
        let mut outcome = AggregateOutcome::default();

        for namespace in namespaces {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let retrieval =
                tokio::time::timeout(self.timeout, self.store.query(vector, namespace, top_k));
            match retrieval.await {
                Ok(Ok(matches)) => {
                    debug!("Namespace {} contributed {} matches", namespace, matches.len());
                    for (rank, m) in matches.into_iter().enumerate() {
                        pool.push((RetrievalHit::from_match(m, namespace.clone()), rank));
                    }
                }
                Ok(Err(error)) => {
                    warn!("Skipping namespace {}: {}", namespace, error);
                    outcome.failures.push(NamespaceFailure {
                        namespace: namespace.clone(),
                        error,
                    });
                }
                Err(_) => {
                    warn!("Namespace {} timed out", namespace);
                    outcome.failures.push(NamespaceFailure {
                        namespace: namespace.clone(),
                        error: AgentError::Timeout(
                            self.timeout,
                            format!("retrieval from {}", namespace),
                        ),
                    });
                }
            }
        }

        pool.sort_by(|(a, rank_a), (b, rank_b)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.namespace.cmp(&b.namespace))
                .then_with(|| rank_a.cmp(rank_b))
        });

        outcome.hits = pool.into_iter().map(|(hit, _)| hit).take(top_k).collect();

        info!(
            "Aggregated {} hits from {} namespaces ({} skipped)",
            outcome.hits.len(),
            namespaces.len(),
            outcome.failures.len()
        );

        Ok(outcome)
    }
}

/// The search agent embeds a user query and aggregates hits across
/// the configured vector namespaces.
pub struct SearchAgent<S> {
    embedder: EmbeddingClient,
    aggregator: RelevanceAggregator<S>,
}

impl<S: VectorSearch> SearchAgent<S> {
    /// Create a new search agent
    pub fn new(embedder: EmbeddingClient, store: S) -> Self {
        Self {
            embedder,
            aggregator: RelevanceAggregator::new(store),
        }
    }

    /// Set the per-namespace retrieval deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.aggregator = self.aggregator.with_timeout(timeout);
        self
    }

    /// Search across namespaces
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        namespaces: &[String],
        top_k: usize,
    ) -> Result<AggregateOutcome> {
        self.search_with_cancellation(query, namespaces, top_k, &CancellationToken::new())
            .await
    }

    /// Search across namespaces with caller-initiated cancellation.
    /// Embedding failures fail the whole call; per-namespace failures
    /// only narrow the merge.
    #[instrument(skip(self, cancel))]
    pub async fn search_with_cancellation(
        &self,
        query: &str,
        namespaces: &[String],
        top_k: usize,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome> {
        if query.trim().is_empty() {
            return Err(AgentError::InvalidInput("empty query".into()));
        }

        info!("Searching for: {}", query);
        let vector = self.embedder.embed_one(query).await?;

        self.aggregator
            .aggregate_with_cancellation(&vector, namespaces, top_k, cancel)
            .await
    }
}
