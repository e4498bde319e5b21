//! Ingestion pipeline - raw text to graph writes

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use commgraph_db::GraphWriter;

use crate::{AgentError, Extractor};

/// Default deadline for one collaborator call
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// What an ingestion run managed to apply. Returned on success and
/// carried inside [`IngestError`] on failure so callers can resume
/// from where the run stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Identities upserted before the run ended
    pub identities_applied: usize,

    /// Relationship edges upserted before the run ended
    pub edges_applied: usize,

    /// True if cancellation stopped the run early; the graph holds a
    /// valid prefix of the extracted identities and edges
    pub cancelled: bool,
}

/// An ingestion failure, carrying the progress made before it
#[derive(Debug, Error)]
#[error(
    "ingestion halted after {} identities and {} edges: {source}",
    report.identities_applied,
    report.edges_applied
)]
pub struct IngestError {
    pub report: IngestReport,
    #[source]
    pub source: AgentError,
}

/// Orchestrates one ingestion run: extraction collaborator first,
/// then identity upserts, then relationship upserts. Identities go
/// first so most edges find named endpoints, but the writer's
/// placeholder creation means ordering is an optimization, not a
/// correctness requirement.
pub struct IngestionPipeline<E> {
    extractor: E,
    graph: GraphWriter,
    op_timeout: Duration,
}

impl<E: Extractor> IngestionPipeline<E> {
    /// Create a new pipeline
    pub fn new(extractor: E, graph: GraphWriter) -> Self {
        Self {
            extractor,
            graph,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Set the per-operation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Ingest one unit of raw text
    pub async fn ingest(&self, raw_text: &str) -> Result<IngestReport, IngestError> {
        self.ingest_with_cancellation(raw_text, &CancellationToken::new())
            .await
    }

    /// Ingest one unit of raw text with caller-initiated
    /// cancellation. Cancellation takes effect between upserts,
    /// never mid-write, and is reported as a successful partial run.
    #[instrument(skip(self, raw_text, cancel))]
    pub async fn ingest_with_cancellation(
        &self,
        raw_text: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();

        let extraction = self
            .step("extraction", self.extractor.extract(raw_text))
            .await
            .map_err(|source| IngestError {
                report: report.clone(),
                source,
            })?;

        info!(
            "Extracted {} identities and {} relationships",
            extraction.people.len(),
            extraction.relationships.len()
        );

        for identity in &extraction.people {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }
            self.step("identity upsert", self.graph.upsert_identity(identity))
                .await
                .map_err(|source| IngestError {
                    report: report.clone(),
                    source,
                })?;
            report.identities_applied += 1;
        }

        for relationship in &extraction.relationships {
            if cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }
            self.step(
                "relationship upsert",
                self.graph.upsert_relationship(relationship),
            )
            .await
            .map_err(|source| IngestError {
                report: report.clone(),
                source,
            })?;
            report.edges_applied += 1;
        }

        info!(
            "Ingested {} identities and {} edges",
            report.identities_applied, report.edges_applied
        );

        Ok(report)
    }

    /// Run one collaborator call under the pipeline deadline
    async fn step<T, Err, F>(&self, what: &str, fut: F) -> crate::Result<T>
    where
        F: Future<Output = std::result::Result<T, Err>>,
        Err: Into<AgentError>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(AgentError::Timeout(self.op_timeout, what.to_string())),
        }
    }
}
