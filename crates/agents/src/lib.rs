//! Pipeline and collaborator layer for commgraph
//!
//! This crate contains the moving parts around the core algorithms:
//! - Extractor: turns raw communication text into identities + edges
//! - IngestionPipeline: orchestrates extraction and graph writes
//! - RelevanceAggregator / SearchAgent: cross-namespace semantic search
//! - EmbeddingClient / VectorStoreClient: HTTP collaborators

pub mod embed;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod search;
pub mod vector;

pub use embed::EmbeddingClient;
pub use error::{AgentError, Result};
pub use extract::{Extraction, Extractor, HeaderScanExtractor};
pub use pipeline::{IngestError, IngestReport, IngestionPipeline};
pub use search::{AggregateOutcome, NamespaceFailure, RelevanceAggregator, SearchAgent};
pub use vector::{VectorSearch, VectorStoreClient};
