//! Agent error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Database error: {0}")]
    Database(#[from] commgraph_db::DbError),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {0:?} during {1}")]
    Timeout(Duration, String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
