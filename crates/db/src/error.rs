//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0} with key {1}")]
    NotFound(String, String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
