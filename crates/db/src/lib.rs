//! Graph-store layer for commgraph
//!
//! Provides SurrealDB integration with schema management and the
//! idempotent person/relationship upserts the ingestion pipeline
//! relies on.

pub mod error;
pub mod graph;
pub mod schema;

pub use error::{DbError, Result};
pub use graph::{DbStats, EdgeRecord, GraphWriter, PersonRecord};

use std::path::Path;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;

/// Database connection type
pub type DbConnection = Surreal<Db>;

/// Initialize database with RocksDB (persistent).
///
/// A storage engine that cannot be opened is the embedded
/// equivalent of an unreachable store, so open failures surface as
/// [`DbError::Unavailable`] rather than a generic driver error.
pub async fn init_persistent(path: impl AsRef<Path>) -> Result<DbConnection> {
    let db = Surreal::new::<RocksDb>(path.as_ref())
        .await
        .map_err(|e| DbError::Unavailable(e.to_string()))?;
    setup_database(&db).await?;
    Ok(db)
}

/// Initialize database in-memory (for testing)
pub async fn init_memory() -> Result<DbConnection> {
    let db = Surreal::new::<Mem>(()).await?;
    setup_database(&db).await?;
    Ok(db)
}

/// Setup database namespace, database, and schema
async fn setup_database(db: &DbConnection) -> Result<()> {
    db.use_ns("commgraph").use_db("graph").await?;
    schema::initialize_schema(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_memory() {
        let db = init_memory().await.expect("Failed to init memory db");
        // Just verify it connects
        let _: Vec<serde_json::Value> = db.select("person").await.unwrap();
    }

    #[cfg(feature = "rocksdb")]
    #[tokio::test]
    async fn test_unopenable_path_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A regular file where the engine expects a directory
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a database").expect("write file");

        let err = init_persistent(&blocker).await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable(_)));
    }
}
