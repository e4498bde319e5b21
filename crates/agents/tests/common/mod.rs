//! Common test utilities

use commgraph_db::{init_memory, GraphWriter};

/// Create a graph writer backed by an in-memory database
pub async fn create_test_writer() -> GraphWriter {
    let db = init_memory().await.expect("Failed to create test database");
    GraphWriter::new(db)
}
