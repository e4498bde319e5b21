//! SurrealDB schema definitions

use crate::{DbConnection, Result};
use tracing::info;

/// Initialize the database schema.
///
/// Safe to repeat: every definition is guarded with IF NOT EXISTS so
/// the bootstrap can run at each startup. The UNIQUE index on
/// `person.email` is what makes the identity upsert an atomic
/// find-or-create, and the UNIQUE (in, out) index guarantees at most
/// one edge per ordered pair.
pub async fn initialize_schema(db: &DbConnection) -> Result<()> {
    info!("Initializing database schema...");

    db.query(SCHEMA_DEFINITION).await?.check()?;

    info!("Schema initialized successfully");
    Ok(())
}

const SCHEMA_DEFINITION: &str = r#"
-- ============================================
-- TABLES
-- ============================================

-- People, keyed by email
DEFINE TABLE IF NOT EXISTS person SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS email ON person TYPE string;
DEFINE FIELD IF NOT EXISTS name ON person TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON person TYPE datetime DEFAULT time::now();

-- Directed communication edges with an open property bag, so the
-- table stays schemaless apart from the bookkeeping field.
DEFINE TABLE IF NOT EXISTS communicates_with TYPE RELATION FROM person TO person;
DEFINE FIELD IF NOT EXISTS created_at ON communicates_with TYPE datetime DEFAULT time::now();

-- ============================================
-- INDEXES
-- ============================================

-- Uniqueness constraint that makes person upserts idempotent
DEFINE INDEX IF NOT EXISTS idx_person_email ON person FIELDS email UNIQUE;

-- At most one edge per ordered (from, to) pair
DEFINE INDEX IF NOT EXISTS idx_comm_pair ON communicates_with FIELDS in, out UNIQUE;
"#;
