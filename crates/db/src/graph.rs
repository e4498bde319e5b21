//! Idempotent graph writes and read queries

use crate::{DbConnection, DbError, Result};
use chrono::{DateTime, Utc};
use commgraph_core::{CanonicalIdentity, Relationship};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use surrealdb::RecordId;
use tracing::{debug, instrument};

/// Writer for the person/communicates_with graph.
///
/// Every write is an upsert: calling any operation twice with the
/// same arguments leaves the graph in the same state as calling it
/// once. Concurrent writers for the same key serialize on the
/// store's unique indexes, not on application locks.
#[derive(Clone)]
pub struct GraphWriter {
    db: DbConnection,
}

impl GraphWriter {
    /// Create a new graph writer
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    // ==========================================
    // PERSON OPERATIONS
    // ==========================================

    /// Find-or-create a person keyed on email, unconditionally
    /// overwriting the display name.
    #[instrument(skip(self, identity), fields(email = %identity.email))]
    pub async fn upsert_identity(&self, identity: &CanonicalIdentity) -> Result<()> {
        self.db
            .query(
                r#"
                INSERT INTO person (email, name, created_at)
                VALUES ($email, $name, time::now())
                ON DUPLICATE KEY UPDATE name = $name
                "#,
            )
            .bind(("email", identity.email.clone()))
            .bind(("name", identity.display_name.clone()))
            .await?
            .check()?;

        Ok(())
    }

    /// Upsert a batch of identities, returning how many were applied
    #[instrument(skip(self, identities))]
    pub async fn upsert_identities(&self, identities: &[CanonicalIdentity]) -> Result<usize> {
        for identity in identities {
            self.upsert_identity(identity).await?;
        }
        Ok(identities.len())
    }

    /// Create a minimal placeholder person (email only) if the email
    /// has no record yet. Never clobbers an existing name; a later
    /// identity upsert may enrich the placeholder.
    #[instrument(skip(self))]
    pub async fn ensure_person(&self, email: &str) -> Result<()> {
        self.db
            .query(
                r#"
                INSERT INTO person (email, created_at)
                VALUES ($email, time::now())
                ON DUPLICATE KEY UPDATE email = $email
                "#,
            )
            .bind(("email", email.to_lowercase()))
            .await?
            .check()?;

        Ok(())
    }

    /// Get a person by email
    #[instrument(skip(self))]
    pub async fn get_person(&self, email: &str) -> Result<Option<PersonRecord>> {
        let mut people: Vec<PersonRecord> = self
            .db
            .query("SELECT * FROM person WHERE email = $email")
            .bind(("email", email.to_lowercase()))
            .await?
            .take(0)?;

        Ok(people.pop())
    }

    /// List people sorted by email
    #[instrument(skip(self))]
    pub async fn list_people(&self, limit: usize) -> Result<Vec<PersonRecord>> {
        let mut people: Vec<PersonRecord> = self.db.select("person").await?;

        // Sort and truncate in Rust to keep the query trivial
        people.sort_by(|a, b| a.email.cmp(&b.email));
        if people.len() > limit {
            people.truncate(limit);
        }

        Ok(people)
    }

    // ==========================================
    // RELATIONSHIP OPERATIONS
    // ==========================================

    /// Find-or-create the directed edge for an ordered email pair,
    /// merging the property bag key-wise: new keys are added,
    /// existing keys overwritten, untouched keys preserved.
    ///
    /// Both endpoints are created as placeholders first, so an edge
    /// never references a missing person.
    #[instrument(skip(self, rel), fields(from = %rel.from_email, to = %rel.to_email))]
    pub async fn upsert_relationship(&self, rel: &Relationship) -> Result<()> {
        self.ensure_person(&rel.from_email).await?;
        self.ensure_person(&rel.to_email).await?;

        match self.edge_id(&rel.from_email, &rel.to_email).await? {
            Some(edge) => {
                debug!("Merging properties into existing edge");
                self.db
                    .query("UPDATE $edge MERGE $props")
                    .bind(("edge", edge))
                    .bind(("props", rel.properties.clone()))
                    .await?
                    .check()?;
            }
            None => {
                let from = self.person_id(&rel.from_email).await?;
                let to = self.person_id(&rel.to_email).await?;

                self.db
                    .query("RELATE $from->communicates_with->$to CONTENT $props")
                    .bind(("from", from))
                    .bind(("to", to))
                    .bind(("props", rel.properties.clone()))
                    .await?
                    .check()?;
            }
        }

        Ok(())
    }

    /// Get the edge for an ordered email pair, if present
    #[instrument(skip(self))]
    pub async fn get_edge(&self, from_email: &str, to_email: &str) -> Result<Option<EdgeRecord>> {
        let mut edges: Vec<EdgeRecord> = self
            .db
            .query(
                r#"
                SELECT * FROM communicates_with
                WHERE in.email = $from_email AND out.email = $to_email
                "#,
            )
            .bind(("from_email", from_email.to_lowercase()))
            .bind(("to_email", to_email.to_lowercase()))
            .await?
            .take(0)?;

        Ok(edges.pop())
    }

    /// People a given person has outgoing edges to
    #[instrument(skip(self))]
    pub async fn contacts_of(&self, email: &str) -> Result<Vec<PersonRecord>> {
        let result: Vec<Contacts> = self
            .db
            .query(
                r#"
                SELECT (SELECT * FROM ->communicates_with->person) AS contacts
                FROM person
                WHERE email = $email
                "#,
            )
            .bind(("email", email.to_lowercase()))
            .await?
            .take(0)?;

        result
            .into_iter()
            .next()
            .map(|c| c.contacts)
            .ok_or_else(|| DbError::NotFound("person".into(), email.into()))
    }

    // ==========================================
    // STATS
    // ==========================================

    /// Get database statistics
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<DbStats> {
        let stats: Vec<DbStats> = self
            .db
            .query(
                r#"
                RETURN {
                    person_count: (SELECT count() FROM person GROUP ALL)[0].count ?? 0,
                    edge_count: (SELECT count() FROM communicates_with GROUP ALL)[0].count ?? 0
                }
                "#,
            )
            .await?
            .take(0)?;

        stats
            .into_iter()
            .next()
            .ok_or_else(|| DbError::QueryFailed("stats".into()))
    }

    // ==========================================
    // INTERNAL
    // ==========================================

    async fn person_id(&self, email: &str) -> Result<RecordId> {
        let mut ids: Vec<RecordId> = self
            .db
            .query("SELECT VALUE id FROM person WHERE email = $email")
            .bind(("email", email.to_lowercase()))
            .await?
            .take(0)?;

        ids.pop()
            .ok_or_else(|| DbError::NotFound("person".into(), email.into()))
    }

    async fn edge_id(&self, from_email: &str, to_email: &str) -> Result<Option<RecordId>> {
        let mut ids: Vec<RecordId> = self
            .db
            .query(
                r#"
                SELECT VALUE id FROM communicates_with
                WHERE in.email = $from_email AND out.email = $to_email
                "#,
            )
            .bind(("from_email", from_email.to_lowercase()))
            .bind(("to_email", to_email.to_lowercase()))
            .await?
            .take(0)?;

        Ok(ids.pop())
    }
}

// ==========================================
// RESULT TYPES
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: RecordId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: RecordId,
    #[serde(rename = "in")]
    pub from: RecordId,
    #[serde(rename = "out")]
    pub to: RecordId,
    pub created_at: DateTime<Utc>,
    /// The open property bag (everything except the fixed fields)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Contacts {
    #[serde(default)]
    contacts: Vec<PersonRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DbStats {
    #[serde(default)]
    pub person_count: i64,
    #[serde(default)]
    pub edge_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_memory;
    use commgraph_core::Relationship;

    async fn writer() -> GraphWriter {
        let db = init_memory().await.expect("init db");
        GraphWriter::new(db)
    }

    #[tokio::test]
    async fn test_identity_upsert_is_idempotent() {
        let writer = writer().await;
        let identity = CanonicalIdentity::new("alice@example.com", "Alice Chen");

        writer.upsert_identity(&identity).await.unwrap();
        writer.upsert_identity(&identity).await.unwrap();

        let stats = writer.get_stats().await.unwrap();
        assert_eq!(stats.person_count, 1);

        let person = writer.get_person("alice@example.com").await.unwrap().unwrap();
        assert_eq!(person.name.as_deref(), Some("Alice Chen"));
    }

    #[tokio::test]
    async fn test_identity_upsert_overwrites_name() {
        let writer = writer().await;

        writer
            .upsert_identity(&CanonicalIdentity::new("bob@example.com", "Bob M."))
            .await
            .unwrap();
        writer
            .upsert_identity(&CanonicalIdentity::new("bob@example.com", "Bob Martinez"))
            .await
            .unwrap();

        let person = writer.get_person("bob@example.com").await.unwrap().unwrap();
        assert_eq!(person.name.as_deref(), Some("Bob Martinez"));

        let stats = writer.get_stats().await.unwrap();
        assert_eq!(stats.person_count, 1);
    }

    #[tokio::test]
    async fn test_placeholder_does_not_clobber_name() {
        let writer = writer().await;

        writer
            .upsert_identity(&CanonicalIdentity::new("carol@example.com", "Carol Wu"))
            .await
            .unwrap();
        writer.ensure_person("carol@example.com").await.unwrap();

        let person = writer.get_person("carol@example.com").await.unwrap().unwrap();
        assert_eq!(person.name.as_deref(), Some("Carol Wu"));
    }

    #[tokio::test]
    async fn test_relationship_creates_placeholder_endpoints() {
        let writer = writer().await;

        let rel = Relationship::new("a@x.com", "b@x.com").with_property("count", 5);
        writer.upsert_relationship(&rel).await.unwrap();

        let a = writer.get_person("a@x.com").await.unwrap().unwrap();
        assert_eq!(a.name, None);
        let b = writer.get_person("b@x.com").await.unwrap().unwrap();
        assert_eq!(b.name, None);

        let stats = writer.get_stats().await.unwrap();
        assert_eq!(stats.person_count, 2);
        assert_eq!(stats.edge_count, 1);
    }

    #[tokio::test]
    async fn test_relationship_upsert_merges_properties() {
        let writer = writer().await;

        let first = Relationship::new("a@x.com", "b@x.com").with_property("count", 5);
        writer.upsert_relationship(&first).await.unwrap();

        let second = Relationship::new("a@x.com", "b@x.com")
            .with_property("count", 12)
            .with_property("channel", "email");
        writer.upsert_relationship(&second).await.unwrap();

        let stats = writer.get_stats().await.unwrap();
        assert_eq!(stats.edge_count, 1);

        let edge = writer.get_edge("a@x.com", "b@x.com").await.unwrap().unwrap();
        assert_eq!(edge.properties.get("count"), Some(&Value::from(12)));
        assert_eq!(edge.properties.get("channel"), Some(&Value::from("email")));
    }

    #[tokio::test]
    async fn test_relationship_merge_preserves_untouched_keys() {
        let writer = writer().await;

        let first = Relationship::new("a@x.com", "b@x.com")
            .with_property("count", 5)
            .with_property("channel", "email");
        writer.upsert_relationship(&first).await.unwrap();

        let second = Relationship::new("a@x.com", "b@x.com").with_property("count", 6);
        writer.upsert_relationship(&second).await.unwrap();

        let edge = writer.get_edge("a@x.com", "b@x.com").await.unwrap().unwrap();
        assert_eq!(edge.properties.get("count"), Some(&Value::from(6)));
        assert_eq!(edge.properties.get("channel"), Some(&Value::from("email")));
    }

    #[tokio::test]
    async fn test_opposite_directions_are_distinct_edges() {
        let writer = writer().await;

        writer
            .upsert_relationship(&Relationship::new("a@x.com", "b@x.com"))
            .await
            .unwrap();
        writer
            .upsert_relationship(&Relationship::new("b@x.com", "a@x.com"))
            .await
            .unwrap();

        let stats = writer.get_stats().await.unwrap();
        assert_eq!(stats.edge_count, 2);
    }

    #[tokio::test]
    async fn test_contacts_of() {
        let writer = writer().await;

        writer
            .upsert_relationship(&Relationship::new("a@x.com", "b@x.com"))
            .await
            .unwrap();
        writer
            .upsert_relationship(&Relationship::new("a@x.com", "c@x.com"))
            .await
            .unwrap();

        let mut contacts = writer.contacts_of("a@x.com").await.unwrap();
        contacts.sort_by(|x, y| x.email.cmp(&y.email));

        let emails: Vec<&str> = contacts.iter().map(|p| p.email.as_str()).collect();
        assert_eq!(emails, vec!["b@x.com", "c@x.com"]);
    }
}
