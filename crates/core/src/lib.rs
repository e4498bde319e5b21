//! Core domain types for commgraph
//!
//! This crate defines the fundamental data structures used throughout
//! the application: name observations, canonical identities,
//! relationships, retrieval hits, and the alias resolver that turns
//! noisy header observations into one display name per email address.

pub mod alias_table;
pub mod error;
pub mod identity;
pub mod observation;
pub mod relationship;
pub mod resolver;
pub mod retrieval;

pub use alias_table::AliasTable;
pub use error::{CoreError, Result};
pub use identity::CanonicalIdentity;
pub use observation::NameObservation;
pub use relationship::Relationship;
pub use resolver::AliasResolver;
pub use retrieval::{RetrievalHit, ScoredMatch};
