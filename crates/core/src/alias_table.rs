//! Persisted alias table - email to display name

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CanonicalIdentity, Result};

/// The computed canonical-identity table, persistable as a plain
/// JSON object (email -> display name) so a run's resolution work
/// can be reused without recomputation.
///
/// The map is ordered so serialization is stable, and the JSON
/// round-trips losslessly: loading a saved table produces an
/// identical mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the display name for an email
    pub fn get(&self, email: &str) -> Option<&str> {
        self.entries.get(email).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (email, display name) pairs in email order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Turn the table back into identities, in email order
    pub fn identities(&self) -> Vec<CanonicalIdentity> {
        self.entries
            .iter()
            .map(|(email, name)| CanonicalIdentity::new(email.clone(), name.clone()))
            .collect()
    }

    /// Write the table to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let entries = serde_json::from_str(&json)?;
        Ok(Self { entries })
    }
}

impl FromIterator<CanonicalIdentity> for AliasTable {
    fn from_iter<I: IntoIterator<Item = CanonicalIdentity>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|id| (id.email, id.display_name))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_identities() {
        let table: AliasTable = vec![
            CanonicalIdentity::new("b@x.com", "Bob Martinez"),
            CanonicalIdentity::new("a@x.com", "Alice Chen"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a@x.com"), Some("Alice Chen"));
        assert_eq!(table.get("b@x.com"), Some("Bob Martinez"));
        assert_eq!(table.get("c@x.com"), None);
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aliases.json");

        let table: AliasTable = vec![
            CanonicalIdentity::new("je@x.com", "Jeffrey Epstein"),
            CanonicalIdentity::new("gm@x.com", "Ghislaine Maxwell"),
        ]
        .into_iter()
        .collect();

        table.save(&path).expect("save");
        let loaded = AliasTable::load(&path).expect("load");

        assert_eq!(table, loaded);
    }
}
