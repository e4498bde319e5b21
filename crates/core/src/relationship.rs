//! Relationship edges between people

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A directed communicates-with edge between two email addresses,
/// carrying an open property bag (e.g. an interaction count).
///
/// At most one edge instance exists per ordered (from, to) pair in
/// the graph; repeated upserts merge properties key-wise instead of
/// creating parallel edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Sender email (lowercased)
    pub from_email: String,

    /// Recipient email (lowercased)
    pub to_email: String,

    /// Open property bag attached to the edge
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Relationship {
    /// Create a new relationship with an empty property bag
    pub fn new(from_email: impl Into<String>, to_email: impl Into<String>) -> Self {
        Self {
            from_email: from_email.into().to_lowercase(),
            to_email: to_email.into().to_lowercase(),
            properties: Map::new(),
        }
    }

    /// Builder: set a property on the bag
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_creation() {
        let rel = Relationship::new("A@x.com", "b@x.com").with_property("count", 12);

        assert_eq!(rel.from_email, "a@x.com");
        assert_eq!(rel.to_email, "b@x.com");
        assert_eq!(rel.properties.get("count"), Some(&Value::from(12)));
    }
}
