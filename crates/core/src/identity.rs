//! Canonical identities - one display name per email address

use serde::{Deserialize, Serialize};

/// The single agreed display name for one email address.
///
/// Produced by the alias resolver from a full observation batch;
/// immutable once computed. Recomputing requires the whole batch
/// again so that frequency counts stay correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    /// Email address, lowercased (unique key)
    pub email: String,

    /// Chosen display name
    pub display_name: String,
}

impl CanonicalIdentity {
    /// Create a new canonical identity
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into().to_lowercase(),
            display_name: display_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_creation() {
        let id = CanonicalIdentity::new("JE@X.com", "Jeffrey Epstein");
        assert_eq!(id.email, "je@x.com");
        assert_eq!(id.display_name, "Jeffrey Epstein");
    }
}
