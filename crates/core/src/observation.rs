//! Name observations - raw (name, email) pairs scanned from headers

use serde::{Deserialize, Serialize};

/// Longest raw name we accept as a plausible display name.
pub const MAX_NAME_LEN: usize = 40;

/// A single (name, email) pair observed on one header line.
///
/// Many observations map to the same email; the resolver collapses
/// them into one canonical identity per address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameObservation {
    /// The display name exactly as it appeared in the header
    pub raw_name: String,

    /// The email address, lowercased (the identity key)
    pub email: String,
}

impl NameObservation {
    /// Create a new observation. The email is lowercased so that it
    /// can serve as a stable identity key.
    pub fn new(raw_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            email: email.into().to_lowercase(),
        }
    }

    /// Whether this observation may be counted towards a canonical
    /// name. Malformed header scraps are expected noise and are
    /// dropped silently, never surfaced as errors.
    pub fn is_eligible(&self) -> bool {
        let name = self.raw_name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return false;
        }
        if name.contains('@') {
            return false;
        }
        // A "name" that is itself a fragment of the address (usually
        // the bare local part) is the address leaking into the name
        // field, not a display name. Real names that merely contain
        // the local part ("Bob Martinez" for bob@...) stay eligible.
        let lowered = name.to_lowercase();
        if self.email.contains(&lowered) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_lowercased() {
        let obs = NameObservation::new("Alice Chen", "Alice@Example.COM");
        assert_eq!(obs.email, "alice@example.com");
        assert_eq!(obs.raw_name, "Alice Chen");
    }

    #[test]
    fn test_eligibility() {
        assert!(NameObservation::new("Alice Chen", "ac@example.com").is_eligible());

        // Empty or whitespace-only
        assert!(!NameObservation::new("", "ac@example.com").is_eligible());
        assert!(!NameObservation::new("   ", "ac@example.com").is_eligible());

        // Over 40 characters
        let long = "x".repeat(41);
        assert!(!NameObservation::new(long, "ac@example.com").is_eligible());

        // Contains an @
        assert!(!NameObservation::new("ac@example.com", "ac@example.com").is_eligible());

        // A fragment of the address itself (case-insensitive)
        assert!(!NameObservation::new("Alice", "alice@example.com").is_eligible());
        assert!(!NameObservation::new("ALICE", "alice@example.com").is_eligible());
        assert!(!NameObservation::new("example", "alice@example.com").is_eligible());
    }

    #[test]
    fn test_names_containing_the_local_part_stay_eligible() {
        // The local part is usually the person's first name or
        // initials; a full name containing it is the common case.
        assert!(NameObservation::new("Bob Martinez", "bob@example.com").is_eligible());
        assert!(NameObservation::new("Alice Chen", "alice@example.com").is_eligible());
        assert!(NameObservation::new("Jeffrey E.", "je@x.com").is_eligible());
    }
}
