//! Extraction collaborator - raw communication text to structured
//! identities and relationship edges.
//!
//! The trait keeps the strategy swappable: the regex header scanner
//! below is a heuristic and can be replaced by a statistical or
//! learned extractor without touching the resolver, the graph
//! writer, or the aggregator.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};

use commgraph_core::{AliasResolver, CanonicalIdentity, NameObservation, Relationship};

use crate::{AgentError, Result};

/// Headers sit at the top of a record; lines past this window are body.
const HEADER_WINDOW: usize = 20;

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(From|To|Cc):(.*)$").expect("field pattern compiles"));

/// E.g. `From: John Doe <john@example.com>` (or `[john@example.com]`)
static NAME_ADDR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^(?:From|To|Cc):\s*"?([^"<\[\n]+?)"?\s*[<\[]([A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9.-]+)[>\]]"#,
    )
    .expect("name-address pattern compiles")
});

static ADDR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9.-]+").expect("address pattern compiles")
});

/// Structured output of the extraction collaborator
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Resolved (name, email) identities
    pub people: Vec<CanonicalIdentity>,

    /// Directed communication edges with their property bags
    pub relationships: Vec<Relationship>,
}

/// The extraction collaborator interface. Implementations take one
/// unit of raw communication text and return structured people and
/// relationships; the rest of the system treats them as opaque.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> Result<Extraction>;
}

/// What one pass over a record's header lines produced
#[derive(Debug, Default)]
struct HeaderScan {
    observations: Vec<NameObservation>,
    sender: Option<String>,
    recipients: Vec<String>,
}

/// Scan the header window of one record for (name, email)
/// observations. Used standalone for alias-table generation, where
/// observations from many records are pooled before resolving.
pub fn scan_observations(raw_text: &str) -> Vec<NameObservation> {
    scan_headers(raw_text).observations
}

fn scan_headers(raw_text: &str) -> HeaderScan {
    let mut scan = HeaderScan::default();

    for line in raw_text.lines().take(HEADER_WINDOW) {
        let Some(field_caps) = FIELD_RE.captures(line) else {
            continue;
        };
        let field = field_caps[1].to_lowercase();
        let rest = field_caps.get(2).map_or("", |m| m.as_str());

        if let Some(caps) = NAME_ADDR_RE.captures(line) {
            let name = caps[1]
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .trim();
            if !name.is_empty() {
                scan.observations
                    .push(NameObservation::new(name, &caps[2]));
            }
        }

        for m in ADDR_RE.find_iter(rest) {
            let email = m.as_str().to_lowercase();
            if field == "from" {
                if scan.sender.is_none() {
                    scan.sender = Some(email);
                }
            } else {
                scan.recipients.push(email);
            }
        }
    }

    scan
}

/// Regex-based, line-windowed header scanner.
///
/// Identities come from pooling the record's name observations
/// through the alias resolver; edges go from the first From address
/// to each To/Cc address with a `count` property.
pub struct HeaderScanExtractor {
    resolver: AliasResolver,
}

impl HeaderScanExtractor {
    /// Create an extractor with no alias overrides
    pub fn new() -> Self {
        Self {
            resolver: AliasResolver::new(),
        }
    }

    /// Create an extractor with a configured resolver
    pub fn with_resolver(resolver: AliasResolver) -> Self {
        Self { resolver }
    }
}

impl Default for HeaderScanExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for HeaderScanExtractor {
    #[instrument(skip(self, raw_text))]
    async fn extract(&self, raw_text: &str) -> Result<Extraction> {
        if raw_text.trim().is_empty() {
            return Err(AgentError::Extraction("empty input".into()));
        }

        let scan = scan_headers(raw_text);
        if scan.sender.is_none() && scan.observations.is_empty() {
            return Err(AgentError::Extraction(
                "no parseable headers in input".into(),
            ));
        }

        let people = self.resolver.resolve(&scan.observations);
        debug!(
            "Scanned {} observations into {} identities",
            scan.observations.len(),
            people.len()
        );

        let mut relationships = Vec::new();
        if let Some(sender) = scan.sender {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for recipient in scan.recipients {
                if recipient != sender {
                    *counts.entry(recipient).or_default() += 1;
                }
            }
            for (recipient, count) in counts {
                relationships
                    .push(Relationship::new(sender.clone(), recipient).with_property("count", count));
            }
        }

        Ok(Extraction {
            people,
            relationships,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
From: Alice Chen <alice@example.com>
To: Bob Martinez <bob@example.com>, carol@example.com
Cc: \"Dave Johnson\" [dave@example.com]
Subject: Project kickoff

Hi team, let's get started on the project.
";

    #[test]
    fn test_scan_observations() {
        let observations = scan_observations(SAMPLE);

        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].raw_name, "Alice Chen");
        assert_eq!(observations[0].email, "alice@example.com");
        assert_eq!(observations[1].raw_name, "Bob Martinez");
        // Quotes and square brackets are both accepted
        assert_eq!(observations[2].raw_name, "Dave Johnson");
        assert_eq!(observations[2].email, "dave@example.com");
    }

    #[test]
    fn test_scan_stops_after_header_window() {
        let mut text = String::new();
        for _ in 0..HEADER_WINDOW {
            text.push_str("body line\n");
        }
        text.push_str("From: Late Header <late@example.com>\n");

        assert!(scan_observations(&text).is_empty());
    }

    #[tokio::test]
    async fn test_extract_people_and_relationships() {
        let extraction = HeaderScanExtractor::new().extract(SAMPLE).await.unwrap();

        let names: Vec<&str> = extraction
            .people
            .iter()
            .map(|p| p.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice Chen", "Bob Martinez", "Dave Johnson"]);

        // One edge per distinct recipient, alphabetical by recipient
        let pairs: Vec<(&str, &str)> = extraction
            .relationships
            .iter()
            .map(|r| (r.from_email.as_str(), r.to_email.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("alice@example.com", "bob@example.com"),
                ("alice@example.com", "carol@example.com"),
                ("alice@example.com", "dave@example.com"),
            ]
        );
        for rel in &extraction.relationships {
            assert_eq!(rel.properties.get("count"), Some(&serde_json::json!(1)));
        }
    }

    #[tokio::test]
    async fn test_extract_bare_addresses() {
        let text = "From: alice@example.com\nTo: bob@example.com\n";
        let extraction = HeaderScanExtractor::new().extract(text).await.unwrap();

        // No display names to resolve, but the edge is still found
        assert!(extraction.people.is_empty());
        assert_eq!(extraction.relationships.len(), 1);
        assert_eq!(extraction.relationships[0].from_email, "alice@example.com");
        assert_eq!(extraction.relationships[0].to_email, "bob@example.com");
    }

    #[tokio::test]
    async fn test_extract_empty_input_fails() {
        let err = HeaderScanExtractor::new().extract("  \n ").await.unwrap_err();
        assert!(matches!(err, AgentError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_extract_unparseable_input_fails() {
        let err = HeaderScanExtractor::new()
            .extract("just some prose with no headers")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_self_addressed_mail_creates_no_edge() {
        let text = "From: alice@example.com\nTo: alice@example.com\n";
        let extraction = HeaderScanExtractor::new().extract(text).await.unwrap();
        assert!(extraction.relationships.is_empty());
    }

    #[tokio::test]
    async fn test_overrides_flow_through_extraction() {
        let text = "From: Jeffrey E. <je@x.com>\nTo: bob@example.com\n";
        let resolver = AliasResolver::new().with_override("jeffrey e.", "Jeffrey Epstein");
        let extraction = HeaderScanExtractor::with_resolver(resolver)
            .extract(text)
            .await
            .unwrap();

        assert_eq!(extraction.people.len(), 1);
        assert_eq!(extraction.people[0].display_name, "Jeffrey Epstein");
    }
}
