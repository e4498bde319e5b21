//! Alias resolution - collapsing noisy name observations into one
//! canonical display name per email address.

use std::collections::{BTreeMap, HashMap};

use crate::{CanonicalIdentity, NameObservation};

/// Resolves the full multiset of observations collected for a run
/// into exactly one canonical identity per distinct email.
///
/// Resolution is a pure function of the observation batch plus a
/// static override table, and is deterministic: the most frequent
/// surviving name wins, ties go to the name observed first in the
/// batch. Emails whose every observation is filtered out are omitted
/// from the output entirely; the resolver never invents a name.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    /// Manual overrides, keyed by lowercased selected name. These
    /// take precedence over frequency and are the only way to
    /// correct systematically wrong canonicalization (e.g.
    /// initials-only signatures).
    overrides: HashMap<String, String>,
}

impl AliasResolver {
    /// Create a resolver with no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with a static override table. Keys are
    /// lowercased on the way in so lookups are case-insensitive.
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Builder: add a single override
    pub fn with_override(mut self, name: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.overrides
            .insert(name.into().to_lowercase(), canonical.into());
        self
    }

    /// Resolve a batch of observations into canonical identities,
    /// one per distinct email, sorted by email.
    pub fn resolve(&self, observations: &[NameObservation]) -> Vec<CanonicalIdentity> {
        // Group eligible observations by email, keeping the raw
        // names in first-observed order within each group.
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for obs in observations {
            if !obs.is_eligible() {
                continue;
            }
            groups
                .entry(obs.email.as_str())
                .or_default()
                .push(obs.raw_name.trim());
        }

        let mut identities = Vec::with_capacity(groups.len());
        for (email, names) in groups {
            if let Some(canonical) = self.pick_canonical(&names) {
                identities.push(CanonicalIdentity::new(email, canonical));
            }
        }
        identities
    }

    /// Pick the canonical name for one email's observation group.
    fn pick_canonical(&self, names: &[&str]) -> Option<String> {
        // Names with commas or semicolons usually mean multiple
        // co-listed people misattributed to one address. Discard
        // them unless that would empty the group; an address with
        // only such observations still gets a best-effort name.
        let survivors: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !n.contains(',') && !n.contains(';'))
            .collect();
        let candidates: &[&str] = if survivors.is_empty() {
            names
        } else {
            &survivors
        };

        // Count in first-observed order so the tie-break does not
        // depend on hash iteration order.
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for name in candidates {
            match counts.iter_mut().find(|(n, _)| n == name) {
                Some((_, c)) => *c += 1,
                None => counts.push((name, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for &(name, count) in &counts {
            // Strictly greater keeps the first-observed name on ties.
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((name, count));
            }
        }

        best.map(|(name, _)| {
            match self.overrides.get(&name.to_lowercase()) {
                Some(replacement) => replacement.clone(),
                None => name.to_string(),
            }
        })
    }
}
