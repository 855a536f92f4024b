//! Term matching strategies.
//!
//! Two strategies exist. [`MatchStrategy::Exact`] matches a DID verbatim or a
//! case-insensitive substring of the handle, profile display name or (for
//! terms containing `@`) email. [`MatchStrategy::FuzzySimilarity`] matches
//! everything `Exact` does plus words whose trigram similarity to the term is
//! above a threshold, so its result set is always a superset.
//!
//! Literal matches rank 0. Similarity-only matches rank by distance
//! (`1 - similarity`) scaled to `1..=1000`.

pub mod trigram;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SearchConfig;
use crate::traits::Capabilities;
use crate::types::{Did, Handle};

use self::trigram::Trigrams;

/// Relevance rank of a match; lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(u16);

impl Rank {
    /// Rank of a literal (DID, substring) match.
    pub const LITERAL: Rank = Rank(0);

    const SCALE: f32 = 1000.0;

    /// Rank for a similarity-only match. Never equal to [`Rank::LITERAL`].
    pub fn from_similarity(similarity: f32) -> Self {
        let distance = (1.0 - similarity.clamp(0.0, 1.0)) * Self::SCALE;
        Rank((distance.round() as u16).max(1))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn is_literal(self) -> bool {
        self == Self::LITERAL
    }
}

/// A cleaned search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    text: String,
    did: Option<Did>,
    trigrams: Trigrams,
}

impl SearchTerm {
    /// Clean a raw term: trim whitespace, drop one leading `@`, lowercase.
    ///
    /// Returns `None` when nothing is left, which callers treat as "no term".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let cleaned = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
        if cleaned.is_empty() {
            return None;
        }

        let did = if cleaned.starts_with("did:") {
            Did::new(cleaned).ok()
        } else {
            None
        };

        Some(Self {
            text: cleaned.to_lowercase(),
            did,
            trigrams: trigram::text_trigrams(cleaned),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The DID this term names, if it is a syntactically valid DID.
    pub fn did(&self) -> Option<&Did> {
        self.did.as_ref()
    }

    pub fn trigrams(&self) -> &Trigrams {
        &self.trigrams
    }

    fn is_email_like(&self) -> bool {
        self.text.contains('@')
    }

    /// Literal match shared by every strategy.
    ///
    /// A DID term only ever matches the repo with exactly that DID.
    pub fn matches_literally(&self, candidate: &Candidate<'_>) -> bool {
        if let Some(did) = &self.did {
            return did == candidate.did;
        }

        candidate.handle.as_str().contains(&self.text)
            || candidate
                .display_name
                .is_some_and(|name| name.to_lowercase().contains(&self.text))
            || (self.is_email_like()
                && candidate
                    .email
                    .is_some_and(|email| email.to_lowercase().contains(&self.text)))
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The searchable view of one repo.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub did: &'a Did,
    pub handle: &'a Handle,
    pub email: Option<&'a str>,
    pub display_name: Option<&'a str>,
}

/// Which strategy produced an ordering; recorded in term-mode cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Exact,
    #[serde(rename = "fuzzy")]
    FuzzySimilarity,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Exact => "exact",
            StrategyKind::FuzzySimilarity => "fuzzy",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matching strategy, fixed when a search engine is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchStrategy {
    Exact,
    FuzzySimilarity { threshold: f32 },
}

impl MatchStrategy {
    /// Pick the strategy for a backend.
    ///
    /// Fuzzy matching is used only when enabled in config and the backend
    /// can evaluate similarity.
    pub fn select(capabilities: Capabilities, config: &SearchConfig) -> Self {
        if !config.fuzzy {
            return MatchStrategy::Exact;
        }
        if !capabilities.similarity {
            info!("directory has no similarity support, using exact matching");
            return MatchStrategy::Exact;
        }
        MatchStrategy::FuzzySimilarity {
            threshold: config.similarity_threshold,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            MatchStrategy::Exact => StrategyKind::Exact,
            MatchStrategy::FuzzySimilarity { .. } => StrategyKind::FuzzySimilarity,
        }
    }

    /// Rank `candidate` against `term`, or `None` if it does not match.
    pub fn rank(&self, term: &SearchTerm, candidate: &Candidate<'_>) -> Option<Rank> {
        if term.matches_literally(candidate) {
            Some(Rank::LITERAL)
        } else {
            self.similarity_rank(term, candidate)
        }
    }

    /// Rank from similarity alone; always `None` for exact matching and DID terms.
    pub fn similarity_rank(&self, term: &SearchTerm, candidate: &Candidate<'_>) -> Option<Rank> {
        let MatchStrategy::FuzzySimilarity { threshold } = *self else {
            return None;
        };
        if term.did().is_some() {
            return None;
        }

        let texts = std::iter::once(candidate.handle.as_str()).chain(candidate.display_name);
        let similarity = trigram::word_similarity(term.trigrams(), texts);

        (similarity > threshold).then(|| Rank::from_similarity(similarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        did: Did,
        handle: Handle,
        email: Option<String>,
        display_name: Option<String>,
    }

    impl Row {
        fn new(did: &str, handle: &str, display_name: Option<&str>) -> Self {
            Self {
                did: Did::new(did).unwrap(),
                handle: Handle::new(handle).unwrap(),
                email: Some(format!("{}@bsky.app", handle)),
                display_name: display_name.map(String::from),
            }
        }

        fn candidate(&self) -> Candidate<'_> {
            Candidate {
                did: &self.did,
                handle: &self.handle,
                email: self.email.as_deref(),
                display_name: self.display_name.as_deref(),
            }
        }
    }

    const FUZZY: MatchStrategy = MatchStrategy::FuzzySimilarity { threshold: 0.2 };

    #[test]
    fn cleans_terms() {
        assert_eq!(SearchTerm::parse("  @Carlos6.test ").unwrap().as_str(), "carlos6.test");
        assert!(SearchTerm::parse("   ").is_none());
        assert!(SearchTerm::parse("@").is_none());
    }

    #[test]
    fn exact_matches_handle_and_display_name_substrings() {
        let term = SearchTerm::parse("car").unwrap();
        let handle = Row::new("did:plc:a", "cara-wiegand69.test", None);
        let name = Row::new("did:plc:b", "eudora-dietrich4.test", Some("Carol Littel"));
        let none = Row::new("did:plc:c", "sven70.test", Some("Sven"));

        assert_eq!(MatchStrategy::Exact.rank(&term, &handle.candidate()), Some(Rank::LITERAL));
        assert_eq!(MatchStrategy::Exact.rank(&term, &name.candidate()), Some(Rank::LITERAL));
        assert_eq!(MatchStrategy::Exact.rank(&term, &none.candidate()), None);
    }

    #[test]
    fn fuzzy_adds_similar_words_only() {
        let term = SearchTerm::parse("car").unwrap();
        let cayla = Row::new("did:plc:d", "cayla-marquardt39.test", Some("Rachel Kshlerin"));

        assert_eq!(MatchStrategy::Exact.rank(&term, &cayla.candidate()), None);
        let rank = FUZZY.rank(&term, &cayla.candidate()).unwrap();
        assert!(!rank.is_literal());
        assert_eq!(rank.value(), 750);
    }

    #[test]
    fn did_terms_match_only_that_did() {
        let row = Row::new("did:plc:a", "cara-wiegand69.test", None);
        let other = Row::new("did:plc:ab", "carlos6.test", None);
        let term = SearchTerm::parse("did:plc:a").unwrap();

        assert_eq!(term.did(), Some(&row.did));
        for strategy in [MatchStrategy::Exact, FUZZY] {
            assert_eq!(strategy.rank(&term, &row.candidate()), Some(Rank::LITERAL));
            assert_eq!(strategy.rank(&term, &other.candidate()), None);
        }
    }

    #[test]
    fn email_matched_only_for_at_terms() {
        let row = Row::new("did:plc:a", "sven70.test", None);
        let by_email = SearchTerm::parse("sven70.test@bsky").unwrap();
        let bsky = SearchTerm::parse("bsky").unwrap();

        assert!(by_email.matches_literally(&row.candidate()));
        assert!(!bsky.matches_literally(&row.candidate()));
    }

    #[test]
    fn select_respects_capability_and_config() {
        let config = SearchConfig::default();
        assert_eq!(
            MatchStrategy::select(Capabilities::EXACT_ONLY, &config),
            MatchStrategy::Exact
        );
        assert_eq!(
            MatchStrategy::select(Capabilities::SIMILARITY, &config).kind(),
            StrategyKind::FuzzySimilarity
        );

        let disabled = SearchConfig {
            fuzzy: false,
            ..SearchConfig::default()
        };
        assert_eq!(
            MatchStrategy::select(Capabilities::SIMILARITY, &disabled),
            MatchStrategy::Exact
        );
    }
}
