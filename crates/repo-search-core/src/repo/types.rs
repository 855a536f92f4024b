//! Directory rows and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cursor::{ListingKey, MatchKey};
use crate::matching::Rank;
use crate::moderation::ModerationState;
use crate::types::{Did, Handle};

use super::RelatedRecord;

/// A repo's canonical directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub did: Did,
    pub handle: Handle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub indexed_at: DateTime<Utc>,
    #[serde(default)]
    pub invites_disabled: bool,
}

impl Repo {
    pub fn new(did: Did, handle: Handle, indexed_at: DateTime<Utc>) -> Self {
        Self {
            did,
            handle,
            email: None,
            indexed_at,
            invites_disabled: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Position of this repo in the no-term listing order.
    pub fn listing_key(&self) -> ListingKey {
        ListingKey {
            indexed_at: self.indexed_at,
            did: self.did.clone(),
        }
    }
}

/// A repo matched by a search term, with its relevance rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRepo {
    pub repo: Repo,
    pub rank: Rank,
}

impl RankedRepo {
    /// Position of this repo in the term-search order.
    pub fn key(&self) -> MatchKey {
        MatchKey {
            rank: self.rank,
            did: self.repo.did.clone(),
        }
    }
}

/// A repo with its moderation state and related records attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRepo {
    #[serde(flatten)]
    pub repo: Repo,
    pub moderation: ModerationState,
    pub related_records: Vec<RelatedRecord>,
    /// Set when a related-record lookup failed and the list may be incomplete.
    #[serde(skip)]
    pub records_degraded: bool,
}

impl EnrichedRepo {
    /// True if any enrichment lookup for this row failed.
    pub fn is_degraded(&self) -> bool {
        self.records_degraded || self.moderation.is_unknown()
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub repos: Vec<EnrichedRepo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl SearchPage {
    pub fn dids(&self) -> Vec<&Did> {
        self.repos.iter().map(|r| &r.repo.did).collect()
    }
}
