//! Repo directory trait.

use async_trait::async_trait;

use crate::Result;
use crate::cursor::{ListingKey, MatchKey};
use crate::matching::{MatchStrategy, SearchTerm};
use crate::repo::{RankedRepo, Repo};

/// What a directory backend can evaluate natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The backend can rank by trigram similarity.
    pub similarity: bool,
}

impl Capabilities {
    pub const EXACT_ONLY: Capabilities = Capabilities { similarity: false };
    pub const SIMILARITY: Capabilities = Capabilities { similarity: true };
}

/// A term query against a directory.
#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
    pub term: &'a SearchTerm,
    pub strategy: MatchStrategy,
}

/// The canonical set of repos known to a service.
///
/// Both reads are keyset-paginated: implementations return rows ordered by
/// key ascending, starting strictly after `after`, at most `limit` of them.
#[async_trait]
pub trait RepoDirectory: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Repos ordered by `(indexed_at, did)`.
    async fn list_repos(&self, after: Option<&ListingKey>, limit: usize) -> Result<Vec<Repo>>;

    /// Repos matching `query`, ordered by `(rank, did)`.
    async fn match_repos(
        &self,
        query: &MatchQuery<'_>,
        after: Option<&MatchKey>,
        limit: usize,
    ) -> Result<Vec<RankedRepo>>;
}

/// Sort `rows` by key and keep at most `limit` rows strictly after `after`.
///
/// Shared by backends that evaluate a full candidate set in memory.
pub fn seek_page<T, K, F>(mut rows: Vec<T>, key: F, after: Option<&K>, limit: usize) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    rows.sort_by_key(|row| key(row));
    rows.into_iter()
        .filter(|row| after.is_none_or(|after| key(row) > *after))
        .take(limit)
        .collect()
}
