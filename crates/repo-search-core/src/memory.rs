//! In-memory repo directory.
//!
//! [`MemoryDirectory`] implements all three search seams over shared state
//! and keeps a trigram index of handles and profile display names, so it
//! supports fuzzy matching. Useful for tests and embedding.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::cursor::{ListingKey, MatchKey};
use crate::error::{Error, InvalidInputError};
use crate::matching::trigram::TrigramIndex;
use crate::matching::{Candidate, Rank};
use crate::moderation::{ActionKind, ModerationAction};
use crate::repo::{RankedRepo, RelatedRecord, Repo, profile_display_name};
use crate::traits::{
    Capabilities, MatchQuery, ModerationOverlay, RecordEnricher, RepoDirectory, seek_page,
};
use crate::types::{Did, Handle};

#[derive(Debug)]
struct StoredAction {
    action: ModerationAction,
    reversed: bool,
}

#[derive(Debug, Default)]
struct State {
    repos: BTreeMap<Did, Repo>,
    records: BTreeMap<Did, BTreeMap<String, RelatedRecord>>,
    actions: Vec<StoredAction>,
    index: TrigramIndex,
}

impl State {
    fn display_name(&self, did: &Did) -> Option<&str> {
        profile_display_name(self.records.get(did)?.values())
    }

    fn candidate<'a>(&'a self, repo: &'a Repo) -> Candidate<'a> {
        Candidate {
            did: &repo.did,
            handle: &repo.handle,
            email: repo.email.as_deref(),
            display_name: self.display_name(&repo.did),
        }
    }

    fn reindex(&mut self, did: &Did) {
        let Some(repo) = self.repos.get(did) else {
            self.index.remove(did);
            return;
        };
        let handle = repo.handle.as_str().to_string();
        let name = self.display_name(did).map(str::to_string);
        self.index
            .index(did, std::iter::once(handle.as_str()).chain(name.as_deref()));
    }

    fn handle_owner(&self, handle: &Handle) -> Option<&Did> {
        self.repos
            .values()
            .find(|r| &r.handle == handle)
            .map(|r| &r.did)
    }
}

/// A repo directory, moderation overlay and record enricher held in memory.
#[derive(Debug)]
pub struct MemoryDirectory {
    state: RwLock<State>,
    capabilities: Capabilities,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectory {
    /// An empty directory with similarity support.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::SIMILARITY)
    }

    /// An empty directory that only supports exact matching.
    pub fn exact_only() -> Self {
        Self::with_capabilities(Capabilities::EXACT_ONLY)
    }

    fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            state: RwLock::new(State::default()),
            capabilities,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a repo. Fails if the DID or handle is already taken.
    pub fn insert_repo(&self, repo: Repo) -> Result<()> {
        let mut state = self.write();
        if state.repos.contains_key(&repo.did) {
            return Err(conflict(format!("repo {} already exists", repo.did)));
        }
        if let Some(owner) = state.handle_owner(&repo.handle) {
            return Err(conflict(format!("handle {} is taken by {}", repo.handle, owner)));
        }

        let did = repo.did.clone();
        state.repos.insert(did.clone(), repo);
        state.reindex(&did);
        Ok(())
    }

    /// Change the handle of an existing repo.
    pub fn update_handle(&self, did: &Did, handle: Handle) -> Result<()> {
        let mut state = self.write();
        if let Some(owner) = state.handle_owner(&handle) {
            if owner != did {
                return Err(conflict(format!("handle {} is taken by {}", handle, owner)));
            }
        }

        let repo = state
            .repos
            .get_mut(did)
            .ok_or_else(|| not_found(did))?;
        debug!(%did, old = %repo.handle, new = %handle, "updating handle");
        repo.handle = handle;
        state.reindex(did);
        Ok(())
    }

    /// Create or replace the record at `rkey` in a repo.
    pub fn put_record(&self, did: &Did, rkey: &str, record: RelatedRecord) -> Result<()> {
        let mut state = self.write();
        if !state.repos.contains_key(did) {
            return Err(not_found(did));
        }
        state
            .records
            .entry(did.clone())
            .or_default()
            .insert(rkey.to_string(), record);
        state.reindex(did);
        Ok(())
    }

    /// Record a moderation action against a repo.
    pub fn take_action(&self, did: &Did, kind: ActionKind) -> Result<ModerationAction> {
        let mut state = self.write();
        if !state.repos.contains_key(did) {
            return Err(not_found(did));
        }

        let action = ModerationAction {
            id: state.actions.len() as u64 + 1,
            action: kind,
            subject_did: did.clone(),
        };
        state.actions.push(StoredAction {
            action: action.clone(),
            reversed: false,
        });
        Ok(action)
    }

    /// Reverse a previously taken action.
    pub fn reverse_action(&self, id: u64) -> Result<()> {
        let mut state = self.write();
        let stored = state
            .actions
            .iter_mut()
            .find(|a| a.action.id == id)
            .ok_or_else(|| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!("no moderation action {}", id),
                })
            })?;
        stored.reversed = true;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().repos.is_empty()
    }
}

fn conflict(message: String) -> Error {
    Error::InvalidInput(InvalidInputError::Other { message })
}

fn not_found(did: &Did) -> Error {
    Error::InvalidInput(InvalidInputError::Did {
        value: did.to_string(),
        reason: "no such repo".to_string(),
    })
}

#[async_trait]
impl RepoDirectory for MemoryDirectory {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn list_repos(&self, after: Option<&ListingKey>, limit: usize) -> Result<Vec<Repo>> {
        let state = self.read();
        let rows = state.repos.values().cloned().collect();
        Ok(seek_page(rows, Repo::listing_key, after, limit))
    }

    async fn match_repos(
        &self,
        query: &MatchQuery<'_>,
        after: Option<&MatchKey>,
        limit: usize,
    ) -> Result<Vec<RankedRepo>> {
        let state = self.read();
        let term = query.term;

        if let Some(did) = term.did() {
            let rows = state
                .repos
                .get(did)
                .map(|repo| RankedRepo {
                    repo: repo.clone(),
                    rank: Rank::LITERAL,
                })
                .into_iter()
                .collect();
            return Ok(seek_page(rows, RankedRepo::key, after, limit));
        }

        let mut literal = BTreeSet::new();
        let mut rows = Vec::new();
        for repo in state.repos.values() {
            if term.matches_literally(&state.candidate(repo)) {
                literal.insert(&repo.did);
                rows.push(RankedRepo {
                    repo: repo.clone(),
                    rank: Rank::LITERAL,
                });
            }
        }

        if self.capabilities.similarity {
            for did in state.index.candidates(term.trigrams()) {
                if literal.contains(&did) {
                    continue;
                }
                let Some(repo) = state.repos.get(&did) else {
                    continue;
                };
                if let Some(rank) = query
                    .strategy
                    .similarity_rank(term, &state.candidate(repo))
                {
                    rows.push(RankedRepo {
                        repo: repo.clone(),
                        rank,
                    });
                }
            }
        }

        Ok(seek_page(rows, RankedRepo::key, after, limit))
    }
}

#[async_trait]
impl ModerationOverlay for MemoryDirectory {
    async fn current_action(&self, did: &Did) -> Result<Option<ModerationAction>> {
        let state = self.read();
        Ok(state
            .actions
            .iter()
            .rev()
            .find(|a| &a.action.subject_did == did && !a.reversed)
            .map(|a| a.action.clone()))
    }
}

#[async_trait]
impl RecordEnricher for MemoryDirectory {
    async fn related_records(&self, did: &Did) -> Result<Vec<RelatedRecord>> {
        let state = self.read();
        Ok(state
            .records
            .get(did)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
