//! File-backed implementation of the search seams.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use repo_search_core::Result;
use repo_search_core::error::{Error, InvalidInputError};
use repo_search_core::matching::Candidate;
use repo_search_core::traits::seek_page;
use repo_search_core::{
    Capabilities, Did, ListingKey, MatchKey, MatchQuery, ModerationAction, ModerationOverlay,
    Rank, RankedRepo, RecordEnricher, RelatedRecord, Repo, RepoDirectory, ServiceUrl,
    profile_display_name,
};

use crate::store::FileStore;

/// Repo directory, moderation overlay and record enricher over a [`FileStore`].
///
/// Terms are evaluated by scanning every account, so only exact matching
/// is supported.
#[derive(Debug, Clone)]
pub struct FileDirectory {
    store: FileStore,
}

impl FileDirectory {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            store: FileStore::new(root),
        }
    }

    /// Open the directory named by a `file://` service URL.
    pub fn from_url(url: &ServiceUrl) -> Result<Self> {
        let path = url.to_file_path().ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::ServiceUrl {
                value: url.to_string(),
                reason: "expected a file:// URL".to_string(),
            })
        })?;
        Ok(Self::new(path))
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    fn display_name(&self, did: &Did) -> Result<Option<String>> {
        let records = self.store.profile_records(did)?;
        Ok(profile_display_name(&records).map(str::to_string))
    }
}

#[async_trait]
impl RepoDirectory for FileDirectory {
    fn capabilities(&self) -> Capabilities {
        Capabilities::EXACT_ONLY
    }

    #[instrument(skip(self))]
    async fn list_repos(&self, after: Option<&ListingKey>, limit: usize) -> Result<Vec<Repo>> {
        let accounts = self.store.list_accounts()?;
        Ok(seek_page(accounts, Repo::listing_key, after, limit))
    }

    #[instrument(skip(self, query), fields(term = %query.term))]
    async fn match_repos(
        &self,
        query: &MatchQuery<'_>,
        after: Option<&MatchKey>,
        limit: usize,
    ) -> Result<Vec<RankedRepo>> {
        let term = query.term;

        let candidates = match term.did() {
            Some(did) => self.store.get_account(did)?.into_iter().collect(),
            None => self.store.list_accounts()?,
        };
        let scanned = candidates.len();

        let mut rows = Vec::new();
        for repo in candidates {
            let display_name = self.display_name(&repo.did)?;
            let candidate = Candidate {
                did: &repo.did,
                handle: &repo.handle,
                email: repo.email.as_deref(),
                display_name: display_name.as_deref(),
            };
            if term.matches_literally(&candidate) {
                rows.push(RankedRepo {
                    repo,
                    rank: Rank::LITERAL,
                });
            }
        }

        debug!(scanned, matched = rows.len(), "Scanned accounts");
        Ok(seek_page(rows, RankedRepo::key, after, limit))
    }
}

#[async_trait]
impl ModerationOverlay for FileDirectory {
    async fn current_action(&self, did: &Did) -> Result<Option<ModerationAction>> {
        self.store
            .current_action(did)
            .map_err(|e| Error::enrichment(format!("moderation log: {}", e)))
    }
}

#[async_trait]
impl RecordEnricher for FileDirectory {
    async fn related_records(&self, did: &Did) -> Result<Vec<RelatedRecord>> {
        self.store
            .profile_records(did)
            .map_err(|e| Error::enrichment(format!("profile records: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_search_core::{
        ActionKind, Handle, MatchStrategy, Nsid, PROFILE_COLLECTION, SearchConfig, SearchEngine,
        SearchRequest, SearchTerm,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_directory() -> (TempDir, FileDirectory) {
        let tmp = TempDir::new().unwrap();
        let dir = FileDirectory::new(tmp.path());
        for handle in [
            "cara-wiegand69.test",
            "eudora-dietrich4.test",
            "carlos6.test",
            "cayla-marquardt39.test",
            "sven70.test",
        ] {
            dir.store()
                .create_account(
                    &Handle::new(handle).unwrap(),
                    Some(format!("{}@bsky.app", handle).as_str()),
                )
                .unwrap();
        }

        let eudora = dir
            .store()
            .find_account_by_handle(&Handle::new("eudora-dietrich4.test").unwrap())
            .unwrap()
            .unwrap();
        let profile = RelatedRecord::profile("Carol Littel").to_value().unwrap();
        dir.store()
            .put_record(
                &eudora.did,
                &Nsid::new(PROFILE_COLLECTION).unwrap(),
                "self",
                &profile,
            )
            .unwrap();

        (tmp, dir)
    }

    fn handles(repos: &[RankedRepo]) -> Vec<&str> {
        let mut handles: Vec<_> = repos.iter().map(|r| r.repo.handle.as_str()).collect();
        handles.sort();
        handles
    }

    #[tokio::test]
    async fn test_exact_match_scan() {
        let (_tmp, dir) = create_test_directory();
        let term = SearchTerm::parse("car").unwrap();
        let query = MatchQuery {
            term: &term,
            strategy: MatchStrategy::Exact,
        };

        let rows = dir.match_repos(&query, None, 10).await.unwrap();
        assert_eq!(
            handles(&rows),
            ["cara-wiegand69.test", "carlos6.test", "eudora-dietrich4.test"]
        );
    }

    #[tokio::test]
    async fn test_never_ranks_by_similarity() {
        let (_tmp, dir) = create_test_directory();
        let term = SearchTerm::parse("car").unwrap();
        let query = MatchQuery {
            term: &term,
            strategy: MatchStrategy::FuzzySimilarity { threshold: 0.2 },
        };

        let rows = dir.match_repos(&query, None, 10).await.unwrap();
        assert!(rows.iter().all(|r| r.rank.is_literal()));
        assert!(!handles(&rows).contains(&"cayla-marquardt39.test"));
    }

    #[tokio::test]
    async fn test_email_search() {
        let (_tmp, dir) = create_test_directory();
        let term = SearchTerm::parse("sven70.test@bsky.app").unwrap();
        let query = MatchQuery {
            term: &term,
            strategy: MatchStrategy::Exact,
        };

        let rows = dir.match_repos(&query, None, 10).await.unwrap();
        assert_eq!(handles(&rows), ["sven70.test"]);
    }

    #[tokio::test]
    async fn test_display_name_from_first_named_profile() {
        let (_tmp, dir) = create_test_directory();
        let sven = dir
            .store()
            .find_account_by_handle(&Handle::new("sven70.test").unwrap())
            .unwrap()
            .unwrap();
        let profile = Nsid::new(PROFILE_COLLECTION).unwrap();
        let unnamed = RelatedRecord {
            display_name: None,
            ..RelatedRecord::profile("")
        };
        dir.store()
            .put_record(&sven.did, &profile, "a", &unnamed.to_value().unwrap())
            .unwrap();
        dir.store()
            .put_record(
                &sven.did,
                &profile,
                "self",
                &RelatedRecord::profile("Rachel Kshlerin").to_value().unwrap(),
            )
            .unwrap();

        let term = SearchTerm::parse("rachel").unwrap();
        let query = MatchQuery {
            term: &term,
            strategy: MatchStrategy::Exact,
        };
        let rows = dir.match_repos(&query, None, 10).await.unwrap();
        assert_eq!(handles(&rows), ["sven70.test"]);
    }

    #[tokio::test]
    async fn test_did_shaped_term_stays_inside_root() {
        let tmp = TempDir::new().unwrap();
        let dir = FileDirectory::new(tmp.path().join("directory"));
        let alice = dir
            .store()
            .create_account(&Handle::new("alice.test").unwrap(), None)
            .unwrap();

        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let evil = Repo::new(
            Did::new("did:plc:evil").unwrap(),
            Handle::new("evil.test").unwrap(),
            chrono::Utc::now(),
        );
        std::fs::write(
            outside.join("account.json"),
            serde_json::to_string(&evil).unwrap(),
        )
        .unwrap();

        let dir = Arc::new(dir);
        let engine = SearchEngine::new(dir.clone(), dir.clone(), dir, SearchConfig::default());
        let term = format!("{}/../../../../outside", alice.did);
        let page = engine.search(&SearchRequest::term(term)).await.unwrap();
        assert!(page.repos.is_empty());

        assert!(Did::new(format!("{}/../outside", alice.did)).is_err());
    }

    #[tokio::test]
    async fn test_engine_over_files() {
        let (_tmp, dir) = create_test_directory();
        let cara = dir
            .store()
            .find_account_by_handle(&Handle::new("cara-wiegand69.test").unwrap())
            .unwrap()
            .unwrap();
        dir.store().take_action(&cara.did, ActionKind::Takedown).unwrap();

        let dir = Arc::new(dir);
        let engine = SearchEngine::new(dir.clone(), dir.clone(), dir, SearchConfig::default());
        assert_eq!(engine.strategy(), MatchStrategy::Exact);

        let page = engine
            .search(&SearchRequest::term(cara.did.as_str()).with_limit(1))
            .await
            .unwrap();
        assert_eq!(page.repos.len(), 1);
        assert!(page.repos[0].moderation.is_taken_down());

        let all = engine.search_all(None, Some(2)).await.unwrap();
        assert_eq!(all.len(), 5);
        let first = engine
            .search(&SearchRequest::listing().with_limit(5))
            .await
            .unwrap();
        assert_eq!(
            all.iter().map(|r| &r.repo.did).collect::<Vec<_>>(),
            first.dids()
        );

        let eudora = engine
            .search(&SearchRequest::term("carol"))
            .await
            .unwrap();
        assert_eq!(eudora.repos.len(), 1);
        assert_eq!(
            eudora.repos[0].related_records[0].display_name.as_deref(),
            Some("Carol Littel")
        );
    }

    #[test]
    fn test_from_url_requires_file_scheme() {
        let url = ServiceUrl::new("https://bsky.social").unwrap();
        assert!(FileDirectory::from_url(&url).is_err());
    }
}
