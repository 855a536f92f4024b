//! The search engine: term resolution, keyset pagination and enrichment.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::config::SearchConfig;
use crate::cursor::SearchCursor;
use crate::error::Error;
use crate::matching::{MatchStrategy, SearchTerm};
use crate::moderation::ModerationState;
use crate::repo::{EnrichedRepo, Repo, SearchPage};
use crate::traits::{MatchQuery, ModerationOverlay, RecordEnricher, RepoDirectory};

/// A `searchRepos` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl SearchRequest {
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }

    /// A request for the no-term listing.
    pub fn listing() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// Answers search requests against a directory, enriching each row.
///
/// The engine holds no per-request state and can be shared across tasks.
pub struct SearchEngine {
    directory: Arc<dyn RepoDirectory>,
    overlay: Arc<dyn ModerationOverlay>,
    records: Arc<dyn RecordEnricher>,
    strategy: MatchStrategy,
    config: SearchConfig,
}

impl SearchEngine {
    /// Build an engine. The match strategy is chosen once, from the
    /// directory's capabilities and `config`.
    pub fn new(
        directory: Arc<dyn RepoDirectory>,
        overlay: Arc<dyn ModerationOverlay>,
        records: Arc<dyn RecordEnricher>,
        config: SearchConfig,
    ) -> Self {
        let strategy = MatchStrategy::select(directory.capabilities(), &config);
        Self {
            directory,
            overlay,
            records,
            strategy,
            config,
        }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fetch one page.
    ///
    /// Fails with [`Error::InvalidCursor`] if the cursor does not decode or
    /// was produced for a different ordering, and with
    /// [`Error::StoreUnavailable`] if the directory cannot be read. Failed
    /// enrichment lookups never fail the call.
    #[instrument(skip(self), fields(strategy = %self.strategy.kind()))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let limit = self.config.clamp_limit(request.limit);
        let cursor = request
            .cursor
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(SearchCursor::decode)
            .transpose()?;
        let term = request.term.as_deref().and_then(SearchTerm::parse);

        let (rows, next) = match term {
            None => self.list_page(cursor, limit).await?,
            Some(term) => self.match_page(&term, cursor, limit).await?,
        };

        debug!(rows = rows.len(), more = next.is_some(), "directory page");

        let repos = join_all(rows.into_iter().map(|repo| self.enrich(repo))).await;
        Ok(SearchPage {
            repos,
            cursor: next.map(|c| c.encode()),
        })
    }

    /// Walk every page for `term` and return all rows in order.
    pub async fn search_all(
        &self,
        term: Option<&str>,
        page_size: Option<i64>,
    ) -> Result<Vec<EnrichedRepo>> {
        let mut request = SearchRequest {
            term: term.map(str::to_string),
            cursor: None,
            limit: page_size,
        };
        let mut repos = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self.search(&request).await?;
            pages += 1;
            let exhausted = page.repos.is_empty();
            repos.extend(page.repos);

            match page.cursor {
                Some(cursor) if !exhausted => request.cursor = Some(cursor),
                _ => break,
            }
        }

        debug!(pages, rows = repos.len(), "walked all pages");
        Ok(repos)
    }

    async fn list_page(
        &self,
        cursor: Option<SearchCursor>,
        limit: usize,
    ) -> Result<(Vec<Repo>, Option<SearchCursor>)> {
        let after = match cursor {
            None => None,
            Some(SearchCursor::Listing(key)) => Some(key),
            Some(other) => return Err(mode_mismatch(&other, "list")),
        };

        let mut rows = self.directory.list_repos(after.as_ref(), limit).await?;
        rows.truncate(limit);

        let next = match rows.last() {
            Some(last) if rows.len() == limit => Some(SearchCursor::Listing(last.listing_key())),
            _ => None,
        };
        Ok((rows, next))
    }

    async fn match_page(
        &self,
        term: &SearchTerm,
        cursor: Option<SearchCursor>,
        limit: usize,
    ) -> Result<(Vec<Repo>, Option<SearchCursor>)> {
        let kind = self.strategy.kind();
        let after = match cursor {
            None => None,
            Some(SearchCursor::Match { strategy, key }) if strategy == kind => Some(key),
            Some(other) => return Err(mode_mismatch(&other, kind.as_str())),
        };

        let query = MatchQuery {
            term,
            strategy: self.strategy,
        };
        let mut rows = self
            .directory
            .match_repos(&query, after.as_ref(), limit)
            .await?;
        rows.truncate(limit);

        let next = match rows.last() {
            Some(last) if rows.len() == limit => Some(SearchCursor::Match {
                strategy: kind,
                key: last.key(),
            }),
            _ => None,
        };
        Ok((rows.into_iter().map(|r| r.repo).collect(), next))
    }

    async fn enrich(&self, repo: Repo) -> EnrichedRepo {
        let (action, records) = futures_util::join!(
            self.overlay.current_action(&repo.did),
            self.records.related_records(&repo.did),
        );

        let moderation = match action {
            Ok(action) => ModerationState::from(action),
            Err(error) => {
                warn!(did = %repo.did, %error, "moderation lookup failed");
                ModerationState::Unknown
            }
        };

        let (related_records, records_degraded) = match records {
            Ok(records) => (records, false),
            Err(error) => {
                warn!(did = %repo.did, %error, "related record lookup failed");
                (Vec::new(), true)
            }
        };

        EnrichedRepo {
            repo,
            moderation,
            related_records,
            records_degraded,
        }
    }
}

fn mode_mismatch(cursor: &SearchCursor, expected: &str) -> Error {
    Error::invalid_cursor(format!(
        "cursor is for {} ordering, request uses {}",
        cursor.mode_name(),
        expected
    ))
}
