//! repo-search-core - Repo directory search for AT Protocol services.
//!
//! The [`SearchEngine`] answers admin `searchRepos`-style queries over a
//! [`RepoDirectory`], enriching each row through a [`ModerationOverlay`] and a
//! [`RecordEnricher`]. Pagination is keyset based, so walking every page with
//! the returned cursors yields exactly the rows a single large page would.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use repo_search_core::{MemoryDirectory, SearchConfig, SearchEngine, SearchRequest};
//!
//! # async fn example() -> repo_search_core::Result<()> {
//! let directory = Arc::new(MemoryDirectory::new());
//! let engine = SearchEngine::new(
//!     directory.clone(),
//!     directory.clone(),
//!     directory,
//!     SearchConfig::default(),
//! );
//!
//! let page = engine.search(&SearchRequest::term("alice")).await?;
//! for repo in page.repos {
//!     println!("{} {}", repo.repo.did, repo.repo.handle);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod matching;
pub mod memory;
pub mod moderation;
pub mod repo;
pub mod traits;
pub mod types;

pub use config::SearchConfig;
pub use cursor::{ListingKey, MatchKey, SearchCursor};
pub use engine::{SearchEngine, SearchRequest};
pub use error::Error;
pub use matching::{MatchStrategy, Rank, SearchTerm, StrategyKind};
pub use memory::MemoryDirectory;
pub use moderation::{ActionKind, ModerationAction, ModerationState};
pub use repo::{
    BlobRef, EnrichedRepo, PROFILE_COLLECTION, RankedRepo, RecordValue, RelatedRecord, Repo,
    SearchPage, profile_display_name,
};
pub use traits::{Capabilities, MatchQuery, ModerationOverlay, RecordEnricher, RepoDirectory};
pub use types::{Did, Handle, Nsid, ServiceUrl};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
