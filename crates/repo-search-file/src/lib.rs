//! repo-search-file - Filesystem-backed repo directory.
//!
//! Accounts, records and the moderation log live under a root directory:
//!
//! ```text
//! $ROOT/pds/accounts/<did>/account.json
//! $ROOT/pds/repos/<did>/collections/<nsid>/<rkey>.json
//! $ROOT/pds/moderation/actions.jsonl
//! ```
//!
//! The backend evaluates terms by scanning, so it only supports exact
//! matching.

mod directory;
mod store;

pub use directory::FileDirectory;
pub use store::{ActionLogEntry, ActionLogOp, FileStore};
