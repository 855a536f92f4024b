//! Subcommand implementations.

pub mod repo;
pub mod search;

use anyhow::{Context, Result, bail};

use repo_search_core::ServiceUrl;
use repo_search_file::FileDirectory;

/// Open the file-backed directory named by `--pds`.
pub fn open_directory(pds: &str) -> Result<FileDirectory> {
    let url = ServiceUrl::new(pds).context("Invalid PDS URL")?;

    if !url.is_local() {
        bail!(
            "Only file:// directories can be searched directly.\n\
             Use --moderation-service to enrich results from a remote service."
        );
    }

    FileDirectory::from_url(&url).context("Failed to open directory")
}
