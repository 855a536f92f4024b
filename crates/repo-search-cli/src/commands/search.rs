//! Search command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use repo_search_core::{
    ModerationOverlay, RecordEnricher, SearchConfig, SearchEngine, SearchRequest, ServiceUrl,
};
use repo_search_xrpc::{XrpcModerationOverlay, XrpcRecordEnricher};

use crate::output;

use super::open_directory;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Directory URL (must be file://)
    #[arg(long)]
    pub pds: String,

    /// Handle, display name, email or DID to search for; omit to list all repos
    #[arg(long)]
    pub term: Option<String>,

    /// Page size (page size per request with --all)
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Pagination cursor from a previous search
    #[arg(long, conflicts_with = "all")]
    pub cursor: Option<String>,

    /// Walk every page and print one repo per line
    #[arg(long)]
    pub all: bool,

    /// Disable fuzzy matching
    #[arg(long)]
    pub exact: bool,

    /// Read moderation state from this service instead of the local directory
    #[arg(long, requires = "admin_token")]
    pub moderation_service: Option<String>,

    /// Admin bearer token for --moderation-service
    #[arg(long)]
    pub admin_token: Option<String>,

    /// Read profile records from this service instead of the local directory
    #[arg(long)]
    pub records_service: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let directory = Arc::new(open_directory(&args.pds)?);

    let mut config = SearchConfig::from_env().context("Invalid search configuration")?;
    if args.exact {
        config.fuzzy = false;
    }

    let overlay: Arc<dyn ModerationOverlay> = match &args.moderation_service {
        Some(url) => {
            let url = ServiceUrl::new(url).context("Invalid moderation service URL")?;
            let token = args
                .admin_token
                .as_deref()
                .context("--admin-token is required with --moderation-service")?;
            Arc::new(XrpcModerationOverlay::new(url, token)?)
        }
        None => directory.clone(),
    };

    let records: Arc<dyn RecordEnricher> = match &args.records_service {
        Some(url) => {
            let url = ServiceUrl::new(url).context("Invalid records service URL")?;
            Arc::new(XrpcRecordEnricher::new(url)?)
        }
        None => directory.clone(),
    };

    let engine = SearchEngine::new(directory, overlay, records, config);
    info!(strategy = %engine.strategy().kind(), "Searching");

    if args.all {
        let repos = engine
            .search_all(args.term.as_deref(), args.limit)
            .await
            .context("Search failed")?;

        if repos.is_empty() {
            output::note("No repos found.");
        }
        for repo in &repos {
            output::json(repo)?;
        }
        return Ok(());
    }

    let request = SearchRequest {
        term: args.term,
        cursor: args.cursor,
        limit: args.limit,
    };
    let page = engine.search(&request).await.context("Search failed")?;

    if args.pretty {
        output::json_pretty(&page)?;
    } else {
        output::json(&page)?;
    }

    if let Some(cursor) = &page.cursor {
        output::cursor(cursor);
    }

    Ok(())
}
