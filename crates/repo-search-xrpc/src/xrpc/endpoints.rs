//! XRPC endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

use repo_search_core::ActionKind;

// ============================================================================
// Endpoint Names
// ============================================================================

/// com.atproto.admin.getRepo
pub const GET_REPO: &str = "com.atproto.admin.getRepo";

/// com.atproto.repo.listRecords
pub const LIST_RECORDS: &str = "com.atproto.repo.listRecords";

// ============================================================================
// Request/Response Types
// ============================================================================

/// XRPC error body.
#[derive(Debug, Deserialize)]
pub struct XrpcErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Query parameters for getRepo.
#[derive(Debug, Serialize)]
pub struct GetRepoQuery<'a> {
    pub did: &'a str,
}

/// Response from getRepo; only the moderation view is read.
#[derive(Debug, Deserialize)]
pub struct GetRepoResponse {
    pub did: String,
    #[serde(default)]
    pub moderation: ModerationView,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationView {
    #[serde(default)]
    pub current_action: Option<CurrentActionView>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentActionView {
    pub id: u64,
    pub action: ActionKind,
}

/// Query parameters for listRecords.
#[derive(Debug, Serialize)]
pub struct ListRecordsQuery<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Response from listRecords.
#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    pub records: Vec<RecordEntry>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A single record entry from listRecords.
#[derive(Debug, Deserialize)]
pub struct RecordEntry {
    pub uri: String,
    pub value: serde_json::Value,
}
