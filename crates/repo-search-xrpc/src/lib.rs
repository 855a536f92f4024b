//! repo-search-xrpc - Moderation overlay and record enricher backed by a
//! remote AT Protocol service.
//!
//! [`XrpcModerationOverlay`] reads `com.atproto.admin.getRepo` with an admin
//! token; [`XrpcRecordEnricher`] reads profile records through
//! `com.atproto.repo.listRecords`. A repo the service does not know has no
//! action and no records. Any other failure is reported as
//! [`Error::EnrichmentDegraded`](repo_search_core::Error::EnrichmentDegraded).

mod overlay;
mod records;
mod xrpc;

pub use overlay::XrpcModerationOverlay;
pub use records::XrpcRecordEnricher;
pub use xrpc::client::XrpcClient;
