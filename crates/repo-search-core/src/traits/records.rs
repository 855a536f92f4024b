//! Related-record enricher trait.

use async_trait::async_trait;

use crate::Result;
use crate::repo::RelatedRecord;
use crate::types::Did;

/// Source of records shown alongside a repo in search results.
#[async_trait]
pub trait RecordEnricher: Send + Sync {
    /// Records related to `did`. An unknown repo has none.
    async fn related_records(&self, did: &Did) -> Result<Vec<RelatedRecord>>;
}
