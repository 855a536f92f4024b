//! Record enricher over `com.atproto.repo.listRecords`.

use async_trait::async_trait;
use tracing::{instrument, warn};

use repo_search_core::error::Error;
use repo_search_core::{
    Did, PROFILE_COLLECTION, RecordEnricher, RecordValue, RelatedRecord, Result, ServiceUrl,
};

use crate::xrpc::client::XrpcClient;
use crate::xrpc::endpoints::{LIST_RECORDS, ListRecordsQuery, ListRecordsResponse};

/// Only the first page of profile records is read.
const PAGE_SIZE: u32 = 10;

/// Reads a repo's profile records from a remote service.
#[derive(Debug, Clone)]
pub struct XrpcRecordEnricher {
    client: XrpcClient,
}

impl XrpcRecordEnricher {
    pub fn new(service: ServiceUrl) -> Result<Self> {
        Ok(Self::with_client(XrpcClient::new(service)?))
    }

    pub fn with_client(client: XrpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordEnricher for XrpcRecordEnricher {
    #[instrument(skip(self), fields(service = %self.client.service()))]
    async fn related_records(&self, did: &Did) -> Result<Vec<RelatedRecord>> {
        let query = ListRecordsQuery {
            repo: did.as_str(),
            collection: PROFILE_COLLECTION,
            limit: Some(PAGE_SIZE),
        };
        let response: ListRecordsResponse = match self.client.query(LIST_RECORDS, &query).await {
            Ok(response) => response,
            Err(Error::Protocol(e)) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(Error::enrichment(format!("listRecords {}: {}", did, e))),
        };

        if response.cursor.is_some() {
            warn!(
                %did,
                kept = response.records.len(),
                "More profile records than one page, ignoring the rest"
            );
        }

        let records = response
            .records
            .into_iter()
            .filter_map(|entry| {
                match RecordValue::new(entry.value).and_then(|v| RelatedRecord::from_value(&v)) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(uri = %entry.uri, error = %e, "Skipping malformed record");
                        None
                    }
                }
            })
            .collect();
        Ok(records)
    }
}
