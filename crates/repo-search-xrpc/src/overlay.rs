//! Moderation overlay over `com.atproto.admin.getRepo`.

use async_trait::async_trait;
use tracing::{debug, instrument};

use repo_search_core::error::Error;
use repo_search_core::{Did, ModerationAction, ModerationOverlay, Result, ServiceUrl};

use crate::xrpc::client::XrpcClient;
use crate::xrpc::endpoints::{GET_REPO, GetRepoQuery, GetRepoResponse};

/// Reads the current moderation action of a repo from a remote service.
#[derive(Debug, Clone)]
pub struct XrpcModerationOverlay {
    client: XrpcClient,
    admin_token: String,
}

impl XrpcModerationOverlay {
    pub fn new(service: ServiceUrl, admin_token: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(XrpcClient::new(service)?, admin_token))
    }

    pub fn with_client(client: XrpcClient, admin_token: impl Into<String>) -> Self {
        Self {
            client,
            admin_token: admin_token.into(),
        }
    }
}

#[async_trait]
impl ModerationOverlay for XrpcModerationOverlay {
    #[instrument(skip(self), fields(service = %self.client.service()))]
    async fn current_action(&self, did: &Did) -> Result<Option<ModerationAction>> {
        let query = GetRepoQuery { did: did.as_str() };
        let response: GetRepoResponse = match self
            .client
            .query_authed(GET_REPO, &query, &self.admin_token)
            .await
        {
            Ok(response) => response,
            Err(Error::Protocol(e)) if e.is_not_found() => {
                debug!("Repo unknown to moderation service");
                return Ok(None);
            }
            Err(e) => return Err(Error::enrichment(format!("getRepo {}: {}", did, e))),
        };

        if response.did != did.as_str() {
            return Err(Error::enrichment(format!(
                "getRepo {} answered for {}",
                did, response.did
            )));
        }

        Ok(response
            .moderation
            .current_action
            .map(|current| ModerationAction {
                id: current.id,
                action: current.action,
                subject_did: did.clone(),
            }))
    }
}
