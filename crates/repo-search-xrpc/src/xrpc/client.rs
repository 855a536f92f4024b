//! XRPC HTTP client implementation.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use repo_search_core::error::{Error, InvalidInputError, ProtocolError};
use repo_search_core::{Result, ServiceUrl};

use super::endpoints::XrpcErrorResponse;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn map_transport(err: reqwest::Error) -> Error {
    Error::store_unavailable(format!("service unreachable: {}", err))
}

/// HTTP client for XRPC queries.
#[derive(Debug, Clone)]
pub struct XrpcClient {
    client: reqwest::Client,
    service: ServiceUrl,
}

impl XrpcClient {
    /// Create a new XRPC client for the given service.
    pub fn new(service: ServiceUrl) -> Result<Self> {
        Self::with_timeout(service, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(service: ServiceUrl, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repo-search/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!("failed to build HTTP client: {}", e),
                })
            })?;

        Ok(Self { client, service })
    }

    pub fn service(&self) -> &ServiceUrl {
        &self.service
    }

    /// Make an unauthenticated XRPC query (GET request).
    #[instrument(skip(self), fields(service = %self.service))]
    pub async fn query<Q, R>(&self, method: &str, params: &Q) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.service.xrpc_url(method);
        debug!(method, "XRPC query");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(map_transport)?;

        self.handle_response(response).await
    }

    /// Make an authenticated XRPC query (GET request).
    #[instrument(skip(self, token), fields(service = %self.service))]
    pub async fn query_authed<Q, R>(&self, method: &str, params: &Q, token: &str) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.service.xrpc_url(method);
        debug!(method, "XRPC authenticated query");

        let response = self
            .client
            .get(&url)
            .query(params)
            .headers(Self::auth_headers(token)?)
            .send()
            .await
            .map_err(map_transport)?;

        self.handle_response(response).await
    }

    /// Create authorization headers for authenticated requests.
    fn auth_headers(token: &str) -> Result<HeaderMap> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            Error::InvalidInput(InvalidInputError::Other {
                message: "admin token contains invalid header characters".to_string(),
            })
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Handle an XRPC response, parsing the body or error.
    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "XRPC response");

        if status.is_success() {
            response.json::<R>().await.map_err(|e| {
                Error::Protocol(ProtocolError::new(
                    status.as_u16(),
                    Some("InvalidResponse".to_string()),
                    Some(e.to_string()),
                ))
            })
        } else {
            Err(Error::Protocol(Self::parse_error_response(response).await))
        }
    }

    /// Parse an XRPC error response.
    async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<XrpcErrorResponse>().await {
            Ok(error_body) => ProtocolError::new(status, error_body.error, error_body.message),
            Err(_) => ProtocolError::new(status, None, None),
        }
    }
}
