//! Service URL type.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated URL of a directory or moderation service.
///
/// Network services (`https://`, or `http://` on localhost) are queried over
/// XRPC. `file://` URLs point at a filesystem-backed directory.
///
/// # Example
///
/// ```
/// use repo_search_core::ServiceUrl;
///
/// let service = ServiceUrl::new("https://mod.example.com").unwrap();
/// assert_eq!(service.xrpc_url("com.atproto.admin.getRepo"),
///            "https://mod.example.com/xrpc/com.atproto.admin.getRepo");
///
/// let local = ServiceUrl::new("file:///tmp/directory").unwrap();
/// assert!(local.is_local());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceUrl(Url);

impl ServiceUrl {
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let mut url = Url::parse(s).map_err(|e| InvalidInputError::ServiceUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        if url.path() == "/" {
            url.set_path("");
        }

        Ok(Self(url))
    }

    /// Returns the XRPC endpoint URL for a given method.
    pub fn xrpc_url(&self, method: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/xrpc/{}", base, method)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true for `file://` URLs.
    pub fn is_local(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// Returns the filesystem path for `file://` URLs.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.is_local() {
            self.0.to_file_path().ok()
        } else {
            None
        }
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::ServiceUrl {
                value: original.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if url.cannot_be_a_base() {
            return Err(invalid("must be an absolute URL"));
        }

        match url.scheme() {
            "file" if url.path().is_empty() => Err(invalid("file:// URL must have a path")),
            "file" => Ok(()),
            scheme => {
                let is_localhost = url
                    .host_str()
                    .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");

                if scheme != "https" && !(scheme == "http" && is_localhost) {
                    return Err(invalid("must use HTTPS (HTTP allowed only for localhost)"));
                }
                if url.host_str().is_none() {
                    return Err(invalid("must have a host"));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServiceUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_http_allowed() {
        let url = ServiceUrl::new("http://127.0.0.1:2583").unwrap();
        assert!(!url.is_local());
        assert_eq!(
            url.xrpc_url("com.atproto.admin.getRepo"),
            "http://127.0.0.1:2583/xrpc/com.atproto.admin.getRepo"
        );
    }

    #[test]
    fn remote_http_rejected() {
        assert!(ServiceUrl::new("http://mod.example.com").is_err());
        assert!(ServiceUrl::new("/xrpc/method").is_err());
    }

    #[test]
    fn trailing_slash_normalized() {
        let url = ServiceUrl::new("https://mod.example.com/").unwrap();
        assert_eq!(
            url.xrpc_url("com.atproto.repo.listRecords"),
            "https://mod.example.com/xrpc/com.atproto.repo.listRecords"
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_url_to_path() {
        let url = ServiceUrl::new("file:///tmp/directory").unwrap();
        assert!(url.is_local());
        assert_eq!(
            url.to_file_path().unwrap(),
            std::path::PathBuf::from("/tmp/directory")
        );
    }
}
