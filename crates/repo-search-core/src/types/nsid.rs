//! Namespaced Identifier (NSID) type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated AT Protocol Namespaced Identifier (NSID).
///
/// Collections of related records (e.g. `app.bsky.actor.profile`) are
/// addressed by NSID.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nsid(String);

impl Nsid {
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: String| -> Error {
            InvalidInputError::Nsid {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        // NSID length limit from the AT Protocol lexicon rules
        if s.len() > 317 {
            return Err(invalid(
                "exceeds maximum length of 317 characters".to_string(),
            ));
        }

        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() < 3 {
            return Err(invalid(
                "must have at least 3 segments (e.g., 'app.bsky.feed')".to_string(),
            ));
        }

        for (i, segment) in segments.iter().enumerate() {
            match segment.chars().next() {
                None => return Err(invalid(format!("segment {} is empty", i + 1))),
                Some(first) if !first.is_ascii_alphabetic() => {
                    return Err(invalid(format!(
                        "segment '{}' must start with a letter",
                        segment
                    )));
                }
                Some(_) => {}
            }

            if let Some(c) = segment
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
            {
                return Err(invalid(format!(
                    "segment '{}' contains invalid character '{}'",
                    segment, c
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Nsid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Nsid {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Nsid> for String {
    fn from(nsid: Nsid) -> Self {
        nsid.0
    }
}

impl AsRef<str> for Nsid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_profile_collection() {
        assert!(Nsid::new("app.bsky.actor.profile").is_ok());
    }

    #[test]
    fn invalid_nsids() {
        assert!(Nsid::new("app.bsky").is_err());
        assert!(Nsid::new("app..feed.post").is_err());
        assert!(Nsid::new("1app.bsky.feed").is_err());
        assert!(Nsid::new("app.bsky.feed_post").is_err());
    }
}
