//! Handle type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

const MAX_HANDLE_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A validated, lowercase-normalized repo handle (e.g. `alice.test`).
///
/// Handles are mutable and unique at any instant, so they are never used as
/// a pagination key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Create a new handle, lowercasing it and validating the syntax.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let normalized = s.as_ref().trim().to_ascii_lowercase();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: String| -> Error {
            InvalidInputError::Handle {
                value: s.to_string(),
                reason,
            }
            .into()
        };

        if s.len() > MAX_HANDLE_LEN {
            return Err(invalid(format!(
                "exceeds maximum length of {} characters",
                MAX_HANDLE_LEN
            )));
        }

        let labels: Vec<&str> = s.split('.').collect();
        if labels.len() < 2 {
            return Err(invalid("must have at least two labels".to_string()));
        }

        for label in labels {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(invalid(format!(
                    "labels must be 1-{} characters",
                    MAX_LABEL_LEN
                )));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(invalid(format!(
                    "label '{}' must not start or end with '-'",
                    label
                )));
            }
            if let Some(c) = label
                .chars()
                .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
            {
                return Err(invalid(format!(
                    "label '{}' contains invalid character '{}'",
                    label, c
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Handle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case() {
        let handle = Handle::new("Cara-Wiegand69.TEST").unwrap();
        assert_eq!(handle.as_str(), "cara-wiegand69.test");
    }

    #[test]
    fn deserializes_through_validation() {
        let handle: Handle = serde_json::from_str("\"Sven70.Test\"").unwrap();
        assert_eq!(handle.as_str(), "sven70.test");
        assert!(serde_json::from_str::<Handle>("\"nodots\"").is_err());
    }

    #[test]
    fn rejects_bad_handles() {
        assert!(Handle::new("single").is_err());
        assert!(Handle::new("-bad.test").is_err());
        assert!(Handle::new("bad..test").is_err());
        assert!(Handle::new("under_score.test").is_err());
        assert!(Handle::new("did:plc:abc").is_err());
    }
}
