//! Search configuration.
//!
//! Values come from defaults, then environment variables, then whatever the
//! host applies on top (CLI flags). Unparsable environment values fall back
//! to the default rather than failing startup.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;
use crate::error::InvalidInputError;

pub const ENV_DEFAULT_LIMIT: &str = "REPO_SEARCH_DEFAULT_LIMIT";
pub const ENV_MAX_LIMIT: &str = "REPO_SEARCH_MAX_LIMIT";
pub const ENV_SIMILARITY_THRESHOLD: &str = "REPO_SEARCH_SIMILARITY_THRESHOLD";
pub const ENV_FUZZY: &str = "REPO_SEARCH_FUZZY";

/// Tuning for [`SearchEngine`](crate::SearchEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size when the request has no limit.
    pub default_limit: usize,
    /// Largest page size a request may ask for.
    pub max_limit: usize,
    /// Similarity above which a fuzzy match counts.
    pub similarity_threshold: f32,
    /// Use fuzzy matching on backends that support it.
    pub fuzzy: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
            similarity_threshold: 0.2,
            fuzzy: true,
        }
    }
}

impl SearchConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, validating the result.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            default_limit: parse_with_fallback(
                ENV_DEFAULT_LIMIT,
                lookup(ENV_DEFAULT_LIMIT),
                defaults.default_limit,
            ),
            max_limit: parse_with_fallback(ENV_MAX_LIMIT, lookup(ENV_MAX_LIMIT), defaults.max_limit),
            similarity_threshold: parse_with_fallback(
                ENV_SIMILARITY_THRESHOLD,
                lookup(ENV_SIMILARITY_THRESHOLD),
                defaults.similarity_threshold,
            ),
            fuzzy: lookup(ENV_FUZZY)
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off"))
                .unwrap_or(defaults.fuzzy),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> Result<()> {
            Err(InvalidInputError::Config {
                message: message.to_string(),
            }
            .into())
        };

        if self.max_limit == 0 {
            return invalid("max_limit must be greater than zero");
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return invalid("default_limit must be between 1 and max_limit");
        }
        if !(0.0..1.0).contains(&self.similarity_threshold) {
            return invalid("similarity_threshold must be in [0, 1)");
        }

        Ok(())
    }

    /// Page size for a requested limit: default when absent, clamped to `1..=max_limit`.
    pub fn clamp_limit(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.default_limit,
            Some(n) if n < 1 => 1,
            Some(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.max_limit),
        }
    }
}

fn parse_with_fallback<T: FromStr + Copy>(key: &str, value: Option<String>, fallback: T) -> T {
    match value {
        None => fallback,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable config value");
            fallback
        }),
    }
}
