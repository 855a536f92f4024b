//! Opaque, version-tagged pagination cursors.
//!
//! A cursor records the sort key of the last row of a page. The next page
//! seeks strictly after that key, so rows are never repeated or skipped even
//! when unrelated writes land between page fetches.
//!
//! Wire form: base64url (no padding) of a JSON object
//! `{"v": 1, "k": "list" | "exact" | "fuzzy", ...}`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::Result;
use crate::error::Error;
use crate::matching::{Rank, StrategyKind};
use crate::types::Did;

const CURSOR_VERSION: u64 = 1;

/// Sort key of the no-term listing: `(indexedAt, did)` ascending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListingKey {
    pub indexed_at: DateTime<Utc>,
    pub did: Did,
}

/// Sort key of term search: `(rank, did)` ascending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchKey {
    pub rank: Rank,
    pub did: Did,
}

/// A decoded pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCursor {
    /// Position in the no-term listing.
    Listing(ListingKey),
    /// Position in a term search ordered by `strategy`.
    Match { strategy: StrategyKind, key: MatchKey },
}

#[derive(Deserialize)]
#[serde(tag = "k", rename_all = "lowercase")]
enum Position {
    List { at: DateTime<Utc>, did: Did },
    Exact { rank: Rank, did: Did },
    Fuzzy { rank: Rank, did: Did },
}

impl SearchCursor {
    pub fn encode(&self) -> String {
        let body = match self {
            SearchCursor::Listing(key) => json!({
                "v": CURSOR_VERSION,
                "k": "list",
                "at": key.indexed_at,
                "did": key.did,
            }),
            SearchCursor::Match { strategy, key } => json!({
                "v": CURSOR_VERSION,
                "k": strategy.as_str(),
                "rank": key.rank,
                "did": key.did,
            }),
        };
        URL_SAFE_NO_PAD.encode(body.to_string())
    }

    pub fn decode(cursor: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor.trim())
            .map_err(|e| Error::invalid_cursor(format!("not base64url: {}", e)))?;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_cursor(format!("not JSON: {}", e)))?;

        match body.get("v").and_then(Value::as_u64) {
            Some(CURSOR_VERSION) => {}
            Some(v) => return Err(Error::invalid_cursor(format!("unsupported version {}", v))),
            None => return Err(Error::invalid_cursor("missing version")),
        }

        let position: Position = serde_json::from_value(body)
            .map_err(|e| Error::invalid_cursor(e.to_string()))?;

        Ok(match position {
            Position::List { at, did } => SearchCursor::Listing(ListingKey {
                indexed_at: at,
                did,
            }),
            Position::Exact { rank, did } => SearchCursor::Match {
                strategy: StrategyKind::Exact,
                key: MatchKey { rank, did },
            },
            Position::Fuzzy { rank, did } => SearchCursor::Match {
                strategy: StrategyKind::FuzzySimilarity,
                key: MatchKey { rank, did },
            },
        })
    }

    /// Short name of the ordering this cursor belongs to.
    pub fn mode_name(&self) -> &'static str {
        match self {
            SearchCursor::Listing(_) => "list",
            SearchCursor::Match { strategy, .. } => strategy.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn did(s: &str) -> Did {
        Did::new(s).unwrap()
    }

    #[test]
    fn listing_cursor_keeps_subsecond_precision() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let cursor = SearchCursor::Listing(ListingKey {
            indexed_at: at,
            did: did("did:plc:abc"),
        });

        let decoded = SearchCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn match_cursor_records_strategy() {
        let cursor = SearchCursor::Match {
            strategy: StrategyKind::FuzzySimilarity,
            key: MatchKey {
                rank: Rank::from_similarity(0.25),
                did: did("did:plc:cayla"),
            },
        };

        let decoded = SearchCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.mode_name(), "fuzzy");
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn keys_order_by_primary_then_did() {
        let literal = MatchKey {
            rank: Rank::LITERAL,
            did: did("did:plc:zzz"),
        };
        let similar = MatchKey {
            rank: Rank::from_similarity(0.9),
            did: did("did:plc:aaa"),
        };
        assert!(literal < similar);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "!!!", "bm90IGpzb24", "e30"] {
            let err = SearchCursor::decode(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidCursor { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn rejects_unknown_version() {
        let body = json!({ "v": 2, "k": "list", "at": Utc::now(), "did": "did:plc:abc" });
        let cursor = URL_SAFE_NO_PAD.encode(body.to_string());
        let err = SearchCursor::decode(&cursor).unwrap_err();
        assert!(err.to_string().contains("unsupported version 2"));
    }

    #[test]
    fn rejects_invalid_did() {
        let body = json!({ "v": 1, "k": "exact", "rank": 0, "did": "not-a-did" });
        let cursor = URL_SAFE_NO_PAD.encode(body.to_string());
        assert!(matches!(
            SearchCursor::decode(&cursor),
            Err(Error::InvalidCursor { .. })
        ));
    }
}
