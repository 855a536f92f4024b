//! Related records attached to a repo (profile and friends).

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::{Error, InvalidInputError};

use super::RecordValue;

/// Collection holding the profile record of a repo.
pub const PROFILE_COLLECTION: &str = "app.bsky.actor.profile";

/// A record associated with a repo, reduced to the fields admin search shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<BlobRef>,
}

impl RelatedRecord {
    /// A bare profile record with only a display name.
    pub fn profile(display_name: impl Into<String>) -> Self {
        Self {
            record_type: PROFILE_COLLECTION.to_string(),
            display_name: Some(display_name.into()),
            description: None,
            avatar: None,
        }
    }

    /// Decode a related record from a stored record value.
    pub fn from_value(value: &RecordValue) -> Result<Self> {
        serde_json::from_value(value.as_value().clone()).map_err(|e| {
            Error::InvalidInput(InvalidInputError::RecordValue {
                reason: format!("{} record: {}", value.record_type(), e),
            })
        })
    }

    /// Encode back into a storable record value.
    pub fn to_value(&self) -> Result<RecordValue> {
        let value = serde_json::to_value(self).map_err(|e| {
            Error::InvalidInput(InvalidInputError::Other {
                message: e.to_string(),
            })
        })?;
        RecordValue::new(value)
    }

    pub fn is_profile(&self) -> bool {
        self.record_type == PROFILE_COLLECTION
    }
}

/// Display name matched by search: the first profile record, in record key
/// order, that carries one.
pub fn profile_display_name<'a>(
    records: impl IntoIterator<Item = &'a RelatedRecord>,
) -> Option<&'a str> {
    records
        .into_iter()
        .filter(|r| r.is_profile())
        .find_map(|r| r.display_name.as_deref())
}

/// Reference to an immutable blob (e.g. an avatar image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "ref")]
    pub content: CidLink,
}

impl BlobRef {
    pub fn new(mime_type: impl Into<String>, size: u64, link: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            size,
            content: CidLink {
                link: link.into(),
            },
        }
    }

    pub fn link(&self) -> &str {
        &self.content.link
    }
}

/// Content address of a blob, serialized as `{"$link": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_profile_with_avatar() {
        let value = RecordValue::new(json!({
            "$type": "app.bsky.actor.profile",
            "displayName": "Carol Littel",
            "description": "",
            "avatar": {
                "$type": "blob",
                "mimeType": "image/jpeg",
                "ref": { "$link": "bafkreiavatar" },
                "size": 3976
            },
            "banner": null
        }))
        .unwrap();

        let record = RelatedRecord::from_value(&value).unwrap();
        assert!(record.is_profile());
        assert_eq!(record.display_name.as_deref(), Some("Carol Littel"));
        assert_eq!(record.description.as_deref(), Some(""));

        let avatar = record.avatar.unwrap();
        assert_eq!(avatar.mime_type, "image/jpeg");
        assert_eq!(avatar.size, 3976);
        assert_eq!(avatar.link(), "bafkreiavatar");
    }

    #[test]
    fn serializes_wire_shape() {
        let record = RelatedRecord {
            avatar: Some(BlobRef::new("image/png", 10, "bafkreilink")),
            ..RelatedRecord::profile("Sadie Carter")
        };

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "$type": "app.bsky.actor.profile",
                "displayName": "Sadie Carter",
                "avatar": {
                    "mimeType": "image/png",
                    "size": 10,
                    "ref": { "$link": "bafkreilink" }
                }
            })
        );
    }

    #[test]
    fn display_name_skips_unnamed_and_foreign_records() {
        let unnamed = RelatedRecord {
            display_name: None,
            ..RelatedRecord::profile("")
        };
        let foreign = RelatedRecord {
            record_type: "app.example.card".to_string(),
            ..RelatedRecord::profile("Impostor")
        };
        let named = RelatedRecord::profile("Carol Littel");

        let records = [unnamed, foreign, named];
        assert_eq!(profile_display_name(&records), Some("Carol Littel"));
        assert_eq!(profile_display_name(&records[..2]), None);
    }

    #[test]
    fn rejects_malformed_fields() {
        let value = RecordValue::new(json!({
            "$type": "app.bsky.actor.profile",
            "displayName": 42
        }))
        .unwrap();
        assert!(RelatedRecord::from_value(&value).is_err());
    }
}
