//! Validated record value type for AT Protocol records.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, InvalidInputError};

/// A validated AT Protocol record payload.
///
/// This type guarantees that the value is a JSON object whose `$type` field
/// is a string. Related-record enrichment is decoded from these values.
///
/// # Example
///
/// ```
/// use repo_search_core::RecordValue;
/// use serde_json::json;
///
/// let value = RecordValue::new(json!({
///     "$type": "app.bsky.actor.profile",
///     "displayName": "Carol Littel"
/// })).unwrap();
///
/// assert_eq!(value.record_type(), "app.bsky.actor.profile");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue(Value);

impl RecordValue {
    /// Create a new `RecordValue` from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or lacks a string `$type`.
    pub fn new(value: Value) -> Result<Self, Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// The `$type` field.
    pub fn record_type(&self) -> &str {
        self.0
            .get("$type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn validate(value: &Value) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::RecordValue {
                reason: reason.to_string(),
            }
            .into()
        };

        let obj = value
            .as_object()
            .ok_or_else(|| invalid("record value must be a JSON object"))?;

        match obj.get("$type") {
            None => Err(invalid("record value must contain a $type field")),
            Some(t) if !t.is_string() => Err(invalid("$type field must be a string")),
            Some(_) => Ok(()),
        }
    }
}

impl Serialize for RecordValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RecordValue::new(value).map_err(serde::de::Error::custom)
    }
}
