//! Moderation actions as seen by the search overlay.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::types::Did;

/// The kind of a moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "com.atproto.admin.defs#takedown")]
    Takedown,
    #[serde(rename = "com.atproto.admin.defs#flag")]
    Flag,
    #[serde(rename = "com.atproto.admin.defs#acknowledge")]
    Acknowledge,
    #[serde(rename = "com.atproto.admin.defs#escalate")]
    Escalate,
}

/// A moderation action taken against a repo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationAction {
    pub id: u64,
    pub action: ActionKind,
    pub subject_did: Did,
}

/// Moderation state attached to a search row.
///
/// Serializes as `{}` when there is no current action (or it could not be
/// read) and `{"currentAction": {"action": ..., "id": ...}}` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModerationState {
    #[default]
    Clear,
    Current(ModerationAction),
    /// The overlay could not be read for this repo.
    Unknown,
}

impl ModerationState {
    pub fn current_action(&self) -> Option<&ModerationAction> {
        match self {
            ModerationState::Current(action) => Some(action),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ModerationState::Unknown)
    }

    pub fn is_taken_down(&self) -> bool {
        self.current_action()
            .is_some_and(|a| a.action == ActionKind::Takedown)
    }
}

impl From<Option<ModerationAction>> for ModerationState {
    fn from(action: Option<ModerationAction>) -> Self {
        action.map_or(ModerationState::Clear, ModerationState::Current)
    }
}

#[derive(Serialize)]
struct CurrentActionView {
    action: ActionKind,
    id: u64,
}

impl Serialize for ModerationState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.current_action() {
            Some(action) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(
                    "currentAction",
                    &CurrentActionView {
                        action: action.action,
                        id: action.id,
                    },
                )?;
                map.end()
            }
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_current_action() {
        let state = ModerationState::Current(ModerationAction {
            id: 1,
            action: ActionKind::Takedown,
            subject_did: Did::new("did:plc:cara").unwrap(),
        });

        assert!(state.is_taken_down());
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "currentAction": {
                    "action": "com.atproto.admin.defs#takedown",
                    "id": 1
                }
            })
        );
    }

    #[test]
    fn clear_and_unknown_serialize_empty() {
        assert_eq!(serde_json::to_value(ModerationState::Clear).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(ModerationState::Unknown).unwrap(), json!({}));
    }

    #[test]
    fn action_kind_wire_names() {
        let kind: ActionKind =
            serde_json::from_value(json!("com.atproto.admin.defs#escalate")).unwrap();
        assert_eq!(kind, ActionKind::Escalate);
    }
}
