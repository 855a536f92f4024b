//! Moderation overlay trait.

use async_trait::async_trait;

use crate::Result;
use crate::moderation::ModerationAction;
use crate::types::Did;

/// Source of the current moderation action for a repo.
#[async_trait]
pub trait ModerationOverlay: Send + Sync {
    /// The action currently in effect against `did`, if any.
    ///
    /// Reversed actions are not current.
    async fn current_action(&self, did: &Did) -> Result<Option<ModerationAction>>;
}
