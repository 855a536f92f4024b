//! Seams between the search engine and its data sources.

mod directory;
mod moderation;
mod records;

pub use directory::{Capabilities, MatchQuery, RepoDirectory, seek_page};
pub use moderation::ModerationOverlay;
pub use records::RecordEnricher;
