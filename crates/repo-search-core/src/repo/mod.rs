//! Directory rows, related records and search result types.

mod record_value;
mod related;
mod types;

pub use record_value::RecordValue;
pub use related::{BlobRef, CidLink, PROFILE_COLLECTION, RelatedRecord, profile_display_name};
pub use types::{EnrichedRepo, RankedRepo, Repo, SearchPage};
