//! Core AT Protocol identifier types.
//!
//! These types enforce protocol invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod did;
mod handle;
mod nsid;
mod service_url;

pub use did::Did;
pub use handle::Handle;
pub use nsid::Nsid;
pub use service_url::ServiceUrl;
