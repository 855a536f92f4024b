//! XRPC plumbing.

pub mod client;
pub mod endpoints;
