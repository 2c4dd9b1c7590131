//! Cache groups: named namespaces that tie the local cache, request
//! coalescing, peer routing and the origin loader together.
//!
//! - [`cache_group`]: the Group orchestrator and its error type
//! - [`registry`]: name → group lookup shared with the peer server
//! - [`singleflight`]: duplicate-load suppression
//! - [`loader`]: the origin loader capability

pub mod cache_group;
pub mod loader;
pub mod registry;
pub mod singleflight;
