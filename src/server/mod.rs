//! HTTP surfaces of a cache node.
//!
//! - [`peer_routes`]: peer-to-peer fetch endpoint under the pool's base path
//! - [`api`]: optional front-end gateway for one group

pub mod api;
pub mod peer_routes;
