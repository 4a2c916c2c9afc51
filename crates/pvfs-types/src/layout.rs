//! Layout: the policy for choosing which I/O servers host the dfiles of a
//! new file.
//!
//! Reference: spec.md §3 "Layout", §4.1 `map_servers`, §8 "Layout coverage".

use crate::server::ServerDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Implementation default (equivalent to `RoundRobin` in this crate).
    None,
    /// Random start, then sequential.
    RoundRobin,
    /// Each index independently hashed, retry on collision.
    Random,
    /// Caller-supplied explicit server list.
    List(Vec<ServerDescriptor>),
}
