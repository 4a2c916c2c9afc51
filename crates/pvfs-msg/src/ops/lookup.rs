//! `lookup_path` — resolve a path to an [`ObjectRef`] one segment at a
//! time. Reference: spec.md §4.5.1 Lookup.

use binrw::binrw;
use pvfs_types::ObjectRef;

use crate::wire_sec::WireCredential;
use crate::wire_util::WireString;

/// Caller supplies the *starting point* (`parent`) and the remaining
/// `path` to resolve under it, so a partially-resolved lookup (one that
/// stopped at a symlink or a missing intermediate segment) can be resumed
/// without re-walking segments already settled.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct LookupPathRequest {
    pub parent: ObjectRef,
    pub path: WireString,
    pub credential: WireCredential,
    /// Caller-requested attribute mask to piggyback on the final segment's
    /// resolution, avoiding a separate `getattr` round trip.
    pub attr_mask: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct LookupPathReply {
    pub status: crate::status::StatusCode,
    pub resolved: ObjectRef,
    /// Number of leading path segments actually consumed; less than the
    /// full segment count of `path` means the walk stopped early (e.g. at
    /// a symlink the caller must dereference itself).
    pub segments_resolved: u32,
    pub attrs: crate::wire_attr::WireObjectAttributes,
}
