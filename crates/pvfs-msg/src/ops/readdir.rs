//! `readdir`, `rmdirent` — directory listing and dirent removal.
//!
//! Reference: spec.md §4.5.6 "Readdir" (cross-shard continuation token).

use binrw::binrw;
use pvfs_types::{Handle, ObjectRef};

use crate::wire_sec::WireCapability;
use crate::wire_util::{WireBytes, WireString, WireVec};

/// `token` is opaque to the caller: empty on the first call, and whatever
/// the previous [`ReaddirReply::next_token`] returned thereafter. It
/// encodes both which dirdata shard is being walked and the position
/// within it, so a listing can resume across a shard boundary without the
/// caller tracking shard indices itself (spec.md §4.5.6 step 3).
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ReaddirRequest {
    pub directory: ObjectRef,
    pub token: WireBytes,
    pub count: u32,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct DirentWire {
    pub name: WireString,
    pub handle: Handle,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ReaddirReply {
    pub status: crate::status::StatusCode,
    pub entries: WireVec<DirentWire>,
    /// Empty when the listing (across every shard) is exhausted.
    pub next_token: WireBytes,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct RmdirentRequest {
    pub parent: ObjectRef,
    pub name: WireString,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct RmdirentReply {
    pub status: crate::status::StatusCode,
    /// The handle the removed dirent named, so the caller can chain a
    /// metafile/dfile removal without a second lookup.
    pub removed_handle: Handle,
}
