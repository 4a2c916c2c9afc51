//! `create`, `mkdir`, `symlink`, `crdirent` — object creation and the
//! directory-entry insert that publishes it into a namespace.
//!
//! Reference: spec.md §4.5.2 Create.

use binrw::binrw;
use pvfs_types::{FsId, Handle, ObjectRef};

use crate::wire_sec::{WireCapability, WireCredential};
use crate::wire_util::{WireString, WireVec};

/// Creates a metafile and its datafiles, but does not link the result into
/// any directory — that is a separate [`CrdirentRequest`], so a caller can
/// retry the link step alone if only it failed.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub fs_id: FsId,
    /// `0` asks the server to pick a count via its configured distribution
    /// default (spec.md §4.5.2 step 2, `get_num_dfiles`).
    pub requested_num_dfiles: u32,
    pub dist_name: WireString,
    pub dist_strip_size: u64,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
    pub credential: WireCredential,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateReply {
    pub status: crate::status::StatusCode,
    pub metafile: ObjectRef,
    pub dfile_handles: WireVec<Handle>,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MkdirRequest {
    pub fs_id: FsId,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
    /// Number of dirdata shards to split the new directory's entries
    /// across (spec.md §3 "Dirdata shard").
    pub dirdata_shards: u32,
    pub credential: WireCredential,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MkdirReply {
    pub status: crate::status::StatusCode,
    pub directory: ObjectRef,
    pub dirdata_handles: WireVec<Handle>,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SymlinkRequest {
    pub fs_id: FsId,
    pub target: WireString,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
    pub credential: WireCredential,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SymlinkReply {
    pub status: crate::status::StatusCode,
    pub symlink: ObjectRef,
    pub capability: WireCapability,
}

/// Inserts `{name, handle}` into one of `parent`'s dirdata shards, selected
/// by [`pvfs_types::dirent::dirent_shard_index`]. Reference: spec.md
/// §4.5.2 step 4, §4.5.4 "Rename" (which reuses this same op for its
/// insert half).
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct CrdirentRequest {
    pub parent: ObjectRef,
    pub name: WireString,
    pub target: ObjectRef,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct CrdirentReply {
    pub status: crate::status::StatusCode,
}
