//! `remove`, `rename` — namespace removal and the insert-then-remove
//! rename protocol.
//!
//! Reference: spec.md §4.5.4 "Rename", §4.5.3 "Remove".

use binrw::binrw;
use pvfs_types::ObjectRef;

use crate::wire_sec::WireCapability;
use crate::wire_util::WireString;

/// Fans out a dspace-remove to the metafile and every datafile handle it
/// names, then removes the dirent itself. Reference: spec.md §4.5.3 step 2
/// ("Remove is fan-out: dspace-remove every dfile handle, then the
/// metafile, then the dirent last").
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveRequest {
    pub parent: ObjectRef,
    pub name: WireString,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveReply {
    pub status: crate::status::StatusCode,
}

/// A rename is an insert of `new_name` under `new_parent` followed by a
/// remove of `old_name` under `old_parent`; a crash or partial failure
/// between the two steps leaves the object linked under both names until
/// the remove step is retried (spec.md §4.5.4, §9 Open Question #1 — no
/// background scrubber, best-effort retry only).
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct RenameRequest {
    pub old_parent: ObjectRef,
    pub old_name: WireString,
    pub new_parent: ObjectRef,
    pub new_name: WireString,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct RenameReply {
    pub status: crate::status::StatusCode,
    /// `true` once both the insert and the remove half have completed;
    /// `false` with a `Partial`-classified status means the caller's state
    /// machine should retry only the remove half, not redo the insert.
    pub insert_done: bool,
    pub remove_done: bool,
}
