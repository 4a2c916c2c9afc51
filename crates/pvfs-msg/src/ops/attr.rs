//! `getattr`, `setattr` — attribute fetch and update.
//!
//! Reference: spec.md §4.5.5 "Getattr/Setattr".

use binrw::binrw;
use pvfs_types::ObjectRef;

use crate::wire_attr::WireObjectAttributes;
use crate::wire_sec::WireCapability;

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct GetattrRequest {
    pub target: ObjectRef,
    pub requested_mask: u32,
    pub capability: WireCapability,
}

/// `size` on a directory's metafile is the sum over every dfile's
/// individually-reported size (spec.md §4.5.5 step 3, "fan-out size sum").
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct GetattrReply {
    pub status: crate::status::StatusCode,
    pub attrs: WireObjectAttributes,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SetattrRequest {
    pub target: ObjectRef,
    pub attrs: WireObjectAttributes,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SetattrReply {
    pub status: crate::status::StatusCode,
}
