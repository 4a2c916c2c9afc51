//! Sparse object attribute record.
//!
//! Reference: spec.md §3 "Object attributes" — "attributes are a sparse
//! record, never assumed fully populated".

use crate::handle::Handle;
use bitflags::bitflags;

bitflags! {
    /// Selects which fields of [`ObjectAttributes`] are meaningful.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrMask: u32 {
        const OWNER       = 1 << 0;
        const GROUP       = 1 << 1;
        const PERMS       = 1 << 2;
        const ATIME       = 1 << 3;
        const MTIME       = 1 << 4;
        const CTIME       = 1 << 5;
        const OBJTYPE     = 1 << 6;
        const SIZE        = 1 << 7;
        const DFILE_COUNT = 1 << 8;
        const DFILE_HANDLES = 1 << 9;
        const DIST        = 1 << 10;
        const LINK_TARGET = 1 << 11;

        const COMMON = Self::OWNER.bits() | Self::GROUP.bits() | Self::PERMS.bits()
            | Self::ATIME.bits() | Self::MTIME.bits() | Self::CTIME.bits() | Self::OBJTYPE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Metafile,
    Datafile,
    Directory,
    Symlink,
    Dirdata,
}

/// A distribution identifier + serialized parameters, as carried in
/// [`ObjectAttributes::dist`]. The concrete algorithm lives in
/// [`crate::distribution::Distribution`]; this is the wire-shaped name+params
/// pair an attribute record stores before the client looks up the matching
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionParams {
    pub name: String,
    pub strip_size: u64,
}

/// `{owner, group, perms, atime, mtime, ctime, objtype, size, dfile_count,
/// dfile_handles, dfile_sids, dist, link_target?, mask}`.
///
/// `mask` selects which fields are meaningful — never assume this struct is
/// fully populated; always gate field reads on `mask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttributes {
    pub mask: AttrMask,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub objtype: Option<ObjectType>,
    pub size: u64,
    pub dfile_count: u32,
    pub dfile_handles: Vec<Handle>,
    pub dfile_sids: Vec<String>,
    pub dist: Option<DistributionParams>,
    pub link_target: Option<String>,
}

impl ObjectAttributes {
    /// An attribute record with no fields populated.
    pub fn empty() -> Self {
        Self {
            mask: AttrMask::empty(),
            owner: 0,
            group: 0,
            perms: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            objtype: None,
            size: 0,
            dfile_count: 0,
            dfile_handles: Vec::new(),
            dfile_sids: Vec::new(),
            dist: None,
            link_target: None,
        }
    }

    /// True if every field named in `requested` is set in `self.mask`.
    pub fn satisfies(&self, requested: AttrMask) -> bool {
        self.mask.contains(requested)
    }

    /// Merge `other` into `self`, with `other`'s fields taking precedence
    /// wherever its mask has a bit set. Used when a cache hit is partial and
    /// must be completed by a server round trip.
    pub fn merge_from(&mut self, other: &ObjectAttributes) {
        if other.mask.contains(AttrMask::OWNER) {
            self.owner = other.owner;
        }
        if other.mask.contains(AttrMask::GROUP) {
            self.group = other.group;
        }
        if other.mask.contains(AttrMask::PERMS) {
            self.perms = other.perms;
        }
        if other.mask.contains(AttrMask::ATIME) {
            self.atime = other.atime;
        }
        if other.mask.contains(AttrMask::MTIME) {
            self.mtime = other.mtime;
        }
        if other.mask.contains(AttrMask::CTIME) {
            self.ctime = other.ctime;
        }
        if other.mask.contains(AttrMask::OBJTYPE) {
            self.objtype = other.objtype;
        }
        if other.mask.contains(AttrMask::SIZE) {
            self.size = other.size;
        }
        if other.mask.contains(AttrMask::DFILE_COUNT) {
            self.dfile_count = other.dfile_count;
        }
        if other.mask.contains(AttrMask::DFILE_HANDLES) {
            self.dfile_handles = other.dfile_handles.clone();
            self.dfile_sids = other.dfile_sids.clone();
        }
        if other.mask.contains(AttrMask::DIST) {
            self.dist = other.dist.clone();
        }
        if other.mask.contains(AttrMask::LINK_TARGET) {
            self.link_target = other.link_target.clone();
        }
        self.mask |= other.mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satisfies_requires_every_requested_bit() {
        let mut a = ObjectAttributes::empty();
        a.mask = AttrMask::OWNER | AttrMask::SIZE;
        assert!(a.satisfies(AttrMask::OWNER));
        assert!(!a.satisfies(AttrMask::OWNER | AttrMask::PERMS));
    }

    #[test]
    fn merge_from_only_touches_masked_fields() {
        let mut a = ObjectAttributes::empty();
        a.mask = AttrMask::OWNER;
        a.owner = 5;

        let mut b = ObjectAttributes::empty();
        b.mask = AttrMask::SIZE;
        b.size = 42;

        a.merge_from(&b);
        assert_eq!(a.owner, 5);
        assert_eq!(a.size, 42);
        assert!(a.satisfies(AttrMask::OWNER | AttrMask::SIZE));
    }
}
