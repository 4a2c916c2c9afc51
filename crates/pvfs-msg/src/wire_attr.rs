//! Wire mirror of [`pvfs_types::ObjectAttributes`].
//!
//! `mask` already tells a reader which fields are meaningful (spec.md §3
//! "attributes are a sparse record, never assumed fully populated"), so
//! fields absent under `mask` are still framed with an inert wire value
//! (object type `0xFF`, an empty `dist` name, an empty `link_target`)
//! rather than needing an `Option`-aware codec of their own.

use binrw::binrw;
use pvfs_types::{AttrMask, Handle, ObjectAttributes, ObjectType};

use crate::wire_util::{WireString, WireVec};

const OBJTYPE_NONE: u8 = 0xFF;
const OBJTYPE_METAFILE: u8 = 0;
const OBJTYPE_DATAFILE: u8 = 1;
const OBJTYPE_DIRECTORY: u8 = 2;
const OBJTYPE_SYMLINK: u8 = 3;
const OBJTYPE_DIRDATA: u8 = 4;

fn objtype_to_wire(t: Option<ObjectType>) -> u8 {
    match t {
        None => OBJTYPE_NONE,
        Some(ObjectType::Metafile) => OBJTYPE_METAFILE,
        Some(ObjectType::Datafile) => OBJTYPE_DATAFILE,
        Some(ObjectType::Directory) => OBJTYPE_DIRECTORY,
        Some(ObjectType::Symlink) => OBJTYPE_SYMLINK,
        Some(ObjectType::Dirdata) => OBJTYPE_DIRDATA,
    }
}

fn objtype_from_wire(v: u8) -> Option<ObjectType> {
    match v {
        OBJTYPE_METAFILE => Some(ObjectType::Metafile),
        OBJTYPE_DATAFILE => Some(ObjectType::Datafile),
        OBJTYPE_DIRECTORY => Some(ObjectType::Directory),
        OBJTYPE_SYMLINK => Some(ObjectType::Symlink),
        OBJTYPE_DIRDATA => Some(ObjectType::Dirdata),
        _ => None,
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireObjectAttributes {
    pub mask: u32,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub objtype: u8,
    pub size: u64,
    pub dfile_count: u32,
    pub dfile_handles: WireVec<Handle>,
    pub dfile_sids: WireVec<WireString>,
    pub dist_name: WireString,
    pub dist_strip_size: u64,
    pub link_target: WireString,
}

impl From<&ObjectAttributes> for WireObjectAttributes {
    fn from(a: &ObjectAttributes) -> Self {
        Self {
            mask: a.mask.bits(),
            owner: a.owner,
            group: a.group,
            perms: a.perms,
            atime: a.atime,
            mtime: a.mtime,
            ctime: a.ctime,
            objtype: objtype_to_wire(a.objtype),
            size: a.size,
            dfile_count: a.dfile_count,
            dfile_handles: a.dfile_handles.clone().into(),
            dfile_sids: a.dfile_sids.iter().map(|s| s.as_str().into()).collect::<Vec<_>>().into(),
            dist_name: a.dist.as_ref().map(|d| d.name.as_str()).unwrap_or("").into(),
            dist_strip_size: a.dist.as_ref().map(|d| d.strip_size).unwrap_or(0),
            link_target: a.link_target.as_deref().unwrap_or("").into(),
        }
    }
}

impl From<&WireObjectAttributes> for ObjectAttributes {
    fn from(w: &WireObjectAttributes) -> Self {
        Self {
            mask: AttrMask::from_bits_truncate(w.mask),
            owner: w.owner,
            group: w.group,
            perms: w.perms,
            atime: w.atime,
            mtime: w.mtime,
            ctime: w.ctime,
            objtype: objtype_from_wire(w.objtype),
            size: w.size,
            dfile_count: w.dfile_count,
            dfile_handles: w.dfile_handles.0.clone(),
            dfile_sids: w.dfile_sids.0.iter().map(|s| s.0.clone()).collect(),
            dist: if w.dist_name.0.is_empty() {
                None
            } else {
                Some(pvfs_types::attr::DistributionParams {
                    name: w.dist_name.0.clone(),
                    strip_size: w.dist_strip_size,
                })
            },
            link_target: if w.link_target.0.is_empty() {
                None
            } else {
                Some(w.link_target.0.clone())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_attrs_round_trip_through_domain_type() {
        let mut attrs = ObjectAttributes::empty();
        attrs.mask = AttrMask::OWNER | AttrMask::SIZE | AttrMask::OBJTYPE;
        attrs.owner = 500;
        attrs.size = 4096;
        attrs.objtype = Some(ObjectType::Directory);

        let wire = WireObjectAttributes::from(&attrs);
        let back = ObjectAttributes::from(&wire);
        assert_eq!(attrs, back);
    }

    #[test]
    fn absent_objtype_round_trips_to_none() {
        let attrs = ObjectAttributes::empty();
        let wire = WireObjectAttributes::from(&attrs);
        assert_eq!(wire.objtype, OBJTYPE_NONE);
        assert_eq!(ObjectAttributes::from(&wire).objtype, None);
    }
}
