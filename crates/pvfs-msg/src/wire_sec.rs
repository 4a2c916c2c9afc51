//! Wire mirrors of [`pvfs_types::Capability`] and [`pvfs_types::Credential`].
//!
//! `binrw`'s derive can't be implemented directly on those types from this
//! crate (they live in `pvfs-types` and carry `Vec<u8>`/`Vec<Handle>`
//! fields with no wire shape of their own), so every request/reply that
//! carries a capability or credential carries one of these instead, and
//! converts at the boundary. Grounded in the same split `smb-msg` makes
//! between its wire `Blob`-style fields and the higher-level types
//! `smb-dtyp` exposes to callers.

use binrw::binrw;
use pvfs_types::{Capability, Credential, FsId, Gid, Handle, OpMask, Uid};

use crate::wire_util::{WireBytes, WireString, WireVec};

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireCapability {
    pub issuer: WireString,
    pub fs_id: FsId,
    pub timeout: u64,
    pub op_mask: u32,
    pub handle_set: WireVec<Handle>,
    pub sig: WireBytes,
}

impl From<&Capability> for WireCapability {
    fn from(c: &Capability) -> Self {
        Self {
            issuer: c.issuer.as_str().into(),
            fs_id: c.fs_id,
            timeout: c.timeout,
            op_mask: c.op_mask.bits(),
            handle_set: c.handle_set.clone().into(),
            sig: WireBytes(c.sig.clone()),
        }
    }
}

impl From<&WireCapability> for Capability {
    fn from(w: &WireCapability) -> Self {
        Self {
            issuer: w.issuer.0.clone(),
            fs_id: w.fs_id,
            timeout: w.timeout,
            op_mask: OpMask::from_bits_truncate(w.op_mask),
            handle_set: w.handle_set.0.clone(),
            sig: w.sig.0.clone(),
        }
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireCredential {
    pub fs_id: FsId,
    pub serial: u32,
    pub uid: Uid,
    pub gids: WireVec<Gid>,
    pub issuer: WireString,
    pub timeout: u64,
    pub sig: WireBytes,
}

impl From<&Credential> for WireCredential {
    fn from(c: &Credential) -> Self {
        Self {
            fs_id: c.fs_id,
            serial: c.serial,
            uid: c.uid,
            gids: c.gids.clone().into(),
            issuer: c.issuer.as_str().into(),
            timeout: c.timeout,
            sig: WireBytes(c.sig.clone()),
        }
    }
}

impl From<&WireCredential> for Credential {
    fn from(w: &WireCredential) -> Self {
        Self {
            fs_id: w.fs_id,
            serial: w.serial,
            uid: w.uid,
            gids: w.gids.0.clone(),
            issuer: w.issuer.0.clone(),
            timeout: w.timeout,
            sig: w.sig.0.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_capability_round_trips_through_domain_type() {
        let cap = Capability {
            issuer: "meta-0".into(),
            fs_id: FsId(3),
            timeout: 100,
            op_mask: OpMask::LOOKUP | OpMask::GETATTR,
            handle_set: vec![Handle(1), Handle(2)],
            sig: vec![9, 9, 9],
        };
        let wire = WireCapability::from(&cap);
        let back = Capability::from(&wire);
        assert_eq!(cap, back);
    }
}
