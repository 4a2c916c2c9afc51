//! Message header: `{op_code, tag, fs_id}`, sent ahead of every request and
//! echoed (with a [`crate::status::StatusCode`] appended) on every reply.
//!
//! Reference: spec.md §6 "Message framing" and the per-operation request
//! lists under §4.5.

use binrw::binrw;
use pvfs_types::FsId;

/// One entry per sysint operation named in spec.md §6.
#[binrw]
#[brw(repr = u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    LookupPath = 1,
    Create = 2,
    Mkdir = 3,
    Symlink = 4,
    Remove = 5,
    Rename = 6,
    Getattr = 7,
    Setattr = 8,
    Readdir = 9,
    Crdirent = 10,
    Rmdirent = 11,
    Io = 12,
    SmallIo = 13,
    WriteCompletion = 14,
    Flush = 15,
    MgmtGetConfig = 16,
    MgmtCountServers = 17,
    MgmtGetServerArray = 18,
    MgmtSetparamList = 19,
    MgmtStatfsList = 20,
    MgmtPerfMonList = 21,
    MgmtIterateHandlesList = 22,
    MgmtGetUserCert = 23,
}

impl TryFrom<u32> for OpCode {
    type Error = crate::error::PvfsMsgError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        use OpCode::*;
        Ok(match v {
            1 => LookupPath,
            2 => Create,
            3 => Mkdir,
            4 => Symlink,
            5 => Remove,
            6 => Rename,
            7 => Getattr,
            8 => Setattr,
            9 => Readdir,
            10 => Crdirent,
            11 => Rmdirent,
            12 => Io,
            13 => SmallIo,
            14 => WriteCompletion,
            15 => Flush,
            16 => MgmtGetConfig,
            17 => MgmtCountServers,
            18 => MgmtGetServerArray,
            19 => MgmtSetparamList,
            20 => MgmtStatfsList,
            21 => MgmtPerfMonList,
            22 => MgmtIterateHandlesList,
            23 => MgmtGetUserCert,
            other => return Err(crate::error::PvfsMsgError::UnknownOpCode(other)),
        })
    }
}

/// Request/reply header. `tag` is the client-assigned op id used to match a
/// reply to its outstanding request in the [op id table]; it has no
/// meaning to the server beyond being echoed back.
///
/// [op id table]: ../pvfs_client/id_table/index.html
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub op_code: OpCode,
    pub tag: u64,
    pub fs_id: FsId,
}

impl Header {
    pub fn new(op_code: OpCode, tag: u64, fs_id: FsId) -> Self {
        Self { op_code, tag, fs_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::io::Cursor;
    use binrw::{BinRead, BinWrite};

    #[test]
    fn op_code_round_trips_through_wire_repr() {
        let h = Header::new(OpCode::Readdir, 42, FsId(9));
        let mut buf = Cursor::new(Vec::new());
        h.write_le(&mut buf).unwrap();
        buf.set_position(0);
        let back = Header::read_le(&mut buf).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn try_from_rejects_unknown_code() {
        assert!(OpCode::try_from(999).is_err());
        assert_eq!(OpCode::try_from(9).unwrap(), OpCode::Readdir);
    }
}
