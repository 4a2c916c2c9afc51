//! Encodes/decodes a [`Header`] followed by the [`RequestBody`]/[`ReplyBody`]
//! variant its `op_code` selects.
//!
//! There is no separate envelope wrapper struct: each request already
//! carries its own capability/credential field (see `ops::*`), so framing
//! a message is exactly "header, then body" with no extra indirection —
//! simpler than `smb-msg/src/message.rs`'s envelope because PVFS has
//! nothing like SMB2 compounding to route around.

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use crate::header::{Header, OpCode};
use crate::ops::*;
use crate::{PvfsMsgError, Result};

macro_rules! encode_body {
    ($body:expr, $out:expr, $( $variant:ident ),* $(,)?) => {
        match $body {
            $( RequestBody::$variant(inner) => inner.write_le($out)?, )*
        }
    };
}

macro_rules! decode_body {
    ($op:expr, $bytes:expr, $( $variant:ident => $ty:ty ),* $(,)?) => {
        match $op {
            $( OpCode::$variant => {
                let mut cur = Cursor::new($bytes);
                RequestBody::$variant(<$ty>::read_le(&mut cur)?)
            } )*
        }
    };
}

pub fn encode_request(header: &Header, body: &RequestBody) -> Result<Vec<u8>> {
    if header.op_code != body.op_code() {
        return Err(PvfsMsgError::OpCodeMismatch { request: header.op_code, reply: body.op_code() });
    }
    let mut out = Cursor::new(Vec::new());
    header.write_le(&mut out)?;
    encode_body!(
        body, &mut out,
        LookupPath, Create, Mkdir, Symlink, Remove, Rename, Getattr, Setattr, Readdir,
        Crdirent, Rmdirent, Io, SmallIo, WriteCompletion, Flush, MgmtGetConfig,
        MgmtCountServers, MgmtGetServerArray, MgmtSetparamList, MgmtStatfsList,
        MgmtPerfMonList, MgmtIterateHandlesList, MgmtGetUserCert,
    );
    Ok(out.into_inner())
}

pub fn decode_request(frame: &[u8]) -> Result<(Header, RequestBody)> {
    let mut cur = Cursor::new(frame);
    let header = Header::read_le(&mut cur)?;
    let rest = &frame[cur.position() as usize..];
    let body = decode_body!(
        header.op_code, rest,
        LookupPath => LookupPathRequest,
        Create => CreateRequest,
        Mkdir => MkdirRequest,
        Symlink => SymlinkRequest,
        Remove => RemoveRequest,
        Rename => RenameRequest,
        Getattr => GetattrRequest,
        Setattr => SetattrRequest,
        Readdir => ReaddirRequest,
        Crdirent => CrdirentRequest,
        Rmdirent => RmdirentRequest,
        Io => IoRequest,
        SmallIo => SmallIoRequest,
        WriteCompletion => WriteCompletionRequest,
        Flush => FlushRequest,
        MgmtGetConfig => MgmtGetConfigRequest,
        MgmtCountServers => MgmtCountServersRequest,
        MgmtGetServerArray => MgmtGetServerArrayRequest,
        MgmtSetparamList => MgmtSetparamListRequest,
        MgmtStatfsList => MgmtStatfsListRequest,
        MgmtPerfMonList => MgmtPerfMonListRequest,
        MgmtIterateHandlesList => MgmtIterateHandlesListRequest,
        MgmtGetUserCert => MgmtGetUserCertRequest,
    );
    Ok((header, body))
}

macro_rules! encode_reply_body {
    ($body:expr, $out:expr, $( $variant:ident ),* $(,)?) => {
        match $body {
            $( ReplyBody::$variant(inner) => inner.write_le($out)?, )*
        }
    };
}

macro_rules! decode_reply_body {
    ($op:expr, $bytes:expr, $( $variant:ident => $ty:ty ),* $(,)?) => {
        match $op {
            $( OpCode::$variant => {
                let mut cur = Cursor::new($bytes);
                ReplyBody::$variant(<$ty>::read_le(&mut cur)?)
            } )*
        }
    };
}

pub fn encode_reply(header: &Header, body: &ReplyBody) -> Result<Vec<u8>> {
    if header.op_code != body.op_code() {
        return Err(PvfsMsgError::OpCodeMismatch { request: header.op_code, reply: body.op_code() });
    }
    let mut out = Cursor::new(Vec::new());
    header.write_le(&mut out)?;
    encode_reply_body!(
        body, &mut out,
        LookupPath, Create, Mkdir, Symlink, Remove, Rename, Getattr, Setattr, Readdir,
        Crdirent, Rmdirent, Io, SmallIo, WriteCompletion, Flush, MgmtGetConfig,
        MgmtCountServers, MgmtGetServerArray, MgmtSetparamList, MgmtStatfsList,
        MgmtPerfMonList, MgmtIterateHandlesList, MgmtGetUserCert,
    );
    Ok(out.into_inner())
}

pub fn decode_reply(frame: &[u8]) -> Result<(Header, ReplyBody)> {
    let mut cur = Cursor::new(frame);
    let header = Header::read_le(&mut cur)?;
    let rest = &frame[cur.position() as usize..];
    let body = decode_reply_body!(
        header.op_code, rest,
        LookupPath => LookupPathReply,
        Create => CreateReply,
        Mkdir => MkdirReply,
        Symlink => SymlinkReply,
        Remove => RemoveReply,
        Rename => RenameReply,
        Getattr => GetattrReply,
        Setattr => SetattrReply,
        Readdir => ReaddirReply,
        Crdirent => CrdirentReply,
        Rmdirent => RmdirentReply,
        Io => IoReply,
        SmallIo => SmallIoReply,
        WriteCompletion => WriteCompletionReply,
        Flush => FlushReply,
        MgmtGetConfig => MgmtGetConfigReply,
        MgmtCountServers => MgmtCountServersReply,
        MgmtGetServerArray => MgmtGetServerArrayReply,
        MgmtSetparamList => MgmtSetparamListReply,
        MgmtStatfsList => MgmtStatfsListReply,
        MgmtPerfMonList => MgmtPerfMonListReply,
        MgmtIterateHandlesList => MgmtIterateHandlesListReply,
        MgmtGetUserCert => MgmtGetUserCertReply,
    );
    Ok((header, body))
}

/// Reply status, read without decoding the rest of the body — lets the RPC
/// layer classify transient-vs-permanent before paying for a full decode.
pub fn peek_reply_status(frame: &[u8]) -> Result<crate::status::StatusCode> {
    let (_, body) = decode_reply(frame)?;
    Ok(reply_status(&body))
}

pub fn reply_status(body: &ReplyBody) -> crate::status::StatusCode {
    match body {
        ReplyBody::LookupPath(r) => r.status,
        ReplyBody::Create(r) => r.status,
        ReplyBody::Mkdir(r) => r.status,
        ReplyBody::Symlink(r) => r.status,
        ReplyBody::Remove(r) => r.status,
        ReplyBody::Rename(r) => r.status,
        ReplyBody::Getattr(r) => r.status,
        ReplyBody::Setattr(r) => r.status,
        ReplyBody::Readdir(r) => r.status,
        ReplyBody::Crdirent(r) => r.status,
        ReplyBody::Rmdirent(r) => r.status,
        ReplyBody::Io(r) => r.status,
        ReplyBody::SmallIo(r) => r.status,
        ReplyBody::WriteCompletion(r) => r.status,
        ReplyBody::Flush(r) => r.status,
        ReplyBody::MgmtGetConfig(r) => r.status,
        ReplyBody::MgmtCountServers(r) => r.status,
        ReplyBody::MgmtGetServerArray(r) => r.status,
        ReplyBody::MgmtSetparamList(r) => r.status,
        ReplyBody::MgmtStatfsList(r) => r.status,
        ReplyBody::MgmtPerfMonList(r) => r.status,
        ReplyBody::MgmtIterateHandlesList(r) => r.status,
        ReplyBody::MgmtGetUserCert(r) => r.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::ops::{GetattrRequest, GetattrReply};
    use crate::wire_attr::WireObjectAttributes;
    use crate::wire_sec::WireCapability;
    use pvfs_types::{FsId, Handle, ObjectRef};

    #[test]
    fn request_round_trips_through_encode_decode() {
        let header = Header::new(OpCode::Getattr, 7, FsId(1));
        let body = RequestBody::Getattr(GetattrRequest {
            target: ObjectRef::new(Handle(42), FsId(1)),
            requested_mask: 0xFF,
            capability: WireCapability {
                issuer: "meta-0".into(),
                fs_id: FsId(1),
                timeout: 100,
                op_mask: 0,
                handle_set: vec![Handle(42)].into(),
                sig: crate::wire_util::WireBytes(vec![1, 2, 3]),
            },
        });
        let frame = encode_request(&header, &body).unwrap();
        let (h2, b2) = decode_request(&frame).unwrap();
        assert_eq!(h2, header);
        assert_eq!(b2, body);
    }

    #[test]
    fn reply_round_trips_and_status_is_peekable() {
        let header = Header::new(OpCode::Getattr, 7, FsId(1));
        let body = ReplyBody::Getattr(GetattrReply {
            status: crate::status::StatusCode::Success,
            attrs: WireObjectAttributes::from(&pvfs_types::ObjectAttributes::empty()),
        });
        let frame = encode_reply(&header, &body).unwrap();
        let (h2, b2) = decode_reply(&frame).unwrap();
        assert_eq!(h2, header);
        assert_eq!(b2, body);
        assert_eq!(peek_reply_status(&frame).unwrap(), crate::status::StatusCode::Success);
    }

    #[test]
    fn mismatched_op_code_is_rejected_at_encode_time() {
        let header = Header::new(OpCode::Readdir, 1, FsId(1));
        let body = RequestBody::Getattr(GetattrRequest {
            target: ObjectRef::new(Handle(1), FsId(1)),
            requested_mask: 0,
            capability: WireCapability {
                issuer: String::new(),
                fs_id: FsId(1),
                timeout: 0,
                op_mask: 0,
                handle_set: vec![].into(),
                sig: crate::wire_util::WireBytes(vec![]),
            },
        });
        assert!(encode_request(&header, &body).is_err());
    }
}
