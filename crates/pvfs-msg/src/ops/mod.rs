//! One module per operation family named in spec.md §4.5 / §6, plus the
//! [`RequestBody`]/[`ReplyBody`] tagged unions that dispatch on
//! [`crate::header::OpCode`] the way `smb-msg`'s `RequestContent`/
//! `ResponseContent` dispatch on SMB2's command field
//! (`smb-msg/src/message.rs`).

pub mod attr;
pub mod create;
pub mod io;
pub mod lookup;
pub mod mgmt;
pub mod readdir;
pub mod remove_rename;

pub use attr::{GetattrRequest, GetattrReply, SetattrRequest, SetattrReply};
pub use create::{CreateRequest, CreateReply, MkdirRequest, MkdirReply, SymlinkRequest, SymlinkReply, CrdirentRequest, CrdirentReply};
pub use io::{IoRequest, IoReply, SmallIoRequest, SmallIoReply, WriteCompletionRequest, WriteCompletionReply, FlushRequest, FlushReply};
pub use lookup::{LookupPathRequest, LookupPathReply};
pub use mgmt::{
    MgmtGetConfigRequest, MgmtGetConfigReply, MgmtCountServersRequest, MgmtCountServersReply,
    MgmtGetServerArrayRequest, MgmtGetServerArrayReply, MgmtSetparamListRequest, MgmtSetparamListReply,
    MgmtStatfsListRequest, MgmtStatfsListReply, MgmtPerfMonListRequest, MgmtPerfMonListReply,
    MgmtIterateHandlesListRequest, MgmtIterateHandlesListReply, MgmtGetUserCertRequest, MgmtGetUserCertReply,
};
pub use readdir::{ReaddirRequest, ReaddirReply, RmdirentRequest, RmdirentReply};
pub use remove_rename::{RemoveRequest, RemoveReply, RenameRequest, RenameReply};

/// Every request body a client can send, keyed by the op code that
/// accompanies it in the [`crate::header::Header`]. There is no shared
/// envelope type that holds both the header and one of these — the header
/// is framed first, then the body matching its `op_code` is decoded, the
/// same two-pass shape `smb-msg/src/message.rs` uses for its command enum.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    LookupPath(LookupPathRequest),
    Create(CreateRequest),
    Mkdir(MkdirRequest),
    Symlink(SymlinkRequest),
    Remove(RemoveRequest),
    Rename(RenameRequest),
    Getattr(GetattrRequest),
    Setattr(SetattrRequest),
    Readdir(ReaddirRequest),
    Crdirent(CrdirentRequest),
    Rmdirent(RmdirentRequest),
    Io(IoRequest),
    SmallIo(SmallIoRequest),
    WriteCompletion(WriteCompletionRequest),
    Flush(FlushRequest),
    MgmtGetConfig(MgmtGetConfigRequest),
    MgmtCountServers(MgmtCountServersRequest),
    MgmtGetServerArray(MgmtGetServerArrayRequest),
    MgmtSetparamList(MgmtSetparamListRequest),
    MgmtStatfsList(MgmtStatfsListRequest),
    MgmtPerfMonList(MgmtPerfMonListRequest),
    MgmtIterateHandlesList(MgmtIterateHandlesListRequest),
    MgmtGetUserCert(MgmtGetUserCertRequest),
}

impl RequestBody {
    pub fn op_code(&self) -> crate::header::OpCode {
        use crate::header::OpCode;
        match self {
            RequestBody::LookupPath(_) => OpCode::LookupPath,
            RequestBody::Create(_) => OpCode::Create,
            RequestBody::Mkdir(_) => OpCode::Mkdir,
            RequestBody::Symlink(_) => OpCode::Symlink,
            RequestBody::Remove(_) => OpCode::Remove,
            RequestBody::Rename(_) => OpCode::Rename,
            RequestBody::Getattr(_) => OpCode::Getattr,
            RequestBody::Setattr(_) => OpCode::Setattr,
            RequestBody::Readdir(_) => OpCode::Readdir,
            RequestBody::Crdirent(_) => OpCode::Crdirent,
            RequestBody::Rmdirent(_) => OpCode::Rmdirent,
            RequestBody::Io(_) => OpCode::Io,
            RequestBody::SmallIo(_) => OpCode::SmallIo,
            RequestBody::WriteCompletion(_) => OpCode::WriteCompletion,
            RequestBody::Flush(_) => OpCode::Flush,
            RequestBody::MgmtGetConfig(_) => OpCode::MgmtGetConfig,
            RequestBody::MgmtCountServers(_) => OpCode::MgmtCountServers,
            RequestBody::MgmtGetServerArray(_) => OpCode::MgmtGetServerArray,
            RequestBody::MgmtSetparamList(_) => OpCode::MgmtSetparamList,
            RequestBody::MgmtStatfsList(_) => OpCode::MgmtStatfsList,
            RequestBody::MgmtPerfMonList(_) => OpCode::MgmtPerfMonList,
            RequestBody::MgmtIterateHandlesList(_) => OpCode::MgmtIterateHandlesList,
            RequestBody::MgmtGetUserCert(_) => OpCode::MgmtGetUserCert,
        }
    }
}

/// Every reply body a server can send back. `status` lives in the shared
/// reply trailer (see each op's `*Reply` struct), not here, since a
/// non-success status means the rest of the body may be entirely absent.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    LookupPath(LookupPathReply),
    Create(CreateReply),
    Mkdir(MkdirReply),
    Symlink(SymlinkReply),
    Remove(RemoveReply),
    Rename(RenameReply),
    Getattr(GetattrReply),
    Setattr(SetattrReply),
    Readdir(ReaddirReply),
    Crdirent(CrdirentReply),
    Rmdirent(RmdirentReply),
    Io(IoReply),
    SmallIo(SmallIoReply),
    WriteCompletion(WriteCompletionReply),
    Flush(FlushReply),
    MgmtGetConfig(MgmtGetConfigReply),
    MgmtCountServers(MgmtCountServersReply),
    MgmtGetServerArray(MgmtGetServerArrayReply),
    MgmtSetparamList(MgmtSetparamListReply),
    MgmtStatfsList(MgmtStatfsListReply),
    MgmtPerfMonList(MgmtPerfMonListReply),
    MgmtIterateHandlesList(MgmtIterateHandlesListReply),
    MgmtGetUserCert(MgmtGetUserCertReply),
}

impl ReplyBody {
    pub fn op_code(&self) -> crate::header::OpCode {
        use crate::header::OpCode;
        match self {
            ReplyBody::LookupPath(_) => OpCode::LookupPath,
            ReplyBody::Create(_) => OpCode::Create,
            ReplyBody::Mkdir(_) => OpCode::Mkdir,
            ReplyBody::Symlink(_) => OpCode::Symlink,
            ReplyBody::Remove(_) => OpCode::Remove,
            ReplyBody::Rename(_) => OpCode::Rename,
            ReplyBody::Getattr(_) => OpCode::Getattr,
            ReplyBody::Setattr(_) => OpCode::Setattr,
            ReplyBody::Readdir(_) => OpCode::Readdir,
            ReplyBody::Crdirent(_) => OpCode::Crdirent,
            ReplyBody::Rmdirent(_) => OpCode::Rmdirent,
            ReplyBody::Io(_) => OpCode::Io,
            ReplyBody::SmallIo(_) => OpCode::SmallIo,
            ReplyBody::WriteCompletion(_) => OpCode::WriteCompletion,
            ReplyBody::Flush(_) => OpCode::Flush,
            ReplyBody::MgmtGetConfig(_) => OpCode::MgmtGetConfig,
            ReplyBody::MgmtCountServers(_) => OpCode::MgmtCountServers,
            ReplyBody::MgmtGetServerArray(_) => OpCode::MgmtGetServerArray,
            ReplyBody::MgmtSetparamList(_) => OpCode::MgmtSetparamList,
            ReplyBody::MgmtStatfsList(_) => OpCode::MgmtStatfsList,
            ReplyBody::MgmtPerfMonList(_) => OpCode::MgmtPerfMonList,
            ReplyBody::MgmtIterateHandlesList(_) => OpCode::MgmtIterateHandlesList,
            ReplyBody::MgmtGetUserCert(_) => OpCode::MgmtGetUserCert,
        }
    }
}
