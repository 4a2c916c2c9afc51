//! Client-core errors: everything an action function can hand back to the
//! state-machine runtime, spanning the local causes (decode failure, op id
//! unknown, capability rejected) and the ones a server communicates via
//! [`pvfs_msg::StatusCode`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport: {0}")]
    Transport(#[from] pvfs_transport::TransportError),

    #[error("message codec: {0}")]
    Msg(#[from] pvfs_msg::PvfsMsgError),

    #[error("path: {0}")]
    Path(#[from] pvfs_types::PvfsTypeError),

    #[error("server {server} returned {status:?}")]
    Server { server: String, status: pvfs_msg::StatusCode },

    #[error("capability rejected: {0}")]
    Capability(#[from] pvfs_types::cap::CapVerifyError),

    #[error("operation id {0} is not registered")]
    UnknownOpId(u64),

    #[error("no server in fs {0:?} advertises the {1:?} role")]
    NoServerForRole(pvfs_types::FsId, pvfs_types::server::ServerRole),

    #[error("caller-supplied buffer holds {have} entries, need {need}")]
    BufferTooSmall { have: usize, need: usize },

    #[error("config cache has no entry for fs {0:?}; call reinitialize first")]
    UnknownFs(pvfs_types::FsId),

    #[error("operation was cancelled")]
    Cancelled,

    #[error("{op} partially failed and could not be rolled back cleanly: {detail}")]
    OrphanedRollback { op: &'static str, detail: String },

    #[error("rename left a duplicate link under both names: {0}")]
    RenameDuplicateLink(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps a client-local error onto the §7 taxonomy's status-code space,
    /// so sysint operations can surface one `error_code` regardless of
    /// whether the failure was local or server-reported.
    pub fn as_status(&self) -> pvfs_msg::StatusCode {
        use pvfs_msg::StatusCode;
        match self {
            Error::Transport(_) => StatusCode::EIO,
            Error::Msg(_) => StatusCode::EINVAL,
            Error::Path(e) => match e {
                pvfs_types::PvfsTypeError::SegmentTooLong { .. }
                | pvfs_types::PvfsTypeError::NameTooLong { .. } => StatusCode::ENAMETOOLONG,
                pvfs_types::PvfsTypeError::PathAboveRoot => StatusCode::EINVAL,
                _ => StatusCode::EINVAL,
            },
            Error::Server { status, .. } => *status,
            Error::Capability(e) => match e {
                pvfs_types::cap::CapVerifyError::Expired
                | pvfs_types::cap::CapVerifyError::InvalidSig => StatusCode::ESECURITY,
                _ => StatusCode::EACCES,
            },
            Error::UnknownOpId(_) => StatusCode::EINVAL,
            Error::NoServerForRole(..) => StatusCode::ENOENT,
            Error::BufferTooSmall { .. } => StatusCode::EOVERFLOW,
            Error::UnknownFs(_) => StatusCode::EINVAL,
            Error::Cancelled => StatusCode::EIO,
            Error::OrphanedRollback { .. } => StatusCode::EIO,
            Error::RenameDuplicateLink(_) => StatusCode::EALREADY,
        }
    }
}
