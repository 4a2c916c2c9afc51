use thiserror::Error;

/// Errors raised while encoding or decoding a message, as distinct from
/// [`crate::status::StatusCode`] values a server sends back as the outcome
/// of an operation it understood fine.
#[derive(Debug, Error)]
pub enum PvfsMsgError {
    #[error("message body truncated or malformed: {0}")]
    Malformed(String),

    #[error("unknown op code {0}")]
    UnknownOpCode(u32),

    #[error("reply op code {reply:?} does not match request op code {request:?}")]
    OpCodeMismatch { request: crate::header::OpCode, reply: crate::header::OpCode },

    #[error("binrw codec error: {0}")]
    Codec(String),
}

impl From<binrw::Error> for PvfsMsgError {
    fn from(e: binrw::Error) -> Self {
        PvfsMsgError::Codec(e.to_string())
    }
}
