//! Wire request/reply messages for the PVFS-style client core.
//!
//! Framing mirrors `smb-msg`'s shape (a fixed header followed by a
//! body keyed by operation code) but is far simpler: PVFS has no
//! dialect negotiation and no SMB2-style chained compounding, so the
//! header carries only what §6 of the filesystem design needs to route
//! and match a reply to its request.

#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod header;
pub mod ops;
pub mod status;
pub mod wire_attr;
pub mod wire_sec;
pub mod wire_util;

pub use codec::{decode_reply, decode_request, encode_reply, encode_request, peek_reply_status};
pub use error::PvfsMsgError;
pub use header::{Header, OpCode};
pub use ops::{ReplyBody, RequestBody};
pub use status::{StatusCode, TransientKind};

pub type Result<T> = std::result::Result<T, PvfsMsgError>;
