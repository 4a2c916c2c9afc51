//! `io`, `small_io`, `write_completion`, `flush` — striped read/write and
//! the small-IO piggyback path.
//!
//! Reference: spec.md §4.5.? "I/O" (active-set computation, small-IO
//! piggyback threshold, per-dfile completion tracking and short-completion
//! truncation).

use binrw::binrw;
use pvfs_types::{Handle, ObjectRef};

use crate::wire_sec::WireCapability;
use crate::wire_util::{WireBytes, WireVec};

#[binrw]
#[brw(repr = u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Read = 0,
    Write = 1,
}

/// One dfile's share of a striped I/O. The active set (which dfiles
/// actually participate) is computed client-side from the distribution
/// before this request is built — a dfile with no bytes in `[offset,
/// offset+len)` is simply not included, rather than being sent a
/// zero-length request (spec.md "active-set computation").
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct IoRequest {
    pub metafile: ObjectRef,
    pub dfile_handle: Handle,
    pub dfile_index: u32,
    pub direction: IoDirection,
    pub local_offset: u64,
    pub len: u64,
    /// Populated only when `direction == Write`.
    pub write_data: WireBytes,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct IoReply {
    pub status: crate::status::StatusCode,
    pub dfile_index: u32,
    /// Bytes actually transferred. Less than the request's `len` on a
    /// short read/write; the client truncates the logical result to the
    /// shortest dfile completion rather than padding (spec.md
    /// "short-completion truncation").
    pub bytes_completed: u64,
    /// Populated only when the request was a read.
    pub read_data: WireBytes,
}

/// A read or write small enough to piggyback on the request/reply itself
/// instead of going through the full multi-dfile [`IoRequest`] fan-out —
/// below the configured small-IO piggyback threshold and always confined
/// to a single dfile.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SmallIoRequest {
    pub metafile: ObjectRef,
    pub dfile_handle: Handle,
    pub dfile_index: u32,
    pub direction: IoDirection,
    pub local_offset: u64,
    pub data: WireBytes,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct SmallIoReply {
    pub status: crate::status::StatusCode,
    pub bytes_completed: u64,
    pub read_data: WireBytes,
}

/// Polls a previously-issued write for completion without blocking,
/// letting the state machine interleave progress on other dfiles of the
/// same logical I/O.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCompletionRequest {
    pub dfile_handle: Handle,
    pub tag: u64,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCompletionReply {
    pub status: crate::status::StatusCode,
    pub complete: bool,
    pub bytes_completed: u64,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct FlushRequest {
    pub dfile_handles: WireVec<Handle>,
    pub capability: WireCapability,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct FlushReply {
    pub status: crate::status::StatusCode,
}
