//! `io`, `small_io` sysint operations — striped read/write (spec.md
//! §4.5.? "I/O").
//!
//! A logical `[offset, offset+len)` range is split at strip boundaries
//! into per-dfile chunks (the "active set"); each chunk becomes one
//! [`IoRequest`] pair in a single [`crate::rpc::MessageArray`], or one
//! [`SmallIoRequest`] when the whole transfer fits in one dfile under
//! [`SMALL_IO_THRESHOLD`]. Replies are stitched back into one logical
//! buffer in offset order; a short completion on any chunk truncates the
//! logical result at that point rather than leaving a hole (spec.md
//! "short-completion truncation").

use std::time::Instant;

use pvfs_msg::ops::{IoDirection, IoReply, IoRequest, SmallIoReply, SmallIoRequest};
use pvfs_msg::wire_sec::WireCapability;
use pvfs_msg::wire_util::WireBytes;
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::cap::OpMask;
use pvfs_types::{AttrMask, Credential, Distribution, ObjectRef};

use crate::context::CoreContext;
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::attr::GetattrState;
use super::{mint_capability, next_tag, OpHandle, OutputSlot};

/// Below this, a transfer confined to a single dfile piggybacks on
/// [`SmallIoRequest`] instead of the full [`IoRequest`] fan-out path.
pub const SMALL_IO_THRESHOLD: u64 = 4096;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoResult {
    pub bytes_completed: u64,
    pub data: Vec<u8>,
}

pub fn read(ctx: &CoreContext, cred: Credential, target: ObjectRef, offset: u64, len: u64) -> OpHandle<IoResult> {
    post(ctx, cred, target, offset, len, IoDirection::Read, Vec::new())
}

pub fn write(ctx: &CoreContext, cred: Credential, target: ObjectRef, offset: u64, data: Vec<u8>) -> OpHandle<IoResult> {
    let len = data.len() as u64;
    post(ctx, cred, target, offset, len, IoDirection::Write, data)
}

fn post(
    ctx: &CoreContext,
    cred: Credential,
    target: ObjectRef,
    offset: u64,
    len: u64,
    direction: IoDirection,
    write_data: Vec<u8>,
) -> OpHandle<IoResult> {
    let slot = OutputSlot::new();
    let state = IoState {
        target,
        offset,
        len,
        direction,
        write_data,
        cred: cred.dup(),
        phase: IoPhase::AwaitAttrs,
        slot: slot.clone(),
    };
    let smcb = Smcb::new("sysint:io", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

struct Chunk {
    dfile_idx: u32,
    local_offset: u64,
    len: u64,
    buffer_pos: u64,
}

enum IoPhase {
    AwaitAttrs,
    AwaitTransfer { chunks: Vec<Chunk> },
}

struct IoState {
    target: ObjectRef,
    offset: u64,
    len: u64,
    direction: IoDirection,
    write_data: Vec<u8>,
    cred: Credential,
    phase: IoPhase,
    slot: OutputSlot<IoResult>,
}

/// Splits `[offset, offset+len)` at `dist`'s stripe boundaries into
/// per-dfile chunks, in increasing `buffer_pos` order.
fn chunk_range(dist: &dyn Distribution, strip_size: u64, offset: u64, len: u64, num_dfiles: u32) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut pos = offset;
    let end = offset + len;
    while pos < end {
        let (dfile_idx, local_offset) = dist.logical_to_physical(pos, num_dfiles);
        // How far the current stripe round for this dfile runs before the
        // logical offset rolls over into the next dfile's stripe.
        let stripe_start = pos - (pos % strip_size);
        let stripe_end = stripe_start + strip_size;
        let run = stripe_end.min(end) - pos;
        chunks.push(Chunk { dfile_idx, local_offset, len: run, buffer_pos: pos - offset });
        pos += run;
    }
    chunks
}

impl IoState {
    fn capability(&self, ctx: &CoreContext, op: OpMask) -> pvfs_types::Capability {
        mint_capability(ctx, &self.cred, op, self.target.handle)
    }
}

impl SmState for IoState {
    fn name(&self) -> &'static str {
        "io:transfer"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let attr_slot = OutputSlot::new();
                let getattr = GetattrState::new(
                    self.target,
                    AttrMask::DFILE_HANDLES | AttrMask::DFILE_COUNT | AttrMask::DIST | AttrMask::OBJTYPE,
                    self.cred.dup(),
                    attr_slot,
                );
                StepOutcome::Push(Box::new(getattr))
            }
            Resume::ChildComplete(code) => {
                if !code.is_success() {
                    return StepOutcome::Complete(code);
                }
                let Some(attrs) = ctx.attr_cache.get(
                    self.target,
                    AttrMask::DFILE_HANDLES | AttrMask::DFILE_COUNT | AttrMask::DIST,
                    Instant::now(),
                ) else {
                    return StepOutcome::Complete(StatusCode::EIO);
                };
                if attrs.dfile_handles.is_empty() {
                    self.slot.set(IoResult::default());
                    return StepOutcome::Complete(StatusCode::Success);
                }
                let strip_size = attrs.dist.as_ref().map(|d| d.strip_size).unwrap_or(pvfs_types::distribution::SimpleStripe::DEFAULT_STRIP_SIZE);
                let dist = pvfs_types::distribution::SimpleStripe::new(strip_size);
                let num_dfiles = attrs.dfile_count.max(attrs.dfile_handles.len() as u32);
                let chunks = chunk_range(&dist, strip_size, self.offset, self.len, num_dfiles);

                let cap_op = match self.direction {
                    IoDirection::Read => OpMask::IO_READ,
                    IoDirection::Write => OpMask::IO_WRITE,
                };
                let capability = self.capability(ctx, cap_op);

                let mut arr = crate::rpc::MessageArray::new(crate::rpc::RpcPolicy::default());
                let small_single_dfile = self.len <= SMALL_IO_THRESHOLD && chunks.len() == 1;
                for chunk in &chunks {
                    let dfile_handle = attrs.dfile_handles[chunk.dfile_idx as usize];
                    let addr = attrs
                        .dfile_sids
                        .get(chunk.dfile_idx as usize)
                        .cloned()
                        .unwrap_or_default();
                    if small_single_dfile {
                        let data = match self.direction {
                            IoDirection::Write => {
                                self.write_data[chunk.buffer_pos as usize..(chunk.buffer_pos + chunk.len) as usize].to_vec()
                            }
                            IoDirection::Read => Vec::new(),
                        };
                        arr.push(
                            addr,
                            next_tag(),
                            self.target.fs_id,
                            RequestBody::SmallIo(SmallIoRequest {
                                metafile: self.target,
                                dfile_handle,
                                dfile_index: chunk.dfile_idx,
                                direction: self.direction,
                                local_offset: chunk.local_offset,
                                data: WireBytes(data),
                                capability: WireCapability::from(&capability),
                            }),
                        );
                    } else {
                        let write_data = match self.direction {
                            IoDirection::Write => {
                                self.write_data[chunk.buffer_pos as usize..(chunk.buffer_pos + chunk.len) as usize].to_vec()
                            }
                            IoDirection::Read => Vec::new(),
                        };
                        arr.push(
                            addr,
                            next_tag(),
                            self.target.fs_id,
                            RequestBody::Io(IoRequest {
                                metafile: self.target,
                                dfile_handle,
                                dfile_index: chunk.dfile_idx,
                                direction: self.direction,
                                local_offset: chunk.local_offset,
                                len: chunk.len,
                                write_data: WireBytes(write_data),
                                capability: WireCapability::from(&capability),
                            }),
                        );
                    }
                }
                self.phase = IoPhase::AwaitTransfer { chunks };
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(results) => {
                let IoPhase::AwaitTransfer { chunks } = &self.phase else {
                    return StepOutcome::Complete(StatusCode::EINVAL);
                };
                let mut buffer = vec![0u8; self.len as usize];
                let mut completed: u64 = 0;
                let mut first_error: Option<StatusCode> = None;

                for (chunk, outcome) in chunks.iter().zip(results.into_iter()) {
                    if chunk.buffer_pos != completed {
                        // An earlier chunk came up short; everything after
                        // it is truncated away regardless of its own result.
                        break;
                    }
                    let (status, bytes_completed, data) = match outcome {
                        Ok(ReplyBody::Io(IoReply { status, bytes_completed, read_data, .. })) => (status, bytes_completed, read_data.0),
                        Ok(ReplyBody::SmallIo(SmallIoReply { status, bytes_completed, read_data })) => (status, bytes_completed, read_data.0),
                        Ok(_) => (StatusCode::EINVAL, 0, Vec::new()),
                        Err(e) => (e.as_status(), 0, Vec::new()),
                    };
                    if !status.is_success() {
                        first_error.get_or_insert(status);
                        break;
                    }
                    let got = bytes_completed.min(chunk.len);
                    if self.direction == IoDirection::Read {
                        let start = chunk.buffer_pos as usize;
                        let n = got.min(data.len() as u64) as usize;
                        buffer[start..start + n].copy_from_slice(&data[..n]);
                    }
                    completed += got;
                    if got < chunk.len {
                        break;
                    }
                }

                buffer.truncate(completed as usize);
                let status = if completed == 0 {
                    first_error.unwrap_or(StatusCode::Success)
                } else {
                    StatusCode::Success
                };
                if status.is_success() || completed > 0 {
                    ctx.attr_cache.invalidate(self.target);
                    self.slot.set(IoResult { bytes_completed: completed, data: buffer });
                }
                StepOutcome::Complete(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_range_splits_at_stripe_boundaries() {
        let dist = pvfs_types::distribution::SimpleStripe::new(100);
        let chunks = chunk_range(&dist, 100, 50, 150, 3);
        // [50,100) on dfile 0, [100,200) on dfile 1.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].dfile_idx, 0);
        assert_eq!(chunks[0].len, 50);
        assert_eq!(chunks[1].dfile_idx, 1);
        assert_eq!(chunks[1].len, 100);
    }
}
