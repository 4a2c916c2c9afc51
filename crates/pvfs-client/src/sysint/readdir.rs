//! `readdir` sysint operation — cross-shard directory listing (spec.md
//! §4.5.6).
//!
//! One round trip per call; the caller drives repeated calls with the
//! previous reply's `next_token` until [`ReaddirResult::next_token`] comes
//! back empty, matching the opaque per-shard continuation token
//! [`pvfs_msg::ops::ReaddirRequest`] documents.

use pvfs_msg::ops::{ReaddirReply, ReaddirRequest};
use pvfs_msg::wire_sec::WireCapability;
use pvfs_msg::wire_util::WireBytes;
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::cap::OpMask;
use pvfs_types::{Credential, DirEntry, ObjectRef};

use crate::context::CoreContext;
use crate::rpc::{MessageArray, RpcPolicy};
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::{mint_capability, next_tag, OpHandle, OutputSlot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaddirResult {
    pub entries: Vec<DirEntry>,
    pub next_token: Vec<u8>,
}

pub fn readdir(ctx: &CoreContext, cred: Credential, directory: ObjectRef, token: Vec<u8>, count: u32) -> OpHandle<ReaddirResult> {
    let slot = OutputSlot::new();
    let state = ReaddirState { directory, token, count, cred: cred.dup(), slot: slot.clone() };
    let smcb = Smcb::new("sysint:readdir", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

struct ReaddirState {
    directory: ObjectRef,
    token: Vec<u8>,
    count: u32,
    cred: Credential,
    slot: OutputSlot<ReaddirResult>,
}

impl SmState for ReaddirState {
    fn name(&self) -> &'static str {
        "readdir:list"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let server = match ctx.config_cache.pick_meta_server(self.directory.fs_id) {
                    Ok(s) => s,
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                let capability = mint_capability(ctx, &self.cred, OpMask::READDIR, self.directory.handle);
                let mut arr = MessageArray::new(RpcPolicy::default());
                arr.push(
                    server.bmi_addr,
                    next_tag(),
                    self.directory.fs_id,
                    RequestBody::Readdir(ReaddirRequest {
                        directory: self.directory,
                        token: WireBytes(self.token.clone()),
                        count: self.count,
                        capability: WireCapability::from(&capability),
                    }),
                );
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("readdir posts exactly one pair");
                let reply: ReaddirReply = match outcome {
                    Ok(ReplyBody::Readdir(r)) => r,
                    Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                if !reply.status.is_success() {
                    return StepOutcome::Complete(reply.status);
                }
                let entries = reply
                    .entries
                    .0
                    .into_iter()
                    .filter_map(|e| DirEntry::new(e.name.0, e.handle).ok())
                    .collect();
                self.slot.set(ReaddirResult { entries, next_token: reply.next_token.0 });
                StepOutcome::Complete(StatusCode::Success)
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::{FsId, Handle};

    #[test]
    fn readdir_without_a_reachable_server_fails_fast() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let cred = Credential { fs_id: FsId(1), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 0, sig: vec![] };
        let directory = ObjectRef::new(Handle(1), FsId(1));
        let handle = readdir(&ctx, cred, directory, Vec::new(), 32);
        let (status, result) = handle.wait(&ctx);
        assert_ne!(status, StatusCode::Success);
        assert!(result.is_none());
    }
}
