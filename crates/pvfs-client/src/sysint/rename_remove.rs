//! `remove`, `rename` sysint operations (spec.md §4.5.3, §4.5.4).
//!
//! `remove` is a single round trip — the wire-level `RemoveRequest` already
//! fans the dspace-remove out to the metafile and its dfiles server-side
//! (see its doc comment in `pvfs-msg`), so there is no client-driven
//! per-handle removal to sequence here.
//!
//! `rename` is insert-then-remove (`RenameRequest` performs both halves in
//! one call); a crash or failure between the two halves leaves the object
//! linked under both names until the remove half is retried. Per spec.md
//! §9 Open Question #1 (no background scrubber), this client does a
//! bounded number of immediate retries of just the remove half before
//! giving up and surfacing the duplicate-link condition to the caller.

use pvfs_msg::ops::{RemoveReply, RemoveRequest, RenameReply, RenameRequest, RmdirentReply, RmdirentRequest};
use pvfs_msg::wire_sec::WireCapability;
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::cap::OpMask;
use pvfs_types::{Credential, ObjectRef};

use crate::context::CoreContext;
use crate::error::Error;
use crate::rpc::{MessageArray, RpcPolicy};
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::{mint_capability, next_tag, OpHandle, OutputSlot};

/// Bounded immediate retries of the remove half of a partially-completed
/// rename before this client gives up (spec.md §9 Open Question #1).
const RENAME_REMOVE_RETRY_LIMIT: u32 = 3;

pub fn remove(ctx: &CoreContext, cred: Credential, parent: ObjectRef, name: String) -> OpHandle<()> {
    let slot = OutputSlot::new();
    let state = RemoveState { parent, name, cred: cred.dup(), slot: slot.clone() };
    let smcb = Smcb::new("sysint:remove", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

struct RemoveState {
    parent: ObjectRef,
    name: String,
    cred: Credential,
    slot: OutputSlot<()>,
}

impl SmState for RemoveState {
    fn name(&self) -> &'static str {
        "remove:object"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let server = match ctx.config_cache.pick_meta_server(self.parent.fs_id) {
                    Ok(s) => s,
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                let capability = mint_capability(ctx, &self.cred, OpMask::REMOVE, self.parent.handle);
                let mut arr = MessageArray::new(RpcPolicy::default());
                arr.push(
                    server.bmi_addr,
                    next_tag(),
                    self.parent.fs_id,
                    RequestBody::Remove(RemoveRequest {
                        parent: self.parent,
                        name: self.name.as_str().into(),
                        capability: WireCapability::from(&capability),
                    }),
                );
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("remove posts exactly one pair");
                let reply: RemoveReply = match outcome {
                    Ok(ReplyBody::Remove(r)) => r,
                    Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                if reply.status.is_success() {
                    ctx.name_cache.invalidate(self.parent, &self.name);
                    self.slot.set(());
                }
                StepOutcome::Complete(reply.status)
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

pub fn rename(
    ctx: &CoreContext,
    cred: Credential,
    old_parent: ObjectRef,
    old_name: String,
    new_parent: ObjectRef,
    new_name: String,
) -> OpHandle<()> {
    let slot = OutputSlot::new();
    let state = RenameState {
        old_parent,
        old_name,
        new_parent,
        new_name,
        cred: cred.dup(),
        retry_attempts: 0,
        slot: slot.clone(),
    };
    let smcb = Smcb::new("sysint:rename", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

struct RenameState {
    old_parent: ObjectRef,
    old_name: String,
    new_parent: ObjectRef,
    new_name: String,
    cred: Credential,
    retry_attempts: u32,
    slot: OutputSlot<()>,
}

impl RenameState {
    fn post_remove_retry(&self, ctx: &CoreContext) -> Result<MessageArray, StatusCode> {
        let server = ctx.config_cache.pick_meta_server(self.old_parent.fs_id).map_err(|e| e.as_status())?;
        let capability = mint_capability(ctx, &self.cred, OpMask::RMDIRENT, self.old_parent.handle);
        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push(
            server.bmi_addr,
            next_tag(),
            self.old_parent.fs_id,
            RequestBody::Rmdirent(RmdirentRequest {
                parent: self.old_parent,
                name: self.old_name.as_str().into(),
                capability: WireCapability::from(&capability),
            }),
        );
        Ok(arr)
    }
}

impl SmState for RenameState {
    fn name(&self) -> &'static str {
        "rename:insert_then_remove"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let server = match ctx.config_cache.pick_meta_server(self.old_parent.fs_id) {
                    Ok(s) => s,
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                let capability = mint_capability(ctx, &self.cred, OpMask::RENAME, self.old_parent.handle);
                let mut arr = MessageArray::new(RpcPolicy::default());
                arr.push(
                    server.bmi_addr,
                    next_tag(),
                    self.old_parent.fs_id,
                    RequestBody::Rename(RenameRequest {
                        old_parent: self.old_parent,
                        old_name: self.old_name.as_str().into(),
                        new_parent: self.new_parent,
                        new_name: self.new_name.as_str().into(),
                        capability: WireCapability::from(&capability),
                    }),
                );
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(mut results) => {
                // The retry branch reuses this same arm shape (one pair,
                // one reply) but against `RmdirentReply` instead.
                let outcome = results.pop().expect("rename/retry posts exactly one pair");
                if self.retry_attempts == 0 {
                    let reply: RenameReply = match outcome {
                        Ok(ReplyBody::Rename(r)) => r,
                        Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                        Err(e) => return StepOutcome::Complete(e.as_status()),
                    };
                    if !reply.status.is_success() && !reply.insert_done {
                        return StepOutcome::Complete(reply.status);
                    }
                    ctx.name_cache.invalidate(self.new_parent, &self.new_name);
                    if reply.remove_done {
                        ctx.name_cache.invalidate(self.old_parent, &self.old_name);
                        self.slot.set(());
                        return StepOutcome::Complete(StatusCode::Success);
                    }
                    // Insert succeeded, remove half didn't: retry just the
                    // remove.
                    self.retry_attempts = 1;
                    return match self.post_remove_retry(ctx) {
                        Ok(arr) => StepOutcome::Deferred(arr),
                        Err(status) => StepOutcome::Complete(status),
                    };
                }

                let reply: RmdirentReply = match outcome {
                    Ok(ReplyBody::Rmdirent(r)) => r,
                    Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                if reply.status.is_success() {
                    ctx.name_cache.invalidate(self.old_parent, &self.old_name);
                    self.slot.set(());
                    return StepOutcome::Complete(StatusCode::Success);
                }
                if self.retry_attempts < RENAME_REMOVE_RETRY_LIMIT {
                    self.retry_attempts += 1;
                    return match self.post_remove_retry(ctx) {
                        Ok(arr) => StepOutcome::Deferred(arr),
                        Err(status) => StepOutcome::Complete(status),
                    };
                }
                let dup = Error::RenameDuplicateLink(self.old_name.clone());
                log::error!(
                    "rename: {} linked under both {}/{} and {}/{} after exhausting remove retries: {dup}",
                    self.old_name, self.old_parent, self.old_name, self.new_parent, self.new_name
                );
                StepOutcome::Complete(StatusCode::EALREADY)
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::{FsId, Handle};

    fn test_cred() -> Credential {
        Credential { fs_id: FsId(1), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 0, sig: vec![] }
    }

    #[test]
    fn remove_without_a_reachable_server_fails_fast() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let parent = ObjectRef::new(Handle(1), FsId(1));
        let handle = remove(&ctx, test_cred(), parent, "a.txt".to_string());
        let (status, result) = handle.wait(&ctx);
        assert_ne!(status, StatusCode::Success);
        assert!(result.is_none());
    }

    #[test]
    fn rename_without_a_reachable_server_fails_fast() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let old_parent = ObjectRef::new(Handle(1), FsId(1));
        let new_parent = ObjectRef::new(Handle(2), FsId(1));
        let handle = rename(&ctx, test_cred(), old_parent, "a".to_string(), new_parent, "b".to_string());
        let (status, result) = handle.wait(&ctx);
        assert_ne!(status, StatusCode::Success);
        assert!(result.is_none());
    }
}
