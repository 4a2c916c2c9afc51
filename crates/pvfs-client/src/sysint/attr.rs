//! `getattr`/`setattr` sysint operations (spec.md §4.5.5).
//!
//! [`GetattrState`] is written to be pushed as a nested child frame (e.g.
//! from [`crate::sysint::lookup`] when a cache hit resolves the path but
//! can't satisfy the caller's requested mask) as well as posted directly
//! as a root operation.

use std::time::{Duration, Instant};

use pvfs_msg::ops::{GetattrReply, GetattrRequest, SetattrReply, SetattrRequest};
use pvfs_msg::wire_attr::WireObjectAttributes;
use pvfs_msg::wire_sec::WireCapability;
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::cap::OpMask;
use pvfs_types::{AttrMask, Capability, Credential, ObjectAttributes, ObjectRef, ObjectType};

use crate::context::CoreContext;
use crate::rpc::{MessageArray, RpcPolicy};
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::{mint_capability, next_tag, OpHandle, OutputSlot};

pub fn getattr(
    ctx: &CoreContext,
    cred: Credential,
    target: ObjectRef,
    requested_mask: AttrMask,
) -> OpHandle<ObjectAttributes> {
    let slot = OutputSlot::new();
    let state = GetattrState::new(target, requested_mask, cred.dup(), slot.clone());
    let smcb = Smcb::new("sysint:getattr", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

pub fn setattr(ctx: &CoreContext, cred: Credential, target: ObjectRef, attrs: ObjectAttributes) -> OpHandle<()> {
    let slot = OutputSlot::new();
    let state = SetattrState { target, attrs, cred: cred.dup(), slot: slot.clone() };
    let smcb = Smcb::new("sysint:setattr", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

enum GetattrPhase {
    Fetch,
    /// Fanning size out across dfiles: one [`GetattrRequest`] per dfile,
    /// summed into `attrs.size` (spec.md §4.5.5 step 3, mirrored in
    /// `GetattrReply`'s doc comment in `pvfs-msg`).
    SizeFanout { base: ObjectAttributes },
}

pub(crate) struct GetattrState {
    target: ObjectRef,
    requested_mask: AttrMask,
    cred: Credential,
    phase: GetattrPhase,
    slot: OutputSlot<ObjectAttributes>,
}

impl GetattrState {
    pub(crate) fn new(target: ObjectRef, requested_mask: AttrMask, cred: Credential, slot: OutputSlot<ObjectAttributes>) -> Self {
        Self { target, requested_mask, cred, phase: GetattrPhase::Fetch, slot }
    }

    fn capability(&self, ctx: &CoreContext) -> Capability {
        mint_capability(ctx, &self.cred, OpMask::GETATTR, self.target.handle)
    }

    fn post_getattr(&self, ctx: &CoreContext, target: ObjectRef, mask: AttrMask) -> Result<MessageArray, StatusCode> {
        let server = ctx.config_cache.pick_meta_server(target.fs_id).map_err(|e| e.as_status())?;
        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push(
            server.bmi_addr,
            next_tag(),
            target.fs_id,
            RequestBody::Getattr(GetattrRequest {
                target,
                requested_mask: mask.bits(),
                capability: WireCapability::from(&self.capability(ctx)),
            }),
        );
        Ok(arr)
    }
}

impl SmState for GetattrState {
    fn name(&self) -> &'static str {
        "attr:getattr"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let now = Instant::now();
                if let Some(cached) = ctx.attr_cache.get(self.target, self.requested_mask, now) {
                    self.slot.set(cached);
                    return StepOutcome::Complete(StatusCode::Success);
                }
                match self.post_getattr(ctx, self.target, self.requested_mask | AttrMask::COMMON | AttrMask::OBJTYPE) {
                    Ok(arr) => StepOutcome::Deferred(arr),
                    Err(status) => StepOutcome::Complete(status),
                }
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("getattr posts exactly one pair");
                match &mut self.phase {
                    GetattrPhase::Fetch => {
                        let reply: GetattrReply = match outcome {
                            Ok(ReplyBody::Getattr(r)) => r,
                            Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                            Err(e) => return StepOutcome::Complete(e.as_status()),
                        };
                        if !reply.status.is_success() {
                            return StepOutcome::Complete(reply.status);
                        }
                        let attrs = ObjectAttributes::from(&reply.attrs);
                        let needs_size_fanout = self.requested_mask.contains(AttrMask::SIZE)
                            && attrs.objtype == Some(ObjectType::Metafile)
                            && !attrs.dfile_sids.is_empty();
                        if !needs_size_fanout {
                            self.cache_and_complete(ctx, attrs);
                            return StepOutcome::Complete(StatusCode::Success);
                        }
                        self.phase = GetattrPhase::SizeFanout { base: attrs.clone() };
                        let mut arr = MessageArray::new(RpcPolicy::default());
                        for (handle, sid) in attrs.dfile_handles.iter().zip(attrs.dfile_sids.iter()) {
                            arr.push(
                                sid.clone(),
                                next_tag(),
                                self.target.fs_id,
                                RequestBody::Getattr(GetattrRequest {
                                    target: ObjectRef::new(*handle, self.target.fs_id),
                                    requested_mask: AttrMask::SIZE.bits(),
                                    capability: WireCapability::from(&self.capability(ctx)),
                                }),
                            );
                        }
                        StepOutcome::Deferred(arr)
                    }
                    GetattrPhase::SizeFanout { base } => {
                        let mut total_size = 0u64;
                        for r in std::mem::take(&mut results) {
                            match r {
                                Ok(ReplyBody::Getattr(reply)) if reply.status.is_success() => {
                                    total_size += reply.attrs.size;
                                }
                                // A dfile that can't report size contributes
                                // nothing rather than failing the whole
                                // getattr; the reported size is a best
                                // effort lower bound.
                                _ => {}
                            }
                        }
                        let mut attrs = base.clone();
                        attrs.size = total_size;
                        attrs.mask |= AttrMask::SIZE;
                        self.cache_and_complete(ctx, attrs);
                        StepOutcome::Complete(StatusCode::Success)
                    }
                }
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

impl GetattrState {
    fn cache_and_complete(&self, ctx: &CoreContext, attrs: ObjectAttributes) {
        if let Ok(timeout) = ctx.config_cache.handle_recycle_timeout_secs(self.target.fs_id) {
            ctx.attr_cache.put(self.target, attrs.clone(), Duration::from_secs(timeout), Instant::now());
        }
        self.slot.set(attrs);
    }
}

struct SetattrState {
    target: ObjectRef,
    attrs: ObjectAttributes,
    cred: Credential,
    slot: OutputSlot<()>,
}

impl SmState for SetattrState {
    fn name(&self) -> &'static str {
        "attr:setattr"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let server = match ctx.config_cache.pick_meta_server(self.target.fs_id) {
                    Ok(s) => s,
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                let cap = mint_capability(ctx, &self.cred, OpMask::SETATTR, self.target.handle);
                let mut arr = MessageArray::new(RpcPolicy::default());
                arr.push(
                    server.bmi_addr,
                    next_tag(),
                    self.target.fs_id,
                    RequestBody::Setattr(SetattrRequest {
                        target: self.target,
                        attrs: WireObjectAttributes::from(&self.attrs),
                        capability: WireCapability::from(&cap),
                    }),
                );
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("setattr posts exactly one pair");
                let reply: SetattrReply = match outcome {
                    Ok(ReplyBody::Setattr(r)) => r,
                    Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                if reply.status.is_success() {
                    ctx.attr_cache.invalidate(self.target);
                    self.slot.set(());
                }
                StepOutcome::Complete(reply.status)
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::FsId;

    fn test_cred() -> Credential {
        Credential { fs_id: FsId(1), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 0, sig: vec![] }
    }

    #[test]
    fn getattr_serves_from_cache_without_an_rpc() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let target = ObjectRef::new(pvfs_types::Handle(1), FsId(1));
        let mut attrs = ObjectAttributes::empty();
        attrs.mask = AttrMask::OWNER;
        attrs.owner = 42;
        ctx.attr_cache.put(target, attrs, Duration::from_secs(30), Instant::now());

        let handle = getattr(&ctx, test_cred(), target, AttrMask::OWNER);
        let (status, result) = handle.wait(&ctx);
        assert_eq!(status, StatusCode::Success);
        assert_eq!(result.unwrap().owner, 42);
    }
}
