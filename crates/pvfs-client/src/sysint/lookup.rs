//! `lookup_path` sysint operation (spec.md §4.5.1).
//!
//! Cache-first: a path this client has already walked resolves entirely
//! out of [`crate::cache::NameCache`]/[`crate::cache::AttrCache`] without a
//! round trip. A miss falls through to a single [`LookupPathRequest`]
//! against a metadata server, which may itself stop short of the full path
//! if it hits a symlink — the state restarts the walk from the link target
//! in that case, up to [`MAX_LOOKUP_CONTEXTS`] times.

use std::time::{Duration, Instant};

use pvfs_msg::ops::{LookupPathReply, LookupPathRequest};
use pvfs_msg::wire_sec::WireCredential;
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::{AttrMask, Credential, ObjectAttributes, ObjectRef, ObjectType};

use crate::context::CoreContext;
use crate::rpc::{MessageArray, RpcPolicy};
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::{next_tag, OpHandle, OutputSlot};

/// A path is rejected outright past this many segments (spec.md §4.5.1
/// step 1, bounding pathological input before any server round trip).
pub const MAX_LOOKUP_SEGMENTS: usize = 64;

/// Symlink restarts permitted before a lookup gives up with `ELOOP`
/// (spec.md §4.5.1 step 5 "symlink loop detection").
pub const MAX_LOOKUP_CONTEXTS: u32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub resolved: ObjectRef,
    pub attrs: ObjectAttributes,
}

/// Controls terminal-segment behavior only (spec.md §4.5.1 step 3); a
/// symlink anywhere earlier in the path is always followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowLink {
    Follow,
    NoFollow,
}

pub fn lookup(
    ctx: &CoreContext,
    cred: Credential,
    parent: ObjectRef,
    path: String,
    attr_mask: AttrMask,
) -> Result<OpHandle<LookupResult>, crate::error::Error> {
    lookup_with_link_policy(ctx, cred, parent, path, attr_mask, FollowLink::Follow)
}

pub fn lookup_with_link_policy(
    ctx: &CoreContext,
    cred: Credential,
    parent: ObjectRef,
    path: String,
    attr_mask: AttrMask,
    follow_link: FollowLink,
) -> Result<OpHandle<LookupResult>, crate::error::Error> {
    let segs = pvfs_types::path::segments(&path)?;
    if segs.len() > MAX_LOOKUP_SEGMENTS {
        return Err(crate::error::Error::Path(pvfs_types::PvfsTypeError::SegmentTooLong {
            max: MAX_LOOKUP_SEGMENTS,
        }));
    }
    let normalized = pvfs_types::path::normalize(&path)?;
    let slot = OutputSlot::new();
    let state = LookupState {
        parent,
        path: normalized,
        attr_mask,
        follow_link,
        contexts_used: 0,
        cred: cred.dup(),
        slot: slot.clone(),
    };
    let smcb = Smcb::new("sysint:lookup", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    Ok(OpHandle::new(op_id, slot))
}

struct LookupState {
    parent: ObjectRef,
    path: String,
    attr_mask: AttrMask,
    follow_link: FollowLink,
    contexts_used: u32,
    cred: Credential,
    slot: OutputSlot<LookupResult>,
}

impl LookupState {
    fn cache_resolve(&self, ctx: &CoreContext) -> Option<(ObjectRef, ObjectAttributes)> {
        let now = Instant::now();
        let resolved = ctx.name_cache.get(self.parent, &self.path, now)?;
        let attrs = ctx.attr_cache.get(resolved, self.attr_mask, now)?;
        Some((resolved, attrs))
    }

    fn post_lookup(&self, ctx: &CoreContext) -> Result<MessageArray, StatusCode> {
        let fs_id = self.parent.fs_id;
        let server = ctx.config_cache.pick_meta_server(fs_id).map_err(|e| e.as_status())?;
        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push(
            server.bmi_addr,
            next_tag(),
            fs_id,
            RequestBody::LookupPath(LookupPathRequest {
                parent: self.parent,
                path: self.path.as_str().into(),
                credential: WireCredential::from(&self.cred),
                attr_mask: self.attr_mask.bits(),
            }),
        );
        Ok(arr)
    }
}

impl SmState for LookupState {
    fn name(&self) -> &'static str {
        "lookup:resolve"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                if let Some((resolved, attrs)) = self.cache_resolve(ctx) {
                    self.slot.set(LookupResult { resolved, attrs });
                    return StepOutcome::Complete(StatusCode::Success);
                }
                match self.post_lookup(ctx) {
                    Ok(arr) => StepOutcome::Deferred(arr),
                    Err(status) => StepOutcome::Complete(status),
                }
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("lookup posts exactly one pair");
                let reply: LookupPathReply = match outcome {
                    Ok(ReplyBody::LookupPath(r)) => r,
                    Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                if !reply.status.is_success() {
                    return StepOutcome::Complete(reply.status);
                }

                let attrs = ObjectAttributes::from(&reply.attrs);
                if let Ok(timeout) = ctx.config_cache.handle_recycle_timeout_secs(self.parent.fs_id) {
                    let now = Instant::now();
                    ctx.attr_cache.put(reply.resolved, attrs.clone(), Duration::from_secs(timeout), now);
                    ctx.name_cache.put(self.parent, &self.path, reply.resolved, Duration::from_secs(timeout), now);
                }

                let full_segment_count = pvfs_types::path::segments(&self.path).unwrap_or_default().len() as u32;
                let stopped_short = reply.segments_resolved < full_segment_count;
                let terminal_is_symlink = !stopped_short && attrs.objtype == Some(ObjectType::Symlink);
                if !stopped_short && !(terminal_is_symlink && self.follow_link == FollowLink::Follow) {
                    self.slot.set(LookupResult { resolved: reply.resolved, attrs });
                    return StepOutcome::Complete(StatusCode::Success);
                }

                // Either the server stopped short of the full path, or the
                // terminal segment itself is a symlink this caller asked
                // to follow: only a symlink with a recorded target is
                // recoverable either way.
                if attrs.objtype != Some(ObjectType::Symlink) {
                    return StepOutcome::Complete(StatusCode::ENOENT);
                }
                let Some(target) = attrs.link_target.clone() else {
                    return StepOutcome::Complete(StatusCode::ENOENT);
                };
                if self.contexts_used + 1 >= MAX_LOOKUP_CONTEXTS {
                    return StepOutcome::Complete(StatusCode::ELOOP);
                }
                self.contexts_used += 1;

                let remaining_segs = pvfs_types::path::segments(&self.path).unwrap_or_default();
                let unresolved = &remaining_segs[reply.segments_resolved as usize..];
                let mut rebuilt = target;
                for seg in unresolved {
                    rebuilt.push('/');
                    rebuilt.push_str(seg);
                }
                self.path = match pvfs_types::path::normalize(&rebuilt) {
                    Ok(p) => p,
                    Err(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                };
                // Symlink targets are resolved from the filesystem root
                // (spec.md §4.5.1 step 5): this client does not track a
                // per-process current-working-directory context.
                self.parent = ObjectRef::new(
                    ctx.config_cache.get_root_handle(self.parent.fs_id).unwrap_or(self.parent.handle),
                    self.parent.fs_id,
                );

                match self.post_lookup(ctx) {
                    Ok(arr) => StepOutcome::Deferred(arr),
                    Err(status) => StepOutcome::Complete(status),
                }
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
    fn oversized_path_is_rejected_before_any_rpc() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let huge = (0..MAX_LOOKUP_SEGMENTS + 1).map(|i| format!("/{i}")).collect::<String>();
        let err = lookup(&ctx, test_cred(), ObjectRef::new(pvfs_types::Handle(1), FsId(1)), huge, AttrMask::empty());
        assert!(err.is_err());
    }

    #[test]
    fn no_follow_returns_the_symlink_itself_at_the_terminal_segment() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let parent = ObjectRef::new(pvfs_types::Handle(1), FsId(1));
        let symlink_ref = ObjectRef::new(pvfs_types::Handle(2), FsId(1));
        let slot = OutputSlot::new();
        let mut state = LookupState {
            parent,
            path: "/link".to_string(),
            attr_mask: AttrMask::empty(),
            follow_link: FollowLink::NoFollow,
            contexts_used: 0,
            cred: test_cred(),
            slot: slot.clone(),
        };

        let mut attrs = ObjectAttributes::empty();
        attrs.mask = AttrMask::OBJTYPE | AttrMask::LINK_TARGET;
        attrs.objtype = Some(ObjectType::Symlink);
        attrs.link_target = Some("/target".to_string());
        let reply = LookupPathReply {
            status: StatusCode::Success,
            resolved: symlink_ref,
            segments_resolved: 1,
            attrs: pvfs_msg::wire_attr::WireObjectAttributes::from(&attrs),
        };
        let outcome = state.step(Resume::Deferred(vec![Ok(ReplyBody::LookupPath(reply))]), &ctx);
        match outcome {
            StepOutcome::Complete(status) => assert_eq!(status, StatusCode::Success),
            _ => panic!("expected the no-follow lookup to complete immediately"),
        }
        let result = slot.take().expect("result populated");
        assert_eq!(result.resolved, symlink_ref, "no-follow lookup must return the symlink object itself");
    }

    #[test]
    fn cache_hit_resolves_without_posting_an_rpc() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let parent = ObjectRef::new(pvfs_types::Handle(1), FsId(1));
        let child = ObjectRef::new(pvfs_types::Handle(2), FsId(1));
        let now = Instant::now();
        let mut attrs = ObjectAttributes::empty();
        attrs.mask = AttrMask::OWNER;
        ctx.name_cache.put(parent, "/foo", child, Duration::from_secs(30), now);
        ctx.attr_cache.put(child, attrs, Duration::from_secs(30), now);

        let handle = lookup(&ctx, test_cred(), parent, "/foo".to_string(), AttrMask::OWNER).unwrap();
        let (status, result) = handle.wait(&ctx);
        assert_eq!(status, StatusCode::Success);
        assert_eq!(result.unwrap().resolved, child);
    }
}
