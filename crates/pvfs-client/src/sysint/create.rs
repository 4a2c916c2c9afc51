//! `create`, `mkdir`, `symlink` sysint operations (spec.md §4.5.2).
//!
//! Each creates its object with one RPC, then links it into `parent` with
//! a [`CrdirentRequest`]. `CreateReply`/`MkdirReply`/`SymlinkReply` already
//! bundle metafile+datafile (or dirdata) creation server-side, so there is
//! no client-driven per-dfile creation fan-out to coordinate here — the
//! two-step shape this state machine keeps is create-then-link, so a
//! caller can retry just the link half if only it failed.
//!
//! A failure during the link step after create has already succeeded
//! leaves an orphaned, unreachable object on the servers: there is no
//! dspace-remove op code this client can issue against an object with no
//! dirent naming it (see [`crate::error::Error::OrphanedRollback`]). This
//! mirrors upstream PVFS2, which relies on its offline `pvfs2-fsck` tool to
//! reclaim exactly this kind of orphan rather than rolling back inline.

use std::time::{Duration, Instant};

use pvfs_msg::ops::{CreateReply, CreateRequest, CrdirentReply, CrdirentRequest, MkdirReply, MkdirRequest, SymlinkReply, SymlinkRequest};
use pvfs_msg::wire_sec::{WireCapability, WireCredential};
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::cap::OpMask;
use pvfs_types::{Capability, Credential, FsId, Handle, ObjectAttributes, ObjectRef};

use crate::context::CoreContext;
use crate::error::Error;
use crate::rpc::{MessageArray, RpcPolicy};
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::{next_tag, OpHandle, OutputSlot};

pub struct NewFileParams {
    pub requested_num_dfiles: u32,
    pub dist_name: String,
    pub dist_strip_size: u64,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
}

pub fn create_file(
    ctx: &CoreContext,
    cred: Credential,
    parent: ObjectRef,
    name: String,
    params: NewFileParams,
) -> OpHandle<ObjectRef> {
    post(ctx, cred, parent, name, CreateKind::File(params))
}

pub struct NewDirParams {
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
    /// `0` uses the fs default (spec.md §4.5.2 step 2 analogue for
    /// directories: `ConfigCache::default_dirdata_shards`).
    pub dirdata_shards: u32,
}

pub fn mkdir(ctx: &CoreContext, cred: Credential, parent: ObjectRef, name: String, params: NewDirParams) -> OpHandle<ObjectRef> {
    post(ctx, cred, parent, name, CreateKind::Dir(params))
}

pub struct NewSymlinkParams {
    pub target: String,
    pub owner: u32,
    pub group: u32,
    pub perms: u32,
}

pub fn symlink(ctx: &CoreContext, cred: Credential, parent: ObjectRef, name: String, params: NewSymlinkParams) -> OpHandle<ObjectRef> {
    post(ctx, cred, parent, name, CreateKind::Symlink(params))
}

fn post(ctx: &CoreContext, cred: Credential, parent: ObjectRef, name: String, kind: CreateKind) -> OpHandle<ObjectRef> {
    let slot = OutputSlot::new();
    let state = CreateState { parent, name, kind, cred: cred.dup(), phase: CreatePhase::AwaitCreate, slot: slot.clone() };
    let smcb = Smcb::new("sysint:create", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

enum CreateKind {
    File(NewFileParams),
    Dir(NewDirParams),
    Symlink(NewSymlinkParams),
}

enum CreatePhase {
    AwaitCreate,
    AwaitLink { created: ObjectRef, capability: Capability },
}

struct CreateState {
    parent: ObjectRef,
    name: String,
    kind: CreateKind,
    cred: Credential,
    phase: CreatePhase,
    slot: OutputSlot<ObjectRef>,
}

impl CreateState {
    fn fs_id(&self) -> FsId {
        self.parent.fs_id
    }

    fn post_create(&self, ctx: &CoreContext) -> Result<MessageArray, StatusCode> {
        let server = ctx.config_cache.pick_meta_server(self.fs_id()).map_err(|e| e.as_status())?;
        let fs_id = self.fs_id();
        let request = match &self.kind {
            CreateKind::File(p) => RequestBody::Create(CreateRequest {
                fs_id,
                requested_num_dfiles: p.requested_num_dfiles,
                dist_name: p.dist_name.as_str().into(),
                dist_strip_size: p.dist_strip_size,
                owner: p.owner,
                group: p.group,
                perms: p.perms,
                credential: WireCredential::from(&self.cred),
            }),
            CreateKind::Dir(p) => {
                let shards = if p.dirdata_shards == 0 {
                    ctx.config_cache.default_dirdata_shards(fs_id).unwrap_or(1)
                } else {
                    p.dirdata_shards
                };
                RequestBody::Mkdir(MkdirRequest {
                    fs_id,
                    owner: p.owner,
                    group: p.group,
                    perms: p.perms,
                    dirdata_shards: shards,
                    credential: WireCredential::from(&self.cred),
                })
            }
            CreateKind::Symlink(p) => RequestBody::Symlink(SymlinkRequest {
                fs_id,
                target: p.target.as_str().into(),
                owner: p.owner,
                group: p.group,
                perms: p.perms,
                credential: WireCredential::from(&self.cred),
            }),
        };
        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push(server.bmi_addr, next_tag(), fs_id, request);
        Ok(arr)
    }

    fn post_crdirent(&self, ctx: &CoreContext, created: ObjectRef, capability: &Capability) -> Result<MessageArray, StatusCode> {
        let server = ctx.config_cache.pick_meta_server(self.fs_id()).map_err(|e| e.as_status())?;
        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push(
            server.bmi_addr,
            next_tag(),
            self.fs_id(),
            RequestBody::Crdirent(CrdirentRequest {
                parent: self.parent,
                name: self.name.as_str().into(),
                target: created,
                capability: WireCapability::from(capability),
            }),
        );
        Ok(arr)
    }
}

impl SmState for CreateState {
    fn name(&self) -> &'static str {
        "create:object"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => match self.post_create(ctx) {
                Ok(arr) => StepOutcome::Deferred(arr),
                Err(status) => StepOutcome::Complete(status),
            },
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("create/link posts exactly one pair");
                match &self.phase {
                    CreatePhase::AwaitCreate => {
                        let (status, created, capability) = match (outcome, &self.kind) {
                            (Ok(ReplyBody::Create(CreateReply { status, metafile, capability, .. })), CreateKind::File(_)) => {
                                (status, metafile, Capability::from(&capability))
                            }
                            (Ok(ReplyBody::Mkdir(MkdirReply { status, directory, capability, .. })), CreateKind::Dir(_)) => {
                                (status, directory, Capability::from(&capability))
                            }
                            (Ok(ReplyBody::Symlink(SymlinkReply { status, symlink, capability })), CreateKind::Symlink(_)) => {
                                (status, symlink, Capability::from(&capability))
                            }
                            (Ok(_), _) => return StepOutcome::Complete(StatusCode::EINVAL),
                            (Err(e), _) => return StepOutcome::Complete(e.as_status()),
                        };
                        if !status.is_success() {
                            return StepOutcome::Complete(status);
                        }
                        self.phase = CreatePhase::AwaitLink { created, capability: capability.clone() };
                        match self.post_crdirent(ctx, created, &capability) {
                            Ok(arr) => StepOutcome::Deferred(arr),
                            Err(status) => StepOutcome::Complete(status),
                        }
                    }
                    CreatePhase::AwaitLink { created, .. } => {
                        let reply: CrdirentReply = match outcome {
                            Ok(ReplyBody::Crdirent(r)) => r,
                            Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                            Err(e) => {
                                let orphan = Error::OrphanedRollback { op: "create", detail: e.to_string() };
                                log::error!("create: object {created} orphaned: {orphan}");
                                return StepOutcome::Complete(e.as_status());
                            }
                        };
                        if reply.status.is_success() {
                            ctx.name_cache.invalidate(self.parent, &self.name);
                            self.slot.set(*created);
                        } else {
                            log::error!(
                                "create: object {created} created but link of {:?} under {} failed: {:?}",
                                self.name, self.parent, reply.status
                            );
                        }
                        StepOutcome::Complete(reply.status)
                    }
                }
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

/// Populates the create-time initial attribute record passed to a caller
/// that wants to seed its attribute cache without a follow-up getattr.
/// Not wired to any wire reply directly (none of `create`/`mkdir`/`symlink`
/// returns a full attribute record) — left available for callers that
/// already know the fields they set at creation time.
pub fn seed_attrs(owner: u32, group: u32, perms: u32) -> ObjectAttributes {
    let mut attrs = ObjectAttributes::empty();
    attrs.mask = pvfs_types::AttrMask::OWNER | pvfs_types::AttrMask::GROUP | pvfs_types::AttrMask::PERMS;
    attrs.owner = owner;
    attrs.group = group;
    attrs.perms = perms;
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::FsId;

    fn test_cred() -> Credential {
        Credential { fs_id: FsId(1), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 0, sig: vec![] }
    }

    #[test]
    fn seed_attrs_sets_requested_mask_only() {
        let attrs = seed_attrs(1, 2, 0o644);
        assert!(attrs.satisfies(pvfs_types::AttrMask::OWNER | pvfs_types::AttrMask::GROUP | pvfs_types::AttrMask::PERMS));
        assert!(!attrs.satisfies(pvfs_types::AttrMask::SIZE));
    }

    #[test]
    fn create_file_without_a_reachable_server_fails_fast() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let parent = ObjectRef::new(Handle(1), FsId(1));
        let handle = create_file(
            &ctx,
            test_cred(),
            parent,
            "a.txt".to_string(),
            NewFileParams { requested_num_dfiles: 0, dist_name: "simple_stripe".to_string(), dist_strip_size: 65536, owner: 0, group: 0, perms: 0o644 },
        );
        let (status, result) = handle.wait(&ctx);
        assert_ne!(status, StatusCode::Success);
        assert!(result.is_none());
    }
}
