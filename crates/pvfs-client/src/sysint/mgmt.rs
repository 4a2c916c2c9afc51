//! Management sysint operations (spec.md §4.1, §4.5.7).
//!
//! [`get_config`] is the one operation that runs before there is any
//! [`crate::config_cache::ConfigCache`] entry for its `fs_id` — it is
//! addressed directly at a caller-supplied bootstrap server rather than
//! through [`crate::config_cache::ConfigCache::pick_meta_server`], and its
//! reply feeds [`crate::config_cache::ConfigCache::reinitialize`] on
//! success. Everything else here is a thin, already-configured wrapper,
//! fanned to an explicit target server rather than a `pick_*` pick.

use pvfs_msg::ops::{
    MgmtGetConfigReply, MgmtGetConfigRequest, MgmtGetUserCertReply, MgmtGetUserCertRequest,
    MgmtIterateHandlesListReply, MgmtIterateHandlesListRequest, MgmtPerfMonListReply, MgmtPerfMonListRequest,
    MgmtSetparamListReply, MgmtSetparamListRequest, MgmtStatfsListReply, MgmtStatfsListRequest, ServerDescriptorWire,
};
use pvfs_msg::wire_sec::WireCredential;
use pvfs_msg::{ReplyBody, RequestBody, StatusCode};
use pvfs_types::{Credential, FsConfig, FsId, Handle, ServerDescriptor, ServerRole};

use crate::context::CoreContext;
use crate::rpc::{MessageArray, RpcPolicy};
use crate::sm::{Resume, SmState, Smcb, StepOutcome};

use super::{next_tag, OpHandle, OutputSlot};

#[derive(Debug, Clone, PartialEq)]
pub struct GetConfigResult {
    pub fs_id: FsId,
}

/// Bootstraps `fs_name`'s [`FsConfig`] from `bootstrap_server` and installs
/// it via [`crate::config_cache::ConfigCache::reinitialize`] on success.
pub fn get_config(ctx: &CoreContext, cred: Credential, bootstrap_server: String, fs_name: String) -> OpHandle<GetConfigResult> {
    let slot = OutputSlot::new();
    let state = GetConfigState { bootstrap_server, fs_name, cred: cred.dup(), slot: slot.clone() };
    let smcb = Smcb::new("sysint:mgmt_get_config", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

struct GetConfigState {
    bootstrap_server: String,
    fs_name: String,
    cred: Credential,
    slot: OutputSlot<GetConfigResult>,
}

fn server_from_wire(w: &ServerDescriptorWire) -> ServerDescriptor {
    ServerDescriptor::new(w.bmi_addr.0.clone(), w.addr_handle, ServerRole::from_bytes([w.role_bits]))
}

impl SmState for GetConfigState {
    fn name(&self) -> &'static str {
        "mgmt:get_config"
    }

    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let mut arr = MessageArray::new(RpcPolicy::default());
                arr.push(
                    self.bootstrap_server.clone(),
                    next_tag(),
                    FsId(0),
                    RequestBody::MgmtGetConfig(MgmtGetConfigRequest {
                        fs_name: self.fs_name.as_str().into(),
                        credential: WireCredential::from(&self.cred),
                    }),
                );
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("get_config posts exactly one pair");
                let reply: MgmtGetConfigReply = match outcome {
                    Ok(ReplyBody::MgmtGetConfig(r)) => r,
                    Ok(_) => return StepOutcome::Complete(StatusCode::EINVAL),
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                if !reply.status.is_success() {
                    return StepOutcome::Complete(reply.status);
                }
                let servers = reply.servers.0.iter().map(server_from_wire).collect();
                let config = FsConfig {
                    fs_id: reply.fs_id,
                    servers,
                    root_handle: reply.root_handle,
                    handle_recycle_timeout_secs: reply.handle_recycle_timeout_secs,
                    default_num_dfiles: reply.default_num_dfiles,
                    default_dirdata_shards: reply.default_dirdata_shards,
                };
                let fs_id = reply.fs_id;
                ctx.config_cache.reinitialize(config);
                self.slot.set(GetConfigResult { fs_id });
                StepOutcome::Complete(StatusCode::Success)
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

pub fn get_user_cert(ctx: &CoreContext, cred: Credential, server: String, fs_id: FsId) -> OpHandle<Vec<u8>> {
    let slot = OutputSlot::new();
    let state = SingleRpcState::new(
        slot.clone(),
        server,
        fs_id,
        RequestBody::MgmtGetUserCert(MgmtGetUserCertRequest { fs_id, credential: WireCredential::from(&cred) }),
        |reply| match reply {
            ReplyBody::MgmtGetUserCert(MgmtGetUserCertReply { status, cert_der }) => (status, Some(cert_der.0)),
            _ => (StatusCode::EINVAL, None),
        },
    );
    let smcb = Smcb::new("sysint:mgmt_get_user_cert", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

pub fn statfs(ctx: &CoreContext, cred: Credential, server: String, fs_id: FsId) -> OpHandle<MgmtStatfsListReply> {
    let slot = OutputSlot::new();
    let state = SingleRpcState::new(
        slot.clone(),
        server,
        fs_id,
        RequestBody::MgmtStatfsList(MgmtStatfsListRequest { fs_id }),
        |reply| match reply {
            ReplyBody::MgmtStatfsList(r) => (r.status, Some(r)),
            _ => (StatusCode::EINVAL, None),
        },
    );
    let smcb = Smcb::new("sysint:mgmt_statfs", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

pub fn perf_mon(ctx: &CoreContext, cred: Credential, server: String, fs_id: FsId, target_server: String, history_count: u32) -> OpHandle<MgmtPerfMonListReply> {
    let slot = OutputSlot::new();
    let state = SingleRpcState::new(
        slot.clone(),
        server,
        fs_id,
        RequestBody::MgmtPerfMonList(MgmtPerfMonListRequest { fs_id, target_server: target_server.as_str().into(), history_count }),
        |reply| match reply {
            ReplyBody::MgmtPerfMonList(r) => (r.status, Some(r)),
            _ => (StatusCode::EINVAL, None),
        },
    );
    let smcb = Smcb::new("sysint:mgmt_perf_mon", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

pub fn iterate_handles(
    ctx: &CoreContext,
    cred: Credential,
    server: String,
    fs_id: FsId,
    target_server: String,
    position: u64,
    count: u32,
) -> OpHandle<MgmtIterateHandlesListReply> {
    let slot = OutputSlot::new();
    let state = SingleRpcState::new(
        slot.clone(),
        server,
        fs_id,
        RequestBody::MgmtIterateHandlesList(MgmtIterateHandlesListRequest { fs_id, target_server: target_server.as_str().into(), position, count }),
        |reply| match reply {
            ReplyBody::MgmtIterateHandlesList(r) => (r.status, Some(r)),
            _ => (StatusCode::EINVAL, None),
        },
    );
    let smcb = Smcb::new("sysint:mgmt_iterate_handles", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

pub fn setparam_list(
    ctx: &CoreContext,
    cred: Credential,
    server: String,
    fs_id: FsId,
    target_servers: Vec<String>,
    param_name: String,
    param_value: i64,
) -> OpHandle<MgmtSetparamListReply> {
    let slot = OutputSlot::new();
    let state = SingleRpcState::new(
        slot.clone(),
        server,
        fs_id,
        RequestBody::MgmtSetparamList(MgmtSetparamListRequest {
            fs_id,
            target_servers: target_servers.into_iter().map(|s| s.as_str().into()).collect::<Vec<_>>().into(),
            param_name: param_name.as_str().into(),
            param_value,
        }),
        |reply| match reply {
            ReplyBody::MgmtSetparamList(r) => (r.status, Some(r)),
            _ => (StatusCode::EINVAL, None),
        },
    );
    let smcb = Smcb::new("sysint:mgmt_setparam_list", cred);
    let op_id = crate::sm::Scheduler::post(ctx, smcb, Box::new(state));
    OpHandle::new(op_id, slot)
}

/// Shared shape for every mgmt op below `get_config` that is one request,
/// one reply, addressed at an already-known server rather than picked from
/// the config cache.
struct SingleRpcState<T> {
    slot: OutputSlot<T>,
    server: String,
    fs_id: FsId,
    request: Option<RequestBody>,
    extract: fn(ReplyBody) -> (StatusCode, Option<T>),
}

impl<T> SingleRpcState<T> {
    fn new(slot: OutputSlot<T>, server: String, fs_id: FsId, request: RequestBody, extract: fn(ReplyBody) -> (StatusCode, Option<T>)) -> Self {
        Self { slot, server, fs_id, request: Some(request), extract }
    }
}

impl<T: Send + 'static> SmState for SingleRpcState<T> {
    fn name(&self) -> &'static str {
        "mgmt:single_rpc"
    }

    fn step(&mut self, resume: Resume, _ctx: &CoreContext) -> StepOutcome {
        match resume {
            Resume::Start => {
                let request = self.request.take().expect("posted exactly once");
                let mut arr = MessageArray::new(RpcPolicy::default());
                arr.push(self.server.clone(), next_tag(), self.fs_id, request);
                StepOutcome::Deferred(arr)
            }
            Resume::Deferred(mut results) => {
                let outcome = results.pop().expect("mgmt op posts exactly one pair");
                let reply = match outcome {
                    Ok(reply) => reply,
                    Err(e) => return StepOutcome::Complete(e.as_status()),
                };
                let (status, value) = (self.extract)(reply);
                if let Some(v) = value {
                    if status.is_success() {
                        self.slot.set(v);
                    }
                }
                StepOutcome::Complete(status)
            }
            Resume::ChildComplete(code) => StepOutcome::Complete(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cred() -> Credential {
        Credential { fs_id: FsId(0), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 0, sig: vec![] }
    }

    #[test]
    fn get_config_against_an_unreachable_bootstrap_server_fails_fast() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let handle = get_config(&ctx, test_cred(), "tcp://does-not-exist:1".to_string(), "orangefs".to_string());
        let (status, result) = handle.wait(&ctx);
        assert_ne!(status, StatusCode::Success);
        assert!(result.is_none());
    }

    #[test]
    fn statfs_against_an_unreachable_server_fails_fast() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let handle = statfs(&ctx, test_cred(), "tcp://does-not-exist:1".to_string(), FsId(1));
        let (status, result) = handle.wait(&ctx);
        assert_ne!(status, StatusCode::Success);
        assert!(result.is_none());
    }
}
