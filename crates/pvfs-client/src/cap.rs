//! Capability/Credential Module — C2.
//!
//! [`pvfs_types::cap::Capability`] models the shape and the structural
//! checks (expiry, fs/op/handle scope); this module adds the signing step
//! spec.md §4.2 requires but that a pure data-model crate has no business
//! performing — it needs a [`crate::signing::SigningBackend`], which lives
//! on [`crate::context::CoreContext`].
//!
//! Reference: spec.md §4.2, §8 "Capability duplication is deep"/"Null
//! capability predicate".

use binrw::BinWrite;
use pvfs_msg::wire_sec::WireCapability;
use pvfs_types::cap::{CapVerifyError, OpMask, ServerAlias};
use pvfs_types::{Capability, FsId, Handle};

use crate::context::CoreContext;

/// The bytes a signature covers: every field of the capability except the
/// signature itself, in the same canonical wire order the server would see
/// it on the network (spec.md §3 "Signature covers all other fields").
fn signable_bytes(cap: &Capability) -> Vec<u8> {
    let mut unsigned = cap.dup();
    unsigned.sig.clear();
    let wire = WireCapability::from(&unsigned);
    let mut buf = binrw::io::Cursor::new(Vec::new());
    wire.write_le(&mut buf).expect("in-memory write cannot fail");
    buf.into_inner()
}

/// Server-side constructor (spec.md §4.2 "new_capability(issuer, fs_id,
/// op_mask, handles, ttl) -> Cap (server-side)"). Modeled here too since
/// this client core also plays the issuing role for capabilities it mints
/// on behalf of tests and the mgmt/bootstrap path — a real PVFS client
/// never mints capabilities for production use, but the contract is
/// identical either side of the wire.
pub fn new_capability(
    ctx: &CoreContext,
    issuer: ServerAlias,
    fs_id: FsId,
    op_mask: OpMask,
    handles: Vec<Handle>,
    ttl_secs: u64,
    now_unix: u64,
) -> Capability {
    let mut cap = Capability {
        issuer,
        fs_id,
        timeout: now_unix + ttl_secs,
        op_mask,
        handle_set: handles,
        sig: Vec::new(),
    };
    cap.sig = ctx.signing.sign(&signable_bytes(&cap));
    cap
}

/// `verify(cap, fs_id, op, handle, now) -> Ok | InvalidSig | Expired |
/// WrongFs | OpNotPermitted | HandleNotCovered` (spec.md §4.2).
///
/// Checks the signature first (cheapest way to reject a corrupted or
/// forged capability before reasoning about its claimed fields), then
/// delegates the structural checks to [`Capability::check_scope`].
pub fn verify(
    ctx: &CoreContext,
    cap: &Capability,
    fs_id: FsId,
    op: OpMask,
    handle: Handle,
    now_unix: u64,
) -> Result<(), CapVerifyError> {
    if !ctx.signing.verify(&signable_bytes(cap), &cap.sig) {
        return Err(CapVerifyError::InvalidSig);
    }
    cap.check_scope(fs_id, op, handle, now_unix)
}

/// Deep copy — see [`Capability::dup`]; re-exported here so callers working
/// through `pvfs_client::cap` never need to reach into `pvfs_types` directly.
pub fn dup(cap: &Capability) -> Capability {
    cap.dup()
}

pub fn null_capability() -> Capability {
    Capability::null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport_pool::TcpConnector;

    #[test]
    fn new_capability_verifies_against_the_same_backend() {
        let ctx = CoreContext::for_test(Box::new(TcpConnector));
        let cap = new_capability(
            &ctx,
            "meta-0".into(),
            FsId(1),
            OpMask::LOOKUP | OpMask::GETATTR,
            vec![Handle(1)],
            300,
            1_000,
        );
        assert!(verify(&ctx, &cap, FsId(1), OpMask::LOOKUP, Handle(1), 1_100).is_ok());
    }

    #[test]
    fn tampered_capability_fails_signature_check() {
        let ctx = CoreContext::for_test(Box::new(TcpConnector));
        let mut cap = new_capability(&ctx, "meta-0".into(), FsId(1), OpMask::LOOKUP, vec![Handle(1)], 300, 1_000);
        cap.handle_set.push(Handle(2));
        assert_eq!(
            verify(&ctx, &cap, FsId(1), OpMask::LOOKUP, Handle(2), 1_100).unwrap_err(),
            CapVerifyError::InvalidSig
        );
    }

    #[test]
    fn null_capability_is_distinguishable() {
        assert!(null_capability().is_null());
    }
}
