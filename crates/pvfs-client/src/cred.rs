//! Credential half of C2 — identity assertions rather than handle-scoped
//! grants. Same signing shape as [`crate::cap`], over
//! [`pvfs_msg::wire_sec::WireCredential`] instead.
//!
//! Reference: spec.md §4.2 "Credentials support the same shape plus
//! `is_unsigned(cred) = sig_len == 0`".

use binrw::BinWrite;
use pvfs_msg::wire_sec::WireCredential;
use pvfs_types::{Credential, FsId, Gid, Uid};

use crate::context::CoreContext;

fn signable_bytes(cred: &Credential) -> Vec<u8> {
    let mut unsigned = cred.dup();
    unsigned.sig.clear();
    let wire = WireCredential::from(&unsigned);
    let mut buf = binrw::io::Cursor::new(Vec::new());
    wire.write_le(&mut buf).expect("in-memory write cannot fail");
    buf.into_inner()
}

/// Mints a signed credential for a principal. In production this is the
/// server's job (issued in exchange for a username/password via
/// `mgmt_get_user_cert`, see [`crate::sysint::mgmt::get_user_cert`]); kept
/// here too so tests can construct a signed credential without a server.
pub fn new_credential(
    ctx: &CoreContext,
    fs_id: FsId,
    serial: u32,
    uid: Uid,
    gids: Vec<Gid>,
    issuer: String,
    ttl_secs: u64,
    now_unix: u64,
) -> Credential {
    let mut cred = Credential { fs_id, serial, uid, gids, issuer, timeout: now_unix + ttl_secs, sig: Vec::new() };
    cred.sig = ctx.signing.sign(&signable_bytes(&cred));
    cred
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredVerifyError {
    #[error("credential signature is invalid")]
    InvalidSig,
    #[error("credential has expired")]
    Expired,
}

pub fn verify(ctx: &CoreContext, cred: &Credential, now_unix: u64) -> Result<(), CredVerifyError> {
    if cred.is_unsigned() {
        return Err(CredVerifyError::InvalidSig);
    }
    if !ctx.signing.verify(&signable_bytes(cred), &cred.sig) {
        return Err(CredVerifyError::InvalidSig);
    }
    if now_unix >= cred.timeout {
        return Err(CredVerifyError::Expired);
    }
    Ok(())
}

/// True if `cred`'s remaining life has dropped below the 120-second safety
/// margin shared with capabilities (spec.md §3 "a client refreshes when the
/// remaining life drops below a safety margin (120 seconds)").
pub fn needs_refresh(cred: &Credential, now_unix: u64) -> bool {
    cred.needs_refresh(now_unix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport_pool::TcpConnector;

    #[test]
    fn new_credential_round_trips_through_verify() {
        let ctx = CoreContext::for_test(Box::new(TcpConnector));
        let cred = new_credential(&ctx, FsId(1), 1, 1000, vec![1000], "meta-0".into(), 300, 1_000);
        assert!(verify(&ctx, &cred, 1_100).is_ok());
    }

    #[test]
    fn expired_credential_is_rejected() {
        let ctx = CoreContext::for_test(Box::new(TcpConnector));
        let cred = new_credential(&ctx, FsId(1), 1, 1000, vec![], "meta-0".into(), 10, 1_000);
        assert_eq!(verify(&ctx, &cred, 1_100).unwrap_err(), CredVerifyError::Expired);
    }

    #[test]
    fn unsigned_credential_is_rejected() {
        let ctx = CoreContext::for_test(Box::new(TcpConnector));
        let cred = Credential { fs_id: FsId(1), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 10_000, sig: vec![] };
        assert_eq!(verify(&ctx, &cred, 0).unwrap_err(), CredVerifyError::InvalidSig);
    }
}
