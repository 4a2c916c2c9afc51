//! Capability: signed, time-bounded grant of a handle-scoped, op-masked
//! right.
//!
//! Reference: spec.md §3 "Capability", §4.2, §8 testable properties
//! ("Capability duplication is deep", "Null capability predicate").

use crate::handle::{FsId, Handle};
use bitflags::bitflags;

bitflags! {
    /// Which operations a [`Capability`] authorizes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpMask: u32 {
        const LOOKUP    = 1 << 0;
        const CREATE    = 1 << 1;
        const REMOVE    = 1 << 2;
        const RENAME    = 1 << 3;
        const GETATTR   = 1 << 4;
        const SETATTR   = 1 << 5;
        const READDIR   = 1 << 6;
        const IO_READ    = 1 << 7;
        const IO_WRITE   = 1 << 8;
        const CRDIRENT  = 1 << 9;
        const RMDIRENT  = 1 << 10;
    }
}

/// An identifier for the server that issued a capability or credential.
/// Opaque to the client beyond display and equality.
pub type ServerAlias = String;

/// `{issuer, fs_id, timeout, op_mask, handle_set, sig}`.
///
/// Invariants (enforced by [`Capability::is_valid_for`], not by
/// construction, since a capability received from the wire must be
/// checkable even when invalid):
/// - `timeout > now` at use.
/// - Every handle in `handle_set` belongs to `fs_id`.
/// - Re-use of a capability for an operation whose bit is clear in
///   `op_mask` fails closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub issuer: ServerAlias,
    pub fs_id: FsId,
    /// Unix seconds after which the capability is no longer valid.
    pub timeout: u64,
    pub op_mask: OpMask,
    pub handle_set: Vec<Handle>,
    pub sig: Vec<u8>,
}

/// Why a capability failed verification. Mirrors spec.md §4.2's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CapVerifyError {
    #[error("capability signature is invalid")]
    InvalidSig,
    #[error("capability has expired")]
    Expired,
    #[error("capability is scoped to a different filesystem")]
    WrongFs,
    #[error("capability does not grant the requested operation")]
    OpNotPermitted,
    #[error("capability does not cover the requested handle")]
    HandleNotCovered,
}

/// Refresh a credential/capability when the remaining life drops below this
/// safety margin, per spec.md §3/§4.2.
pub const CAP_TIMEOUT_BUFFER_SECS: u64 = 120;

impl Capability {
    /// A distinguishable sentinel with empty issuer and zero `op_mask`.
    /// [`Capability::is_null`] reports `true` for exactly this value and
    /// for no valid capability.
    pub fn null() -> Self {
        Self {
            issuer: String::new(),
            fs_id: FsId(0),
            timeout: 0,
            op_mask: OpMask::empty(),
            handle_set: Vec::new(),
            sig: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.issuer.is_empty() && self.op_mask.is_empty() && self.sig.is_empty()
    }

    /// Structural checks only (timeout/fs/op/handle coverage) — does not
    /// verify the signature. Callers holding a signing/verifying backend
    /// should check the signature first via that backend, then call this.
    pub fn check_scope(&self, fs_id: FsId, op: OpMask, handle: Handle, now_unix: u64) -> std::result::Result<(), CapVerifyError> {
        if self.fs_id != fs_id {
            return Err(CapVerifyError::WrongFs);
        }
        if now_unix >= self.timeout {
            return Err(CapVerifyError::Expired);
        }
        if !self.op_mask.contains(op) {
            return Err(CapVerifyError::OpNotPermitted);
        }
        if !self.handle_set.iter().any(|h| *h == handle) {
            return Err(CapVerifyError::HandleNotCovered);
        }
        Ok(())
    }

    /// True if the capability should be refreshed: fewer than
    /// [`CAP_TIMEOUT_BUFFER_SECS`] seconds remain before `timeout`.
    pub fn needs_refresh(&self, now_unix: u64) -> bool {
        self.timeout.saturating_sub(now_unix) < CAP_TIMEOUT_BUFFER_SECS
    }

    /// Deep copy: never aliases the signature or handle array with the
    /// original. See spec.md §8 "Capability duplication is deep".
    pub fn dup(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
            fs_id: self.fs_id,
            timeout: self.timeout,
            op_mask: self.op_mask,
            handle_set: self.handle_set.clone(),
            sig: self.sig.clone(),
        }
    }
}

impl Drop for Capability {
    fn drop(&mut self) {
        // Zero the signature buffer before free, per spec.md §4.2 lifecycle.
        for b in self.sig.iter_mut() {
            *b = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Capability {
        Capability {
            issuer: "meta-0".into(),
            fs_id: FsId(7),
            timeout: 1_000_000,
            op_mask: OpMask::LOOKUP | OpMask::GETATTR,
            handle_set: vec![Handle(1), Handle(2)],
            sig: vec![0xAA; 16],
        }
    }

    #[test]
    fn null_capability_predicate() {
        assert!(Capability::null().is_null());
        assert!(!sample().is_null());
    }

    #[test]
    fn dup_is_deep_and_independent() {
        let original = sample();
        let mut copy = original.dup();
        assert_eq!(original, copy);
        copy.handle_set.push(Handle(99));
        copy.sig[0] = 0;
        assert_ne!(original, copy);
        assert_eq!(original.handle_set.len(), 2);
        assert_eq!(original.sig[0], 0xAA);
    }

    #[test]
    fn check_scope_fails_closed_on_missing_op_bit() {
        let cap = sample();
        let err = cap
            .check_scope(FsId(7), OpMask::SETATTR, Handle(1), 0)
            .unwrap_err();
        assert_eq!(err, CapVerifyError::OpNotPermitted);
    }

    #[test]
    fn check_scope_rejects_uncovered_handle() {
        let cap = sample();
        let err = cap
            .check_scope(FsId(7), OpMask::LOOKUP, Handle(3), 0)
            .unwrap_err();
        assert_eq!(err, CapVerifyError::HandleNotCovered);
    }

    #[test]
    fn check_scope_rejects_expired_and_wrong_fs() {
        let cap = sample();
        assert_eq!(
            cap.check_scope(FsId(7), OpMask::LOOKUP, Handle(1), 1_000_000)
                .unwrap_err(),
            CapVerifyError::Expired
        );
        assert_eq!(
            cap.check_scope(FsId(8), OpMask::LOOKUP, Handle(1), 0)
                .unwrap_err(),
            CapVerifyError::WrongFs
        );
    }

    #[test]
    fn needs_refresh_honors_buffer() {
        let cap = sample();
        assert!(!cap.needs_refresh(1_000_000 - CAP_TIMEOUT_BUFFER_SECS - 1));
        assert!(cap.needs_refresh(1_000_000 - CAP_TIMEOUT_BUFFER_SECS + 1));
    }
}
