//! Signing/verifying backend consumed by the Capability/Credential module.
//!
//! Cryptographic primitives (X.509, RSA) are out of scope for this crate
//! (spec.md §1) — the core "consumes a signing/verifying interface only".
//! HMAC-SHA256 stands in for that interface here, the way the teacher's
//! `smb::crypto::SigningAlgo` stands in for SMB2's AES-CMAC/HMAC signing
//! (`session/signer.rs`): a small trait the session layer drives, with one
//! concrete implementation plugged in at `CoreContext` construction.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Signs and verifies the canonical byte representation of a capability or
/// credential (spec.md §4.2). Boxed and owned by [`crate::context::CoreContext`]
/// so a caller can substitute a different backend (e.g. one backed by the
/// server's real RSA keypair) without touching the cap/cred modules.
pub trait SigningBackend: Send + Sync {
    fn sign(&self, data: &[u8]) -> Vec<u8>;

    /// Constant-time-ish comparison is not attempted here — HMAC verification
    /// failures are not a timing-sensitive boundary for this client (the
    /// server is the one deciding whether to honor a capability; the client
    /// only re-derives the same signature to catch corruption/tampering
    /// before spending a round trip).
    fn verify(&self, data: &[u8], sig: &[u8]) -> bool;
}

/// HMAC-SHA256 keyed with a process-held secret. Registration/deregistration
/// of this backend at [`crate::context::CoreContext::init`]/`finalize` stands
/// in for spec.md §5's OpenSSL id/lock callback registration, since the
/// signing dependency here has no thread-local state of its own to register.
pub struct HmacSha256Backend {
    key: Vec<u8>,
}

impl HmacSha256Backend {
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }
}

impl SigningBackend for HmacSha256Backend {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> bool {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.verify_slice(sig).is_ok()
    }
}

impl Drop for HmacSha256Backend {
    fn drop(&mut self) {
        for b in self.key.iter_mut() {
            *b = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let backend = HmacSha256Backend::new(b"test-key".to_vec());
        let sig = backend.sign(b"payload");
        assert!(backend.verify(b"payload", &sig));
        assert!(!backend.verify(b"tampered", &sig));
    }
}
