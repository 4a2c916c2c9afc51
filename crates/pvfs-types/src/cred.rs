//! Credential: signed, time-bounded identity assertion of a principal.
//!
//! Reference: spec.md §3 "Credential", §4.2.

use crate::cap::CAP_TIMEOUT_BUFFER_SECS;
use crate::handle::{FsId, Gid, Uid};

/// `{fs_id, serial, uid, gids, issuer, timeout, sig}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub fs_id: FsId,
    pub serial: u32,
    pub uid: Uid,
    pub gids: Vec<Gid>,
    pub issuer: String,
    pub timeout: u64,
    pub sig: Vec<u8>,
}

impl Credential {
    pub fn is_unsigned(&self) -> bool {
        self.sig.is_empty()
    }

    /// Short-lived; a client refreshes when the remaining life drops below
    /// the same 120-second safety margin used for capabilities.
    pub fn needs_refresh(&self, now_unix: u64) -> bool {
        self.timeout.saturating_sub(now_unix) < CAP_TIMEOUT_BUFFER_SECS
    }

    pub fn dup(&self) -> Self {
        Self {
            fs_id: self.fs_id,
            serial: self.serial,
            uid: self.uid,
            gids: self.gids.clone(),
            issuer: self.issuer.clone(),
            timeout: self.timeout,
            sig: self.sig.clone(),
        }
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        for b in self.sig.iter_mut() {
            *b = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credential {
        Credential {
            fs_id: FsId(1),
            serial: 4,
            uid: 1000,
            gids: vec![1000, 100],
            issuer: "meta-0".into(),
            timeout: 500,
            sig: vec![1, 2, 3],
        }
    }

    #[test]
    fn is_unsigned_checks_sig_len() {
        let mut c = sample();
        assert!(!c.is_unsigned());
        c.sig.clear();
        assert!(c.is_unsigned());
    }

    #[test]
    fn dup_is_independent() {
        let c = sample();
        let mut d = c.dup();
        d.gids.push(1);
        assert_eq!(c.gids.len(), 2);
        assert_eq!(d.gids.len(), 3);
    }
}
