//! Thread-safe op id allocator.
//!
//! Reference: spec.md §3 "Op id" — "an externally visible handle to an
//! SMCB. Registered in a thread-safe id table at post time, unregistered
//! at release." and §5 "Op-id table: thread-safe register/lookup/
//! unregister."

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::sm::Smcb;

/// Externally visible handle to a live [`Smcb`]. Never reused while its
/// SMCB is registered; once released the numeric value may be recycled by
/// the allocator's wraparound, which is safe because a stale `OpId` can
/// only ever miss the table (look up fails) rather than hit a different
/// live operation — recycling only happens after `unregister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u64);

#[derive(Default)]
pub struct IdTable {
    next: AtomicU64,
    live: Mutex<HashMap<OpId, Smcb>>,
}

impl IdTable {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1), live: Mutex::new(HashMap::new()) }
    }

    /// Registers a freshly-posted SMCB and returns its op id.
    pub fn register(&self, smcb: Smcb) -> OpId {
        let id = OpId(self.next.fetch_add(1, Ordering::Relaxed));
        self.live.lock().unwrap().insert(id, smcb);
        id
    }

    pub fn with_mut<R>(&self, id: OpId, f: impl FnOnce(&mut Smcb) -> R) -> Option<R> {
        self.live.lock().unwrap().get_mut(&id).map(f)
    }

    pub fn contains(&self, id: OpId) -> bool {
        self.live.lock().unwrap().contains_key(&id)
    }

    /// Every currently-registered op id, for `testcontext`'s "drain
    /// whatever is ready" sweep.
    pub fn all_ids(&self) -> Vec<OpId> {
        self.live.lock().unwrap().keys().copied().collect()
    }

    /// Removes and returns the SMCB; called once the caller has read the
    /// terminal result (spec.md §3 "released after caller reads result").
    pub fn unregister(&self, id: OpId) -> Option<Smcb> {
        self.live.lock().unwrap().remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sm::Smcb;
    use pvfs_types::Credential;

    fn sample_smcb() -> Smcb {
        Smcb::new(
            "test-op",
            Credential {
                fs_id: pvfs_types::FsId(1),
                serial: 0,
                uid: 0,
                gids: vec![],
                issuer: String::new(),
                timeout: 0,
                sig: vec![],
            },
        )
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let table = IdTable::new();
        let a = table.register(sample_smcb());
        let b = table.register(sample_smcb());
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn unregister_removes_from_table() {
        let table = IdTable::new();
        let id = table.register(sample_smcb());
        assert!(table.contains(id));
        assert!(table.unregister(id).is_some());
        assert!(!table.contains(id));
        assert!(table.unregister(id).is_none());
    }
}
