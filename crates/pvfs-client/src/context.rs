//! The Core Context — spec.md §9 "Global mutable state": rather than
//! hidden singletons for the op-id table, the config cache, and the
//! signing backend's thread registration, every public entry point takes
//! a `&CoreContext` explicitly. Construct one with [`CoreContext::init`]
//! at process start and let it drop (or call [`CoreContext::finalize`]
//! explicitly) at shutdown.

use crate::cache::{AttrCache, NameCache};
use crate::config_cache::ConfigCache;
use crate::id_table::IdTable;
use crate::signing::{HmacSha256Backend, SigningBackend};
use crate::transport_pool::{Connector, TransportPool};

pub struct CoreContext {
    pub id_table: IdTable,
    pub transports: TransportPool,
    pub config_cache: ConfigCache,
    pub attr_cache: AttrCache,
    pub name_cache: NameCache,
    pub signing: Box<dyn SigningBackend>,
}

impl CoreContext {
    /// Process-wide construction. `signing_key` plays the role spec.md §5's
    /// OpenSSL id/lock callback registration plays for the real library —
    /// there is no global crypto library state to register here since the
    /// signing backend is self-contained, so `init` simply owns it for the
    /// context's lifetime.
    pub fn init(connector: Box<dyn Connector>, signing_key: Vec<u8>) -> Self {
        log::debug!("core context: initializing");
        Self {
            id_table: IdTable::new(),
            transports: TransportPool::new(connector),
            config_cache: ConfigCache::new(),
            attr_cache: AttrCache::new(),
            name_cache: NameCache::new(),
            signing: Box::new(HmacSha256Backend::new(signing_key)),
        }
    }

    /// Test-only convenience: a fixed signing key so tests that sign and
    /// verify within the same process don't need to thread a key through
    /// every call site.
    pub fn for_test(connector: Box<dyn Connector>) -> Self {
        Self::init(connector, b"pvfs-rs-test-signing-key".to_vec())
    }

    /// Tears the context down. Drains pooled connections and, via
    /// [`HmacSha256Backend`]'s `Drop`, zeroes the signing key — the
    /// deregistration half of spec.md §5's OpenSSL callback lifecycle.
    pub fn finalize(self) {
        self.transports.cancel_all();
        log::debug!("core context: finalized");
    }
}
