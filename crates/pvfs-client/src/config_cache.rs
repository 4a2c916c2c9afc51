//! Config Cache — C1. Per-`fs_id` cache of server lists, handle→server
//! maps, and layout policy, keyed by [`FsId`] and rebuilt wholesale by
//! [`ConfigCache::reinitialize`].
//!
//! Reference: spec.md §4.1.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pvfs_types::{Distribution, FsConfig, FsId, Handle, Layout, ServerDescriptor, ServerRole};

use crate::error::{Error, Result};

/// A live `fs_id`'s configuration plus its lazily-derived, deduplicated
/// server array (spec.md §4.1 "a deduplicated server array derived lazily
/// on first query").
struct FsEntry {
    config: FsConfig,
    dedup: OnceLock<Vec<ServerDescriptor>>,
}

impl FsEntry {
    fn dedup_servers(&self) -> &[ServerDescriptor] {
        self.dedup.get_or_init(|| dedup_and_merge_roles(&self.config.servers))
    }
}

/// One descriptor per physical endpoint (spec.md §3 "Server descriptor" —
/// "Deduplicated: one descriptor per physical endpoint even if it serves
/// both roles"), merging role bits on collision (spec.md §8 "Config cache
/// server dedup").
fn dedup_and_merge_roles(servers: &[ServerDescriptor]) -> Vec<ServerDescriptor> {
    let mut out: Vec<ServerDescriptor> = Vec::with_capacity(servers.len());
    for s in servers {
        match out.iter_mut().find(|o: &&mut ServerDescriptor| o.bmi_addr == s.bmi_addr) {
            Some(existing) => existing.add_role(s.role()),
            None => out.push(s.clone()),
        }
    }
    out
}

/// Seeds the layout-randomization PRNG from time + pid + hostname, per
/// spec.md §4.1, so a fleet of clients launched at the same instant don't
/// all pick the same round-robin start point or random server mapping.
fn seed_material() -> u64 {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos() as u64;
    let pid = std::process::id() as u64;
    let hostname = std::env::var("HOSTNAME").unwrap_or_default();

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    nanos.hash(&mut hasher);
    pid.hash(&mut hasher);
    hostname.hash(&mut hasher);
    hasher.finish()
}

/// Number of independent-hash retries [`ConfigCache::map_servers`] gives a
/// colliding `RANDOM` pick before falling back to linear probing (spec.md
/// §4.1 "For RANDOM, after six collision retries it falls back to linear
/// probing to guarantee termination").
const RANDOM_LAYOUT_RETRIES: u32 = 6;

pub struct ConfigCache {
    entries: RwLock<HashMap<FsId, std::sync::Arc<FsEntry>>>,
    rng: Mutex<StdRng>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()), rng: Mutex::new(StdRng::seed_from_u64(seed_material())) }
    }

    fn entry(&self, fs_id: FsId) -> Result<std::sync::Arc<FsEntry>> {
        self.entries.read().unwrap().get(&fs_id).cloned().ok_or(Error::UnknownFs(fs_id))
    }

    /// Atomic swap (spec.md §4.1 "reinitialize(new_config) — atomic swap;
    /// in-flight readers see the old snapshot through completion"). Every
    /// query method here returns owned data (not a live reference into the
    /// table), so an SMCB that captured a server list before this call
    /// keeps using it regardless of what happens here afterward (spec.md
    /// §4.1 invariant).
    pub fn reinitialize(&self, config: FsConfig) {
        let fs_id = config.fs_id;
        log::debug!("config cache: reinitializing fs {fs_id}");
        let entry = std::sync::Arc::new(FsEntry { config, dedup: OnceLock::new() });
        self.entries.write().unwrap().insert(fs_id, entry);
    }

    pub fn count_servers(&self, fs_id: FsId, role_mask: ServerRole) -> Result<u32> {
        let entry = self.entry(fs_id)?;
        Ok(entry.dedup_servers().iter().filter(|s| s.role().intersects_or_any(role_mask)).count() as u32)
    }

    /// Fails with [`Error::BufferTooSmall`] if `capacity` is short of the
    /// match count, rather than silently truncating (spec.md §4.1).
    pub fn get_server_array(&self, fs_id: FsId, role_mask: ServerRole, capacity: usize) -> Result<Vec<ServerDescriptor>> {
        let entry = self.entry(fs_id)?;
        let matching: Vec<ServerDescriptor> =
            entry.dedup_servers().iter().filter(|s| s.role().intersects_or_any(role_mask)).cloned().collect();
        if matching.len() > capacity {
            return Err(Error::BufferTooSmall { have: capacity, need: matching.len() });
        }
        Ok(matching)
    }

    pub fn map_addr(&self, fs_id: FsId, bmi_addr: &str) -> Result<(String, ServerRole)> {
        let entry = self.entry(fs_id)?;
        entry
            .dedup_servers()
            .iter()
            .find(|s| s.bmi_addr == bmi_addr)
            .map(|s| (s.bmi_addr.clone(), s.role()))
            .ok_or(Error::NoServerForRole(fs_id, ServerRole::ALL))
    }

    pub fn get_root_handle(&self, fs_id: FsId) -> Result<Handle> {
        Ok(self.entry(fs_id)?.config.root_handle)
    }

    /// Picks a metadata server to address a request against `fs_id` when
    /// the caller has no other way to find the server that owns a
    /// particular handle.
    ///
    /// Real PVFS resolves this via extent ownership
    /// (`PINT_cached_config_map_to_server`); upstream's own implementation
    /// of that function is an unfinished stub that always returns success
    /// without consulting the extent table (`src/common/misc/
    /// pint-cached-config.c`), so any live metadata server is as good a
    /// guess as the real one. This picks uniformly at random among the
    /// fs's META-capable servers instead of hardcoding the first one.
    pub fn pick_meta_server(&self, fs_id: FsId) -> Result<ServerDescriptor> {
        let entry = self.entry(fs_id)?;
        let meta: Vec<&ServerDescriptor> = entry.dedup_servers().iter().filter(|s| s.role().meta()).collect();
        if meta.is_empty() {
            return Err(Error::NoServerForRole(fs_id, ServerRole::META_ONLY));
        }
        let idx = self.rng.lock().unwrap().gen_range(0..meta.len());
        Ok(meta[idx].clone())
    }

    pub fn handle_recycle_timeout_secs(&self, fs_id: FsId) -> Result<u64> {
        Ok(self.entry(fs_id)?.config.handle_recycle_timeout_secs)
    }

    pub fn default_dirdata_shards(&self, fs_id: FsId) -> Result<u32> {
        Ok(self.entry(fs_id)?.config.default_dirdata_shards)
    }

    /// `requested == 0` uses the FS default; then delegates to the
    /// distribution (spec.md §4.1 `get_num_dfiles`).
    pub fn get_num_dfiles(&self, fs_id: FsId, dist: &dyn Distribution, requested: u32) -> Result<u32> {
        let entry = self.entry(fs_id)?;
        let available = entry.dedup_servers().iter().filter(|s| s.role().io()).count().max(1) as u32;
        let requested = if requested == 0 { entry.config.default_num_dfiles } else { requested };
        Ok(dist.get_num_dfiles(requested, available))
    }

    /// Implements the §3 layout policies: `None`/`RoundRobin` pick a random
    /// start point and walk sequentially; `Random` hashes each index
    /// independently with collision retry; `List` trusts the caller's
    /// explicit server list outright.
    pub fn map_servers(&self, fs_id: FsId, n_dfiles: u32, layout: &Layout) -> Result<Vec<ServerDescriptor>> {
        if let Layout::List(list) = layout {
            if list.len() < n_dfiles as usize {
                return Err(Error::BufferTooSmall { have: list.len(), need: n_dfiles as usize });
            }
            return Ok(list[..n_dfiles as usize].to_vec());
        }

        let entry = self.entry(fs_id)?;
        let io_servers: Vec<ServerDescriptor> =
            entry.dedup_servers().iter().filter(|s| s.role().io()).cloned().collect();
        if io_servers.is_empty() {
            return Err(Error::NoServerForRole(fs_id, ServerRole::IO_ONLY));
        }

        let mut rng = self.rng.lock().unwrap();
        match layout {
            Layout::None | Layout::RoundRobin => {
                let start = rng.gen_range(0..io_servers.len());
                Ok((0..n_dfiles as usize).map(|i| io_servers[(start + i) % io_servers.len()].clone()).collect())
            }
            Layout::Random => {
                let mut chosen = Vec::with_capacity(n_dfiles as usize);
                for _ in 0..n_dfiles {
                    let mut picked = None;
                    for _ in 0..RANDOM_LAYOUT_RETRIES {
                        let idx = rng.gen_range(0..io_servers.len());
                        if !chosen.contains(&idx) {
                            picked = Some(idx);
                            break;
                        }
                    }
                    let idx = picked.unwrap_or_else(|| {
                        log::warn!("config cache: RANDOM layout exhausted collision retries, falling back to linear probe");
                        (0..io_servers.len()).find(|i| !chosen.contains(i)).unwrap_or(0)
                    });
                    chosen.push(idx);
                }
                Ok(chosen.into_iter().map(|i| io_servers[i].clone()).collect())
            }
            Layout::List(_) => unreachable!("handled above"),
        }
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::distribution::SimpleStripe;

    fn sample_config() -> FsConfig {
        FsConfig {
            fs_id: FsId(1),
            servers: vec![
                ServerDescriptor::new("tcp://meta-0:3334", 0, ServerRole::META_ONLY),
                ServerDescriptor::new("tcp://io-0:3334", 1, ServerRole::IO_ONLY),
                ServerDescriptor::new("tcp://io-1:3334", 2, ServerRole::IO_ONLY),
                ServerDescriptor::new("tcp://io-2:3334", 3, ServerRole::IO_ONLY),
                // This one serves both roles under one physical endpoint.
                ServerDescriptor::new("tcp://both-0:3334", 4, ServerRole::BOTH),
            ],
            root_handle: Handle(1),
            handle_recycle_timeout_secs: 30,
            default_num_dfiles: 4,
            default_dirdata_shards: 3,
        }
    }

    #[test]
    fn unknown_fs_is_an_error() {
        let cache = ConfigCache::new();
        assert!(matches!(cache.count_servers(FsId(1), ServerRole::ALL), Err(Error::UnknownFs(_))));
    }

    #[test]
    fn count_and_get_server_array_respect_role_mask() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        assert_eq!(cache.count_servers(FsId(1), ServerRole::ALL).unwrap(), 5);
        assert_eq!(cache.count_servers(FsId(1), ServerRole::IO_ONLY).unwrap(), 4);
        assert_eq!(cache.count_servers(FsId(1), ServerRole::META_ONLY).unwrap(), 2);
    }

    #[test]
    fn get_server_array_reports_buffer_too_small() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        let err = cache.get_server_array(FsId(1), ServerRole::ALL, 1).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { have: 1, need: 5 }));
    }

    #[test]
    fn reinitialize_swaps_atomically_and_old_snapshot_is_not_retroactively_mutated() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        let before = cache.get_server_array(FsId(1), ServerRole::ALL, 10).unwrap();

        let mut updated = sample_config();
        updated.servers.push(ServerDescriptor::new("tcp://io-3:3334", 5, ServerRole::IO_ONLY));
        cache.reinitialize(updated);

        // The vector captured before reinitialize is an owned snapshot;
        // it does not see the new server.
        assert_eq!(before.len(), 5);
        assert_eq!(cache.count_servers(FsId(1), ServerRole::ALL).unwrap(), 6);
    }

    #[test]
    fn get_num_dfiles_uses_fs_default_through_distribution() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        let dist = SimpleStripe::default();
        // default_num_dfiles = 4, 4 IO-capable servers available.
        assert_eq!(cache.get_num_dfiles(FsId(1), &dist, 0).unwrap(), 4);
    }

    #[test]
    fn round_robin_layout_picks_n_distinct_sequential_servers() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        let chosen = cache.map_servers(FsId(1), 4, &Layout::RoundRobin).unwrap();
        assert_eq!(chosen.len(), 4);
        let unique: std::collections::HashSet<_> = chosen.iter().map(|s| &s.bmi_addr).collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn random_layout_never_duplicates_a_server_when_n_le_available() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        for _ in 0..20 {
            let chosen = cache.map_servers(FsId(1), 4, &Layout::Random).unwrap();
            let unique: std::collections::HashSet<_> = chosen.iter().map(|s| &s.bmi_addr).collect();
            assert_eq!(unique.len(), 4, "RANDOM layout produced a duplicate server index");
        }
    }

    #[test]
    fn pick_meta_server_only_returns_meta_capable_servers() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        for _ in 0..20 {
            let picked = cache.pick_meta_server(FsId(1)).unwrap();
            assert!(picked.role().meta(), "picked a non-meta server: {picked:?}");
        }
    }

    #[test]
    fn list_layout_uses_caller_supplied_servers_verbatim() {
        let cache = ConfigCache::new();
        cache.reinitialize(sample_config());
        let explicit = vec![ServerDescriptor::new("tcp://pinned:1", 9, ServerRole::IO_ONLY)];
        let chosen = cache.map_servers(FsId(1), 1, &Layout::List(explicit.clone())).unwrap();
        assert_eq!(chosen, explicit);
    }
}
