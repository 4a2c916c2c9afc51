//! Shapes produced by external configuration collaborators.
//!
//! Tab-file discovery and configuration-file parsing are out of scope for
//! this crate (spec.md §1) — these types describe what such a parser (or
//! an `mgmt_get_config` round trip) would hand the Config Cache, so the
//! cache has a concrete input to be constructed from.

use crate::handle::{FsId, Handle};
use crate::server::ServerDescriptor;

/// One line of a tab file:
/// `config_server_list fs_name mount_point fs_type opts 0 0`.
///
/// Reference: spec.md §6 "Tab file".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabFileEntry {
    /// Comma-separated `<transport>://<host>:<port>/<fs>` URIs; entries
    /// must agree on `<fs>`.
    pub config_server_list: Vec<String>,
    pub fs_name: String,
    pub mount_point: String,
    pub fs_type: String,
    pub opts: String,
}

/// The per-FS configuration snapshot the Config Cache is built from —
/// shaped like what an `mgmt_get_config` round trip returns.
///
/// Reference: spec.md §4.1 Config Cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    pub fs_id: FsId,
    pub servers: Vec<ServerDescriptor>,
    pub root_handle: Handle,
    /// Seconds a handle remains reserved against reuse after its object is
    /// removed, and the invalidation horizon for cached attribute/name
    /// entries referencing it (spec.md §4.1, §9 Open Question #2).
    pub handle_recycle_timeout_secs: u64,
    /// Used when a caller requests `dfile_count == 0` at create time.
    pub default_num_dfiles: u32,
    /// Number of dirdata shards a newly created directory is split across.
    pub default_dirdata_shards: u32,
}
