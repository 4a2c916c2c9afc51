//! Management operations: configuration retrieval, server enumeration,
//! parameter tuning, and diagnostics.
//!
//! Reference: spec.md §4.1 Config Cache; grounded in
//! `pint-client-get-config.c`/`pint-server-get-config.c` (config
//! retrieval, `count_servers`/`get_server_array`/`map_addr` shapes),
//! `pvfs2-get-user-cert.c` (certificate exchange), and
//! `pint-cached-config.c`/`pvfs2-auto-migration.c` (handle-range and
//! diagnostic iteration op codes retained as read-only).

use binrw::binrw;
use pvfs_types::{FsId, Handle};

use crate::wire_sec::WireCredential;
use crate::wire_util::{WireString, WireVec};

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ServerDescriptorWire {
    pub bmi_addr: WireString,
    pub addr_handle: u64,
    pub role_bits: u8,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtGetConfigRequest {
    pub fs_name: WireString,
    pub credential: WireCredential,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtGetConfigReply {
    pub status: crate::status::StatusCode,
    pub fs_id: FsId,
    pub servers: WireVec<ServerDescriptorWire>,
    pub root_handle: Handle,
    pub handle_recycle_timeout_secs: u64,
    pub default_num_dfiles: u32,
    pub default_dirdata_shards: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtCountServersRequest {
    pub fs_id: FsId,
    /// Bitmask matching [`pvfs_types::server::ServerRole`]'s `role_bits`;
    /// a request for `META_ONLY` counts only metadata servers, etc.
    pub role_mask: u8,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtCountServersReply {
    pub status: crate::status::StatusCode,
    pub count: u32,
}

/// Reference: spec.md §4.1 "`get_server_array` returns `BUFFER_TOO_SMALL`
/// when the caller's array is undersized rather than truncating
/// silently" — `requested_count` lets the caller size a retry without a
/// prior `mgmt_count_servers` round trip.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtGetServerArrayRequest {
    pub fs_id: FsId,
    pub role_mask: u8,
    pub requested_count: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtGetServerArrayReply {
    pub status: crate::status::StatusCode,
    pub servers: WireVec<ServerDescriptorWire>,
    /// True (with `status == EMSGSIZE`) when `requested_count` was too
    /// small; `servers` is empty in that case and `total_available` gives
    /// the size a retry needs.
    pub buffer_too_small: bool,
    pub total_available: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtSetparamListRequest {
    pub fs_id: FsId,
    pub target_servers: WireVec<WireString>,
    pub param_name: WireString,
    pub param_value: i64,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtSetparamListReply {
    pub status: crate::status::StatusCode,
    pub old_values: WireVec<i64>,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtStatfsListRequest {
    pub fs_id: FsId,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatfsWire {
    pub server: WireString,
    pub bytes_total: u64,
    pub bytes_available: u64,
    pub handles_total: u64,
    pub handles_available: u64,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtStatfsListReply {
    pub status: crate::status::StatusCode,
    pub per_server: WireVec<ServerStatfsWire>,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtPerfMonListRequest {
    pub fs_id: FsId,
    pub target_server: WireString,
    pub history_count: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct PerfSampleWire {
    pub timestamp_unix: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtPerfMonListReply {
    pub status: crate::status::StatusCode,
    pub samples: WireVec<PerfSampleWire>,
}

/// Read-only diagnostic iteration over a server's handle ranges. Kept as
/// an op code for introspection tooling only — this client never issues
/// the destructive administrative variants OrangeFS's `fsck`/migration
/// tools build on top of it.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtIterateHandlesListRequest {
    pub fs_id: FsId,
    pub target_server: WireString,
    pub position: u64,
    pub count: u32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtIterateHandlesListReply {
    pub status: crate::status::StatusCode,
    pub handles: WireVec<Handle>,
    pub next_position: u64,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtGetUserCertRequest {
    pub fs_id: FsId,
    pub credential: WireCredential,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct MgmtGetUserCertReply {
    pub status: crate::status::StatusCode,
    pub cert_der: crate::wire_util::WireBytes,
}
