//! Server descriptors and the role bitmask that a deduplicated server plays.
//!
//! Reference: spec.md §3 "Server descriptor".

use modular_bitfield::prelude::*;

/// Bitmask describing which roles a server plays in a filesystem.
///
/// A physical endpoint gets exactly one [`ServerDescriptor`] even if it
/// serves both roles — both bits are then set on that single descriptor.
#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerRole {
    pub meta: bool,
    pub io: bool,
    #[skip]
    __: B6,
}

impl ServerRole {
    pub const META_ONLY: ServerRole = ServerRole::new().with_meta(true);
    pub const IO_ONLY: ServerRole = ServerRole::new().with_io(true);
    pub const BOTH: ServerRole = ServerRole::new().with_meta(true).with_io(true);
    pub const ALL: ServerRole = Self::BOTH;

    /// True if `self` carries every bit set in `mask`.
    pub fn matches(&self, mask: ServerRole) -> bool {
        (!mask.meta() || self.meta()) && (!mask.io() || self.io())
    }

    /// True if `self` and `mask` share at least one role bit (or `mask` is
    /// empty, in which case everything matches — used for "ALL" queries).
    pub fn intersects_or_any(&self, mask: ServerRole) -> bool {
        if !mask.meta() && !mask.io() {
            return true;
        }
        (mask.meta() && self.meta()) || (mask.io() && self.io())
    }

    pub fn merge(&self, other: ServerRole) -> ServerRole {
        ServerRole::new()
            .with_meta(self.meta() || other.meta())
            .with_io(self.io() || other.io())
    }
}

/// `{bmi_addr: String, addr_handle: opaque, role: bitmask{META|IO}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerDescriptor {
    pub bmi_addr: String,
    /// Opaque per-process handle, e.g. an index into a resolved-address
    /// table kept by the transport layer. Not meaningful across processes.
    pub addr_handle: u64,
    role_bits: u8,
}

impl ServerDescriptor {
    pub fn new(bmi_addr: impl Into<String>, addr_handle: u64, role: ServerRole) -> Self {
        Self {
            bmi_addr: bmi_addr.into(),
            addr_handle,
            role_bits: role.into_bytes()[0],
        }
    }

    pub fn role(&self) -> ServerRole {
        ServerRole::from_bytes([self.role_bits])
    }

    pub fn add_role(&mut self, role: ServerRole) {
        let merged = self.role().merge(role);
        self.role_bits = merged.into_bytes()[0];
    }
}

impl std::hash::Hash for ServerRole {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.into_bytes().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_merges_role_bits() {
        let mut s = ServerDescriptor::new("tcp://h:3334", 1, ServerRole::META_ONLY);
        assert!(s.role().meta());
        assert!(!s.role().io());
        s.add_role(ServerRole::IO_ONLY);
        assert!(s.role().meta());
        assert!(s.role().io());
    }

    #[test]
    fn role_matches_respects_both_bits() {
        let both = ServerRole::BOTH;
        assert!(both.matches(ServerRole::META_ONLY));
        assert!(both.matches(ServerRole::IO_ONLY));
        assert!(ServerRole::META_ONLY.matches(ServerRole::META_ONLY));
        assert!(!ServerRole::META_ONLY.matches(ServerRole::IO_ONLY));
    }
}
