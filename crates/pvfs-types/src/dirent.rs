//! Directory entry: `{name: String ≤ 256B, handle}`.
//!
//! Reference: spec.md §3 "Directory entry (dirent)" — "Names are opaque
//! bytes; no normalization."

use crate::error::PvfsTypeError;
use crate::handle::Handle;

pub const MAX_DIRENT_NAME_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub handle: Handle,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, handle: Handle) -> crate::Result<Self> {
        let name = name.into();
        if name.len() > MAX_DIRENT_NAME_LEN {
            return Err(PvfsTypeError::NameTooLong {
                max: MAX_DIRENT_NAME_LEN,
            });
        }
        Ok(Self { name, handle })
    }
}

/// Deterministic shard assignment for a directory entry name, used to pick
/// which dirdata shard of `shard_count` a dirent with `name` belongs in.
///
/// Reference: spec.md §3 "Dirdata shard" — "split across N dirdata shards
/// by a deterministic hash of `name`".
pub fn dirent_shard_index(name: &str, shard_count: u32) -> u32 {
    assert!(shard_count > 0, "shard_count must be positive");
    let mut hash: u32 = 5381;
    for b in name.as_bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(*b as u32);
    }
    hash % shard_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(MAX_DIRENT_NAME_LEN + 1);
        assert!(DirEntry::new(long, Handle(1)).is_err());
    }

    #[test]
    fn shard_index_is_deterministic() {
        let a = dirent_shard_index("foo.txt", 7);
        let b = dirent_shard_index("foo.txt", 7);
        assert_eq!(a, b);
        assert!(a < 7);
    }

    #[test]
    fn shard_index_spreads_across_names() {
        let shard_count = 3;
        let mut seen = [0u32; 3];
        for i in 0..30 {
            let name = format!("file-{i}");
            seen[dirent_shard_index(&name, shard_count) as usize] += 1;
        }
        assert!(seen.iter().all(|&c| c > 0));
    }
}
