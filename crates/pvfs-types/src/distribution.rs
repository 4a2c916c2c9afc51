//! Distribution: the deterministic map between logical file offsets and
//! (dfile, local offset) tuples.
//!
//! Reference: spec.md §3 "Distribution", §8 "Distribution round-trip".

/// A distribution capability set, instantiated once per distribution
/// algorithm (spec.md §9: "Dynamic dispatch over distributions" — a small
/// trait, no runtime type probing beyond choosing which impl to construct).
pub trait Distribution: Send + Sync {
    /// Stable name, as it would appear in [`crate::attr::DistributionParams`].
    fn name(&self) -> &str;

    /// Maps a logical file offset to `(dfile_idx, local_offset)`.
    fn logical_to_physical(&self, offset: u64, num_dfiles: u32) -> (u32, u64);

    /// Maps `(dfile_idx, local_offset)` back to a logical file offset.
    /// Must satisfy `physical_to_logical(logical_to_physical(o)) == o` for
    /// every valid `o` (spec.md §8).
    fn physical_to_logical(&self, dfile_idx: u32, local_offset: u64, num_dfiles: u32) -> u64;

    /// Chooses how many dfiles to use for a new file given a caller
    /// `requested` count (0 meaning "use the distribution's default") and
    /// the number of `available` I/O servers.
    fn get_num_dfiles(&self, requested: u32, available: u32) -> u32;
}

/// `simple_stripe{strip_size}` — round-robin byte striping across dfiles,
/// the PVFS default distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleStripe {
    pub strip_size: u64,
}

impl SimpleStripe {
    pub const DEFAULT_STRIP_SIZE: u64 = 64 * 1024;

    pub fn new(strip_size: u64) -> Self {
        assert!(strip_size > 0, "strip_size must be positive");
        Self { strip_size }
    }
}

impl Default for SimpleStripe {
    fn default() -> Self {
        Self {
            strip_size: Self::DEFAULT_STRIP_SIZE,
        }
    }
}

impl Distribution for SimpleStripe {
    fn name(&self) -> &str {
        "simple_stripe"
    }

    fn logical_to_physical(&self, offset: u64, num_dfiles: u32) -> (u32, u64) {
        assert!(num_dfiles > 0, "num_dfiles must be positive");
        let stripe_no = offset / self.strip_size;
        let dfile_idx = (stripe_no % num_dfiles as u64) as u32;
        let stripe_round = stripe_no / num_dfiles as u64;
        let local_offset = stripe_round * self.strip_size + (offset % self.strip_size);
        (dfile_idx, local_offset)
    }

    fn physical_to_logical(&self, dfile_idx: u32, local_offset: u64, num_dfiles: u32) -> u64 {
        assert!(num_dfiles > 0, "num_dfiles must be positive");
        let stripe_round = local_offset / self.strip_size;
        let within_stripe = local_offset % self.strip_size;
        let stripe_no = stripe_round * num_dfiles as u64 + dfile_idx as u64;
        stripe_no * self.strip_size + within_stripe
    }

    fn get_num_dfiles(&self, requested: u32, available: u32) -> u32 {
        if requested == 0 {
            available.min(4).max(1)
        } else {
            requested.min(available.max(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_holds_for_many_offsets() {
        let dist = SimpleStripe::new(4096);
        let num_dfiles = 5;
        for offset in (0u64..2_000_000).step_by(997) {
            let (idx, local) = dist.logical_to_physical(offset, num_dfiles);
            assert!(idx < num_dfiles);
            let back = dist.physical_to_logical(idx, local, num_dfiles);
            assert_eq!(back, offset, "round trip failed for offset {offset}");
        }
    }

    #[test]
    fn striping_cycles_across_dfiles() {
        let dist = SimpleStripe::new(100);
        assert_eq!(dist.logical_to_physical(0, 3), (0, 0));
        assert_eq!(dist.logical_to_physical(100, 3), (1, 0));
        assert_eq!(dist.logical_to_physical(200, 3), (2, 0));
        assert_eq!(dist.logical_to_physical(300, 3), (0, 100));
    }

    #[test]
    fn get_num_dfiles_uses_fs_default_when_unrequested() {
        let dist = SimpleStripe::default();
        assert_eq!(dist.get_num_dfiles(0, 8), 4);
        assert_eq!(dist.get_num_dfiles(0, 2), 2);
        assert_eq!(dist.get_num_dfiles(6, 8), 6);
        assert_eq!(dist.get_num_dfiles(6, 3), 3);
    }
}
