//! Protection masks for regions and mappings.

use bitflags::bitflags;

bitflags! {
    /// Access modes a region allows its mappings.
    ///
    /// A region starts out with the full mask and the mask may only ever be
    /// narrowed afterwards; see `Region::set_prot_mask` in `memshare-core`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProtMask: u32 {
        /// Mappings may read the region's content.
        const READ = 1 << 0;
        /// Mappings may write the region's content.
        const WRITE = 1 << 1;
        /// Mappings may execute the region's content.
        const EXEC = 1 << 2;
    }
}

impl ProtMask {
    /// Returns whether `narrower` is a subset of this mask.
    ///
    /// This is the narrowing rule: an update is legal iff it only removes
    /// bits from the current mask.
    #[must_use]
    pub fn permits(self, narrower: Self) -> bool {
        self.contains(narrower)
    }
}

impl Default for ProtMask {
    /// The full mask: regions allow all access modes until narrowed.
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_full_mask() {
        assert_eq!(ProtMask::default(), ProtMask::READ | ProtMask::WRITE | ProtMask::EXEC);
    }

    #[test]
    fn test_permits_subset_only() {
        let rw = ProtMask::READ | ProtMask::WRITE;
        assert!(rw.permits(ProtMask::READ));
        assert!(rw.permits(rw));
        assert!(rw.permits(ProtMask::empty()));
        assert!(!rw.permits(ProtMask::EXEC));
        assert!(!rw.permits(rw | ProtMask::EXEC));
    }
}
