//! Interval metadata stored in the pin-state arena.

use memshare_common::{PageSpan, RegionId};

/// One unpinned, reclaimable interval of a region.
///
/// Intervals are owned by exactly one region's range set and referenced
/// exactly once by the live tail of the reclaim queue. Absence of an
/// interval means the covered pages are pinned.
#[derive(Debug, Clone)]
pub(crate) struct Interval {
    /// The owning region.
    pub region: RegionId,
    /// Covered pages, inclusive.
    pub span: PageSpan,
    /// Whether the backing content of this interval has been evicted.
    pub purged: bool,
    /// Recency stamp; matches the one live queue entry referencing this
    /// interval. A queue entry whose token differs is a tombstone.
    pub token: u64,
}
