//! Pin/unpin bookkeeping: per-region range sets and the global reclaim
//! queue.
//!
//! All interval metadata for every region lives in [`PinState`], guarded by
//! one global mutex (see `registry`). The coarse lock is deliberate: every
//! range-set mutation must land together with its reclaim-queue update, and
//! cross-region recency ordering needs a single serialization point.
//! Finer locking would reintroduce lost-update races between a region's
//! range set and the queue.

mod interval;
mod range_set;
mod reclaim;

pub(crate) use interval::Interval;
pub(crate) use range_set::RangeSet;
pub(crate) use reclaim::{QueueEntry, ReclaimQueue};

use memshare_common::utils::hash::FxHashMap;
use memshare_common::{Arena, PageSpan, RegionId};

/// A live region handle always has a registered range set.
const REGISTERED: &str = "region is registered while its handle is live";

/// Result of a pin call: whether any overlapping unpinned sub-range had
/// been purged since it was last pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// Some covered content was evicted while unpinned; the caller must
    /// treat it as lost.
    WasPurged,
    /// All covered content survived.
    NotPurged,
}

/// Result of a pin-status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStatus {
    /// No page in the queried range is unpinned.
    Pinned,
    /// At least one page in the queried range is unpinned.
    Unpinned,
}

/// A resolved view of one unpinned interval, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpinnedRange {
    /// Covered pages, inclusive.
    pub span: PageSpan,
    /// Whether the interval's content has been evicted.
    pub purged: bool,
}

/// All pin/unpin state for every region, guarded by the global pin lock.
#[derive(Debug)]
pub(crate) struct PinState {
    arena: Arena<Interval>,
    queue: ReclaimQueue,
    sets: FxHashMap<RegionId, RangeSet>,
}

impl PinState {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            queue: ReclaimQueue::new(),
            sets: FxHashMap::default(),
        }
    }

    /// Adds an empty range set for a newly opened region.
    pub fn register(&mut self, region: RegionId) {
        self.sets.insert(region, RangeSet::new());
    }

    /// Drops a closing region's range set, retiring all of its intervals
    /// from the arena and the queue.
    pub fn unregister(&mut self, region: RegionId) {
        if let Some(mut set) = self.sets.remove(&region) {
            set.clear(&mut self.arena, &mut self.queue);
        }
    }

    pub fn unpin(&mut self, region: RegionId, span: PageSpan) {
        let set = self.sets.get_mut(&region).expect(REGISTERED);
        set.unpin(region, span, &mut self.arena, &mut self.queue);
    }

    pub fn pin(&mut self, region: RegionId, span: PageSpan) -> bool {
        let set = self.sets.get_mut(&region).expect(REGISTERED);
        set.pin(span, &mut self.arena, &mut self.queue)
    }

    pub fn status(&self, region: RegionId, span: PageSpan) -> PinStatus {
        let set = self.sets.get(&region).expect(REGISTERED);
        if set.any_unpinned(span, &self.arena) {
            PinStatus::Unpinned
        } else {
            PinStatus::Pinned
        }
    }

    pub fn reclaimable_bytes(&self) -> usize {
        self.queue.reclaimable_bytes()
    }

    /// Number of intervals currently tracked by the reclaim queue.
    pub fn live_intervals(&self) -> usize {
        self.queue.live()
    }

    pub fn unpinned_ranges(&self, region: RegionId) -> Vec<UnpinnedRange> {
        let set = self.sets.get(&region).expect(REGISTERED);
        set.resolved(&self.arena)
            .into_iter()
            .map(|(span, purged)| UnpinnedRange { span, purged })
            .collect()
    }

    /// Head-to-tail snapshot of the reclaim queue for a purge walk.
    pub fn queue_snapshot(&self) -> Vec<QueueEntry> {
        self.queue.snapshot()
    }

    /// Resolves a queue entry to its interval's current location, skipping
    /// tombstones and already-purged intervals.
    pub fn resolve_for_purge(&self, entry: &QueueEntry) -> Option<(RegionId, PageSpan)> {
        let iv = self.arena.get(entry.key)?;
        if iv.token != entry.token || iv.purged {
            return None;
        }
        Some((iv.region, iv.span))
    }

    /// Marks an interval purged if it is still exactly the one observed at
    /// resolve time. Returns false when a concurrent pin, merge, or
    /// recency refresh won the race, in which case the eviction result is
    /// discarded.
    pub fn confirm_purged(&mut self, entry: &QueueEntry, span: PageSpan) -> bool {
        let Some(iv) = self.arena.get_mut(entry.key) else {
            return false;
        };
        if iv.token != entry.token || iv.purged || iv.span != span {
            return false;
        }
        iv.purged = true;
        true
    }
}
