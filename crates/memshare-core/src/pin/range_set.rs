//! Per-region sorted, disjoint interval set.
//!
//! A range set tracks the *unpinned* portion of one region: pairwise
//! disjoint page spans in ascending order, each tagged purged or
//! not-purged. Pinned pages have no representation. The set is an index
//! keyed by start page over intervals living in the shared arena; every
//! structural change performs its matching reclaim-queue update inside the
//! same call, under the caller's (global) lock.

use std::collections::BTreeMap;

use memshare_common::{Arena, ArenaKey, PageSpan, RegionId};
use smallvec::SmallVec;

use super::interval::Interval;
use super::reclaim::ReclaimQueue;

/// Sorted, disjoint set of unpinned intervals for one region.
#[derive(Debug, Default)]
pub(crate) struct RangeSet {
    /// Start page -> interval handle. Disjointness makes the key unique.
    by_start: BTreeMap<usize, ArenaKey>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self {
            by_start: BTreeMap::new(),
        }
    }

    /// Collects the handles of all intervals overlapping `span`, in
    /// ascending start order.
    ///
    /// Only the interval starting at or before `span.start` can straddle
    /// the left edge; everything starting inside `span` overlaps by
    /// construction, and nothing starting past `span.end` can.
    fn overlapping(
        &self,
        span: PageSpan,
        arena: &Arena<Interval>,
    ) -> SmallVec<[(usize, ArenaKey); 4]> {
        let mut found = SmallVec::new();
        if let Some((&start, &key)) = self.by_start.range(..=span.start()).next_back() {
            let iv = arena.get(key).expect("range set references a dead interval");
            if iv.span.end() >= span.start() {
                found.push((start, key));
            }
        }
        if span.start() < span.end() {
            for (&start, &key) in self.by_start.range(span.start() + 1..=span.end()) {
                found.push((start, key));
            }
        }
        found
    }

    /// Marks `span` unpinned and reclaimable.
    ///
    /// Every truly overlapping interval is absorbed: its bounds extend the
    /// union and its purge tag is OR'd forward; a single interval covering
    /// the union is then inserted in sorted position and appended at the
    /// reclaim-queue tail. Adjacent-but-not-overlapping neighbours are left
    /// alone. Unpinning a range an existing interval already covers leaves
    /// the structure untouched but still refreshes that interval's recency.
    pub fn unpin(
        &mut self,
        region: RegionId,
        span: PageSpan,
        arena: &mut Arena<Interval>,
        queue: &mut ReclaimQueue,
    ) {
        let overlaps = self.overlapping(span, arena);

        // Already fully unpinned: structure is a no-op, recency is not.
        if let [(_, key)] = overlaps[..] {
            let iv = arena.get_mut(key).expect("range set references a dead interval");
            if iv.span.contains_span(span) {
                iv.token = queue.move_to_tail(key);
                return;
            }
        }

        let mut union = span;
        let mut purged = false;
        for (start, key) in overlaps {
            let iv = arena.remove(key).expect("range set references a dead interval");
            union = union.union(iv.span);
            purged |= iv.purged;
            queue.retire(iv.span.bytes());
            self.by_start.remove(&start);
        }

        let key = arena.insert(Interval {
            region,
            span: union,
            purged,
            token: 0,
        });
        let token = queue.push_tail(key, union.bytes());
        arena
            .get_mut(key)
            .expect("freshly inserted interval")
            .token = token;
        self.by_start.insert(union.start(), key);
        queue.maybe_compact(arena);
    }

    /// Removes `span` from the reclaimable set, returning whether any
    /// overlapping sub-range had been purged.
    ///
    /// Four cases per overlapping interval, scanned in ascending order:
    /// subsumed intervals are deleted, edge overlaps shrink the interval,
    /// and a request strictly inside one interval splits it in two, after
    /// which no further interval can overlap.
    pub fn pin(
        &mut self,
        span: PageSpan,
        arena: &mut Arena<Interval>,
        queue: &mut ReclaimQueue,
    ) -> bool {
        let mut was_purged = false;

        for (start, key) in self.overlapping(span, arena) {
            let (iv_span, iv_purged, region) = {
                let iv = arena.get(key).expect("range set references a dead interval");
                (iv.span, iv.purged, iv.region)
            };
            was_purged |= iv_purged;

            if span.contains_span(iv_span) {
                // Case 1: the request subsumes the interval.
                self.by_start.remove(&start);
                let iv = arena.remove(key).expect("range set references a dead interval");
                queue.retire(iv.span.bytes());
            } else if iv_span.start() >= span.start() {
                // Case 2: overlap at the interval's head.
                let shrunk = PageSpan::new(span.end() + 1, iv_span.end());
                arena.get_mut(key).expect("live interval").span = shrunk;
                queue.shrink(iv_span.bytes() - shrunk.bytes());
                self.by_start.remove(&start);
                self.by_start.insert(shrunk.start(), key);
            } else if iv_span.end() <= span.end() {
                // Case 3: overlap at the interval's tail.
                let shrunk = PageSpan::new(iv_span.start(), span.start() - 1);
                arena.get_mut(key).expect("live interval").span = shrunk;
                queue.shrink(iv_span.bytes() - shrunk.bytes());
            } else {
                // Case 4: the request punches a hole. The left half shrinks
                // in place and keeps its queue position; the right half is a
                // new interval carrying the same tag, with fresh recency.
                // Disjointness means nothing further can overlap.
                let left = PageSpan::new(iv_span.start(), span.start() - 1);
                let right = PageSpan::new(span.end() + 1, iv_span.end());

                arena.get_mut(key).expect("live interval").span = left;
                queue.shrink(iv_span.bytes() - left.bytes());

                let right_key = arena.insert(Interval {
                    region,
                    span: right,
                    purged: iv_purged,
                    token: 0,
                });
                let token = queue.push_tail(right_key, right.bytes());
                arena
                    .get_mut(right_key)
                    .expect("freshly inserted interval")
                    .token = token;
                self.by_start.insert(right.start(), right_key);
                break;
            }
        }

        queue.maybe_compact(arena);
        was_purged
    }

    /// Returns whether any interval overlaps `span`.
    pub fn any_unpinned(&self, span: PageSpan, arena: &Arena<Interval>) -> bool {
        !self.overlapping(span, arena).is_empty()
    }

    /// Removes every interval, for region close.
    pub fn clear(&mut self, arena: &mut Arena<Interval>, queue: &mut ReclaimQueue) {
        for (_, key) in std::mem::take(&mut self.by_start) {
            let iv = arena.remove(key).expect("range set references a dead interval");
            queue.retire(iv.span.bytes());
        }
    }

    /// Resolves the set to `(span, purged)` pairs in ascending order.
    pub fn resolved(&self, arena: &Arena<Interval>) -> Vec<(PageSpan, bool)> {
        self.by_start
            .values()
            .map(|&key| {
                let iv = arena.get(key).expect("range set references a dead interval");
                (iv.span, iv.purged)
            })
            .collect()
    }
}
