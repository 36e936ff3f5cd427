//! The process-wide reclaim queue.
//!
//! Recency order for every unpinned interval across all regions: the tail
//! is the most recently unpinned, and the purge walk consumes from the
//! head. The queue is append-only; an interval leaving the queue (pinned
//! away, merged, or moved back to the tail) simply leaves its old entry
//! behind as a tombstone, detected by a token mismatch against the interval
//! it points at. Tombstones are skipped by the walk and swept out once they
//! outnumber live entries.

use std::collections::VecDeque;

use memshare_common::{Arena, ArenaKey};

use super::interval::Interval;

/// Sweep threshold: compact once tombstones exceed live entries by this
/// many.
const COMPACT_SLACK: usize = 32;

/// A queue entry referencing an interval by stable handle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueEntry {
    pub key: ArenaKey,
    pub token: u64,
}

/// Recency-ordered queue of reclaimable intervals plus the aggregate
/// reclaimable-byte counter.
#[derive(Debug)]
pub(crate) struct ReclaimQueue {
    entries: VecDeque<QueueEntry>,
    /// Number of non-tombstone entries.
    live: usize,
    /// Next recency token to hand out.
    next_token: u64,
    /// Sum of the byte sizes of every interval in every region's range
    /// set. Purged intervals still count; they only leave on pin.
    reclaimable_bytes: usize,
}

impl ReclaimQueue {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            live: 0,
            next_token: 0,
            reclaimable_bytes: 0,
        }
    }

    /// Aggregate size of all tracked intervals, in bytes.
    pub fn reclaimable_bytes(&self) -> usize {
        self.reclaimable_bytes
    }

    /// Number of live (non-tombstone) entries.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Appends a new interval at the tail and returns its recency token.
    pub fn push_tail(&mut self, key: ArenaKey, bytes: usize) -> u64 {
        let token = self.fresh_token();
        self.entries.push_back(QueueEntry { key, token });
        self.live += 1;
        self.reclaimable_bytes += bytes;
        token
    }

    /// Moves an already-tracked interval to the tail, returning its new
    /// token. The interval's old entry becomes a tombstone; its size stays
    /// counted.
    pub fn move_to_tail(&mut self, key: ArenaKey) -> u64 {
        let token = self.fresh_token();
        self.entries.push_back(QueueEntry { key, token });
        token
    }

    /// Records the removal of a tracked interval. The entry pointing at it
    /// becomes a tombstone once the arena slot dies or changes token.
    pub fn retire(&mut self, bytes: usize) {
        debug_assert!(self.live > 0, "retire with no live entries");
        debug_assert!(bytes <= self.reclaimable_bytes, "retire underflows byte counter");
        self.live -= 1;
        self.reclaimable_bytes -= bytes;
    }

    /// Records an in-place shrink of a tracked interval. Its queue entry
    /// and recency stay valid.
    pub fn shrink(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.reclaimable_bytes, "shrink underflows byte counter");
        self.reclaimable_bytes -= bytes;
    }

    /// Head-to-tail snapshot of the current entries for a purge walk.
    /// Entries invalidated after the snapshot show up as tombstones when
    /// re-resolved.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.iter().copied().collect()
    }

    /// Sweeps tombstones if they have accumulated past the slack bound.
    pub fn maybe_compact(&mut self, arena: &Arena<Interval>) {
        if self.entries.len() > self.live + COMPACT_SLACK {
            self.entries
                .retain(|entry| arena.get(entry.key).is_some_and(|iv| iv.token == entry.token));
            debug_assert_eq!(self.entries.len(), self.live);
        }
    }

    fn fresh_token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }
}
