//! The purge controller: content eviction under memory pressure.
//!
//! A purge walks the reclaim queue oldest-first and evicts the backing
//! content of every interval still unpinned and not already purged,
//! marking it purged in place. Purge never touches region metadata; the
//! interval stays in its range set and in the queue, where a later walk
//! skips it.
//!
//! The walk never holds the global pin lock across eviction I/O. Each
//! entry is resolved under the lock, evicted outside it, then confirmed
//! under the lock again; if a pin, merge, or recency refresh moved the
//! interval in between, the eviction result is discarded. Pin wins over a
//! concurrent purge.

use std::sync::Arc;

use tracing::{debug, warn};

use memshare_common::{Error, Result};

use crate::registry::SharedState;

/// Caller privilege witness for the purge surface.
///
/// Mirrors the external interface's requirement that purging all caches is
/// an administrative operation.
#[derive(Debug, Clone, Copy)]
pub struct Credentials {
    admin: bool,
}

impl Credentials {
    /// An administrative caller, allowed to purge.
    #[must_use]
    pub const fn admin() -> Self {
        Self { admin: true }
    }

    /// An unprivileged caller.
    #[must_use]
    pub const fn user() -> Self {
        Self { admin: false }
    }

    /// Whether this caller may trigger a purge.
    #[must_use]
    pub const fn can_purge(&self) -> bool {
        self.admin
    }
}

/// Drives content eviction over a manager's reclaim queue.
pub struct PurgeController {
    shared: Arc<SharedState>,
}

impl PurgeController {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Evicts the content of every reclaimable interval, oldest first, and
    /// returns the number of bytes reclaimed.
    ///
    /// Idempotent: already-purged intervals are skipped, so a second walk
    /// with no intervening unpin reclaims 0 bytes. A single interval's
    /// eviction failure is logged and skipped; the interval stays unpurged
    /// and a later walk retries it.
    pub fn purge_all(&self, creds: &Credentials) -> Result<usize> {
        purge_walk(&self.shared, creds)
    }
}

pub(crate) fn purge_walk(shared: &SharedState, creds: &Credentials) -> Result<usize> {
    if !creds.can_purge() {
        return Err(Error::PermissionDenied("purging all caches requires an administrative caller"));
    }

    // One walk at a time; pin/unpin traffic is still free to interleave.
    let _walk = shared.purge_gate.lock();

    let snapshot = shared.pin.lock().queue_snapshot();
    let mut reclaimed = 0usize;

    for entry in snapshot {
        let Some((region_id, span)) = shared.pin.lock().resolve_for_purge(&entry) else {
            continue;
        };

        // The store lookup and the eviction both happen off the pin lock.
        let store = shared
            .regions
            .read()
            .get(&region_id)
            .and_then(|region| region.store());

        if let Some(store) = store {
            if let Err(err) = store.punch(span.byte_offset(), span.bytes()) {
                warn!(
                    region = %region_id,
                    start = span.start(),
                    end = span.end(),
                    error = %err,
                    "eviction failed; interval left unpurged for a later walk"
                );
                continue;
            }
        }

        if shared.pin.lock().confirm_purged(&entry, span) {
            reclaimed += span.bytes();
            debug!(
                region = %region_id,
                start = span.start(),
                end = span.end(),
                bytes = span.bytes(),
                "interval purged"
            );
        }
    }

    Ok(reclaimed)
}
