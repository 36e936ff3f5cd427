//! The region manager and region handles.
//!
//! [`RegionManager`] owns the process-wide shared state: the single pin
//! lock guarding every region's range set together with the reclaim queue,
//! and the table of open regions. [`RegionHandle`] is the caller's grip on
//! one region; dropping it closes the region.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use memshare_common::utils::hash::FxHashMap;
use memshare_common::{PageSpan, ProtMask, RegionId, Result};

use crate::pin::{PinOutcome, PinState, PinStatus, UnpinnedRange};
use crate::purge::{purge_walk, Credentials, PurgeController};
use crate::region::{Mapping, Region};

/// Process-wide state shared by the manager, its handles, and the purge
/// controller.
pub(crate) struct SharedState {
    /// The single global lock: all range sets and the reclaim queue.
    pub pin: Mutex<PinState>,
    /// Open regions. Read on purge walks, written on open/close.
    pub regions: RwLock<FxHashMap<RegionId, Arc<Region>>>,
    /// Serializes concurrent purge walks.
    pub purge_gate: Mutex<()>,
    next_region: AtomicU64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            pin: Mutex::new(PinState::new()),
            regions: RwLock::new(FxHashMap::default()),
            purge_gate: Mutex::new(()),
            next_region: AtomicU64::new(0),
        }
    }
}

/// The entry point: opens regions and drives global reclaim.
pub struct RegionManager {
    shared: Arc<SharedState>,
}

impl RegionManager {
    /// Creates a manager with no open regions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SharedState::new()),
        }
    }

    /// Opens a new region and returns the handle owning it.
    pub fn open(&self) -> RegionHandle {
        let id = RegionId::new(self.shared.next_region.fetch_add(1, Ordering::Relaxed));
        let region = Arc::new(Region::new(id));
        self.shared.regions.write().insert(id, Arc::clone(&region));
        self.shared.pin.lock().register(id);
        debug!(region = %id, "region opened");
        RegionHandle {
            shared: Arc::clone(&self.shared),
            region,
            closed: false,
        }
    }

    /// A purge controller bound to this manager's regions.
    #[must_use]
    pub fn purge_controller(&self) -> PurgeController {
        PurgeController::new(Arc::clone(&self.shared))
    }

    /// Evicts the content of every reclaimable interval. Privileged; see
    /// [`PurgeController::purge_all`].
    pub fn purge_all(&self, creds: &Credentials) -> Result<usize> {
        purge_walk(&self.shared, creds)
    }

    /// Aggregate size of all unpinned intervals across all regions.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> usize {
        self.shared.pin.lock().reclaimable_bytes()
    }

    /// Number of unpinned intervals across all regions.
    #[must_use]
    pub fn reclaimable_intervals(&self) -> usize {
        self.shared.pin.lock().live_intervals()
    }

    /// Number of currently open regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.shared.regions.read().len()
    }
}

impl Default for RegionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Owning handle to an open region.
///
/// All pin/unpin entry points validate the byte range up front, before
/// taking the global lock or touching any state; an invalid request
/// mutates nothing.
pub struct RegionHandle {
    shared: Arc<SharedState>,
    region: Arc<Region>,
    closed: bool,
}

impl RegionHandle {
    /// The region's id.
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.region.id()
    }

    /// Fixes the region's size. See [`Region::set_size`].
    pub fn set_size(&self, size: usize) -> Result<()> {
        self.region.set_size(size)
    }

    /// The region's size in bytes; 0 until set.
    #[must_use]
    pub fn size(&self) -> usize {
        self.region.size()
    }

    /// Narrows the protection mask. See [`Region::set_prot_mask`].
    pub fn set_prot_mask(&self, mask: ProtMask) -> Result<()> {
        self.region.set_prot_mask(mask)
    }

    /// The currently allowed access modes.
    #[must_use]
    pub fn prot_mask(&self) -> ProtMask {
        self.region.prot_mask()
    }

    /// Names the region. See [`Region::set_name`].
    pub fn set_name(&self, name: &str) -> Result<()> {
        self.region.set_name(name)
    }

    /// The region's name.
    #[must_use]
    pub fn name(&self) -> String {
        self.region.name()
    }

    /// Maps the region. See [`Region::map`].
    pub fn map(&self, len: usize, prot: ProtMask) -> Result<Mapping> {
        self.region.map(len, prot)
    }

    /// Pins `[offset, offset + len)`, removing it from the reclaimable
    /// set. `len == 0` means "to the end of the region". Returns whether
    /// any overlapping unpinned sub-range had been purged.
    pub fn pin(&self, offset: usize, len: usize) -> Result<PinOutcome> {
        let span = self.page_span(offset, len)?;
        let purged = self.shared.pin.lock().pin(self.region.id(), span);
        Ok(if purged {
            PinOutcome::WasPurged
        } else {
            PinOutcome::NotPurged
        })
    }

    /// Unpins `[offset, offset + len)`, making it reclaimable. `len == 0`
    /// means "to the end of the region".
    pub fn unpin(&self, offset: usize, len: usize) -> Result<()> {
        let span = self.page_span(offset, len)?;
        self.shared.pin.lock().unpin(self.region.id(), span);
        Ok(())
    }

    /// Reports whether any page in `[offset, offset + len)` is unpinned.
    pub fn pin_status(&self, offset: usize, len: usize) -> Result<PinStatus> {
        let span = self.page_span(offset, len)?;
        Ok(self.shared.pin.lock().status(self.region.id(), span))
    }

    /// The region's unpinned intervals, ascending, with purge tags.
    #[must_use]
    pub fn unpinned_ranges(&self) -> Vec<UnpinnedRange> {
        self.shared.pin.lock().unpinned_ranges(self.region.id())
    }

    /// Closes the region: its intervals leave the reclaim queue and the
    /// backing store handle is released. Equivalent to dropping the handle.
    pub fn close(mut self) {
        self.release();
    }

    pub(crate) fn shared(&self) -> &SharedState {
        &self.shared
    }

    fn page_span(&self, offset: usize, len: usize) -> Result<PageSpan> {
        let size = self.region.require_size()?;
        PageSpan::from_bytes(offset, len, size)
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let id = self.region.id();
        self.shared.pin.lock().unregister(id);
        self.shared.regions.write().remove(&id);
        debug!(region = %id, "region closed");
    }
}

impl Drop for RegionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for RegionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionHandle")
            .field("region", &self.region)
            .finish()
    }
}
