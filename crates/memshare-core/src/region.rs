//! Region metadata: size, protection mask, name, and the lazily-created
//! backing store.
//!
//! The fields read on mapping and data paths (`size`, the protection mask,
//! backing-store existence) are single-assignment-after-create atomics, so
//! those paths never contend with pin/unpin traffic on the global lock.
//! Store creation itself is serialized by a narrow per-region mutex.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use memshare_common::{page_align, Error, ProtMask, RegionId, Result, MAX_NAME_LEN};

use crate::store::{BackingStore, MapStore};

/// Name used for stores whose region was never named.
pub const DEFAULT_NAME: &str = "memshare";

#[derive(Default)]
struct StoreSlot {
    /// Set by `set_name`, frozen once the store exists.
    name: Option<String>,
    /// Created at most once, on the first mapping request.
    store: Option<Arc<dyn BackingStore>>,
}

/// A named, sizeable shared-memory region.
///
/// The lifecycle runs open → `set_size` (once) → map/pin/unpin → close.
/// Size and name are fixed points: size can be assigned exactly once, and
/// the name freezes when the backing store comes into existence.
pub struct Region {
    id: RegionId,
    /// Byte length; 0 means not yet set.
    size: AtomicUsize,
    /// Allowed access modes; only ever narrowed.
    prot: AtomicU32,
    /// Lock-free existence flag for the backing store.
    has_store: AtomicBool,
    /// Guards store creation and the name, nothing else.
    slot: Mutex<StoreSlot>,
}

impl Region {
    pub(crate) fn new(id: RegionId) -> Self {
        Self {
            id,
            size: AtomicUsize::new(0),
            prot: AtomicU32::new(ProtMask::all().bits()),
            has_store: AtomicBool::new(false),
            slot: Mutex::new(StoreSlot::default()),
        }
    }

    /// The region's id.
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Fixes the region's size. Callable exactly once, before any mapping.
    pub fn set_size(&self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::InvalidRange("size must be non-zero"));
        }
        self.size
            .compare_exchange(0, size, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadySized)?;
        Ok(())
    }

    /// The region's size in bytes; 0 until `set_size` runs.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub(crate) fn require_size(&self) -> Result<usize> {
        match self.size() {
            0 => Err(Error::SizeNotSet),
            size => Ok(size),
        }
    }

    /// The currently allowed access modes.
    #[must_use]
    pub fn prot_mask(&self) -> ProtMask {
        ProtMask::from_bits_truncate(self.prot.load(Ordering::Acquire))
    }

    /// Narrows the protection mask. Bits can be removed, never added.
    pub fn set_prot_mask(&self, mask: ProtMask) -> Result<()> {
        self.prot
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                ProtMask::from_bits_truncate(current)
                    .permits(mask)
                    .then_some(mask.bits())
            })
            .map_err(|_| Error::PermissionDenied("protection mask may only be narrowed"))?;
        Ok(())
    }

    /// Names the region. Rejected once the backing store exists.
    pub fn set_name(&self, name: &str) -> Result<()> {
        if name.len() >= MAX_NAME_LEN {
            return Err(Error::InvalidRange("name is too long"));
        }
        let mut slot = self.slot.lock();
        if slot.store.is_some() {
            return Err(Error::InvalidRange("name is fixed once the backing store exists"));
        }
        slot.name = Some(name.to_owned());
        Ok(())
    }

    /// The region's name, or [`DEFAULT_NAME`] if it was never named.
    #[must_use]
    pub fn name(&self) -> String {
        self.slot
            .lock()
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_NAME.to_owned())
    }

    /// Whether the backing store has been created. Lock-free.
    #[must_use]
    pub fn has_store(&self) -> bool {
        self.has_store.load(Ordering::Acquire)
    }

    /// The backing store, if it exists.
    pub(crate) fn store(&self) -> Option<Arc<dyn BackingStore>> {
        if !self.has_store() {
            return None;
        }
        self.slot.lock().store.clone()
    }

    /// Maps `len` bytes of the region with the requested protections.
    ///
    /// Requires the size to be set, `len` within the page-aligned size, and
    /// `prot` within the region's mask. The backing store is created here,
    /// at most once, on the first successful call.
    pub fn map(&self, len: usize, prot: ProtMask) -> Result<Mapping> {
        let size = self.require_size()?;
        let aligned = page_align(size);
        if len == 0 {
            return Err(Error::InvalidRange("mapping length must be non-zero"));
        }
        if len > aligned {
            return Err(Error::InvalidRange("mapping is larger than the region"));
        }
        if !self.prot_mask().permits(prot) {
            return Err(Error::PermissionDenied(
                "mapping requests protections outside the region's mask",
            ));
        }
        let store = self.ensure_store(aligned)?;
        Ok(Mapping { store, len, prot })
    }

    /// Creates the backing store if it does not exist yet, serializing the
    /// create-create race on the per-region slot lock.
    fn ensure_store(&self, len: usize) -> Result<Arc<dyn BackingStore>> {
        let mut slot = self.slot.lock();
        if let Some(store) = &slot.store {
            return Ok(Arc::clone(store));
        }
        let name = slot.name.as_deref().unwrap_or(DEFAULT_NAME);
        let store: Arc<dyn BackingStore> = Arc::new(MapStore::new(name, len)?);
        slot.store = Some(Arc::clone(&store));
        self.has_store.store(true, Ordering::Release);
        Ok(store)
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.id)
            .field("size", &self.size())
            .field("prot", &self.prot_mask())
            .field("has_store", &self.has_store())
            .finish()
    }
}

/// A view of a region's bytes, bounded by the length and protections
/// requested at map time.
///
/// A mapping holds its own reference to the backing store and does not
/// extend the region's lifetime; what happens to a mapping when its region
/// closes is the mapper's concern.
pub struct Mapping {
    store: Arc<dyn BackingStore>,
    len: usize,
    prot: ProtMask,
}

impl Mapping {
    /// Mapped length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the mapping covers zero bytes. Mappings are created
    /// non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Protections this mapping was granted.
    #[must_use]
    pub fn prot(&self) -> ProtMask {
        self.prot
    }

    /// Reads from the mapping. Requires [`ProtMask::READ`].
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        if !self.prot.contains(ProtMask::READ) {
            return Err(Error::PermissionDenied("mapping is not readable"));
        }
        if offset >= self.len {
            return Ok(0);
        }
        let limit = buf.len().min(self.len - offset);
        self.store.read_at(offset, &mut buf[..limit])
    }

    /// Writes through the mapping. Requires [`ProtMask::WRITE`].
    pub fn write_at(&self, offset: usize, data: &[u8]) -> Result<usize> {
        if !self.prot.contains(ProtMask::WRITE) {
            return Err(Error::PermissionDenied("mapping is not writable"));
        }
        if offset >= self.len {
            return Ok(0);
        }
        let limit = data.len().min(self.len - offset);
        self.store.write_at(offset, &data[..limit])
    }
}
