//! Backing stores: where a region's bytes actually live.
//!
//! The region manager only tracks *metadata* about which ranges are
//! eligible for content eviction; the bytes themselves sit behind the
//! [`BackingStore`] trait. The default implementation, [`MapStore`], is an
//! anonymous memory map sized to the region's page-aligned length.

use std::sync::atomic::{AtomicUsize, Ordering};

use memmap2::{MmapMut, MmapOptions};
use parking_lot::RwLock;

use memshare_common::{Error, Result};

/// A region's content store.
///
/// Implementations are created lazily, sized once, and never grown; the
/// region's size is fixed before the store exists. `punch` is the eviction
/// primitive: it drops the content of a byte range, after which reads of
/// that range observe zeroes.
pub trait BackingStore: Send + Sync {
    /// Capacity in bytes (the region's page-aligned size).
    fn len(&self) -> usize;

    /// Returns whether the store has zero capacity.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads from `offset` into `buf`, returning the number of bytes read.
    /// Reads past the end return 0.
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize>;

    /// Writes `data` at `offset`, returning the number of bytes written.
    /// Writes past the end are truncated.
    fn write_at(&self, offset: usize, data: &[u8]) -> Result<usize>;

    /// Drops the content of `[offset, offset + len)`, zero-filling it.
    fn punch(&self, offset: usize, len: usize) -> Result<()>;
}

/// Anonymous-map backing store.
#[derive(Debug)]
pub struct MapStore {
    name: String,
    map: RwLock<MmapMut>,
    punched_bytes: AtomicUsize,
}

impl MapStore {
    /// Allocates an anonymous map of `len` bytes.
    pub fn new(name: &str, len: usize) -> Result<Self> {
        let map = MmapOptions::new()
            .len(len)
            .map_anon()
            .map_err(|_| Error::OutOfMemory("anonymous map allocation failed"))?;
        Ok(Self {
            name: name.to_owned(),
            map: RwLock::new(map),
            punched_bytes: AtomicUsize::new(0),
        })
    }

    /// The diagnostic name the store was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total bytes zero-filled by `punch` over the store's lifetime.
    #[must_use]
    pub fn punched_bytes(&self) -> usize {
        self.punched_bytes.load(Ordering::Relaxed)
    }
}

impl BackingStore for MapStore {
    fn len(&self) -> usize {
        self.map.read().len()
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize> {
        let map = self.map.read();
        if offset >= map.len() {
            return Ok(0);
        }
        let n = buf.len().min(map.len() - offset);
        buf[..n].copy_from_slice(&map[offset..offset + n]);
        Ok(n)
    }

    fn write_at(&self, offset: usize, data: &[u8]) -> Result<usize> {
        let mut map = self.map.write();
        if offset >= map.len() {
            return Ok(0);
        }
        let n = data.len().min(map.len() - offset);
        map[offset..offset + n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn punch(&self, offset: usize, len: usize) -> Result<()> {
        let mut map = self.map.write();
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= map.len())
            .ok_or(Error::InvalidRange("punch range extends past the store"))?;
        map[offset..end].fill(0);
        self.punched_bytes.fetch_add(len, Ordering::Relaxed);
        Ok(())
    }
}
