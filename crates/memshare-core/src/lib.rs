//! # memshare-core
//!
//! The Memshare region manager: named, purgeable shared-memory regions.
//!
//! A [`RegionManager`] owns a set of regions. Callers fix a region's size
//! once, then mark byte ranges of it pinned (must-keep) or unpinned
//! (reclaimable). Unpinned ranges across all regions line up in one
//! process-wide recency queue; [`PurgeController`] walks that queue on
//! demand and evicts the backing content of ranges still unpinned at
//! eviction time. A region purged while unpinned reports that fact exactly
//! once on re-pin.
//!
//! ## Modules
//!
//! - [`pin`] - Per-region range sets and the global reclaim queue
//! - [`region`] - Region metadata, protection masks, and mappings
//! - [`registry`] - The region manager and region handles
//! - [`purge`] - The purge controller and privilege witness
//! - [`store`] - Backing-store abstraction and the anonymous-map store
//! - [`command`] - Transport-independent command surface
//!
//! ## Example
//!
//! ```
//! use memshare_core::{Credentials, PinOutcome, RegionManager, PAGE_SIZE};
//!
//! let manager = RegionManager::new();
//! let region = manager.open();
//! region.set_size(16 * PAGE_SIZE).unwrap();
//!
//! region.unpin(0, 4 * PAGE_SIZE).unwrap();
//! manager.purge_all(&Credentials::admin()).unwrap();
//! assert_eq!(region.pin(0, 4 * PAGE_SIZE).unwrap(), PinOutcome::WasPurged);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod pin;
pub mod purge;
pub mod region;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use command::{Command, Response};
pub use pin::{PinOutcome, PinStatus, UnpinnedRange};
pub use purge::{Credentials, PurgeController};
pub use region::{Mapping, DEFAULT_NAME};
pub use registry::{RegionHandle, RegionManager};
pub use store::{BackingStore, MapStore};

// Foundation types from memshare-common
pub use memshare_common::{
    page_align, Error, PageSpan, ProtMask, RegionId, Result, MAX_NAME_LEN, PAGE_SIZE,
};
