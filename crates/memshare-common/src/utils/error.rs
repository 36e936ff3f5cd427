//! Error types shared across all Memshare crates.

use thiserror::Error;

/// The error type for all region-manager operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A byte or page range was misaligned, out of bounds, inverted, or
    /// empty. Also covers malformed arguments such as over-long names.
    #[error("invalid range: {0}")]
    InvalidRange(&'static str),

    /// An operation that requires a fixed region size ran before
    /// `set_size`.
    #[error("region size has not been set")]
    SizeNotSet,

    /// `set_size` was called on a region whose size is already fixed.
    #[error("region size is already set")]
    AlreadySized,

    /// A narrowing-only protection update tried to widen the mask, or an
    /// unprivileged caller requested a purge.
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    /// Backing-store allocation failed.
    #[error("out of memory: {0}")]
    OutOfMemory(&'static str),

    /// The backing store failed during content eviction or access.
    #[error("backing store unavailable")]
    BackingStoreUnavailable(#[source] std::io::Error),
}

/// Convenient result alias used throughout Memshare.
pub type Result<T> = std::result::Result<T, Error>;
