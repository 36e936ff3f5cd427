//! Page spans and byte-to-page translation.
//!
//! All pin/unpin bookkeeping is done at page granularity. Callers speak in
//! byte offsets and lengths; [`PageSpan::from_bytes`] is the single
//! validation and translation point, so every command applies the same
//! rules before any state is touched.

use crate::utils::error::{Error, Result};

/// Size of a page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Maximum length of a region name, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Rounds `n` up to the next multiple of [`PAGE_SIZE`].
#[must_use]
pub const fn page_align(n: usize) -> usize {
    (n + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

/// An inclusive interval of page indices `[start, end]`.
///
/// Invariant: `start <= end`; a span always covers at least one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSpan {
    start: usize,
    end: usize,
}

impl PageSpan {
    /// Creates a span from inclusive page bounds.
    ///
    /// Callers must uphold `start <= end`; spans produced by
    /// [`PageSpan::from_bytes`] always do.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted page span {start}..={end}");
        Self { start, end }
    }

    /// Validates a byte range against a region of `size` bytes and
    /// translates it to pages.
    ///
    /// Rules, applied in order:
    /// - `offset` must be page-aligned
    /// - `len == 0` means "from `offset` to the end of the region"
    /// - `len` must be page-aligned
    /// - `offset + len` must not overflow and must stay within the
    ///   page-aligned region size
    pub fn from_bytes(offset: usize, len: usize, size: usize) -> Result<Self> {
        let aligned = page_align(size);

        if offset % PAGE_SIZE != 0 {
            return Err(Error::InvalidRange("offset is not page-aligned"));
        }

        let len = if len == 0 {
            if offset >= aligned {
                return Err(Error::InvalidRange("offset is past the end of the region"));
            }
            aligned - offset
        } else {
            len
        };

        if len % PAGE_SIZE != 0 {
            return Err(Error::InvalidRange("length is not page-aligned"));
        }
        let end = offset
            .checked_add(len)
            .ok_or(Error::InvalidRange("offset + length overflows"))?;
        if end > aligned {
            return Err(Error::InvalidRange("range extends past the end of the region"));
        }

        let pgstart = offset / PAGE_SIZE;
        let pgend = pgstart + len / PAGE_SIZE - 1;
        Ok(Self::new(pgstart, pgend))
    }

    /// First page covered by the span.
    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Last page covered by the span (inclusive).
    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of pages covered.
    #[must_use]
    pub const fn pages(self) -> usize {
        self.end - self.start + 1
    }

    /// Number of bytes covered.
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.pages() * PAGE_SIZE
    }

    /// Byte offset of the first covered page.
    #[must_use]
    pub const fn byte_offset(self) -> usize {
        self.start * PAGE_SIZE
    }

    /// Returns whether the two spans share at least one page.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns whether `other` lies entirely within this span.
    #[must_use]
    pub const fn contains_span(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns the union of two spans.
    ///
    /// Meaningful for overlapping (or adjacent) spans; the result covers
    /// both inputs.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_align() {
        assert_eq!(page_align(0), 0);
        assert_eq!(page_align(1), PAGE_SIZE);
        assert_eq!(page_align(PAGE_SIZE), PAGE_SIZE);
        assert_eq!(page_align(PAGE_SIZE + 1), 2 * PAGE_SIZE);
    }

    #[test]
    fn test_from_bytes_basic() {
        let span = PageSpan::from_bytes(0, 4 * PAGE_SIZE, 16 * PAGE_SIZE).unwrap();
        assert_eq!((span.start(), span.end()), (0, 3));
        assert_eq!(span.pages(), 4);
        assert_eq!(span.bytes(), 4 * PAGE_SIZE);
    }

    #[test]
    fn test_from_bytes_zero_len_means_to_end() {
        let span = PageSpan::from_bytes(2 * PAGE_SIZE, 0, 10 * PAGE_SIZE).unwrap();
        assert_eq!((span.start(), span.end()), (2, 9));
    }

    #[test]
    fn test_from_bytes_unaligned_size_rounds_up() {
        // A 1-byte region still occupies one page.
        let span = PageSpan::from_bytes(0, 0, 1).unwrap();
        assert_eq!((span.start(), span.end()), (0, 0));
    }

    #[test]
    fn test_from_bytes_rejects_misaligned() {
        assert!(matches!(
            PageSpan::from_bytes(1, PAGE_SIZE, 16 * PAGE_SIZE),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PageSpan::from_bytes(0, PAGE_SIZE + 1, 16 * PAGE_SIZE),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_from_bytes_rejects_out_of_bounds() {
        assert!(matches!(
            PageSpan::from_bytes(8 * PAGE_SIZE, 0, 4 * PAGE_SIZE),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PageSpan::from_bytes(0, 8 * PAGE_SIZE, 4 * PAGE_SIZE),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_from_bytes_rejects_overflow() {
        assert!(matches!(
            PageSpan::from_bytes(usize::MAX - PAGE_SIZE + 1, PAGE_SIZE, 4 * PAGE_SIZE),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_overlap_and_containment() {
        let a = PageSpan::new(0, 9);
        let b = PageSpan::new(5, 14);
        let c = PageSpan::new(10, 14);
        assert!(a.overlaps(b));
        assert!(!a.overlaps(c));
        assert!(a.contains_span(PageSpan::new(3, 7)));
        assert!(!a.contains_span(b));
        assert_eq!(a.union(b), PageSpan::new(0, 14));
    }
}
