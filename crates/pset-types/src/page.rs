use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Default number of low-order index bits used as the in-page offset.
///
/// 12 bits gives 4096 slots per page.
pub const DEFAULT_PAGE_BITS: u8 = 12;

/// Largest supported page width. Offsets are stored as `u32`.
pub const MAX_PAGE_BITS: u8 = 32;

/// Identifier of a single page: the index with its offset bits shifted out.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(u64);

impl PageId {
    /// Wrap a raw page number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw page number.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({:#x})", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for PageId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// An index resolved into its page and the slot within that page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PagePosition {
    pub page: PageId,
    pub offset: u32,
}

/// Splits 64-bit indices into `(page, offset)` pairs.
///
/// The low `page_bits` bits of an index are the offset; the remaining high
/// bits are the page id. The mapping is pure, so the same index always lands
/// on the same slot for the lifetime of a partitioner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePartitioner {
    page_bits: u8,
    mask: u64,
}

impl PagePartitioner {
    /// Create a partitioner with `page_bits` offset bits.
    pub fn new(page_bits: u8) -> Result<Self, TypeError> {
        if page_bits == 0 || page_bits > MAX_PAGE_BITS {
            return Err(TypeError::InvalidPageBits {
                bits: page_bits,
                max: MAX_PAGE_BITS,
            });
        }
        Ok(Self {
            page_bits,
            mask: (1u64 << page_bits) - 1,
        })
    }

    /// Number of offset bits.
    pub fn page_bits(&self) -> u8 {
        self.page_bits
    }

    /// Number of slots in one page.
    pub fn page_size(&self) -> u64 {
        self.mask + 1
    }

    /// Resolve an index to its page and in-page offset.
    pub fn resolve(&self, index: u64) -> PagePosition {
        PagePosition {
            page: self.page_id(index),
            offset: self.page_offset(index),
        }
    }

    /// The page an index belongs to.
    pub fn page_id(&self, index: u64) -> PageId {
        PageId(index >> self.page_bits)
    }

    /// The offset of an index within its page.
    pub fn page_offset(&self, index: u64) -> u32 {
        // mask fits in u32 because page_bits <= 32
        (index & self.mask) as u32
    }

    /// Rebuild an index from a page and offset. Inverse of [`resolve`](Self::resolve).
    pub fn compose(&self, page: PageId, offset: u32) -> u64 {
        (page.0 << self.page_bits) | (offset as u64 & self.mask)
    }

    /// Like [`compose`](Self::compose), but rejects offsets that do not fit a page.
    pub fn try_compose(&self, page: PageId, offset: u32) -> Result<u64, TypeError> {
        if offset as u64 > self.mask {
            return Err(TypeError::OffsetOutOfRange {
                offset,
                page_size: self.page_size(),
            });
        }
        Ok(self.compose(page, offset))
    }

    /// First index covered by `page`.
    pub fn page_start(&self, page: PageId) -> u64 {
        page.0 << self.page_bits
    }

    /// Last index covered by `page`.
    pub fn page_end(&self, page: PageId) -> u64 {
        self.page_start(page) | self.mask
    }
}

impl Default for PagePartitioner {
    fn default() -> Self {
        Self {
            page_bits: DEFAULT_PAGE_BITS,
            mask: (1u64 << DEFAULT_PAGE_BITS) - 1,
        }
    }
}
