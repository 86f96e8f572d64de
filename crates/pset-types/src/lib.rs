//! Foundation types for paged property sets.
//!
//! A property set maps 64-bit indices (typically addresses) onto values. The
//! index space is far too large to back densely, so it is cut into fixed-size
//! pages that are only materialized when something is written into them. This
//! crate owns the arithmetic of that split; the storage itself lives in
//! `pset-store`.
//!
//! # Key Types
//!
//! - [`PageId`] — identifier of one page (the high-order bits of an index)
//! - [`PagePosition`] — a resolved `(page, offset)` pair
//! - [`PagePartitioner`] — maps indices to positions and back

pub mod error;
pub mod page;

pub use error::TypeError;
pub use page::{PageId, PagePartitioner, PagePosition, DEFAULT_PAGE_BITS, MAX_PAGE_BITS};
