//! Sparse, paged object property store.
//!
//! An [`ObjectPropertyStore`] associates arbitrary values with 64-bit indices
//! (usually addresses). The index space is split into pages by a
//! [`PagePartitioner`](pset_types::PagePartitioner); a page is created the
//! first time something is written into it and lives as long as the store.
//!
//! # Components
//!
//! - [`PropertyPage`] -- sparse offset-to-value map for one page
//! - [`PageDirectory`] -- page id to page, with lazy creation
//! - [`ObjectPropertyStore`] -- index-level put/get/remove/move, range
//!   operations, navigation, visitation, and per-entry persistence
//! - [`PropertySink`] / [`PropertySource`] -- sequential value persistence
//! - [`MemorySink`] / [`MemorySource`] -- in-memory persistence for tests
//!
//! # Design Rules
//!
//! 1. `len()` always equals the number of occupied slots across all pages.
//!    It is maintained from the size change of each touched page and is
//!    never recomputed by a full scan.
//! 2. Reads never create pages.
//! 3. A failed operation leaves the store exactly as it was.
//! 4. All persistence errors are propagated, never silently ignored.

pub mod config;
pub mod directory;
pub mod error;
pub mod memory;
pub mod page;
pub mod store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{StoreConfig, DEFAULT_NOMINAL_ENTRY_SIZE};
pub use directory::PageDirectory;
pub use error::{StoreError, StoreResult};
pub use memory::{MemorySink, MemorySource};
pub use page::PropertyPage;
pub use store::ObjectPropertyStore;
pub use traits::{PropertySink, PropertySource};
