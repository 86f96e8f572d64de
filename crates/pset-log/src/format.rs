//! On-disk layout of a property log.
//!
//! ```text
//! [4 bytes: magic "PSET"]
//! [4 bytes: schema version (big-endian u32)]
//! record*
//!
//! record:
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (bincode)]
//! ```
//!
//! The first record is a [`LogHeader`]. It is followed by `entry_count`
//! pairs of records: the index (`u64`), then the value stored there.

use pset_store::ObjectPropertyStore;
use serde::{Deserialize, Serialize};

/// File magic.
pub const MAGIC: &[u8; 4] = b"PSET";

/// Schema version written by this crate. Readers reject anything else.
pub const SCHEMA_VERSION: u32 = 1;

/// Magic plus schema version.
pub const PREAMBLE_SIZE: usize = 8;

/// Record framing: length plus CRC.
pub const RECORD_HEADER_SIZE: usize = 8;

/// Upper bound on a single record payload (256 MiB).
pub const MAX_RECORD_SIZE: u32 = 256 * 1024 * 1024;

/// First record of every log: describes the store that was saved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogHeader {
    pub store_name: String,
    pub page_bits: u8,
    /// Per-entry footprint estimate the store was configured with.
    pub nominal_entry_size: u64,
    pub entry_count: u64,
}

impl LogHeader {
    /// Describe `store` as it is right now.
    pub fn for_store<V>(store: &ObjectPropertyStore<V>) -> Self {
        Self {
            store_name: store.name().to_string(),
            page_bits: store.partitioner().page_bits(),
            nominal_entry_size: store.nominal_entry_size() as u64,
            entry_count: store.len() as u64,
        }
    }
}
