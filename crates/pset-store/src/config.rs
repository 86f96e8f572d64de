use pset_types::{PagePartitioner, DEFAULT_PAGE_BITS};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Approximate per-entry footprint, in bytes, reported by a store.
///
/// This is a coarse estimate for capacity planning. It is not the serialized
/// size of any value, which varies per object.
pub const DEFAULT_NOMINAL_ENTRY_SIZE: usize = 20;

/// Configuration for an [`ObjectPropertyStore`](crate::ObjectPropertyStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of low-order index bits used as the in-page offset.
    pub page_bits: u8,
    /// Estimated bytes per stored entry, reported by `nominal_entry_size()`.
    pub nominal_entry_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_bits: DEFAULT_PAGE_BITS,
            nominal_entry_size: DEFAULT_NOMINAL_ENTRY_SIZE,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a usable store.
    pub fn validate(&self) -> StoreResult<()> {
        self.partitioner()?;
        if self.nominal_entry_size == 0 {
            return Err(StoreError::Config(
                "nominal_entry_size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Build the page partitioner this configuration describes.
    pub fn partitioner(&self) -> StoreResult<PagePartitioner> {
        Ok(PagePartitioner::new(self.page_bits)?)
    }
}
