use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid page bits: {bits} (expected 1..={max})")]
    InvalidPageBits { bits: u8, max: u8 },

    #[error("page offset {offset} out of range for page size {page_size}")]
    OffsetOutOfRange { offset: u32, page_size: u64 },
}
